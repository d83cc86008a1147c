// ── Product snapshot ──
//
// Holds the most recent successfully fetched product list. Every
// update replaces the whole list and reports how it differs from the
// one it replaced; the comparison and the swap happen under the same
// `send_modify`, so concurrent updates cannot interleave between them.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;

use crate::model::{AirMode, Product};
use crate::stream::SnapshotStream;

/// How a newly stored snapshot differs from the previous one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnapshotDiff {
    /// Primary product mode differs from the previous snapshot's.
    pub mode_changed: bool,
    /// The new list is not structurally equal to the old one.
    pub products_changed: bool,
    pub previous_mode: Option<String>,
    pub current_mode: Option<String>,
}

/// The single held product snapshot.
pub struct ProductStore {
    snapshot: watch::Sender<Arc<Vec<Product>>>,
    last_refresh: watch::Sender<Option<DateTime<Utc>>>,
}

impl ProductStore {
    pub fn new() -> Self {
        let (snapshot, _) = watch::channel(Arc::new(Vec::new()));
        let (last_refresh, _) = watch::channel(None);
        Self {
            snapshot,
            last_refresh,
        }
    }

    /// Current snapshot (cheap `Arc` clone). Empty until the first fetch.
    pub fn snapshot(&self) -> Arc<Vec<Product>> {
        Arc::clone(&self.snapshot.borrow())
    }

    /// Replace the snapshot and diff it against the previous one.
    ///
    /// The first fetch never counts as a mode change, but always counts
    /// as a products change.
    pub fn update(&self, products: Vec<Product>) -> SnapshotDiff {
        let next = Arc::new(products);
        let current_mode = next
            .first()
            .and_then(Product::air_mode)
            .map(str::to_owned);

        let mut diff = SnapshotDiff::default();
        self.snapshot.send_modify(|held| {
            // Stamped under the snapshot lock: exactly one update is first.
            let first_fetch = self.last_refresh.send_replace(Some(Utc::now())).is_none();
            let previous_mode = held.first().and_then(Product::air_mode).map(str::to_owned);
            diff = SnapshotDiff {
                mode_changed: !first_fetch && previous_mode != current_mode,
                products_changed: first_fetch || **held != *next,
                previous_mode,
                current_mode,
            };
            *held = Arc::clone(&next);
        });
        diff
    }

    /// First product in service order, if any.
    pub fn primary(&self) -> Option<Product> {
        self.snapshot.borrow().first().cloned()
    }

    /// Modem id of the primary product. Empty ids count as absent.
    pub fn primary_modem(&self) -> Option<String> {
        self.snapshot
            .borrow()
            .first()
            .map(|p| p.modem.clone())
            .filter(|m| !m.is_empty())
    }

    /// Raw mode code of the primary product.
    pub fn current_mode_code(&self) -> Option<String> {
        self.snapshot
            .borrow()
            .first()
            .and_then(Product::air_mode)
            .map(str::to_owned)
    }

    /// Parsed mode of the primary product. Unknown codes yield `None`.
    pub fn current_mode(&self) -> Option<AirMode> {
        self.current_mode_code()
            .as_deref()
            .and_then(AirMode::from_code)
    }

    pub fn last_refresh(&self) -> Option<DateTime<Utc>> {
        *self.last_refresh.borrow()
    }

    pub fn subscribe(&self) -> SnapshotStream<Vec<Product>> {
        SnapshotStream::new(self.snapshot.subscribe())
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot.borrow().is_empty()
    }
}

impl Default for ProductStore {
    fn default() -> Self {
        Self::new()
    }
}
