// ── Change notification ──
//
// Typed publish/subscribe for state changes. Handlers registered with
// `subscribe` run synchronously on the publishing task, in registration
// order. A handler that errors or panics is logged and skipped; the
// remaining handlers still run. Every published event is also sent on
// a broadcast channel for async consumers.

use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::model::Product;

const EVENT_CHANNEL_SIZE: usize = 64;

/// Boxed error returned by a failing handler.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

type Handler = Arc<dyn Fn(&ChangeEvent) -> Result<(), HandlerError> + Send + Sync>;

/// Event kinds that handlers subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    ModeChanged,
    ProductsChanged,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ModeChanged => "mode_changed",
            Self::ProductsChanged => "products_changed",
        })
    }
}

/// A state change observed after a successful fetch.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChangeEvent {
    /// The primary product's air mode code differs from the last snapshot.
    ModeChanged {
        previous: Option<String>,
        current: Option<String>,
    },
    /// A new product list replaced the held snapshot.
    ProductsChanged { products: Arc<Vec<Product>> },
}

impl ChangeEvent {
    pub fn kind(&self) -> ChangeKind {
        match self {
            Self::ModeChanged { .. } => ChangeKind::ModeChanged,
            Self::ProductsChanged { .. } => ChangeKind::ProductsChanged,
        }
    }
}

/// Handle returned by [`ChangeNotifier::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

struct Subscription {
    id: SubscriptionId,
    kind: ChangeKind,
    handler: Handler,
}

/// Registry of change handlers plus a broadcast fan-out.
pub struct ChangeNotifier {
    subscriptions: RwLock<Vec<Subscription>>,
    next_id: AtomicU64,
    broadcast: broadcast::Sender<ChangeEvent>,
}

impl ChangeNotifier {
    pub fn new() -> Self {
        let (broadcast, _) = broadcast::channel(EVENT_CHANNEL_SIZE);
        Self {
            subscriptions: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
            broadcast,
        }
    }

    /// Register a handler for one event kind.
    pub fn subscribe<F>(&self, kind: ChangeKind, handler: F) -> SubscriptionId
    where
        F: Fn(&ChangeEvent) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.subscriptions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Subscription {
                id,
                kind,
                handler: Arc::new(handler),
            });
        debug!(subscription = %id, %kind, "handler registered");
        id
    }

    /// Remove a handler. Returns `false` if the id was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subs = self
            .subscriptions
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let before = subs.len();
        subs.retain(|s| s.id != id);
        before != subs.len()
    }

    /// Deliver an event to every handler registered for its kind, then
    /// to broadcast receivers. Returns the number of handlers invoked.
    ///
    /// Handlers are cloned out of the registry before running, so a
    /// handler may itself subscribe or unsubscribe.
    pub fn publish(&self, event: &ChangeEvent) -> usize {
        let kind = event.kind();
        let handlers: Vec<(SubscriptionId, Handler)> = self
            .subscriptions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|s| s.kind == kind)
            .map(|s| (s.id, Arc::clone(&s.handler)))
            .collect();

        for (id, handler) in &handlers {
            match catch_unwind(AssertUnwindSafe(|| handler(event))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!(subscription = %id, %kind, error = %e, "change handler failed"),
                Err(_) => warn!(subscription = %id, %kind, "change handler panicked"),
            }
        }

        // No receivers is not an error.
        let _ = self.broadcast.send(event.clone());
        handlers.len()
    }

    /// Async receiver for every published event.
    pub fn events(&self) -> broadcast::Receiver<ChangeEvent> {
        self.broadcast.subscribe()
    }

    pub fn handler_count(&self, kind: ChangeKind) -> usize {
        self.subscriptions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|s| s.kind == kind)
            .count()
    }
}

impl Default for ChangeNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn mode_event(previous: &str, current: &str) -> ChangeEvent {
        ChangeEvent::ModeChanged {
            previous: Some(previous.into()),
            current: Some(current.into()),
        }
    }

    #[test]
    fn handlers_run_in_registration_order() {
        let notifier = ChangeNotifier::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        for name in ["first", "second", "third"] {
            let log = Arc::clone(&log);
            notifier.subscribe(ChangeKind::ModeChanged, move |_| {
                log.lock().unwrap().push(name);
                Ok(())
            });
        }

        assert_eq!(notifier.publish(&mode_event("A", "B")), 3);
        assert_eq!(*log.lock().unwrap(), vec!["first", "second", "third"]);
    }

    #[test]
    fn handlers_only_see_their_kind() {
        let notifier = ChangeNotifier::new();
        let hits = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&hits);
        notifier.subscribe(ChangeKind::ProductsChanged, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        assert_eq!(notifier.publish(&mode_event("A", "B")), 0);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn failing_handlers_do_not_stop_delivery() {
        let notifier = ChangeNotifier::new();
        let reached = Arc::new(AtomicU64::new(0));

        notifier.subscribe(ChangeKind::ModeChanged, |_| Err("boom".into()));
        notifier.subscribe(ChangeKind::ModeChanged, |_| panic!("handler bug"));
        let counter = Arc::clone(&reached);
        notifier.subscribe(ChangeKind::ModeChanged, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        assert_eq!(notifier.publish(&mode_event("B", "C")), 3);
        assert_eq!(reached.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let notifier = ChangeNotifier::new();
        let hits = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&hits);
        let id = notifier.subscribe(ChangeKind::ModeChanged, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        notifier.publish(&mode_event("A", "B"));
        assert!(notifier.unsubscribe(id));
        assert!(!notifier.unsubscribe(id));
        notifier.publish(&mode_event("B", "C"));

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(notifier.handler_count(ChangeKind::ModeChanged), 0);
    }

    #[test]
    fn handler_may_unsubscribe_itself() {
        let notifier = Arc::new(ChangeNotifier::new());
        let slot: Arc<Mutex<Option<SubscriptionId>>> = Arc::new(Mutex::new(None));

        let inner = Arc::clone(&notifier);
        let inner_slot = Arc::clone(&slot);
        let id = notifier.subscribe(ChangeKind::ModeChanged, move |_| {
            if let Some(id) = *inner_slot.lock().unwrap() {
                inner.unsubscribe(id);
            }
            Ok(())
        });
        *slot.lock().unwrap() = Some(id);

        assert_eq!(notifier.publish(&mode_event("A", "B")), 1);
        assert_eq!(notifier.publish(&mode_event("B", "C")), 0);
    }

    #[tokio::test]
    async fn broadcast_receives_published_events() {
        let notifier = ChangeNotifier::new();
        let mut rx = notifier.events();

        notifier.publish(&mode_event("A", "F"));

        let event = rx.recv().await.unwrap();
        assert_eq!(event.kind(), ChangeKind::ModeChanged);
        match event {
            ChangeEvent::ModeChanged { previous, current } => {
                assert_eq!(previous.as_deref(), Some("A"));
                assert_eq!(current.as_deref(), Some("F"));
            }
            other @ ChangeEvent::ProductsChanged { .. } => panic!("unexpected {other:?}"),
        }
    }
}
