// ── Controller abstraction ──
//
// Lifecycle management for one Aldes account: authentication,
// discovery, the background poller, commands, and change events.
//
// Reads degrade: a failed fetch keeps serving the last snapshot and
// publishes nothing. Writes surface every failure to the caller and
// never touch local state unless the service confirmed them.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use aldes_api::{AldesClient, TlsMode, TransportConfig};

use crate::config::ControllerConfig;
use crate::error::CoreError;
use crate::events::{ChangeEvent, ChangeKind, ChangeNotifier, HandlerError, SubscriptionId};
use crate::model::{
    AirMode, HvacState, ModeInfo, Product, Temperature, Thermostat, ThermostatId,
    ThermostatUpdate,
};
use crate::store::{ProductStore, ThermostatRegistry};
use crate::stream::SnapshotStream;

// ── ConnectionState ──────────────────────────────────────────────

/// Connection state observable by consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Failed,
}

// ── Controller ───────────────────────────────────────────────────

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<ControllerInner>`. Every clone shares
/// the same snapshot, registry, notifier, and poller.
#[derive(Clone)]
pub struct Controller {
    inner: Arc<ControllerInner>,
}

struct ControllerInner {
    config: ControllerConfig,
    store: ProductStore,
    thermostats: ThermostatRegistry,
    notifier: ChangeNotifier,
    connection_state: watch::Sender<ConnectionState>,
    cancel: CancellationToken,
    /// Child token for the current connection, cancelled on disconnect
    /// and replaced on reconnect.
    cancel_child: Mutex<CancellationToken>,
    client: Mutex<Option<Arc<AldesClient>>>,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Controller {
    /// Create a new Controller from configuration. Does NOT connect;
    /// call [`connect()`](Self::connect) to authenticate and start polling.
    pub fn new(config: ControllerConfig) -> Self {
        let (connection_state, _) = watch::channel(ConnectionState::Disconnected);
        let cancel = CancellationToken::new();
        let cancel_child = cancel.child_token();

        Self {
            inner: Arc::new(ControllerInner {
                config,
                store: ProductStore::new(),
                thermostats: ThermostatRegistry::new(),
                notifier: ChangeNotifier::new(),
                connection_state,
                cancel,
                cancel_child: Mutex::new(cancel_child),
                client: Mutex::new(None),
                task_handles: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.inner.config
    }

    // ── Connection lifecycle ─────────────────────────────────────

    /// Authenticate, run discovery, then spawn the poller.
    ///
    /// The poller only starts once discovery has completed, so the
    /// registry is populated before the first scheduled refresh.
    /// Connecting again stops the previous poller before a new one starts.
    pub async fn connect(&self) -> Result<(), CoreError> {
        let _ = self
            .inner
            .connection_state
            .send(ConnectionState::Connecting);

        match self.establish().await {
            Ok(()) => {
                let _ = self.inner.connection_state.send(ConnectionState::Connected);
                info!(
                    thermostats = self.inner.thermostats.len(),
                    "connected to Aldes cloud"
                );
                Ok(())
            }
            Err(e) => {
                *self.inner.client.lock().await = None;
                let _ = self.inner.connection_state.send(ConnectionState::Failed);
                Err(e)
            }
        }
    }

    async fn establish(&self) -> Result<(), CoreError> {
        // Fresh child token for this connection (supports reconnect).
        // A poller left over from an earlier connect is stopped first.
        let child = self.inner.cancel.child_token();
        let previous =
            std::mem::replace(&mut *self.inner.cancel_child.lock().await, child.clone());
        previous.cancel();
        let stale: Vec<JoinHandle<()>> = self.inner.task_handles.lock().await.drain(..).collect();
        for handle in stale {
            let _ = handle.await;
        }

        let config = &self.inner.config;
        let client = AldesClient::new(
            config.base_url.clone(),
            config.username.clone(),
            config.password.clone(),
            &build_transport(config),
        )?;
        client.authenticate().await?;
        *self.inner.client.lock().await = Some(Arc::new(client));

        let tracked = self.discover().await?;
        debug!(count = tracked.len(), "discovery complete");

        let interval = config.refresh_interval;
        if !interval.is_zero() {
            let mut handles = self.inner.task_handles.lock().await;
            handles.push(tokio::spawn(poll_task(self.clone(), interval, child)));
        }
        Ok(())
    }

    /// Stop the poller and drop the authenticated client.
    ///
    /// An in-flight refresh is allowed to finish. Cached state stays
    /// readable after disconnecting.
    pub async fn disconnect(&self) {
        // Cancel the child token (not the parent, which allows reconnect).
        self.inner.cancel_child.lock().await.cancel();

        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            let _ = handle.await;
        }

        *self.inner.client.lock().await = None;

        let _ = self
            .inner
            .connection_state
            .send(ConnectionState::Disconnected);
        debug!("disconnected");
    }

    /// Connect, run `f`, disconnect. The poller is never started.
    pub async fn oneshot<F, Fut, T>(config: ControllerConfig, f: F) -> Result<T, CoreError>
    where
        F: FnOnce(Controller) -> Fut,
        Fut: std::future::Future<Output = Result<T, CoreError>>,
    {
        let mut cfg = config;
        cfg.refresh_interval = Duration::ZERO;

        let controller = Controller::new(cfg);
        controller.connect().await?;
        let result = f(controller.clone()).await;
        controller.disconnect().await;
        result
    }

    // ── Reads ────────────────────────────────────────────────────

    /// Fetch products and start tracking every thermostat of the
    /// primary product. Returns the ids that were not tracked before.
    ///
    /// Unlike [`fetch_products`](Self::fetch_products), failures are
    /// returned to the caller.
    pub async fn discover(&self) -> Result<Vec<ThermostatId>, CoreError> {
        let client = self.client().await?;
        let products = client.fetch_products().await?;

        let mut added = Vec::new();
        match products.first() {
            Some(primary) => {
                for thermostat in primary.thermostats() {
                    let id = thermostat.thermostat_id;
                    if self.inner.thermostats.track(thermostat.clone()) {
                        info!(thermostat = %id, name = %thermostat.name, "tracking thermostat");
                        added.push(id);
                    }
                }
            }
            None => warn!("no Aldes product on this account"),
        }

        self.apply_snapshot(products);
        Ok(added)
    }

    /// Fetch the latest products and update local state.
    ///
    /// Never fails: on any error (or when not connected) the previous
    /// snapshot is returned unchanged and no event is published.
    pub async fn fetch_products(&self) -> Arc<Vec<Product>> {
        let Ok(client) = self.client().await else {
            debug!("not connected, serving cached products");
            return self.inner.store.snapshot();
        };

        match client.fetch_products().await {
            Ok(products) => self.apply_snapshot(products),
            Err(e) => {
                warn!(error = %e, "product fetch failed, keeping last snapshot");
                self.inner.store.snapshot()
            }
        }
    }

    /// One poll cycle: fetch, refresh tracked thermostats, notify.
    pub async fn refresh(&self) -> Arc<Vec<Product>> {
        info!("refreshing Aldes product state");
        self.fetch_products().await
    }

    /// Store a fetched list, refresh tracked thermostats, then publish.
    ///
    /// `ModeChanged` is published before `ProductsChanged`.
    fn apply_snapshot(&self, products: Vec<Product>) -> Arc<Vec<Product>> {
        let fetched: Vec<Thermostat> = products
            .first()
            .map(|p| p.thermostats().to_vec())
            .unwrap_or_default();

        let diff = self.inner.store.update(products);
        let snapshot = self.inner.store.snapshot();

        let changed = self.inner.thermostats.refresh(&fetched);
        if !changed.is_empty() {
            debug!(count = changed.len(), "thermostat values updated");
        }

        if diff.mode_changed {
            info!(
                previous = diff.previous_mode.as_deref().unwrap_or("-"),
                current = diff.current_mode.as_deref().unwrap_or("-"),
                "air mode changed"
            );
            self.inner.notifier.publish(&ChangeEvent::ModeChanged {
                previous: diff.previous_mode,
                current: diff.current_mode,
            });
        }
        if diff.products_changed {
            self.inner.notifier.publish(&ChangeEvent::ProductsChanged {
                products: Arc::clone(&snapshot),
            });
        }
        snapshot
    }

    // ── Commands ─────────────────────────────────────────────────

    /// Switch the primary product to `mode`.
    ///
    /// Local state is not touched; the next poll observes the change.
    pub async fn update_mode(&self, mode: AirMode) -> Result<(), CoreError> {
        let client = self.client().await?;
        let modem = self.primary_modem()?;
        client.change_mode(&modem, mode.code()).await?;
        info!(mode = mode.code(), name = mode.name(), "air mode change accepted");
        Ok(())
    }

    /// Like [`update_mode`](Self::update_mode), from a raw code.
    /// Unknown codes are rejected before any request is sent.
    pub async fn update_mode_code(&self, code: &str) -> Result<(), CoreError> {
        let mode = AirMode::from_code(code).ok_or_else(|| CoreError::InvalidMode {
            code: code.to_owned(),
        })?;
        self.update_mode(mode).await
    }

    /// Push the setpoint of `thermostat` to the service.
    pub async fn update_thermostat(&self, thermostat: &Thermostat) -> Result<(), CoreError> {
        let update =
            ThermostatUpdate::from_thermostat(thermostat).ok_or_else(|| {
                CoreError::ValidationFailed {
                    message: format!("thermostat {} has no setpoint", thermostat.thermostat_id),
                }
            })?;
        let client = self.client().await?;
        let modem = self.primary_modem()?;
        client.update_thermostats(&modem, &update).await?;
        Ok(())
    }

    /// Change the setpoint of a tracked thermostat.
    ///
    /// The registry is updated only after the service accepted the write.
    pub async fn set_target_temperature(
        &self,
        id: ThermostatId,
        target: Temperature,
    ) -> Result<Arc<Thermostat>, CoreError> {
        let current = self
            .inner
            .thermostats
            .get(id)
            .ok_or(CoreError::ThermostatNotFound { id })?;

        let mut next = (*current).clone();
        next.temperature_set = Some(target);
        self.update_thermostat(&next).await?;

        info!(thermostat = %id, setpoint = %target, "setpoint accepted");
        self.inner
            .thermostats
            .set_setpoint(id, target)
            .ok_or(CoreError::ThermostatNotFound { id })
    }

    /// Map an HVAC state onto a mode (configured defaults for heat and
    /// cool) and send it. Returns the mode that was sent.
    pub async fn set_hvac_state(&self, state: HvacState) -> Result<AirMode, CoreError> {
        let mode = match state {
            HvacState::Off => AirMode::Off,
            HvacState::Heat => self.inner.config.default_heat_mode,
            HvacState::Cool => self.inner.config.default_cool_mode,
        };
        self.update_mode(mode).await?;
        Ok(mode)
    }

    // ── Change notification ──────────────────────────────────────

    /// Register a synchronous handler for one event kind.
    pub fn subscribe<F>(&self, kind: ChangeKind, handler: F) -> SubscriptionId
    where
        F: Fn(&ChangeEvent) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        self.inner.notifier.subscribe(kind, handler)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.notifier.unsubscribe(id)
    }

    /// Subscribe to the event broadcast stream.
    pub fn events(&self) -> broadcast::Receiver<ChangeEvent> {
        self.inner.notifier.events()
    }

    /// Subscribe to connection state changes.
    pub fn connection_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.connection_state.subscribe()
    }

    // ── Snapshot accessors ───────────────────────────────────────

    pub fn products(&self) -> Arc<Vec<Product>> {
        self.inner.store.snapshot()
    }

    pub fn product_stream(&self) -> SnapshotStream<Vec<Product>> {
        self.inner.store.subscribe()
    }

    pub fn primary_product(&self) -> Option<Product> {
        self.inner.store.primary()
    }

    /// Mode of the primary product as last fetched.
    pub fn current_mode(&self) -> Option<AirMode> {
        self.inner.store.current_mode()
    }

    pub fn current_mode_code(&self) -> Option<String> {
        self.inner.store.current_mode_code()
    }

    /// The static mode table.
    pub fn modes(&self) -> Vec<ModeInfo> {
        AirMode::table()
    }

    pub fn hvac_state(&self) -> HvacState {
        HvacState::from_code(self.inner.store.current_mode_code().as_deref())
    }

    pub fn thermostat(&self, id: ThermostatId) -> Option<Arc<Thermostat>> {
        self.inner.thermostats.get(id)
    }

    pub fn thermostats(&self) -> Arc<Vec<Arc<Thermostat>>> {
        self.inner.thermostats.snapshot()
    }

    pub fn thermostat_stream(&self) -> SnapshotStream<Vec<Arc<Thermostat>>> {
        self.inner.thermostats.subscribe()
    }

    pub fn last_refresh(&self) -> Option<DateTime<Utc>> {
        self.inner.store.last_refresh()
    }

    // ── Private helpers ──────────────────────────────────────────

    async fn client(&self) -> Result<Arc<AldesClient>, CoreError> {
        self.inner
            .client
            .lock()
            .await
            .clone()
            .ok_or(CoreError::ControllerDisconnected)
    }

    fn primary_modem(&self) -> Result<String, CoreError> {
        self.inner.store.primary_modem().ok_or(CoreError::NoProduct)
    }
}

// ── Background tasks ─────────────────────────────────────────────

/// Periodic refresh. Ticks that fall behind a slow fetch are skipped
/// rather than bunched, so cycles never overlap.
async fn poll_task(controller: Controller, period: Duration, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    interval.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                controller.refresh().await;
            }
        }
    }
    debug!("poller stopped");
}

fn build_transport(config: &ControllerConfig) -> TransportConfig {
    TransportConfig {
        tls: config
            .ca_cert
            .clone()
            .map_or(TlsMode::System, TlsMode::CustomCa),
        timeout: config.timeout,
    }
}
