//! Sync core between `aldes-api` and home-automation consumers.
//!
//! This crate keeps a local picture of an Aldes installation consistent
//! with the cloud service:
//!
//! - **[`Controller`]**: The central facade. [`connect()`](Controller::connect)
//!   authenticates, runs discovery, then spawns the poller that refreshes
//!   state on a fixed interval. Commands (`update_mode`, `update_thermostat`)
//!   go straight to the remote API and surface failures to the caller.
//!
//! - **[`ProductStore`]**: The single held product snapshot, replaced
//!   wholesale on every successful fetch and diffed against the previous one.
//!
//! - **[`ThermostatRegistry`]**: Thermostats discovered at connect time,
//!   keyed by id. Poll cycles refresh known ids and ignore unknown ones.
//!
//! - **[`ChangeNotifier`]**: Typed publish/subscribe for [`ChangeEvent`]s
//!   (`ModeChanged`, `ProductsChanged`), with synchronous, isolated handlers
//!   plus a broadcast channel for async consumers.
//!
//! - **Mode table** ([`AirMode`]): The nine operating modes and their
//!   single-letter codes; `A` is always off.

pub mod config;
pub mod controller;
pub mod error;
pub mod events;
pub mod model;
pub mod store;
pub mod stream;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::ControllerConfig;
pub use controller::{ConnectionState, Controller};
pub use error::CoreError;
pub use events::{ChangeEvent, ChangeKind, ChangeNotifier, HandlerError, SubscriptionId};
pub use store::{ProductStore, SnapshotDiff, ThermostatRegistry};
pub use stream::SnapshotStream;

pub use model::{
    AirMode, HvacState, Indicator, ModeInfo, Product, Temperature, Thermostat, ThermostatId,
    ThermostatUpdate,
};
