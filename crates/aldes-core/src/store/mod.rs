// ── Local state ──
//
// The product snapshot and the thermostat registry. Both are
// lock-free for readers and publish replacements over `watch`.

mod product_store;
mod thermostats;

pub use product_store::{ProductStore, SnapshotDiff};
pub use thermostats::ThermostatRegistry;
