// ── Domain model ──
//
// Wire types come straight from `aldes-api`; the mode table and the
// HVAC projection live here.

pub mod mode;

pub use aldes_api::{Indicator, Product, Temperature, Thermostat, ThermostatId, ThermostatUpdate};
pub use mode::{AirMode, HvacState, ModeInfo};
