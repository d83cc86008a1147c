// aldes-api: Async Rust client for the Aldes AldesConnect cloud API.
//
// Token exchange, authenticated product reads, and the two write
// endpoints (thermostat setpoints, air mode commands). Every
// authenticated call re-authenticates once on HTTP 401 and retries.

pub mod auth;
pub mod client;
pub mod error;
pub mod models;
mod products;
pub mod transport;

pub use auth::{Credential, CredentialStore};
pub use client::{AldesClient, DEFAULT_BASE_URL};
pub use error::Error;
pub use models::{Indicator, Product, Temperature, Thermostat, ThermostatId, ThermostatUpdate};
pub use transport::{TlsMode, TransportConfig};
