// ── Runtime connection configuration ──
//
// These types describe *how* to reach the Aldes cloud. They carry
// credential data and tuning, but never touch disk. The CLI (or any
// embedding host) constructs a `ControllerConfig` and hands it in.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use crate::model::AirMode;

/// Poll period observed on the production integration.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(15);

/// Configuration for one Aldes account.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// API host root (defaults to [`aldes_api::DEFAULT_BASE_URL`]).
    pub base_url: Url,
    pub username: String,
    pub password: SecretString,
    /// Extra CA certificate to trust (PEM), for intercepting proxies.
    pub ca_cert: Option<PathBuf>,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Poll period. `Duration::ZERO` disables the background poller.
    pub refresh_interval: Duration,
    /// Mode sent when a consumer asks for "heat" without naming a program.
    pub default_heat_mode: AirMode,
    /// Mode sent when a consumer asks for "cool" without naming a program.
    pub default_cool_mode: AirMode,
}

impl ControllerConfig {
    pub fn new(username: impl Into<String>, password: SecretString) -> Self {
        Self {
            base_url: default_base_url(),
            username: username.into(),
            password,
            ca_cert: None,
            timeout: Duration::from_secs(30),
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            default_heat_mode: AirMode::HeatComfort,
            default_cool_mode: AirMode::CoolComfort,
        }
    }

    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = base_url;
        self
    }

    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }
}

/// The production API host as a parsed URL.
pub fn default_base_url() -> Url {
    Url::parse(aldes_api::DEFAULT_BASE_URL).expect("default base URL is valid")
}
