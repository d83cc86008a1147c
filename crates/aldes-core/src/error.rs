// ── Core error types ──
//
// User-facing errors from aldes-core. Consumers see domain failures,
// not raw reqwest errors. The `From<aldes_api::Error>` impl translates
// transport-layer errors into domain-appropriate variants.

use thiserror::Error;

use crate::model::ThermostatId;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot reach the Aldes cloud at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed {
        status: Option<u16>,
        message: String,
    },

    #[error("Controller disconnected")]
    ControllerDisconnected,

    #[error("Request to the Aldes cloud timed out")]
    Timeout,

    // ── Data errors ──────────────────────────────────────────────────
    #[error("No product discovered on this account")]
    NoProduct,

    #[error("Thermostat not found: {id}")]
    ThermostatNotFound { id: ThermostatId },

    #[error("Unknown air mode '{code}' (expected a code A-I or a mode name)")]
    InvalidMode { code: String },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    // ── Remote errors ────────────────────────────────────────────────
    /// A command was not confirmed by the service (non-2xx, or still
    /// unauthorized after the re-authentication retry).
    #[error("Aldes cloud rejected the request: {message}")]
    Remote {
        status: Option<u16>,
        message: String,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::AuthenticationFailed { status, .. } | Self::Remote { status, .. } => *status,
            _ => None,
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<aldes_api::Error> for CoreError {
    fn from(err: aldes_api::Error) -> Self {
        match err {
            aldes_api::Error::Authentication { status, message } => {
                CoreError::AuthenticationFailed { status, message }
            }
            aldes_api::Error::Unauthorized => CoreError::Remote {
                status: Some(401),
                message: "still unauthorized after re-authentication".into(),
            },
            aldes_api::Error::Api { status, message } => CoreError::Remote {
                status: Some(status),
                message: format!("HTTP {status}: {message}"),
            },
            aldes_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Remote {
                        status: e.status().map(|s| s.as_u16()),
                        message: e.to_string(),
                    }
                }
            }
            aldes_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            aldes_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            aldes_api::Error::Deserialization { message, body: _ } => CoreError::Remote {
                status: None,
                message: format!("unexpected payload: {message}"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_retry_becomes_remote_error() {
        let err = CoreError::from(aldes_api::Error::Unauthorized);
        assert!(matches!(err, CoreError::Remote { status: Some(401), .. }));
    }

    #[test]
    fn auth_errors_keep_status() {
        let err = CoreError::from(aldes_api::Error::Authentication {
            status: Some(403),
            message: "nope".into(),
        });
        assert_eq!(err.status(), Some(403));
        assert!(matches!(err, CoreError::AuthenticationFailed { .. }));
    }
}
