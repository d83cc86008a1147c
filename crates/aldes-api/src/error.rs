use thiserror::Error;

/// Top-level error type for the `aldes-api` crate.
///
/// Covers token exchange, authenticated calls, transport, and payload
/// decoding. `aldes-core` maps these into domain errors.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// The token endpoint rejected the credentials or was unreachable.
    #[error("Authentication failed: {message}")]
    Authentication {
        status: Option<u16>,
        message: String,
    },

    /// The retried request was still rejected after re-authenticating.
    #[error("Request unauthorized after re-authentication")]
    Unauthorized,

    // ── Remote API ──────────────────────────────────────────────────
    /// Non-success response from a products endpoint.
    #[error("Aldes API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS configuration error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if the failure came from the credential exchange
    /// or from a request the service kept rejecting.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::Authentication { .. } | Self::Unauthorized)
    }

    /// Returns `true` if this is a transient error worth retrying on
    /// the next poll cycle.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// HTTP status associated with the failure, when there was a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Authentication { status, .. } => *status,
            Self::Unauthorized => Some(401),
            Self::Api { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
