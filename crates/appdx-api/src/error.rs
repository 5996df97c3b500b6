use thiserror::Error;

/// Top-level error type for the `appdx-api` crate.
///
/// Covers both API surfaces: the AppDynamics controller and the
/// Config Exporter service. `appdx-core` maps these into workflow errors.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Login or token acquisition failed, or the controller rejected the session.
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// A bounded wait elapsed without the remote side becoming usable.
    #[error("Timed out after {timeout_secs}s waiting for {what}")]
    Timeout { what: String, timeout_secs: u64 },

    /// The HTTP client could not be built (bad proxy URL, TLS backend failure).
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),

    // ── API ─────────────────────────────────────────────────────────
    /// Non-success HTTP status from either API surface.
    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// HTTP status code, when the error came from an HTTP response.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
