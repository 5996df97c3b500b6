// ── Core error types ──
//
// Workflow-level errors. Every variant here is fatal for the run;
// recoverable problems are logged and collected in the run reports
// instead of being returned. The `From<appdx_api::Error>` impl translates
// transport-layer errors into domain-appropriate variants.

use std::path::PathBuf;

use thiserror::Error;

use crate::entity_list::ParseError;

#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Timed out: {message}")]
    Timeout { message: String },

    // ── Exporter state ───────────────────────────────────────────────
    #[error("Controller {url} is not registered with the exporter")]
    ControllerNotRegistered { url: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Unknown configuration entity '{name}'")]
    UnknownEntity { name: String },

    #[error("{feature} is not yet implemented")]
    NotImplemented { feature: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Data ─────────────────────────────────────────────────────────
    #[error("Unexpected listing shape: {0}")]
    Listing(#[from] ParseError),

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error{}: {message}", .status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
    Api { message: String, status: Option<u16> },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<appdx_api::Error> for CoreError {
    fn from(err: appdx_api::Error) -> Self {
        match err {
            appdx_api::Error::Authentication { message } => Self::AuthenticationFailed { message },
            appdx_api::Error::Transport(ref e) if e.is_connect() => Self::ConnectionFailed {
                url: e.url().map(ToString::to_string).unwrap_or_default(),
                reason: e.to_string(),
            },
            appdx_api::Error::Transport(ref e) if e.is_timeout() => Self::Timeout {
                message: e.to_string(),
            },
            appdx_api::Error::Timeout { what, timeout_secs } => Self::Timeout {
                message: format!("{what} did not respond within {timeout_secs}s"),
            },
            appdx_api::Error::ClientBuild(message) => Self::Config { message },
            appdx_api::Error::InvalidUrl(e) => Self::Config {
                message: e.to_string(),
            },
            appdx_api::Error::Api { status, message } => Self::Api {
                message,
                status: Some(status),
            },
            other => Self::Api {
                status: other.status(),
                message: other.to_string(),
            },
        }
    }
}
