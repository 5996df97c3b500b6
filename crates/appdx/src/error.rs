//! CLI error types with miette diagnostics.
//!
//! Maps `ConfigError` and `CoreError` into user-facing errors with
//! actionable help text. Every variant is fatal for the run.

use miette::Diagnostic;
use strum::IntoEnumIterator;
use thiserror::Error;

use appdx_config::ConfigError;
use appdx_core::{ConfigEntity, CoreError};

/// Process exit codes.
pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const FATAL: i32 = 1;
    pub const INTERRUPTED: i32 = 130;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Configuration ────────────────────────────────────────────────
    #[error("Required config key '{key}' is missing or empty")]
    #[diagnostic(
        code(appdx::missing_key),
        help("Add `{key}=...` to the config file, or set it as an APPDX_-prefixed environment variable.")
    )]
    MissingConfigKey { key: String },

    #[error("Cannot read config file {path}")]
    #[diagnostic(code(appdx::config_unreadable), help("Check the path given with --config."))]
    ConfigUnreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {message}")]
    #[diagnostic(code(appdx::config))]
    ConfigInvalid { message: String },

    #[error("Unknown configuration entity '{name}'")]
    #[diagnostic(
        code(appdx::unknown_entity),
        help("Supported application entities: {supported}")
    )]
    UnknownEntity { name: String, supported: String },

    #[error("{feature} is not yet implemented")]
    #[diagnostic(
        code(appdx::not_implemented),
        help("Remove appd_account_config from the config file to migrate application configuration only.")
    )]
    NotYetImplemented { feature: String },

    // ── Exporter ─────────────────────────────────────────────────────
    #[error("Controller {url} is not registered with the Config Exporter")]
    #[diagnostic(
        code(appdx::controller_not_registered),
        help("Add the controller in the Config Exporter UI, then run again.")
    )]
    ControllerNotRegistered { url: String },

    #[error("Could not launch the Config Exporter with `{command}`")]
    #[diagnostic(code(appdx::exporter_launch))]
    ExporterLaunch {
        command: String,
        #[source]
        source: std::io::Error,
    },

    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to {url}")]
    #[diagnostic(
        code(appdx::connection_failed),
        help("Check that the service is running and reachable.\n{reason}")
    )]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(appdx::auth_failed),
        help("Verify the API user, account and password or client secret.")
    )]
    AuthFailed { message: String },

    #[error("Timed out: {message}")]
    #[diagnostic(
        code(appdx::timeout),
        help("Raise --exporter-wait or request_timeout_secs, or check the service's responsiveness.")
    )]
    Timeout { message: String },

    #[error("API error{}: {message}", .status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
    #[diagnostic(code(appdx::api_error))]
    Api {
        message: String,
        status: Option<u16>,
        #[help]
        hint: Option<String>,
    },

    // ── Local ────────────────────────────────────────────────────────
    #[error("Cannot write {path}")]
    #[diagnostic(code(appdx::io))]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Interrupted")]
    #[diagnostic(code(appdx::interrupted))]
    Interrupted,

    #[error("Internal error: {0}")]
    #[diagnostic(code(appdx::internal))]
    Internal(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Interrupted => exit_code::INTERRUPTED,
            _ => exit_code::FATAL,
        }
    }
}

// ── ConfigError → CliError ───────────────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::MissingKey { key } => Self::MissingConfigKey { key: key.into() },
            ConfigError::Unreadable { path, source } => Self::ConfigUnreadable {
                path: path.display().to_string(),
                source,
            },
            other => Self::ConfigInvalid {
                message: other.to_string(),
            },
        }
    }
}

// ── CoreError → CliError ─────────────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => Self::ConnectionFailed { url, reason },
            CoreError::AuthenticationFailed { message } => Self::AuthFailed { message },
            CoreError::Timeout { message } => Self::Timeout { message },
            CoreError::ControllerNotRegistered { url } => Self::ControllerNotRegistered { url },
            CoreError::UnknownEntity { name } => Self::UnknownEntity {
                name,
                supported: ConfigEntity::iter()
                    .map(|e| e.to_string())
                    .collect::<Vec<_>>()
                    .join(", "),
            },
            CoreError::NotImplemented { feature } => Self::NotYetImplemented { feature },
            CoreError::Config { message } => Self::ConfigInvalid { message },
            CoreError::Io { path, source } => Self::Io {
                path: path.display().to_string(),
                source,
            },
            CoreError::Listing(e) => Self::Api {
                message: e.to_string(),
                status: None,
                hint: None,
            },
            CoreError::Api { message, status } => Self::Api {
                message,
                status,
                hint: status_hint(status),
            },
            CoreError::Internal(message) => Self::Internal(message),
        }
    }
}

/// Help text for an HTTP status the user can act on.
fn status_hint(status: Option<u16>) -> Option<String> {
    let hint = match status? {
        404 => "The Config Exporter does not know this endpoint or id. Check config_exporter_url and the exporter version.",
        429 => "The service is rate limiting requests. Wait and run again.",
        500..=599 => "The service failed while handling the request. Its own logs have the details.",
        _ => return None,
    };
    Some(hint.to_owned())
}
