// ── Run settings ──
//
// These types describe *what* a run does and *where* it connects.
// They are built once by the config loader and passed by reference to
// every workflow; nothing here reads files or the environment.

use std::path::PathBuf;
use std::time::Duration;

use regex::Regex;
use secrecy::SecretString;
use strum::{Display, EnumString};
use url::Url;

use appdx_api::Credentials;

/// Which workflow the run executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Mode {
    Export,
    Migrate,
}

/// Secret material for one controller.
#[derive(Debug, Clone)]
pub enum ApiSecret {
    /// API user password (Basic auth + session cookie).
    Password(SecretString),
    /// API client secret (OAuth client-credentials grant).
    ClientSecret(SecretString),
}

impl ApiSecret {
    pub fn to_credentials(&self) -> Credentials {
        match self {
            Self::Password(p) => Credentials::Password(p.clone()),
            Self::ClientSecret(s) => Credentials::ClientSecret(s.clone()),
        }
    }
}

/// Connection settings for one controller (source or destination).
#[derive(Debug, Clone)]
pub struct ControllerSettings {
    /// Controller URL (e.g., `https://acme.saas.appdynamics.com`).
    pub url: Url,
    pub account: String,
    pub api_user: String,
    pub secret: ApiSecret,
    /// Proxy for every request to this controller.
    pub proxy: Option<String>,
}

/// Everything a run needs, fixed for its whole duration.
#[derive(Debug, Clone)]
pub struct Settings {
    pub source: ControllerSettings,
    /// Present in migrate mode.
    pub destination: Option<ControllerSettings>,
    /// Matched against application names.
    pub application_filter: Regex,
    /// Matched against dashboard names.
    pub dashboard_filter: Regex,
    /// Application-level entity names, in configured order.
    pub application_config: Vec<String>,
    /// Account-level entity names, in configured order.
    pub account_config: Vec<String>,
    pub output_dir: PathBuf,
    pub exporter_url: Url,
    pub create_app: bool,
    pub create_tier: bool,
    pub overwrite: bool,
    /// Per-request deadline for every HTTP call.
    pub request_timeout: Duration,
}

impl Settings {
    /// `true` if any account-level entity asks for dashboards.
    pub fn wants_dashboards(&self) -> bool {
        self.account_config.iter().any(|e| e.contains("dashboard"))
    }
}
