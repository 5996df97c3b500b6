//! Configuration loading for appdx.
//!
//! The config file is a shell-style `key=value` file (quoted values,
//! multi-line quoted lists, `export` prefixes and comments are fine). It is
//! read with `dotenvy`'s iterator, so the process environment is never
//! modified, then layered over defaults with `figment`. `APPDX_<KEY>`
//! environment variables override file values. The result is validated
//! into an immutable `appdx_core::Settings`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::{Figment, providers::Serialized};
use regex::Regex;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use url::Url;

use appdx_core::{ApiSecret, ControllerSettings, Mode, Settings};

/// Prefix for environment overrides, e.g. `APPDX_APPD_SOURCE_API_PASSWORD`.
pub const ENV_PREFIX: &str = "APPDX_";

/// Key reported when neither entity list is configured.
pub const ENTITY_LISTS_KEY: &str = "appd_application_config|appd_account_config";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Raw line contents are never included, values may be secrets.
    #[error("syntax error in config file {path} (near character {index})")]
    Syntax { path: PathBuf, index: usize },

    #[error("required config key '{key}' is missing or empty")]
    MissingKey { key: &'static str },

    #[error("invalid {key}: {reason}")]
    Invalid { key: &'static str, reason: String },

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── Raw layer ───────────────────────────────────────────────────────

/// Every recognised key, as text. Validation happens in [`build_settings`].
#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
struct RawSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    appd_source_controller_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    appd_source_account: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    appd_source_api_user: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    appd_source_api_password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    appd_source_api_secret: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    appd_source_proxy: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    appd_dest_controller_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    appd_dest_account: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    appd_dest_api_user: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    appd_dest_api_password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    appd_dest_api_secret: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    appd_dest_proxy: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    appd_application_names: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    appd_dashboard_names: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    appd_application_config: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    appd_account_config: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    output_dir: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    config_exporter_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    appd_create_app: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    appd_create_tier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    appd_overwrite: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    request_timeout_secs: Option<String>,
}

impl Default for RawSettings {
    fn default() -> Self {
        Self {
            appd_source_controller_url: None,
            appd_source_account: None,
            appd_source_api_user: None,
            appd_source_api_password: None,
            appd_source_api_secret: None,
            appd_source_proxy: None,
            appd_dest_controller_url: None,
            appd_dest_account: None,
            appd_dest_api_user: None,
            appd_dest_api_password: None,
            appd_dest_api_secret: None,
            appd_dest_proxy: None,
            appd_application_names: None,
            appd_dashboard_names: None,
            appd_application_config: None,
            appd_account_config: None,
            output_dir: None,
            config_exporter_url: None,
            appd_create_app: Some("false".into()),
            appd_create_tier: Some("true".into()),
            appd_overwrite: Some("false".into()),
            request_timeout_secs: Some("60".into()),
        }
    }
}

// ── Loading ─────────────────────────────────────────────────────────

/// Load settings from `path`, with `APPDX_*` overrides from the process
/// environment.
pub fn load_settings(path: &Path, mode: Mode) -> Result<Settings, ConfigError> {
    load_settings_with_env(path, mode, std::env::vars())
}

/// Load settings from `path`, taking overrides from `env` instead of the
/// process environment.
pub fn load_settings_with_env<I>(path: &Path, mode: Mode, env: I) -> Result<Settings, ConfigError>
where
    I: IntoIterator<Item = (String, String)>,
{
    let file_values = read_assignments(path)?;
    let env_values: HashMap<String, String> = env
        .into_iter()
        .filter_map(|(key, value)| {
            key.strip_prefix(ENV_PREFIX)
                .map(|k| (k.to_ascii_lowercase(), value))
        })
        .collect();
    debug!(
        path = %path.display(),
        keys = file_values.len(),
        overrides = env_values.len(),
        "config file read"
    );

    let raw: RawSettings = Figment::new()
        .merge(Serialized::defaults(RawSettings::default()))
        .merge(Serialized::globals(file_values))
        .merge(Serialized::globals(env_values))
        .extract()?;

    build_settings(&raw, mode)
}

/// Parse the shell-style assignments in `path` without touching the
/// process environment. Later assignments win.
fn read_assignments(path: &Path) -> Result<HashMap<String, String>, ConfigError> {
    let unreadable = |source| ConfigError::Unreadable {
        path: path.to_path_buf(),
        source,
    };

    let iter = dotenvy::from_path_iter(path).map_err(|e| match e {
        dotenvy::Error::Io(io) => unreadable(io),
        other => unreadable(std::io::Error::other(other.to_string())),
    })?;

    let mut values = HashMap::new();
    for item in iter {
        match item {
            Ok((key, value)) => {
                values.insert(key.to_ascii_lowercase(), value);
            }
            Err(dotenvy::Error::LineParse(_, index)) => {
                return Err(ConfigError::Syntax {
                    path: path.to_path_buf(),
                    index,
                });
            }
            Err(dotenvy::Error::Io(io)) => return Err(unreadable(io)),
            Err(other) => return Err(unreadable(std::io::Error::other(other.to_string()))),
        }
    }
    Ok(values)
}

// ── Validation ──────────────────────────────────────────────────────

/// Validate raw values into settings. Required keys are checked in a fixed
/// order and the first missing one is reported.
fn build_settings(raw: &RawSettings, mode: Mode) -> Result<Settings, ConfigError> {
    let source = controller_settings(
        ControllerKeys::SOURCE,
        raw.appd_source_controller_url.as_deref(),
        raw.appd_source_account.as_deref(),
        raw.appd_source_api_user.as_deref(),
        raw.appd_source_api_password.as_deref(),
        raw.appd_source_api_secret.as_deref(),
        raw.appd_source_proxy.as_deref(),
    )?;

    let application_names = required(raw.appd_application_names.as_deref(), "appd_application_names")?;
    let dashboard_names = required(raw.appd_dashboard_names.as_deref(), "appd_dashboard_names")?;
    let output_dir = required(raw.output_dir.as_deref(), "output_dir")?;

    let application_config = parse_list(raw.appd_application_config.as_deref());
    let account_config = parse_list(raw.appd_account_config.as_deref());
    if application_config.is_empty() && account_config.is_empty() {
        return Err(ConfigError::MissingKey {
            key: ENTITY_LISTS_KEY,
        });
    }

    let exporter_url = parse_url(
        required(raw.config_exporter_url.as_deref(), "config_exporter_url")?,
        "config_exporter_url",
    )?;

    let destination = match mode {
        Mode::Migrate => Some(controller_settings(
            ControllerKeys::DESTINATION,
            raw.appd_dest_controller_url.as_deref(),
            raw.appd_dest_account.as_deref(),
            raw.appd_dest_api_user.as_deref(),
            raw.appd_dest_api_password.as_deref(),
            raw.appd_dest_api_secret.as_deref(),
            raw.appd_dest_proxy.as_deref(),
        )?),
        Mode::Export => None,
    };

    Ok(Settings {
        source,
        destination,
        application_filter: parse_regex(application_names, "appd_application_names")?,
        dashboard_filter: parse_regex(dashboard_names, "appd_dashboard_names")?,
        application_config,
        account_config,
        output_dir: PathBuf::from(output_dir),
        exporter_url,
        create_app: parse_flag(raw.appd_create_app.as_deref(), "appd_create_app")?,
        create_tier: parse_flag(raw.appd_create_tier.as_deref(), "appd_create_tier")?,
        overwrite: parse_flag(raw.appd_overwrite.as_deref(), "appd_overwrite")?,
        request_timeout: parse_timeout(raw.request_timeout_secs.as_deref())?,
    })
}

/// Key names for one side of a migration.
#[derive(Clone, Copy)]
struct ControllerKeys {
    url: &'static str,
    account: &'static str,
    user: &'static str,
    password: &'static str,
}

impl ControllerKeys {
    const SOURCE: Self = Self {
        url: "appd_source_controller_url",
        account: "appd_source_account",
        user: "appd_source_api_user",
        password: "appd_source_api_password",
    };
    const DESTINATION: Self = Self {
        url: "appd_dest_controller_url",
        account: "appd_dest_account",
        user: "appd_dest_api_user",
        password: "appd_dest_api_password",
    };
}

fn controller_settings(
    keys: ControllerKeys,
    url: Option<&str>,
    account: Option<&str>,
    user: Option<&str>,
    password: Option<&str>,
    secret: Option<&str>,
    proxy: Option<&str>,
) -> Result<ControllerSettings, ConfigError> {
    let url = parse_url(required(url, keys.url)?, keys.url)?;
    let account = required(account, keys.account)?.to_owned();
    let api_user = required(user, keys.user)?.to_owned();

    // A client secret satisfies the password requirement.
    let secret = match (non_empty(password), non_empty(secret)) {
        (Some(p), _) => ApiSecret::Password(SecretString::from(p.to_owned())),
        (None, Some(s)) => ApiSecret::ClientSecret(SecretString::from(s.to_owned())),
        (None, None) => return Err(ConfigError::MissingKey { key: keys.password }),
    };

    Ok(ControllerSettings {
        url,
        account,
        api_user,
        secret,
        proxy: non_empty(proxy).map(str::to_owned),
    })
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn required<'a>(value: Option<&'a str>, key: &'static str) -> Result<&'a str, ConfigError> {
    non_empty(value).ok_or(ConfigError::MissingKey { key })
}

fn parse_url(value: &str, key: &'static str) -> Result<Url, ConfigError> {
    Url::parse(value).map_err(|e| ConfigError::Invalid {
        key,
        reason: format!("'{value}' is not a URL: {e}"),
    })
}

fn parse_regex(value: &str, key: &'static str) -> Result<Regex, ConfigError> {
    Regex::new(value).map_err(|e| ConfigError::Invalid {
        key,
        reason: e.to_string(),
    })
}

fn parse_flag(value: Option<&str>, key: &'static str) -> Result<bool, ConfigError> {
    match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
        None | Some("" | "false" | "no" | "0" | "off") => Ok(false),
        Some("true" | "yes" | "1" | "on") => Ok(true),
        Some(other) => Err(ConfigError::Invalid {
            key,
            reason: format!("expected true or false, got '{other}'"),
        }),
    }
}

fn parse_timeout(value: Option<&str>) -> Result<Duration, ConfigError> {
    const KEY: &str = "request_timeout_secs";
    let secs = match value.map(str::trim) {
        None | Some("") => 60,
        Some(v) => v.parse::<u64>().map_err(|e| ConfigError::Invalid {
            key: KEY,
            reason: format!("'{v}': {e}"),
        })?,
    };
    if secs == 0 {
        return Err(ConfigError::Invalid {
            key: KEY,
            reason: "must be at least 1 second".into(),
        });
    }
    Ok(Duration::from_secs(secs))
}

/// Normalise a list value: all whitespace (including newlines) removed,
/// comma-separated tokens kept in order, empty tokens dropped.
pub fn parse_list(value: Option<&str>) -> Vec<String> {
    value
        .unwrap_or_default()
        .split(',')
        .map(|token| token.chars().filter(|c| !c.is_whitespace()).collect::<String>())
        .filter(|token| !token.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use std::io::Write;

    use pretty_assertions::assert_eq;
    use secrecy::ExposeSecret;

    use super::*;

    const EXPORT_CONFIG: &str = r#"
# source controller
appd_source_controller_url="https://src.saas.example.com"
appd_source_account=customer1
appd_source_api_user='apiuser'
appd_source_api_password="p@ss word"
appd_application_names='MyApp'
appd_dashboard_names="^Ops"
appd_application_config="scopes,
    health-rules ,policies,
    scopes"
appd_account_config=""
output_dir=/tmp/appdx-out
config_exporter_url=http://localhost:8080
"#;

    const DEST_KEYS: &str = r#"
appd_dest_controller_url=https://dst.saas.example.com
appd_dest_account=customer2
appd_dest_api_user=migrator
appd_dest_api_password=secret
"#;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    fn load(contents: &str, mode: Mode) -> Result<Settings, ConfigError> {
        let file = write_config(contents);
        load_settings_with_env(file.path(), mode, Vec::new())
    }

    /// The export config with the line for `key` removed.
    fn without(key: &str) -> String {
        let mut out = String::new();
        let mut skipping = false;
        for line in EXPORT_CONFIG.lines() {
            if line.starts_with(&format!("{key}=")) {
                skipping = line.matches('"').count() == 1;
                continue;
            }
            if skipping {
                skipping = !line.contains('"');
                continue;
            }
            out.push_str(line);
            out.push('\n');
        }
        out
    }

    #[test]
    fn loads_export_config() {
        let settings = load(EXPORT_CONFIG, Mode::Export).unwrap();

        assert_eq!(settings.source.url.as_str(), "https://src.saas.example.com/");
        assert_eq!(settings.source.account, "customer1");
        assert_eq!(settings.source.api_user, "apiuser");
        match &settings.source.secret {
            ApiSecret::Password(p) => assert_eq!(p.expose_secret(), "p@ss word"),
            ApiSecret::ClientSecret(_) => panic!("expected password"),
        }
        assert_eq!(
            settings.application_config,
            vec!["scopes", "health-rules", "policies", "scopes"]
        );
        assert!(settings.account_config.is_empty());
        assert!(settings.application_filter.is_match("MyApp"));
        assert_eq!(settings.output_dir, PathBuf::from("/tmp/appdx-out"));
        assert!(settings.destination.is_none());
        assert!(settings.create_tier);
        assert!(!settings.overwrite);
        assert_eq!(settings.request_timeout, Duration::from_secs(60));
    }

    #[test]
    fn unreadable_file() {
        let result = load_settings_with_env(Path::new("/nonexistent/appdx.conf"), Mode::Export, Vec::new());
        assert!(matches!(result, Err(ConfigError::Unreadable { .. })));
    }

    #[test]
    fn each_required_key_is_reported() {
        for key in [
            "appd_source_controller_url",
            "appd_source_account",
            "appd_source_api_user",
            "appd_source_api_password",
            "appd_application_names",
            "appd_dashboard_names",
            "output_dir",
            "config_exporter_url",
        ] {
            match load(&without(key), Mode::Export) {
                Err(ConfigError::MissingKey { key: missing }) => assert_eq!(missing, key),
                other => panic!("removing {key}: expected MissingKey, got {other:?}"),
            }
        }
    }

    #[test]
    fn empty_value_counts_as_missing() {
        let config = EXPORT_CONFIG.replace("appd_source_account=customer1", "appd_source_account=");
        assert!(matches!(
            load(&config, Mode::Export),
            Err(ConfigError::MissingKey { key: "appd_source_account" })
        ));
    }

    #[test]
    fn first_missing_key_wins() {
        let config = without("appd_source_api_user").replace("output_dir=/tmp/appdx-out", "");
        assert!(matches!(
            load(&config, Mode::Export),
            Err(ConfigError::MissingKey { key: "appd_source_api_user" })
        ));
    }

    #[test]
    fn both_entity_lists_missing() {
        let config = without("appd_application_config");
        match load(&config, Mode::Export) {
            Err(ConfigError::MissingKey { key }) => assert_eq!(key, ENTITY_LISTS_KEY),
            other => panic!("expected MissingKey, got {other:?}"),
        }
    }

    #[test]
    fn account_list_alone_is_enough() {
        let config = without("appd_application_config")
            .replace("appd_account_config=\"\"", "appd_account_config=\"dashboards, server\"");
        let settings = load(&config, Mode::Export).unwrap();
        assert_eq!(settings.account_config, vec!["dashboards", "server"]);
    }

    #[test]
    fn migrate_requires_destination_keys() {
        let full = format!("{EXPORT_CONFIG}{DEST_KEYS}");
        let settings = load(&full, Mode::Migrate).unwrap();
        let dest = settings.destination.unwrap();
        assert_eq!(dest.account, "customer2");

        for key in [
            "appd_dest_controller_url",
            "appd_dest_account",
            "appd_dest_api_user",
            "appd_dest_api_password",
        ] {
            let config: String = full
                .lines()
                .filter(|l| !l.starts_with(&format!("{key}=")))
                .map(|l| format!("{l}\n"))
                .collect();
            match load(&config, Mode::Migrate) {
                Err(ConfigError::MissingKey { key: missing }) => assert_eq!(missing, key),
                other => panic!("removing {key}: expected MissingKey, got {other:?}"),
            }
            assert!(load(&config, Mode::Export).is_ok());
        }
    }

    #[test]
    fn client_secret_replaces_password() {
        let config = without("appd_source_api_password") + "appd_source_api_secret=abc123\n";
        let settings = load(&config, Mode::Export).unwrap();
        assert!(matches!(settings.source.secret, ApiSecret::ClientSecret(_)));
    }

    #[test]
    fn environment_overrides_file() {
        let file = write_config(EXPORT_CONFIG);
        let env = vec![
            ("APPDX_APPD_SOURCE_ACCOUNT".to_owned(), "override".to_owned()),
            ("APPD_SOURCE_API_USER".to_owned(), "ignored".to_owned()),
        ];
        let settings = load_settings_with_env(file.path(), Mode::Export, env).unwrap();
        assert_eq!(settings.source.account, "override");
        assert_eq!(settings.source.api_user, "apiuser");
    }

    #[test]
    fn invalid_values_are_rejected() {
        let bad_url = EXPORT_CONFIG.replace("http://localhost:8080", "not a url");
        assert!(matches!(
            load(&bad_url, Mode::Export),
            Err(ConfigError::Invalid { key: "config_exporter_url", .. })
        ));

        let bad_regex = EXPORT_CONFIG.replace("appd_application_names='MyApp'", "appd_application_names='(['");
        assert!(matches!(
            load(&bad_regex, Mode::Export),
            Err(ConfigError::Invalid { key: "appd_application_names", .. })
        ));

        let bad_flag = format!("{EXPORT_CONFIG}appd_overwrite=maybe\n");
        assert!(matches!(
            load(&bad_flag, Mode::Export),
            Err(ConfigError::Invalid { key: "appd_overwrite", .. })
        ));
    }

    #[test]
    fn flags_and_proxy() {
        let config = format!(
            "{EXPORT_CONFIG}appd_overwrite=yes\nappd_create_tier=false\nappd_source_proxy=http://proxy:3128\nrequest_timeout_secs=5\n"
        );
        let settings = load(&config, Mode::Export).unwrap();
        assert!(settings.overwrite);
        assert!(!settings.create_tier);
        assert_eq!(settings.source.proxy.as_deref(), Some("http://proxy:3128"));
        assert_eq!(settings.request_timeout, Duration::from_secs(5));
    }

    #[test]
    fn list_normalisation() {
        assert_eq!(parse_list(Some(" a ,\n b,,c\t, a ")), vec!["a", "b", "c", "a"]);
        assert!(parse_list(Some(" , \n")).is_empty());
        assert!(parse_list(None).is_empty());
    }
}
