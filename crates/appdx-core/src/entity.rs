// ── Configuration entity catalogue ──
//
// Application-level entities map 1:1 onto the exporter's internal
// identifiers used in migration requests. Account-level entities are
// either generic, backed by a monitoring application, or dashboards.

use regex::Regex;
use strum::{AsRefStr, Display, EnumIter, EnumString};

use crate::error::CoreError;

/// One application-level configuration category.
///
/// The kebab-case form (`health-rules`) is the name used in config files,
/// exporter URLs and output file names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, AsRefStr)]
#[strum(serialize_all = "kebab-case")]
pub enum ConfigEntity {
    BusinessTransactions,
    Backends,
    HealthRules,
    Policies,
    Actions,
    Scopes,
    Rules,
    DataCollectors,
    ErrorDetection,
    ServiceEndpoints,
    InfoPoints,
    CallGraphSettings,
    SlowTransactionThresholds,
    JmxRules,
}

impl ConfigEntity {
    /// Exporter-internal identifier for `POST /api/rest/app-config`.
    pub fn migration_id(self) -> &'static str {
        match self {
            Self::BusinessTransactions => "BUSINESS_TRANSACTIONS",
            Self::Backends => "BACKEND_DETECTION",
            Self::HealthRules => "HEALTH_RULES",
            Self::Policies => "POLICIES",
            Self::Actions => "ACTIONS",
            Self::Scopes => "SCOPES",
            Self::Rules => "TRANSACTION_DETECTION_RULES",
            Self::DataCollectors => "DATA_COLLECTORS",
            Self::ErrorDetection => "ERROR_DETECTION",
            Self::ServiceEndpoints => "SERVICE_ENDPOINTS",
            Self::InfoPoints => "INFO_POINTS",
            Self::CallGraphSettings => "CALL_GRAPH_SETTINGS",
            Self::SlowTransactionThresholds => "SLOW_TRANSACTION_THRESHOLDS",
            Self::JmxRules => "JMX_RULES",
        }
    }
}

/// Resolve configured names to catalogue entries, failing on the first
/// name the catalogue does not know.
pub fn resolve_migration_entities(names: &[String]) -> Result<Vec<ConfigEntity>, CoreError> {
    names
        .iter()
        .map(|name| {
            name.parse::<ConfigEntity>()
                .map_err(|_| CoreError::UnknownEntity { name: name.clone() })
        })
        .collect()
}

// ── Account-level entities ──────────────────────────────────────────

/// Account-level monitoring products whose configuration lives on a
/// dedicated, fixed-name application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum MonitoringApp {
    Server,
    Analytics,
    Database,
}

impl MonitoringApp {
    /// Display-name pattern of the application backing this product.
    pub fn application_pattern(self) -> &'static str {
        match self {
            Self::Server => "^Server & Infrastructure Monitoring$",
            Self::Analytics => "^AppDynamics Analytics$",
            Self::Database => "^Database Monitoring$",
        }
    }

    pub fn application_filter(self) -> Result<Regex, CoreError> {
        Regex::new(self.application_pattern()).map_err(|e| CoreError::Internal(e.to_string()))
    }

    /// Entities exported for the backing application.
    pub fn entities(self) -> &'static [&'static str] {
        match self {
            Self::Server => &["health-rules", "policies", "actions"],
            Self::Analytics => &["health-rules", "policies", "actions", "data-collectors"],
            Self::Database => &["health-rules", "policies", "actions", "scopes"],
        }
    }
}

/// How one configured account-level entity is exported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountEntity {
    /// Custom dashboards, through the controller UI API.
    Dashboards,
    /// Application-scoped config of a monitoring product.
    Monitoring(MonitoringApp),
    /// Fetched from the exporter with the `account` placeholder.
    Generic(String),
}

impl AccountEntity {
    pub fn parse(name: &str) -> Self {
        if name.contains("dashboard") {
            return Self::Dashboards;
        }
        name.parse::<MonitoringApp>()
            .map_or_else(|_| Self::Generic(name.to_owned()), Self::Monitoring)
    }
}
