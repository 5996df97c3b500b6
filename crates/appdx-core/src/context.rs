// ── Run context ──
//
// Clients built from `Settings` once per run, plus the two lookups both
// workflows share: controller id resolution and filtered application
// listing.

use regex::{Regex, RegexBuilder};
use tracing::{debug, info};
use url::Url;

use appdx_api::{ControllerClient, ExporterClient, TransportConfig};

use crate::entity_list::{EntityList, flatten_rows, parse_entities};
use crate::error::CoreError;
use crate::settings::{ControllerSettings, Settings};

/// Everything a workflow needs: settings, the exporter client, and the
/// source controller session.
pub struct Context<'a> {
    pub settings: &'a Settings,
    pub exporter: ExporterClient,
    pub source: ControllerClient,
}

impl<'a> Context<'a> {
    /// Build clients from settings. No network traffic happens here.
    pub fn new(settings: &'a Settings) -> Result<Self, CoreError> {
        let transport = TransportConfig::default().with_timeout(settings.request_timeout);
        let exporter = ExporterClient::new(settings.exporter_url.clone(), &transport)?;
        let source = open_session(&settings.source, &transport)?;
        Ok(Self {
            settings,
            exporter,
            source,
        })
    }

    /// Find the exporter's id for the controller at `controller_url`.
    pub async fn resolve_controller_id(&self, controller_url: &Url) -> Result<u64, CoreError> {
        let pattern = registration_pattern(controller_url)?;
        let controllers = self.exporter.list_controllers().await?;
        debug!(count = controllers.len(), "registered controllers");

        controllers
            .iter()
            .find(|c| pattern.is_match(&c.url))
            .map(|c| {
                info!(controller = %controller_url, id = c.id, "resolved controller id");
                c.id
            })
            .ok_or_else(|| CoreError::ControllerNotRegistered {
                url: controller_url.to_string(),
            })
    }

    /// Applications on `controller_id` whose name matches `filter`.
    pub async fn applications(
        &self,
        controller_id: u64,
        filter: &Regex,
    ) -> Result<EntityList, CoreError> {
        let rows = self.exporter.list_applications(controller_id).await?;
        let lines = flatten_rows(&rows, filter);
        let apps = parse_entities(&lines, false)?;
        debug!(controller_id, matched = apps.len(), filter = %filter, "applications listed");
        Ok(apps)
    }
}

/// Build the per-target controller session: credentials plus proxy.
pub fn open_session(
    target: &ControllerSettings,
    transport: &TransportConfig,
) -> Result<ControllerClient, CoreError> {
    let transport = transport.clone().with_proxy(target.proxy.clone());
    Ok(ControllerClient::new(
        target.url.clone(),
        target.account.clone(),
        target.api_user.clone(),
        target.secret.to_credentials(),
        &transport,
    )?)
}

/// Anchored, case-insensitive match on the configured URL, trailing
/// slash optional.
fn registration_pattern(controller_url: &Url) -> Result<Regex, CoreError> {
    let base = controller_url.as_str().trim_end_matches('/');
    RegexBuilder::new(&format!("^{}/?$", regex::escape(base)))
        .case_insensitive(true)
        .build()
        .map_err(|e| CoreError::Internal(e.to_string()))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn registration_pattern_matches_with_or_without_slash() {
        let url = Url::parse("https://Acme.saas.example.com").unwrap();
        let re = registration_pattern(&url).unwrap();
        assert!(re.is_match("https://acme.saas.example.com"));
        assert!(re.is_match("https://acme.saas.example.com/"));
        assert!(!re.is_match("https://acme.saas.example.com.evil"));
        assert!(!re.is_match("http://acme.saas.example.com"));
    }

    #[test]
    fn registration_pattern_escapes_metacharacters() {
        let url = Url::parse("http://localhost:8090/ctl").unwrap();
        let re = registration_pattern(&url).unwrap();
        assert!(re.is_match("http://localhost:8090/ctl"));
        assert!(!re.is_match("http://localhostX8090/ctl"));
    }
}
