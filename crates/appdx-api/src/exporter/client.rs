// Config Exporter HTTP client
//
// The exporter is a locally-run service that reads and writes controller
// configuration on our behalf. Calls to it are never authenticated.

use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, trace};
use url::Url;

use crate::error::Error;
use crate::exporter::models::{MigrationRequest, RegisteredController};
use crate::transport::{TransportConfig, join_path, read_json, read_text};

const INITIAL_BACKOFF: Duration = Duration::from_millis(250);
const MAX_BACKOFF: Duration = Duration::from_secs(5);

/// HTTP client for the Config Exporter service.
pub struct ExporterClient {
    http: reqwest::Client,
    base_url: Url,
}

impl ExporterClient {
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        Ok(Self {
            http: transport.build_client()?,
            base_url,
        })
    }

    /// Create an exporter client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self { http, base_url }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── Endpoints ───────────────────────────────────────────────────

    /// `GET /api/controllers`
    pub async fn list_controllers(&self) -> Result<Vec<RegisteredController>, Error> {
        let url = join_path(&self.base_url, "/api/controllers")?;
        debug!("GET {}", url);
        let resp = self.http.get(url).send().await.map_err(Error::Transport)?;
        read_json(resp).await
    }

    /// `GET /api/controllers/{id}/applications`
    ///
    /// Returns the raw `{name, id, ...}` objects; name filtering happens in
    /// the caller.
    pub async fn list_applications(
        &self,
        controller_id: u64,
    ) -> Result<Vec<serde_json::Value>, Error> {
        let url = join_path(
            &self.base_url,
            &format!("/api/controllers/{controller_id}/applications"),
        )?;
        debug!("GET {}", url);
        let resp = self.http.get(url).send().await.map_err(Error::Transport)?;
        read_json(resp).await
    }

    /// `GET /api/controllers/{id}/files/{entity}?applicationId={app}`
    ///
    /// `application_id` is a numeric id, or `account` for account-level
    /// entities. The body is returned verbatim.
    pub async fn fetch_entity(
        &self,
        controller_id: u64,
        entity: &str,
        application_id: &str,
    ) -> Result<String, Error> {
        let mut url = join_path(
            &self.base_url,
            &format!("/api/controllers/{controller_id}/files/{entity}"),
        )?;
        url.query_pairs_mut()
            .append_pair("applicationId", application_id);
        debug!("GET {}", url);
        let resp = self.http.get(url).send().await.map_err(Error::Transport)?;
        read_text(resp).await
    }

    /// `POST /api/rest/app-config` with a [`MigrationRequest`] body.
    pub async fn post_app_config(&self, request: &MigrationRequest) -> Result<String, Error> {
        self.post_json("/api/rest/app-config", request).await
    }

    async fn post_json(&self, path: &str, body: &(impl Serialize + Sync)) -> Result<String, Error> {
        let url = join_path(&self.base_url, path)?;
        debug!("POST {}", url);
        let resp = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(Error::Transport)?;
        read_text(resp).await
    }

    // ── Readiness ───────────────────────────────────────────────────

    /// Poll the controller listing until the service answers, backing off
    /// exponentially, for at most `timeout`.
    pub async fn wait_until_ready(&self, timeout: Duration) -> Result<(), Error> {
        let started = Instant::now();
        let mut delay = INITIAL_BACKOFF;

        loop {
            match self.list_controllers().await {
                Ok(_) => {
                    debug!(elapsed = ?started.elapsed(), "exporter is ready");
                    return Ok(());
                }
                Err(e) => trace!("exporter not ready yet: {e}"),
            }

            let elapsed = started.elapsed();
            if elapsed >= timeout {
                return Err(Error::Timeout {
                    what: format!("exporter at {}", self.base_url),
                    timeout_secs: timeout.as_secs(),
                });
            }

            tokio::time::sleep(delay.min(timeout - elapsed)).await;
            delay = (delay * 2).min(MAX_BACKOFF);
        }
    }
}
