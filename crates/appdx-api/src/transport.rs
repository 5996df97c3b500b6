// Shared transport configuration for building reqwest::Client instances.
//
// Controller and exporter clients share timeout, proxy, and cookie
// settings through this module, avoiding duplicated builder logic.

use std::sync::Arc;
use std::time::Duration;

use reqwest::cookie::Jar;
use serde::de::DeserializeOwned;
use tracing::trace;

use crate::error::Error;

const USER_AGENT: &str = concat!("appdx/", env!("CARGO_PKG_VERSION"));

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Per-request deadline. Every call is bounded by this.
    pub timeout: Duration,
    /// Proxy URL applied to every request for this target.
    pub proxy: Option<String>,
    pub cookie_jar: Option<Arc<Jar>>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            proxy: None,
            cookie_jar: None,
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        let mut builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(USER_AGENT);

        if let Some(ref proxy) = self.proxy {
            let proxy = reqwest::Proxy::all(proxy)
                .map_err(|e| Error::ClientBuild(format!("invalid proxy '{proxy}': {e}")))?;
            builder = builder.proxy(proxy);
        }

        if let Some(ref jar) = self.cookie_jar {
            builder = builder.cookie_provider(Arc::clone(jar));
        }

        builder
            .build()
            .map_err(|e| Error::ClientBuild(e.to_string()))
    }

    /// Create a config with a fresh cookie jar (for session auth).
    pub fn with_cookie_jar(mut self) -> Self {
        self.cookie_jar = Some(Arc::new(Jar::default()));
        self
    }

    pub fn with_proxy(mut self, proxy: Option<String>) -> Self {
        self.proxy = proxy;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

// ── Response helpers ────────────────────────────────────────────────

/// Consume a response, returning its body on 2xx.
///
/// 401/403 become [`Error::Authentication`]; any other non-success status
/// becomes [`Error::Api`] with a short body preview.
pub(crate) async fn read_text(resp: reqwest::Response) -> Result<String, Error> {
    let status = resp.status();
    trace!(%status, url = %resp.url(), "response received");

    if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
        return Err(Error::Authentication {
            message: format!("HTTP {status} from {}", resp.url()),
        });
    }

    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(Error::Api {
            status: status.as_u16(),
            message: preview(&body).to_owned(),
        });
    }

    resp.text().await.map_err(Error::Transport)
}

/// Like [`read_text`], then deserialize the body as JSON.
pub(crate) async fn read_json<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
    let body = read_text(resp).await?;
    decode(&body)
}

pub(crate) fn decode<T: DeserializeOwned>(body: &str) -> Result<T, Error> {
    serde_json::from_str(body).map_err(|e| Error::Deserialization {
        message: format!("{e} (body preview: {:?})", preview(body)),
        body: body.to_owned(),
    })
}

fn preview(body: &str) -> &str {
    let mut end = body.len().min(200);
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}

/// Join an absolute API path (optionally with a query) onto a base URL,
/// keeping any path prefix the base URL already carries.
pub(crate) fn join_path(base: &url::Url, path: &str) -> Result<url::Url, Error> {
    let base = base.as_str().trim_end_matches('/');
    let full = format!("{base}/{}", path.trim_start_matches('/'));
    url::Url::parse(&full).map_err(Error::InvalidUrl)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn join_path_keeps_base_prefix() {
        let base = url::Url::parse("http://localhost:8080/exporter/").unwrap();
        let url = join_path(&base, "/api/controllers").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/exporter/api/controllers");
    }

    #[test]
    fn join_path_preserves_query() {
        let base = url::Url::parse("https://acme.saas.example.com").unwrap();
        let url = join_path(&base, "/controller/auth?action=login").unwrap();
        assert_eq!(url.query(), Some("action=login"));
    }

    #[test]
    fn preview_respects_char_boundaries() {
        let body = "é".repeat(150);
        assert!(preview(&body).len() <= 200);
    }

    #[test]
    fn invalid_proxy_is_reported() {
        let cfg = TransportConfig::default().with_proxy(Some("::not a proxy::".into()));
        assert!(matches!(cfg.build_client(), Err(Error::ClientBuild(_))));
    }
}
