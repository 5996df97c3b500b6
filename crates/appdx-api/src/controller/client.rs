// Controller HTTP client
//
// Wraps `reqwest::Client` with the controller's three authentication
// modes (bearer token, Basic + session cookie + CSRF, anonymous). Endpoint
// groups (auth, dashboards) are implemented as inherent methods in
// sibling files to keep this module focused on transport mechanics.

use std::sync::{Arc, RwLock};

use reqwest::Method;
use reqwest::cookie::{CookieStore, Jar};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, trace};
use url::Url;

use crate::auth::Credentials;
use crate::error::Error;
use crate::transport::{TransportConfig, join_path};

/// Name of the anti-forgery cookie the controller sets at login, and of the
/// header it expects back on authenticated calls.
pub const CSRF_TOKEN_NAME: &str = "X-CSRF-TOKEN";

/// HTTP client for one AppDynamics controller (source or destination).
///
/// Holds the per-target session state: cookie jar, captured CSRF token
/// and OAuth bearer token. All state lives for the duration of the run.
pub struct ControllerClient {
    http: reqwest::Client,
    base_url: Url,
    account: String,
    username: String,
    credentials: Credentials,
    cookie_jar: Arc<Jar>,
    /// Captured from the `X-CSRF-TOKEN` cookie after login.
    csrf_token: RwLock<Option<String>>,
    /// Set by the client-credentials grant; takes precedence over Basic auth.
    oauth_token: RwLock<Option<SecretString>>,
}

impl ControllerClient {
    /// Create a controller client from a `TransportConfig`.
    ///
    /// A cookie jar is always attached (session auth requires it). The
    /// transport's proxy, if any, applies to every request this client makes.
    pub fn new(
        base_url: Url,
        account: String,
        username: String,
        credentials: Credentials,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let config = if transport.cookie_jar.is_some() {
            transport.clone()
        } else {
            transport.clone().with_cookie_jar()
        };
        let cookie_jar = config
            .cookie_jar
            .clone()
            .unwrap_or_else(|| Arc::new(Jar::default()));
        let http = config.build_client()?;
        Ok(Self {
            http,
            base_url,
            account,
            username,
            credentials,
            cookie_jar,
            csrf_token: RwLock::new(None),
            oauth_token: RwLock::new(None),
        })
    }

    /// The controller base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// The Basic-auth / OAuth client name: `user@account`.
    pub fn login_name(&self) -> String {
        format!("{}@{}", self.username, self.account)
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    // ── Session state ───────────────────────────────────────────────

    pub fn csrf_token(&self) -> Option<String> {
        self.csrf_token.read().expect("CSRF lock poisoned").clone()
    }

    pub(crate) fn set_csrf_token(&self, token: String) {
        debug!("storing CSRF token");
        *self.csrf_token.write().expect("CSRF lock poisoned") = Some(token);
    }

    pub fn has_oauth_token(&self) -> bool {
        self.oauth_token.read().expect("token lock poisoned").is_some()
    }

    pub(crate) fn set_oauth_token(&self, token: SecretString) {
        debug!("storing OAuth bearer token");
        *self.oauth_token.write().expect("token lock poisoned") = Some(token);
    }

    /// The `Cookie` header value the jar would send to `/controller/`.
    pub fn cookie_header(&self) -> Option<String> {
        let url = join_path(&self.base_url, "/controller/").ok()?;
        let cookies = self.cookie_jar.cookies(&url)?;
        cookies.to_str().ok().map(String::from)
    }

    // ── Request construction ────────────────────────────────────────

    /// Build a full URL for a controller path such as `/controller/auth?action=login`.
    pub fn url(&self, path: &str) -> Result<Url, Error> {
        join_path(&self.base_url, path)
    }

    /// Start a request, applying authentication when `authenticated` is set.
    ///
    /// - bearer token present: `Authorization: Bearer <token>`
    /// - password configured: Basic `user@account`, session cookie, and
    ///   `X-CSRF-TOKEN` if one was captured
    /// - otherwise the request goes out as-is
    pub fn request(
        &self,
        authenticated: bool,
        method: Method,
        path: &str,
    ) -> Result<reqwest::RequestBuilder, Error> {
        let url = self.url(path)?;
        debug!("{method} {url}");
        let builder = self.http.request(method, url);

        if !authenticated {
            return Ok(builder);
        }

        if let Some(token) = self.oauth_token.read().expect("token lock poisoned").as_ref() {
            trace!("using bearer auth");
            return Ok(builder.bearer_auth(token.expose_secret()));
        }

        match &self.credentials {
            Credentials::Password(password) => {
                trace!("using basic auth with session cookie");
                let builder = builder.basic_auth(self.login_name(), Some(password.expose_secret()));
                Ok(self.apply_csrf(builder))
            }
            Credentials::ClientSecret(_) | Credentials::None => Ok(builder),
        }
    }

    /// Apply the stored CSRF token to a request builder.
    fn apply_csrf(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let guard = self.csrf_token.read().expect("CSRF lock poisoned");
        match guard.as_deref() {
            Some(token) => builder.header(CSRF_TOKEN_NAME, token),
            None => builder,
        }
    }
}

/// Pull the CSRF token out of a `Cookie` header string (`a=b; c=d`).
pub fn csrf_from_cookie_header(header: &str) -> Option<String> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case(CSRF_TOKEN_NAME))
        .map(|(_, value)| value.trim().trim_matches('"').to_owned())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csrf_found_among_other_cookies() {
        let header = "JSESSIONID=node01abc; X-CSRF-TOKEN=f00dcafe; other=1";
        assert_eq!(csrf_from_cookie_header(header).as_deref(), Some("f00dcafe"));
    }

    #[test]
    fn csrf_name_is_case_insensitive() {
        assert_eq!(
            csrf_from_cookie_header("x-csrf-token=abc").as_deref(),
            Some("abc")
        );
    }

    #[test]
    fn csrf_missing_or_empty() {
        assert_eq!(csrf_from_cookie_header("JSESSIONID=node01abc"), None);
        assert_eq!(csrf_from_cookie_header("X-CSRF-TOKEN="), None);
        assert_eq!(csrf_from_cookie_header(""), None);
    }
}
