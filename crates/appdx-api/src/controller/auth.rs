// Controller authentication
//
// Two flows: the OAuth client-credentials grant (API client secret) and
// the cookie login (API user password). The login endpoint sets the
// session cookie and the `X-CSRF-TOKEN` cookie in the client's jar.

use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, warn};

use crate::auth::{AuthOutcome, Credentials};
use crate::controller::client::{ControllerClient, csrf_from_cookie_header};
use crate::error::Error;
use crate::transport::read_json;

const OAUTH_TOKEN_PATH: &str = "/controller/api/oauth/access_token";
const LOGIN_PATH: &str = "/controller/auth?action=login";

impl ControllerClient {
    /// Authenticate using whatever credentials this client carries.
    ///
    /// Client secrets go through [`oauth_token`](Self::oauth_token),
    /// passwords through [`login`](Self::login).
    pub async fn authenticate(&self) -> Result<AuthOutcome, Error> {
        match self.credentials() {
            Credentials::ClientSecret(_) => {
                self.oauth_token().await?;
                Ok(AuthOutcome::Bearer)
            }
            Credentials::Password(_) => {
                let csrf = self.login().await?;
                Ok(AuthOutcome::Session { csrf })
            }
            Credentials::None => Ok(AuthOutcome::Anonymous),
        }
    }

    /// Acquire an OAuth bearer token with the client-credentials grant.
    ///
    /// `POST /controller/api/oauth/access_token`. The token is stored on the
    /// client and used by every later authenticated request.
    pub async fn oauth_token(&self) -> Result<SecretString, Error> {
        let Credentials::ClientSecret(secret) = self.credentials() else {
            return Err(Error::Authentication {
                message: "OAuth requires an API client secret".into(),
            });
        };

        let url = self.url(OAUTH_TOKEN_PATH)?;
        debug!("requesting OAuth token at {}", url);

        let client_id = self.login_name();
        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", client_id.as_str()),
            ("client_secret", secret.expose_secret()),
        ];

        let resp = self
            .http()
            .post(url)
            .form(&form)
            .send()
            .await
            .map_err(Error::Transport)?;

        let body: serde_json::Value = read_json(resp).await?;
        let token = body
            .get("access_token")
            .and_then(serde_json::Value::as_str)
            .map(str::trim)
            .filter(|t| !t.is_empty() && !t.contains(char::is_whitespace))
            .ok_or_else(|| Error::Authentication {
                message: "token response did not contain an access_token".into(),
            })?;

        let token = SecretString::from(token.to_owned());
        self.set_oauth_token(token.clone());
        debug!("OAuth token acquired");
        Ok(token)
    }

    /// Log in and capture the session cookie plus CSRF token.
    ///
    /// `GET /controller/auth?action=login` with Basic auth. Returns whether
    /// a CSRF token was found in the jar. A missing token is only a warning:
    /// later calls proceed without CSRF protection.
    pub async fn login(&self) -> Result<bool, Error> {
        debug!("logging in as {}", self.login_name());

        let resp = self
            .request(true, Method::GET, LOGIN_PATH)?
            .send()
            .await
            .map_err(Error::Transport)?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Authentication {
                message: format!("login failed (HTTP {status}): {body}"),
            });
        }
        resp.text().await.map_err(Error::Transport)?;

        match self.cookie_header().as_deref().and_then(csrf_from_cookie_header) {
            Some(token) => {
                self.set_csrf_token(token);
                debug!("login successful");
                Ok(true)
            }
            None => {
                warn!(
                    controller = %self.base_url(),
                    "login response carried no X-CSRF-TOKEN cookie; continuing without CSRF protection"
                );
                Ok(false)
            }
        }
    }
}
