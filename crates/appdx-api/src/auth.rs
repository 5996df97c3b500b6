use secrecy::SecretString;

/// Credentials for authenticating with an AppDynamics controller.
///
/// Each variant carries the secret material needed for its auth flow.
#[derive(Debug, Clone)]
pub enum Credentials {
    /// API user password. Requests use HTTP Basic auth as `user@account`
    /// plus the session cookie and CSRF token captured at login.
    Password(SecretString),

    /// API client secret. Exchanged for an OAuth bearer token via the
    /// client-credentials grant.
    ClientSecret(SecretString),

    /// No credentials; requests go out unauthenticated.
    None,
}

/// How the session ended up authenticated after [`ControllerClient::authenticate`].
///
/// [`ControllerClient::authenticate`]: crate::ControllerClient::authenticate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthOutcome {
    /// OAuth bearer token acquired.
    Bearer,
    /// Cookie session established. `csrf` is `false` when the login
    /// response carried no `X-CSRF-TOKEN` cookie.
    Session { csrf: bool },
    /// Nothing to authenticate with.
    Anonymous,
}
