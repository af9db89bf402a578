use std::time::Duration;

use axum_extra::extract::cookie::Key;
use url::Url;

use super::error::AuthError;

pub(crate) const DEFAULT_LOGIN_PATH: &str = "/login";
pub(crate) const AUTH_FAILED: &str = "auth_failed";

/// Shared auth settings used by both config and runtime state.
#[derive(Clone)]
pub(crate) struct AuthSettings {
    pub(crate) redirect_uri: Url,
    pub(crate) cookie_key: Key,
    pub(crate) session_cookie_name: String,
    pub(crate) session_ttl: Duration,
    pub(crate) refresh_ttl: Duration,
    pub(crate) secure_cookies: bool,
    pub(crate) auth_path: String,
    pub(crate) login_path: String,
    pub(crate) landing_path: String,
    pub(crate) logout_redirect: String,
    pub(crate) collaborator_timeout: Duration,
}

impl AuthSettings {
    fn defaults(redirect_uri: Url) -> Self {
        Self {
            redirect_uri,
            cookie_key: Key::generate(),
            session_cookie_name: "__authflow_session".into(),
            session_ttl: Duration::from_secs(3600),
            refresh_ttl: Duration::from_secs(30 * 24 * 3600),
            secure_cookies: true,
            auth_path: "/auth".into(),
            login_path: DEFAULT_LOGIN_PATH.into(),
            landing_path: "/dashboard".into(),
            logout_redirect: DEFAULT_LOGIN_PATH.into(),
            collaborator_timeout: Duration::from_secs(10),
        }
    }

    /// Full path of an auth route, e.g. `route("refresh")` → `/auth/refresh`.
    pub(crate) fn route(&self, name: &str) -> String {
        format!("{}/{name}", self.auth_path.trim_end_matches('/'))
    }
}

/// Login flow configuration.
///
/// Required field (`redirect_uri`) is a constructor parameter.
///
/// Use [`from_env()`](AuthConfig::from_env) for convention-based setup,
/// or [`new()`](AuthConfig::new) with `with_*` methods for full control.
pub struct AuthConfig {
    pub(super) settings: AuthSettings,
}

impl AuthConfig {
    /// Create config with the callback URI registered at the identity provider.
    ///
    /// All optional fields use sensible defaults. Override with `with_*` methods.
    #[must_use]
    pub fn new(redirect_uri: Url) -> Self {
        Self {
            settings: AuthSettings::defaults(redirect_uri),
        }
    }

    /// Create config from environment variables.
    ///
    /// # Required env vars
    /// - `AUTHFLOW_REDIRECT_URI`: callback URI (must be a valid URL)
    ///
    /// # Optional env vars
    /// - `AUTHFLOW_SESSION_TTL_SECS`: session lifetime in seconds
    /// - `AUTHFLOW_REFRESH_TTL_SECS`: refresh cookie lifetime in seconds
    /// - `DEV_AUTH`: Set to `"1"` or `"true"` to disable secure cookies
    /// - `COOKIE_KEY`: Cookie encryption key bytes
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Config`] if required env vars are missing or values are invalid.
    pub fn from_env() -> Result<Self, AuthError> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    pub(crate) fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self, AuthError> {
        let redirect_uri: Url = var("AUTHFLOW_REDIRECT_URI")
            .ok_or_else(|| AuthError::Config("AUTHFLOW_REDIRECT_URI is required".into()))?
            .parse()
            .map_err(|e| AuthError::Config(format!("AUTHFLOW_REDIRECT_URI: {e}")))?;

        let mut config = Self::new(redirect_uri);

        if let Some(secs) = var("AUTHFLOW_SESSION_TTL_SECS") {
            let secs: u64 = secs
                .parse()
                .map_err(|e| AuthError::Config(format!("AUTHFLOW_SESSION_TTL_SECS: {e}")))?;
            config = config.with_session_ttl(Duration::from_secs(secs));
        }

        if let Some(secs) = var("AUTHFLOW_REFRESH_TTL_SECS") {
            let secs: u64 = secs
                .parse()
                .map_err(|e| AuthError::Config(format!("AUTHFLOW_REFRESH_TTL_SECS: {e}")))?;
            config = config.with_refresh_ttl(Duration::from_secs(secs));
        }

        let dev_auth = matches!(var("DEV_AUTH").as_deref(), Some("1") | Some("true"));

        if let Some(k) = var("COOKIE_KEY") {
            let key = Key::try_from(k.as_bytes()).map_err(|_| {
                AuthError::Config(
                    "COOKIE_KEY is set but invalid (must be at least 64 bytes). \
                     Remove the env var to use an ephemeral key, or provide a valid key."
                        .into(),
                )
            })?;
            config = config.with_cookie_key(key);
        }

        Ok(config.with_secure_cookies(!dev_auth))
    }

    /// Key sealing the session and flow cookies (default: ephemeral per process).
    #[must_use]
    pub fn with_cookie_key(mut self, key: Key) -> Self {
        self.settings.cookie_key = key;
        self
    }

    /// Session cookie name (default: `__authflow_session`).
    #[must_use]
    pub fn with_session_cookie_name(mut self, name: impl Into<String>) -> Self {
        self.settings.session_cookie_name = name.into();
        self
    }

    /// Session cookie lifetime (default: 3600 s). Keep it in line with the store's TTL.
    #[must_use]
    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.settings.session_ttl = ttl;
        self
    }

    /// Refresh cookie lifetime (default: 30 days).
    #[must_use]
    pub fn with_refresh_ttl(mut self, ttl: Duration) -> Self {
        self.settings.refresh_ttl = ttl;
        self
    }

    /// Set the `Secure` flag on every cookie (default: `true`).
    #[must_use]
    pub fn with_secure_cookies(mut self, secure: bool) -> Self {
        self.settings.secure_cookies = secure;
        self
    }

    /// Prefix for the auth routes (default: `/auth`).
    #[must_use]
    pub fn with_auth_path(mut self, path: impl Into<String>) -> Self {
        self.settings.auth_path = path.into();
        self
    }

    /// Login page that receives unauthenticated users and `?error=auth_failed`.
    #[must_use]
    pub fn with_login_path(mut self, path: impl Into<String>) -> Self {
        self.settings.login_path = path.into();
        self
    }

    /// Protected landing page after a successful callback (default: `/dashboard`).
    #[must_use]
    pub fn with_landing_path(mut self, path: impl Into<String>) -> Self {
        self.settings.landing_path = path.into();
        self
    }

    /// Where logout sends the browser (default: `/login`).
    #[must_use]
    pub fn with_logout_redirect(mut self, path: impl Into<String>) -> Self {
        self.settings.logout_redirect = path.into();
        self
    }

    /// Upper bound for each identity-provider or session-store call (default: 10 s).
    #[must_use]
    pub fn with_collaborator_timeout(mut self, timeout: Duration) -> Self {
        self.settings.collaborator_timeout = timeout;
        self
    }

    /// Session lifetime, for sizing the store's TTL.
    #[must_use]
    pub fn session_ttl(&self) -> Duration {
        self.settings.session_ttl
    }

    /// Callback URI registered at the identity provider.
    #[must_use]
    pub fn redirect_uri(&self) -> &Url {
        &self.settings.redirect_uri
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn from_map(vars: &HashMap<&str, &str>) -> Result<AuthConfig, AuthError> {
        AuthConfig::from_vars(|name| vars.get(name).map(|v| v.to_string()))
    }

    #[test]
    fn defaults() {
        let config = AuthConfig::new("http://localhost:8080/auth/callback".parse().unwrap());
        let s = &config.settings;
        assert_eq!(s.session_ttl, Duration::from_secs(3600));
        assert!(s.secure_cookies);
        assert_eq!(s.auth_path, "/auth");
        assert_eq!(s.login_path, "/login");
        assert_eq!(s.landing_path, "/dashboard");
        assert_eq!(s.refresh_ttl, Duration::from_secs(30 * 24 * 3600));
    }

    #[test]
    fn routes_join_auth_path() {
        let config = AuthConfig::new("http://localhost:8080/auth/callback".parse().unwrap())
            .with_auth_path("/account/");
        assert_eq!(config.settings.route("refresh"), "/account/refresh");
    }

    #[test]
    fn from_vars_dev_auth_disables_secure_cookies() {
        let vars = HashMap::from([
            ("AUTHFLOW_REDIRECT_URI", "http://localhost:8080/auth/callback"),
            ("AUTHFLOW_SESSION_TTL_SECS", "120"),
            ("AUTHFLOW_REFRESH_TTL_SECS", "86400"),
            ("DEV_AUTH", "true"),
        ]);
        let config = from_map(&vars).unwrap();
        assert!(!config.settings.secure_cookies);
        assert_eq!(config.session_ttl(), Duration::from_secs(120));
        assert_eq!(config.settings.refresh_ttl, Duration::from_secs(86400));
    }

    #[test]
    fn from_vars_requires_redirect_uri() {
        let err = from_map(&HashMap::new()).err().unwrap();
        assert!(matches!(err, AuthError::Config(_)));
    }

    #[test]
    fn from_vars_rejects_short_cookie_key() {
        let vars = HashMap::from([
            ("AUTHFLOW_REDIRECT_URI", "http://localhost:8080/auth/callback"),
            ("COOKIE_KEY", "too-short"),
        ]);
        assert!(matches!(from_map(&vars), Err(AuthError::Config(_))));
    }
}
