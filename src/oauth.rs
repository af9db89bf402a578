use std::time::Duration;

use serde::Deserialize;
use url::Url;

use crate::error::Error;
use crate::middleware::{AuthorizationParams, IdentityClient, ProviderGrant};
use crate::types::AuthenticatedIdentity;

const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Identity provider `OAuth2` configuration.
///
/// Endpoints are derived from the provider environment URL and can be
/// overridden individually.
///
/// ```rust,ignore
/// use authflow::OAuthConfig;
///
/// let config = OAuthConfig::new(
///     "https://acme.idp.example".parse()?,
///     "client-id",
///     "client-secret",
/// )?
/// .with_scopes(vec!["openid".into(), "email".into()]);
/// ```
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct OAuthConfig {
    pub(crate) client_id: String,
    pub(crate) client_secret: String,
    pub(crate) auth_url: Url,
    pub(crate) token_url: Url,
    pub(crate) userinfo_url: Url,
    pub(crate) scopes: Vec<String>,
    pub(crate) prompt: Option<String>,
    pub(crate) timeout: Duration,
}

impl OAuthConfig {
    /// Create a configuration for the provider environment at `env_url`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `env_url` cannot carry a path (e.g. `mailto:`).
    pub fn new(
        env_url: Url,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Result<Self, Error> {
        Ok(Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            auth_url: endpoint(&env_url, &["oauth", "authorize"])?,
            token_url: endpoint(&env_url, &["oauth", "token"])?,
            userinfo_url: endpoint(&env_url, &["userinfo"])?,
            scopes: ["openid", "email", "profile", "offline_access"]
                .map(String::from)
                .to_vec(),
            prompt: None,
            timeout: DEFAULT_HTTP_TIMEOUT,
        })
    }

    /// Create config from environment variables.
    ///
    /// # Required env vars
    /// - `AUTHFLOW_ENV_URL`: identity provider environment URL
    /// - `AUTHFLOW_CLIENT_ID`: `OAuth2` client ID
    /// - `AUTHFLOW_CLIENT_SECRET`: `OAuth2` client secret
    ///
    /// # Optional env vars
    /// - `AUTHFLOW_AUTHORIZE_URL`, `AUTHFLOW_TOKEN_URL`, `AUTHFLOW_USERINFO_URL`: endpoint overrides
    /// - `AUTHFLOW_SCOPES`: comma-separated scopes
    /// - `AUTHFLOW_PROMPT`: `prompt` parameter sent to the authorize endpoint
    /// - `AUTHFLOW_HTTP_TIMEOUT_SECS`: per-request timeout against the provider
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a required variable is missing or a value is malformed.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    pub(crate) fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
        let required = |name: &str| var(name).ok_or_else(|| Error::Config(format!("{name} is required")));
        let parse_url = |name: &str, value: String| {
            value
                .parse::<Url>()
                .map_err(|e| Error::Config(format!("{name}: {e}")))
        };

        let env_url = parse_url("AUTHFLOW_ENV_URL", required("AUTHFLOW_ENV_URL")?)?;
        let mut config = Self::new(
            env_url,
            required("AUTHFLOW_CLIENT_ID")?,
            required("AUTHFLOW_CLIENT_SECRET")?,
        )?;

        if let Some(value) = var("AUTHFLOW_AUTHORIZE_URL") {
            config = config.with_auth_url(parse_url("AUTHFLOW_AUTHORIZE_URL", value)?);
        }
        if let Some(value) = var("AUTHFLOW_TOKEN_URL") {
            config = config.with_token_url(parse_url("AUTHFLOW_TOKEN_URL", value)?);
        }
        if let Some(value) = var("AUTHFLOW_USERINFO_URL") {
            config = config.with_userinfo_url(parse_url("AUTHFLOW_USERINFO_URL", value)?);
        }
        if let Some(scopes) = var("AUTHFLOW_SCOPES") {
            config = config.with_scopes(
                scopes
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
            );
        }
        if let Some(prompt) = var("AUTHFLOW_PROMPT").filter(|p| !p.is_empty()) {
            config = config.with_prompt(prompt);
        }
        if let Some(secs) = var("AUTHFLOW_HTTP_TIMEOUT_SECS") {
            let secs: u64 = secs
                .parse()
                .map_err(|e| Error::Config(format!("AUTHFLOW_HTTP_TIMEOUT_SECS: {e}")))?;
            config = config.with_timeout(Duration::from_secs(secs));
        }

        Ok(config)
    }

    /// Override the authorize endpoint.
    #[must_use]
    pub fn with_auth_url(mut self, url: Url) -> Self {
        self.auth_url = url;
        self
    }

    /// Override the token endpoint.
    #[must_use]
    pub fn with_token_url(mut self, url: Url) -> Self {
        self.token_url = url;
        self
    }

    /// Override the userinfo endpoint.
    #[must_use]
    pub fn with_userinfo_url(mut self, url: Url) -> Self {
        self.userinfo_url = url;
        self
    }

    /// Override the `OAuth2` scopes (default: `["openid", "email", "profile", "offline_access"]`).
    ///
    /// Without `offline_access` most providers issue no refresh token.
    #[must_use]
    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }

    /// Send `prompt` (e.g. `"login"`, `"none"`) with every authorization request.
    #[must_use]
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }

    /// Per-request timeout for token and userinfo calls (default: 10 s).
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Get the client ID.
    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Get the authorize endpoint.
    #[must_use]
    pub fn auth_url(&self) -> &Url {
        &self.auth_url
    }

    /// Get the token endpoint.
    #[must_use]
    pub fn token_url(&self) -> &Url {
        &self.token_url
    }

    /// Get the userinfo endpoint.
    #[must_use]
    pub fn userinfo_url(&self) -> &Url {
        &self.userinfo_url
    }

    /// Get the requested scopes.
    #[must_use]
    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }
}

fn endpoint(base: &Url, segments: &[&str]) -> Result<Url, Error> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|()| Error::Config(format!("{base} cannot be used as a base URL")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// `OAuth2` authorization code client for the identity provider.
pub struct AuthClient {
    config: OAuthConfig,
    http: reqwest::Client,
}

/// Token response from the provider token endpoint.
#[derive(Debug, Clone, Deserialize)]
#[non_exhaustive]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub id_token: Option<String>,
}

/// Claims returned by the provider userinfo endpoint.
#[derive(Debug, Clone, Deserialize)]
#[non_exhaustive]
pub struct UserInfo {
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, alias = "oid", alias = "org_id")]
    pub organization_id: Option<String>,
}

impl UserInfo {
    /// Builds the identity handed to the session store.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OAuth`] when the provider omitted `email` or the organization claim.
    pub fn into_identity(self) -> Result<AuthenticatedIdentity, Error> {
        let missing = |claim: &str| Error::OAuth {
            operation: "userinfo request",
            status: None,
            detail: format!("missing {claim} claim"),
        };
        let email = self.email.ok_or_else(|| missing("email"))?;
        let organization_id = self
            .organization_id
            .ok_or_else(|| missing("organization"))?;
        Ok(AuthenticatedIdentity::new(self.sub, email, organization_id))
    }
}

impl AuthClient {
    /// Create a client with a default `reqwest` HTTP client.
    #[must_use]
    pub fn new(config: OAuthConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    /// Use a custom HTTP client (for connection pool reuse or testing).
    #[must_use]
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http = client;
        self
    }

    /// Get the provider configuration.
    #[must_use]
    pub fn config(&self) -> &OAuthConfig {
        &self.config
    }

    /// Exchange an authorization code for tokens using PKCE.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] on network failure, or
    /// [`Error::OAuth`] if the token endpoint returns an error.
    pub async fn request_token(
        &self,
        code: &str,
        redirect_uri: &Url,
        code_verifier: &str,
    ) -> Result<TokenResponse, Error> {
        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", redirect_uri.as_str()),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("code_verifier", code_verifier),
        ];

        self.token_request(&params, "token exchange").await
    }

    /// Redeem a refresh token for a new token set.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] on network failure, or
    /// [`Error::OAuth`] if the provider rejects the refresh token.
    pub async fn refresh_token(&self, refresh_token: &str) -> Result<TokenResponse, Error> {
        let params = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
        ];
        self.token_request(&params, "token refresh").await
    }

    async fn token_request(
        &self,
        params: &[(&str, &str)],
        operation: &'static str,
    ) -> Result<TokenResponse, Error> {
        let response = self
            .http
            .post(self.config.token_url.clone())
            .timeout(self.config.timeout)
            .form(params)
            .send()
            .await?;

        let response = Self::ensure_success(response, operation).await?;
        response.json::<TokenResponse>().await.map_err(Into::into)
    }

    /// Resolve the identity behind a fresh token set.
    async fn grant(&self, token: TokenResponse) -> Result<ProviderGrant, Error> {
        let identity = self
            .fetch_user_info(&token.access_token)
            .await?
            .into_identity()?;
        Ok(ProviderGrant {
            identity,
            refresh_token: token.refresh_token,
        })
    }

    /// Fetch user info using an access token.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] on network failure, or
    /// [`Error::OAuth`] if the userinfo endpoint returns an error.
    pub async fn fetch_user_info(&self, access_token: &str) -> Result<UserInfo, Error> {
        let response = self
            .http
            .get(self.config.userinfo_url.clone())
            .timeout(self.config.timeout)
            .bearer_auth(access_token)
            .send()
            .await?;

        let response = Self::ensure_success(response, "userinfo request").await?;
        response.json::<UserInfo>().await.map_err(Into::into)
    }

    async fn ensure_success(
        response: reqwest::Response,
        operation: &'static str,
    ) -> Result<reqwest::Response, Error> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Err(Error::OAuth {
            operation,
            status: Some(status),
            detail: body,
        })
    }
}

impl IdentityClient for AuthClient {
    fn authorization_url(&self, params: &AuthorizationParams<'_>) -> Result<Url, Error> {
        let scope = self.config.scopes.join(" ");

        let mut url = self.config.auth_url.clone();
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("response_type", "code")
                .append_pair("client_id", &self.config.client_id)
                .append_pair("redirect_uri", params.redirect_uri.as_str())
                .append_pair("scope", &scope)
                .append_pair("state", params.state)
                .append_pair("code_challenge", params.code_challenge)
                .append_pair("code_challenge_method", "S256");
            if let Some(organization_id) = params.organization_hint {
                query.append_pair("organization_id", organization_id);
            }
            if let Some(prompt) = &self.config.prompt {
                query.append_pair("prompt", prompt);
            }
        }
        Ok(url)
    }

    async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &Url,
        code_verifier: &str,
    ) -> Result<ProviderGrant, Error> {
        let token = self.request_token(code, redirect_uri, code_verifier).await?;
        self.grant(token).await
    }

    async fn refresh(&self, refresh_token: &str) -> Result<ProviderGrant, Error> {
        let token = self.refresh_token(refresh_token).await?;
        self.grant(token).await
    }
}
