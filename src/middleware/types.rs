use url::Url;

use crate::types::AuthenticatedIdentity;

/// Identity and optional refresh token granted by the provider.
///
/// Returned by both [`IdentityClient::exchange_code`](super::IdentityClient::exchange_code)
/// and [`IdentityClient::refresh`](super::IdentityClient::refresh).
#[derive(Debug, Clone)]
pub struct ProviderGrant {
    pub identity: AuthenticatedIdentity,
    /// Present when the provider issued one (scope `offline_access`).
    pub refresh_token: Option<String>,
}

impl From<AuthenticatedIdentity> for ProviderGrant {
    fn from(identity: AuthenticatedIdentity) -> Self {
        Self {
            identity,
            refresh_token: None,
        }
    }
}

/// Session data from a successful code exchange or refresh.
///
/// Passed to [`SessionStore::create`](super::SessionStore::create) for the consumer to persist.
#[derive(Debug, Clone)]
pub struct NewSession {
    /// Identity granted by the provider.
    pub identity: AuthenticatedIdentity,
    /// Client `User-Agent` header value.
    pub user_agent: Option<String>,
    /// Client IP address.
    pub ip_address: Option<String>,
}

/// Inputs for [`IdentityClient::authorization_url`](super::IdentityClient::authorization_url).
#[derive(Debug, Clone, Copy)]
pub struct AuthorizationParams<'a> {
    /// Callback URI registered at the provider.
    pub redirect_uri: &'a Url,
    /// Organization (tenant) the user should authenticate against.
    pub organization_hint: Option<&'a str>,
    /// Fresh CSRF `state` for this flow.
    pub state: &'a str,
    /// PKCE S256 challenge.
    pub code_challenge: &'a str,
}

/// Correlation data for a login awaiting its callback.
#[derive(Debug, Clone)]
pub(crate) struct PendingLogin {
    pub(crate) state: String,
    pub(crate) code_verifier: String,
    pub(crate) post_login_redirect: Option<String>,
}
