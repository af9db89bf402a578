use std::future::Future;

use url::Url;

use super::types::{AuthorizationParams, NewSession, ProviderGrant};
use crate::error::Error;
use crate::types::{AuthenticatedIdentity, SessionId};

/// Error type returned by consumer-provided stores.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Identity provider operations used by the login flow.
///
/// [`AuthClient`](crate::AuthClient) implements this against a standard
/// `OAuth2` provider; tests and custom SDK wrappers can provide their own.
pub trait IdentityClient: Send + Sync + 'static {
    /// Build the provider authorization URL the browser is redirected to.
    ///
    /// An `Err` means the provider cannot be reached or configured and is
    /// reported as a server error, never as a login failure.
    fn authorization_url(&self, params: &AuthorizationParams<'_>) -> Result<Url, Error>;

    /// Exchange a single-use authorization code for the verified identity.
    ///
    /// Called at most once per code; the flow never retries a failed exchange.
    fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &Url,
        code_verifier: &str,
    ) -> impl Future<Output = Result<ProviderGrant, Error>> + Send;

    /// Redeem a refresh token for the current identity.
    ///
    /// The returned grant may carry a rotated refresh token.
    fn refresh(
        &self,
        refresh_token: &str,
    ) -> impl Future<Output = Result<ProviderGrant, Error>> + Send;
}

/// Consumer-provided session persistence.
///
/// Must tolerate concurrent calls; each operation touches a single key.
///
/// # Example
///
/// ```rust,ignore
/// impl SessionStore for RedisSessions {
///     async fn create(&self, session: NewSession) -> Result<SessionId, BoxError> {
///         let id = SessionId(authflow::pkce::generate_session_id());
///         self.set_ex(id.as_str(), serde_json::to_string(&session.identity)?, 3600).await?;
///         Ok(id)
///     }
///
///     async fn get(&self, id: &SessionId) -> Result<Option<AuthenticatedIdentity>, BoxError> {
///         let raw: Option<String> = self.get(id.as_str()).await?;
///         Ok(raw.map(|s| serde_json::from_str(&s)).transpose()?)
///     }
///
///     async fn delete(&self, id: &SessionId) -> Result<(), BoxError> {
///         self.del(id.as_str()).await
///     }
/// }
/// ```
pub trait SessionStore: Send + Sync + 'static {
    /// Create a new session. Returns an unguessable session handle.
    fn create(
        &self,
        session: NewSession,
    ) -> impl Future<Output = Result<SessionId, BoxError>> + Send;

    /// Look up a session. `None` if it never existed, expired or was deleted.
    fn get(
        &self,
        session_id: &SessionId,
    ) -> impl Future<Output = Result<Option<AuthenticatedIdentity>, BoxError>> + Send;

    /// Delete a session (logout). Deleting an unknown handle is not an error.
    fn delete(&self, session_id: &SessionId) -> impl Future<Output = Result<(), BoxError>> + Send;
}
