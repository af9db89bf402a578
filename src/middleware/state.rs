use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;

use axum::extract::FromRef;
use axum_extra::extract::PrivateCookieJar;
use axum_extra::extract::cookie::Key;

use super::config::{AuthConfig, AuthSettings};
use super::cookies;
use super::error::AuthError;
use super::extractor::AuthUser;
use super::traits::{IdentityClient, SessionStore};

/// Login flow controller: the auth routes and the session guard share it as state.
///
/// Holds no mutable state of its own; sessions live in the [`SessionStore`]
/// and pending logins in private cookies.
///
/// ```rust,ignore
/// let flow = AuthFlowController::new(AuthConfig::from_env()?, client, store);
/// let app = Router::new()
///     .merge(flow.routes())
///     .merge(flow.protect(Router::new().route("/dashboard", get(dashboard))));
/// ```
pub struct AuthFlowController<C, S> {
    pub(super) client: Arc<C>,
    pub(super) session_store: Arc<S>,
    pub(super) settings: Arc<AuthSettings>,
}

// Manual Clone: avoid derive adding `C: Clone, S: Clone` bounds.
impl<C, S> Clone for AuthFlowController<C, S> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            session_store: self.session_store.clone(),
            settings: self.settings.clone(),
        }
    }
}

// PrivateCookieJar requires Key to be extractable from state
impl<C: IdentityClient, S: SessionStore> FromRef<AuthFlowController<C, S>> for Key {
    fn from_ref(state: &AuthFlowController<C, S>) -> Self {
        state.settings.cookie_key.clone()
    }
}

impl<C: IdentityClient, S: SessionStore> AuthFlowController<C, S> {
    #[must_use]
    pub fn new(config: AuthConfig, client: C, session_store: S) -> Self {
        Self {
            client: Arc::new(client),
            session_store: Arc::new(session_store),
            settings: Arc::new(config.settings),
        }
    }

    /// Resolve the session referenced by the request's session cookie.
    ///
    /// Identity data comes exclusively from [`SessionStore::get`].
    ///
    /// # Errors
    ///
    /// [`AuthError::SessionMissing`] if there is no readable cookie or the store
    /// does not know the handle; [`AuthError::CollaboratorUnavailable`] if the
    /// store fails or times out.
    pub async fn resolve_session(&self, jar: &PrivateCookieJar) -> Result<AuthUser, AuthError> {
        let session_id =
            cookies::session_id(jar, &self.settings).ok_or(AuthError::SessionMissing)?;

        let identity = self
            .bounded("session lookup", self.session_store.get(&session_id))
            .await
            .map_err(AuthError::CollaboratorUnavailable)?
            .ok_or(AuthError::SessionMissing)?;

        Ok(AuthUser {
            session_id,
            identity,
        })
    }

    /// Run a collaborator call under the configured timeout.
    pub(super) async fn bounded<T, E: Display>(
        &self,
        operation: &'static str,
        call: impl Future<Output = Result<T, E>>,
    ) -> Result<T, String> {
        let limit = self.settings.collaborator_timeout;
        match tokio::time::timeout(limit, call).await {
            Ok(result) => result.map_err(|e| format!("{operation}: {e}")),
            Err(_) => Err(format!("{operation}: timed out after {limit:?}")),
        }
    }
}
