use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use super::error::AuthError;
use crate::types::{AuthenticatedIdentity, SessionId};

/// Authenticated user attached by the session guard.
///
/// Use as an Axum extractor in handlers behind
/// [`AuthFlowController::protect`](super::AuthFlowController::protect).
/// Outside a guarded router it rejects with a redirect to `/login`.
///
/// # Example
///
/// ```rust,ignore
/// async fn dashboard(user: AuthUser) -> impl IntoResponse {
///     format!("Welcome, {}!", user.identity.email)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// Session handle (from cookie).
    pub session_id: SessionId,
    /// Identity exactly as returned by `SessionStore::get`.
    pub identity: AuthenticatedIdentity,
}

impl<S: Send + Sync> FromRequestParts<S> for AuthUser {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or(AuthError::SessionMissing)
    }
}
