use axum::Router;
use axum::extract::{Request, State};
use axum::http::header::SET_COOKIE;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum_extra::extract::PrivateCookieJar;

use super::cookies;
use super::error::AuthError;
use super::state::AuthFlowController;
use super::traits::{IdentityClient, SessionStore};

impl<C: IdentityClient, S: SessionStore> AuthFlowController<C, S> {
    /// Put every route of `router` behind the session guard.
    ///
    /// Requests without a valid session are redirected to the login page
    /// before any handler runs.
    pub fn protect<T>(&self, router: Router<T>) -> Router<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        router.route_layer(middleware::from_fn_with_state(
            self.clone(),
            require_auth::<C, S>,
        ))
    }
}

/// Session guard: attach [`AuthUser`](super::AuthUser) or short-circuit with a redirect.
pub(super) async fn require_auth<C: IdentityClient, S: SessionStore>(
    State(flow): State<AuthFlowController<C, S>>,
    jar: PrivateCookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    match flow.resolve_session(&jar).await {
        Ok(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(AuthError::SessionMissing) => {
            tracing::debug!(path = %request.uri().path(), "No session, redirecting to login");
            let had_cookie = jar.get(&flow.settings.session_cookie_name).is_some();
            let mut response = AuthError::SessionMissing.into_response_for(&flow.settings.login_path);
            if had_cookie {
                if let Some(clear) = cookies::clear_session_cookie(&flow.settings) {
                    response.headers_mut().append(SET_COOKIE, clear);
                }
            }
            response
        }
        Err(err) => err.into_response_for(&flow.settings.login_path),
    }
}
