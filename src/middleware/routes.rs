use axum::Json;
use axum::Router;
use axum::extract::{Query, State};
use axum::http::header::{SET_COOKIE, USER_AGENT};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{AppendHeaders, IntoResponse, Response};
use axum::routing::{get, post};
use axum_extra::extract::PrivateCookieJar;
use serde::Deserialize;
use serde_json::json;

use super::cookies;
use super::error::AuthError;
use super::redirect::{found, safe_redirect_path};
use super::state::AuthFlowController;
use super::traits::{IdentityClient, SessionStore};
use super::types::{AuthorizationParams, NewSession, PendingLogin, ProviderGrant};
use crate::pkce::{self, PkcePair};
use crate::types::{AuthenticatedIdentity, SessionId};

impl<C: IdentityClient, S: SessionStore> AuthFlowController<C, S> {
    /// Create the login, callback, refresh, logout and session-info router.
    pub fn routes(&self) -> Router {
        let route = |name: &str| self.settings.route(name);

        Router::new()
            .route(&route("login"), get(login::<C, S>))
            .route(&route("callback"), get(callback::<C, S>))
            .route(&route("refresh"), post(refresh::<C, S>))
            .route(&route("logout"), post(logout::<C, S>))
            .route(&route("session"), get(session_info::<C, S>))
            .with_state(self.clone())
    }
}

// ── Login ──────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct LoginRequest {
    organization_id: Option<String>,
    redirect: Option<String>,
}

async fn login<C: IdentityClient, S: SessionStore>(
    State(flow): State<AuthFlowController<C, S>>,
    jar: PrivateCookieJar,
    Query(request): Query<LoginRequest>,
) -> Result<Response, Response> {
    let settings = &flow.settings;
    let state = pkce::generate_state();
    let pkce = PkcePair::generate();
    let organization_hint = request.organization_id.as_deref().filter(|o| !o.is_empty());

    let url = flow
        .client
        .authorization_url(&AuthorizationParams {
            redirect_uri: &settings.redirect_uri,
            organization_hint,
            state: &state,
            code_challenge: &pkce.challenge,
        })
        .map_err(|e| {
            AuthError::CollaboratorUnavailable(format!("authorization url: {e}"))
                .into_response_for(&settings.login_path)
        })?;

    let post_login_redirect = request.redirect.as_deref().and_then(safe_redirect_path);
    // A redirect cookie from an abandoned login must not outlive this one.
    let stale_redirect = match post_login_redirect {
        Some(_) => None,
        None => cookies::clear_redirect_cookie(settings),
    };
    let pending = PendingLogin {
        state,
        code_verifier: pkce.verifier,
        post_login_redirect,
    };
    let jar = cookies::pending_login_cookies(pending, settings)
        .into_iter()
        .fold(jar, |jar, cookie| jar.add(cookie));

    tracing::debug!(organization_hint = ?organization_hint, "Redirecting to identity provider");

    Ok((
        jar,
        AppendHeaders(stale_redirect.map(|value| (SET_COOKIE, value))),
        found(url.as_str()),
    )
        .into_response())
}

// ── Callback ───────────────────────────────────────────────────────

#[derive(Deserialize)]
struct CallbackRequest {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

async fn callback<C: IdentityClient, S: SessionStore>(
    State(flow): State<AuthFlowController<C, S>>,
    jar: PrivateCookieJar,
    Query(request): Query<CallbackRequest>,
    headers: HeaderMap,
) -> Response {
    let settings = &flow.settings;
    // The state is single-use: flow cookies go away whatever the outcome.
    let clear_flow = AppendHeaders(
        cookies::clear_flow_cookies(settings)
            .into_iter()
            .map(|value| (SET_COOKIE, value)),
    );

    let pending = cookies::pending_login(&jar);
    match complete_login(&flow, request, pending, &headers).await {
        Ok(CompletedLogin {
            session_id,
            refresh_token,
            redirect_to,
        }) => {
            let mut jar = jar.add(cookies::session_cookie(&session_id, settings));
            if let Some(token) = refresh_token {
                jar = jar.add(cookies::refresh_cookie(token, settings));
            }
            tracing::info!(session_id = %session_id, "Login successful");
            (jar, clear_flow, found(&redirect_to)).into_response()
        }
        Err(err) => (clear_flow, err.into_response_for(&settings.login_path)).into_response(),
    }
}

struct CompletedLogin {
    session_id: SessionId,
    refresh_token: Option<String>,
    redirect_to: String,
}

async fn complete_login<C: IdentityClient, S: SessionStore>(
    flow: &AuthFlowController<C, S>,
    request: CallbackRequest,
    pending: Option<PendingLogin>,
    headers: &HeaderMap,
) -> Result<CompletedLogin, AuthError> {
    if let Some(error) = &request.error {
        let desc = request.error_description.as_deref().unwrap_or("Unknown error");
        tracing::warn!(error = %error, description = %desc, "OAuth2 error from identity provider");
        return Err(AuthError::AuthenticationFailed(format!("provider error: {error}")));
    }

    let pending = pending.ok_or(AuthError::CsrfStateMismatch)?;
    let returned_state = request.state.ok_or(AuthError::CsrfStateMismatch)?;
    if returned_state != pending.state {
        return Err(AuthError::CsrfStateMismatch);
    }

    let code = request
        .code
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AuthError::AuthenticationFailed("missing code".into()))?;
    if pending.code_verifier.is_empty() {
        return Err(AuthError::AuthenticationFailed("missing code verifier".into()));
    }

    let grant = flow
        .bounded(
            "code exchange",
            flow.client
                .exchange_code(&code, &flow.settings.redirect_uri, &pending.code_verifier),
        )
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Token exchange failed");
            AuthError::AuthenticationFailed(e)
        })?;

    let session_id = create_session(flow, grant.identity, headers).await?;

    let redirect_to = pending
        .post_login_redirect
        .as_deref()
        .and_then(safe_redirect_path)
        .unwrap_or_else(|| flow.settings.landing_path.clone());

    Ok(CompletedLogin {
        session_id,
        refresh_token: grant.refresh_token,
        redirect_to,
    })
}

async fn create_session<C: IdentityClient, S: SessionStore>(
    flow: &AuthFlowController<C, S>,
    identity: AuthenticatedIdentity,
    headers: &HeaderMap,
) -> Result<SessionId, AuthError> {
    let session = NewSession {
        identity,
        user_agent: extract_user_agent(headers),
        ip_address: extract_client_ip(headers),
    };

    flow.bounded("session create", flow.session_store.create(session))
        .await
        .map_err(AuthError::CollaboratorUnavailable)
}

// ── Refresh ────────────────────────────────────────────────────────

async fn refresh<C: IdentityClient, S: SessionStore>(
    State(flow): State<AuthFlowController<C, S>>,
    jar: PrivateCookieJar,
    headers: HeaderMap,
) -> Response {
    let settings = &flow.settings;
    let previous = cookies::session_id(&jar, settings);

    let outcome = match cookies::refresh_token(&jar) {
        Some(token) => renew_session(&flow, &token, &headers).await,
        None => Err(AuthError::SessionMissing),
    };

    match outcome {
        Ok((session_id, grant)) => {
            retire_session(&flow, previous.as_ref()).await;
            let mut jar = jar.add(cookies::session_cookie(&session_id, settings));
            if let Some(token) = grant.refresh_token {
                jar = jar.add(cookies::refresh_cookie(token, settings));
            }
            tracing::info!(session_id = %session_id, "Session refreshed");
            (
                jar,
                Json(json!({
                    "authenticated": true,
                    "user": grant.identity,
                })),
            )
                .into_response()
        }
        Err(err @ (AuthError::CollaboratorUnavailable(_) | AuthError::Config(_))) => {
            err.into_response_for(&settings.login_path)
        }
        Err(err) => {
            tracing::warn!(error = %err, "Session refresh rejected");
            retire_session(&flow, previous.as_ref()).await;
            let cleared = [
                cookies::clear_session_cookie(settings),
                cookies::clear_refresh_cookie(settings),
            ];
            (
                StatusCode::UNAUTHORIZED,
                AppendHeaders(cleared.into_iter().flatten().map(|value| (SET_COOKIE, value))),
                Json(json!({ "authenticated": false })),
            )
                .into_response()
        }
    }
}

/// Best-effort deletion of the session a refresh replaces.
async fn retire_session<C: IdentityClient, S: SessionStore>(
    flow: &AuthFlowController<C, S>,
    session_id: Option<&SessionId>,
) {
    let Some(session_id) = session_id else {
        return;
    };
    if let Err(e) = flow
        .bounded("session delete", flow.session_store.delete(session_id))
        .await
    {
        tracing::warn!(error = %e, "Session deletion failed during refresh");
    }
}

async fn renew_session<C: IdentityClient, S: SessionStore>(
    flow: &AuthFlowController<C, S>,
    refresh_token: &str,
    headers: &HeaderMap,
) -> Result<(SessionId, ProviderGrant), AuthError> {
    let grant = flow
        .bounded("token refresh", flow.client.refresh(refresh_token))
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Token refresh failed");
            AuthError::AuthenticationFailed(e)
        })?;

    let session_id = create_session(flow, grant.identity.clone(), headers).await?;
    Ok((session_id, grant))
}

// ── Logout ─────────────────────────────────────────────────────────

async fn logout<C: IdentityClient, S: SessionStore>(
    State(flow): State<AuthFlowController<C, S>>,
    jar: PrivateCookieJar,
) -> Response {
    let settings = &flow.settings;
    if let Some(session_id) = cookies::session_id(&jar, settings) {
        match flow
            .bounded("session delete", flow.session_store.delete(&session_id))
            .await
        {
            Ok(()) => tracing::info!(session_id = %session_id, "Logged out"),
            Err(e) => tracing::warn!(error = %e, "Session deletion failed during logout"),
        }
    }

    let cleared: [Option<HeaderValue>; 2] = [
        cookies::clear_session_cookie(settings),
        cookies::clear_refresh_cookie(settings),
    ];
    (
        AppendHeaders(cleared.into_iter().flatten().map(|value| (SET_COOKIE, value))),
        found(&settings.logout_redirect),
    )
        .into_response()
}

// ── Session info ───────────────────────────────────────────────────

async fn session_info<C: IdentityClient, S: SessionStore>(
    State(flow): State<AuthFlowController<C, S>>,
    jar: PrivateCookieJar,
) -> Response {
    match flow.resolve_session(&jar).await {
        Ok(user) => Json(json!({
            "authenticated": true,
            "user": user.identity,
        }))
        .into_response(),
        Err(AuthError::SessionMissing) => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "authenticated": false })),
        )
            .into_response(),
        Err(err) => err.into_response_for(&flow.settings.login_path),
    }
}

// ── Helpers ────────────────────────────────────────────────────────

fn extract_user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}

fn extract_client_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(|s| s.trim().to_string())
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|v| v.to_str().ok())
                .map(|s| s.to_string())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_ip_prefers_first_forwarded_hop() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.7, 10.0.0.1"));
        headers.insert("x-real-ip", HeaderValue::from_static("10.0.0.2"));
        assert_eq!(extract_client_ip(&headers).as_deref(), Some("203.0.113.7"));
    }

    #[test]
    fn client_ip_falls_back_to_real_ip() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("10.0.0.2"));
        assert_eq!(extract_client_ip(&headers).as_deref(), Some("10.0.0.2"));
        assert_eq!(extract_user_agent(&headers), None);
    }
}
