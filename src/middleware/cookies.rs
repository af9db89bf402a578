use axum::http::HeaderValue;
use axum_extra::extract::PrivateCookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use time::Duration;

use super::config::AuthSettings;
use super::types::PendingLogin;
use crate::types::SessionId;

const STATE_COOKIE_NAME: &str = "__authflow_state";
const PKCE_COOKIE_NAME: &str = "__authflow_pkce";
const REDIRECT_COOKIE_NAME: &str = "__authflow_redirect";
const REFRESH_COOKIE_NAME: &str = "__authflow_refresh";
const FLOW_COOKIE_TTL: Duration = Duration::minutes(10);

fn flow_cookie(name: &'static str, value: String, settings: &AuthSettings) -> Cookie<'static> {
    Cookie::build((name, value))
        .http_only(true)
        .secure(settings.secure_cookies)
        .same_site(SameSite::Lax)
        .path(settings.auth_path.clone())
        .max_age(FLOW_COOKIE_TTL)
        .build()
}

/// Cookies that carry the pending login across the provider round-trip.
pub(super) fn pending_login_cookies(
    pending: PendingLogin,
    settings: &AuthSettings,
) -> Vec<Cookie<'static>> {
    let mut cookies = vec![
        flow_cookie(STATE_COOKIE_NAME, pending.state, settings),
        flow_cookie(PKCE_COOKIE_NAME, pending.code_verifier, settings),
    ];
    if let Some(path) = pending.post_login_redirect {
        cookies.push(flow_cookie(REDIRECT_COOKIE_NAME, path, settings));
    }
    cookies
}

/// Read back the pending login; `None` if the state cookie is missing or was tampered with.
pub(super) fn pending_login(jar: &PrivateCookieJar) -> Option<PendingLogin> {
    let value = |name: &str| jar.get(name).map(|c| c.value().to_string());
    Some(PendingLogin {
        state: value(STATE_COOKIE_NAME)?,
        code_verifier: value(PKCE_COOKIE_NAME).unwrap_or_default(),
        post_login_redirect: value(REDIRECT_COOKIE_NAME),
    })
}

/// Expired, empty counterpart of a cookie, as a plain `Set-Cookie` value.
///
/// Emitted outside the private jar so the browser receives an empty value
/// whether or not it presented the cookie.
fn expired_cookie(
    name: impl Into<String>,
    path: String,
    same_site: SameSite,
    settings: &AuthSettings,
) -> Option<HeaderValue> {
    let cookie = Cookie::build((name.into(), ""))
        .http_only(true)
        .secure(settings.secure_cookies)
        .same_site(same_site)
        .path(path)
        .max_age(Duration::ZERO)
        .build();
    HeaderValue::from_str(&cookie.to_string()).ok()
}

/// Plain `Set-Cookie` values expiring every flow cookie.
pub(super) fn clear_flow_cookies(settings: &AuthSettings) -> Vec<HeaderValue> {
    [STATE_COOKIE_NAME, PKCE_COOKIE_NAME, REDIRECT_COOKIE_NAME]
        .into_iter()
        .filter_map(|name| {
            expired_cookie(name, settings.auth_path.clone(), SameSite::Lax, settings)
        })
        .collect()
}

/// Expire a post-login redirect left behind by an abandoned login.
pub(super) fn clear_redirect_cookie(settings: &AuthSettings) -> Option<HeaderValue> {
    expired_cookie(
        REDIRECT_COOKIE_NAME,
        settings.auth_path.clone(),
        SameSite::Lax,
        settings,
    )
}

/// Create session cookie.
pub(super) fn session_cookie(session_id: &SessionId, settings: &AuthSettings) -> Cookie<'static> {
    let ttl = Duration::try_from(settings.session_ttl).unwrap_or(Duration::MAX);
    Cookie::build((settings.session_cookie_name.clone(), session_id.to_string()))
        .http_only(true)
        .secure(settings.secure_cookies)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(ttl)
        .build()
}

/// Plain `Set-Cookie` value expiring the session cookie.
pub(super) fn clear_session_cookie(settings: &AuthSettings) -> Option<HeaderValue> {
    expired_cookie(
        settings.session_cookie_name.clone(),
        "/".into(),
        SameSite::Lax,
        settings,
    )
}

/// Refresh token cookie, only ever sent to the refresh route.
pub(super) fn refresh_cookie(refresh_token: String, settings: &AuthSettings) -> Cookie<'static> {
    let ttl = Duration::try_from(settings.refresh_ttl).unwrap_or(Duration::MAX);
    Cookie::build((REFRESH_COOKIE_NAME, refresh_token))
        .http_only(true)
        .secure(settings.secure_cookies)
        .same_site(SameSite::Strict)
        .path(settings.route("refresh"))
        .max_age(ttl)
        .build()
}

pub(super) fn refresh_token(jar: &PrivateCookieJar) -> Option<String> {
    jar.get(REFRESH_COOKIE_NAME)
        .map(|c| c.value().to_string())
        .filter(|token| !token.is_empty())
}

pub(super) fn clear_refresh_cookie(settings: &AuthSettings) -> Option<HeaderValue> {
    expired_cookie(
        REFRESH_COOKIE_NAME,
        settings.route("refresh"),
        SameSite::Strict,
        settings,
    )
}

/// Get the session handle from the private jar.
pub(super) fn session_id(jar: &PrivateCookieJar, settings: &AuthSettings) -> Option<SessionId> {
    jar.get(&settings.session_cookie_name)
        .map(|c| SessionId(c.value().to_string()))
        .filter(|id| !id.as_str().is_empty())
}
