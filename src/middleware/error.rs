use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use super::config::{AUTH_FAILED, DEFAULT_LOGIN_PATH};
use super::redirect::found;

/// Authentication errors for the middleware layer.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Callback `state` does not match the value issued at login.
    #[error("OAuth state mismatch")]
    CsrfStateMismatch,

    /// Code exchange or refresh rejected by the provider, or the provider was unreachable.
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// No valid session found.
    #[error("Not authenticated")]
    SessionMissing,

    /// Identity client or session store failed.
    #[error("Collaborator unavailable: {0}")]
    CollaboratorUnavailable(String),

    /// Missing or invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl AuthError {
    /// Convert into the browser-facing response for the given login page.
    ///
    /// Auth failures become a redirect carrying only `error=auth_failed`;
    /// infrastructure failures become a bare 500.
    pub(crate) fn into_response_for(self, login_path: &str) -> Response {
        match self {
            Self::CsrfStateMismatch | Self::AuthenticationFailed(_) => {
                tracing::warn!(error = %self, "Login rejected");
                found(&format!("{login_path}?error={AUTH_FAILED}"))
            }
            Self::SessionMissing => found(login_path),
            Self::CollaboratorUnavailable(_) | Self::Config(_) => {
                tracing::error!(error = %self, "Auth internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal error").into_response()
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        self.into_response_for(DEFAULT_LOGIN_PATH)
    }
}

#[cfg(test)]
mod tests {
    use axum::http::header::LOCATION;

    use super::*;

    fn location(response: &Response) -> &str {
        response.headers()[LOCATION].to_str().unwrap()
    }

    #[test]
    fn auth_failures_redirect_with_generic_error() {
        for err in [
            AuthError::CsrfStateMismatch,
            AuthError::AuthenticationFailed("invalid_grant: code expired".into()),
        ] {
            let response = err.into_response();
            assert_eq!(response.status(), StatusCode::FOUND);
            assert_eq!(location(&response), "/login?error=auth_failed");
        }
    }

    #[test]
    fn missing_session_redirects_to_login() {
        let response = AuthError::SessionMissing.into_response_for("/signin");
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(location(&response), "/signin");
    }

    #[test]
    fn infrastructure_failures_are_server_errors() {
        for err in [
            AuthError::CollaboratorUnavailable("store down".into()),
            AuthError::Config("COOKIE_KEY is set but invalid".into()),
        ] {
            let response = err.into_response();
            assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
            assert!(response.headers().get(LOCATION).is_none());
        }
    }
}
