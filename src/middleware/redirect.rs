use axum::http::StatusCode;
use axum::http::header::LOCATION;
use axum::response::{IntoResponse, Response};

/// `302 Found` to `location`.
pub(crate) fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(LOCATION, location.to_string())]).into_response()
}

/// Validate a post-login redirect target.
///
/// Only same-origin absolute paths survive; query string and fragment are dropped.
pub(crate) fn safe_redirect_path(target: &str) -> Option<String> {
    let path = target.split(|c: char| c == '?' || c == '#').next().unwrap_or_default();

    if !path.starts_with('/') || path.starts_with("//") || path.contains('\\') {
        return None;
    }
    if path.chars().any(char::is_control) {
        return None;
    }
    Some(path.to_string())
}
