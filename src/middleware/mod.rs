//! Authorization-code login flow for Axum.
//!
//! [`AuthFlowController`] serves `/auth/login`, `/auth/callback`, `/auth/refresh`,
//! `/auth/logout` and `/auth/session`, and guards protected routes with an
//! opaque session handle kept in a private cookie.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use authflow::middleware::{AuthConfig, AuthFlowController, AuthUser};
//! use authflow::{AuthClient, MemorySessionStore, OAuthConfig};
//!
//! let client = AuthClient::new(OAuthConfig::from_env()?);
//! let flow = AuthFlowController::new(AuthConfig::from_env()?, client, MemorySessionStore::new());
//!
//! let app = axum::Router::new()
//!     .merge(flow.routes())
//!     .merge(flow.protect(axum::Router::new().route("/dashboard", get(dashboard))));
//!
//! async fn dashboard(user: AuthUser) -> String {
//!     format!("Welcome, {}!", user.identity.email)
//! }
//! ```

mod config;
mod cookies;
mod error;
mod extractor;
mod guard;
mod redirect;
mod routes;
mod state;
mod traits;
mod types;

pub use config::AuthConfig;
pub use error::AuthError;
pub use extractor::AuthUser;
pub use state::AuthFlowController;
pub use traits::{BoxError, IdentityClient, SessionStore};
pub use types::{AuthorizationParams, NewSession, ProviderGrant};

/// Re-export cookie key type for builder API.
pub use axum_extra::extract::cookie::Key as CookieKey;
