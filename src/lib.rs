#![doc = include_str!("../README.md")]

pub mod error;
pub mod middleware;
#[cfg(feature = "oauth")]
pub mod oauth;
pub mod pkce;
pub mod session;
pub mod types;

// Re-exports for convenient access
pub use error::Error;
pub use middleware::{
    AuthConfig, AuthError, AuthFlowController, AuthUser, IdentityClient, NewSession, ProviderGrant,
    SessionStore,
};
#[cfg(feature = "oauth")]
pub use oauth::{AuthClient, OAuthConfig, TokenResponse, UserInfo};
pub use pkce::{PkcePair, generate_state};
pub use session::MemorySessionStore;
pub use types::{AuthenticatedIdentity, OrganizationId, SessionId, UserId};
