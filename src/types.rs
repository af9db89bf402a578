use derive_more::{Display, From, Into};
use serde::{Deserialize, Serialize};

/// Stable user identifier assigned by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display, From, Into)]
#[serde(transparent)]
pub struct UserId(pub String);

/// Tenant the user authenticated into.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display, From, Into)]
#[serde(transparent)]
pub struct OrganizationId(pub String);

/// Opaque session handle.
///
/// Returned by [`SessionStore::create`](crate::middleware::SessionStore::create)
/// and carried in the (encrypted) session cookie. It references server-side
/// state only; no identity data is ever derived from it directly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display, From, Into)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl SessionId {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Result of a successful authorization code exchange.
///
/// Produced once per successful callback and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedIdentity {
    pub user_id: UserId,
    pub email: String,
    pub organization_id: OrganizationId,
}

impl AuthenticatedIdentity {
    #[must_use]
    pub fn new(
        user_id: impl Into<String>,
        email: impl Into<String>,
        organization_id: impl Into<String>,
    ) -> Self {
        Self {
            user_id: UserId(user_id.into()),
            email: email.into(),
            organization_id: OrganizationId(organization_id.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_serializes_flat() {
        let identity = AuthenticatedIdentity::new("u1", "a@b.com", "org_42");
        let json = serde_json::to_value(&identity).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "user_id": "u1",
                "email": "a@b.com",
                "organization_id": "org_42",
            })
        );
    }

    #[test]
    fn session_id_from_string() {
        let id = SessionId::from("sess-abc".to_string());
        assert_eq!(id.to_string(), "sess-abc");
        assert_eq!(id.as_str(), "sess-abc");
        assert_eq!(String::from(id), "sess-abc");
    }

    #[test]
    fn newtypes_prevent_mixing() {
        fn takes_user_id(_: &UserId) {}
        fn takes_org_id(_: &OrganizationId) {}

        let user = UserId::from("id".to_string());
        let org = OrganizationId::from("id".to_string());

        takes_user_id(&user);
        takes_org_id(&org);
        // takes_user_id(&org);  // Compile error!
    }
}
