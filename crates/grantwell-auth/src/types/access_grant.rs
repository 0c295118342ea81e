//! Authorization grant domain type.
//!
//! An access grant records an issued authorization code. It shares the expiry
//! and revocation semantics of access tokens but has no refresh chain.

use grantwell_store::{Entity, FieldValue};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::lifecycle::Lifecycle;

/// Authorization grant stored by the entity store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessGrant {
    /// Unique identifier for this grant record.
    pub id: Uuid,

    /// Resource owner who authorized the grant.
    pub resource_owner_id: Uuid,

    /// Application the grant was issued to.
    pub application_id: Uuid,

    /// The authorization code.
    pub token: String,

    /// Lifetime in seconds.
    pub expires_in: i64,

    /// Redirect URI the code was issued for.
    pub redirect_uri: String,

    /// Granted scopes (space-separated).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scopes: Option<String>,

    /// When this grant was revoked (None = not revoked).
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "time::serde::rfc3339::option"
    )]
    pub revoked_at: Option<OffsetDateTime>,

    /// When this grant was created.
    #[serde(with = "time::serde::rfc3339")]
    pub inserted_at: OffsetDateTime,
}

impl Lifecycle for AccessGrant {
    fn inserted_at(&self) -> OffsetDateTime {
        self.inserted_at
    }

    fn expires_in(&self) -> Option<i64> {
        Some(self.expires_in)
    }

    fn revoked_at(&self) -> Option<OffsetDateTime> {
        self.revoked_at
    }

    fn set_revoked_at(&mut self, at: OffsetDateTime) {
        self.revoked_at = Some(at);
    }
}

impl Entity for AccessGrant {
    const COLLECTION: &'static str = "access_grants";
    const UNIQUE_FIELDS: &'static [&'static str] = &["token"];

    fn id(&self) -> Uuid {
        self.id
    }

    fn field(&self, name: &str) -> FieldValue {
        match name {
            "resource_owner_id" => self.resource_owner_id.into(),
            "application_id" => self.application_id.into(),
            "token" => self.token.as_str().into(),
            "expires_in" => self.expires_in.into(),
            "redirect_uri" => self.redirect_uri.as_str().into(),
            "scopes" => self.scopes.clone().into(),
            "revoked_at" => self.revoked_at.into(),
            "inserted_at" => self.inserted_at.into(),
            _ => FieldValue::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Duration;

    fn grant(inserted_at: OffsetDateTime, expires_in: i64) -> AccessGrant {
        AccessGrant {
            id: Uuid::new_v4(),
            resource_owner_id: Uuid::new_v4(),
            application_id: Uuid::new_v4(),
            token: "code".to_string(),
            expires_in,
            redirect_uri: "https://app.example.com/callback".to_string(),
            scopes: None,
            revoked_at: None,
            inserted_at,
        }
    }

    #[test]
    fn test_grant_expires() {
        let now = OffsetDateTime::now_utc();
        assert!(grant(now, 600).is_accessible_at(now));
        assert!(!grant(now - Duration::minutes(10), 600).is_accessible_at(now));
    }

    #[test]
    fn test_grant_revocation() {
        let now = OffsetDateTime::now_utc();
        let mut g = grant(now, 600);
        g.set_revoked_at(now);
        assert!(g.is_revoked());
        assert!(!g.is_accessible_at(now));
    }
}
