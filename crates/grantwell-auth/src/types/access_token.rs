//! Access token domain type.
//!
//! This module defines the access token record issued to resource owners and
//! applications, together with its optional refresh token and rotation link.

use grantwell_store::{Entity, FieldValue};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::lifecycle::Lifecycle;

/// Access token stored by the entity store.
///
/// Records are created once and only ever mutated by revocation. Rotating a
/// refresh token creates a new record whose `previous_refresh_token` holds
/// the predecessor's `refresh_token` value.
///
/// # Rotation chain
///
/// `previous_refresh_token` is a plain string, not a foreign key. Lookups
/// match it by equality and constrain the result to the same resource owner
/// and application, so a chain survives its predecessor being revoked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessToken {
    /// Unique identifier for this token record.
    pub id: Uuid,

    /// Resource owner the token was issued to (None for application tokens).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_owner_id: Option<Uuid>,

    /// Application the token was issued for.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub application_id: Option<Uuid>,

    /// The bearer credential.
    pub token: String,

    /// Refresh token, present only when refresh issuance is enabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    /// Refresh token value of the token this one superseded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_refresh_token: Option<String>,

    /// Lifetime in seconds (None = never expires).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<i64>,

    /// Granted scopes (space-separated).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scopes: Option<String>,

    /// When this token was revoked (None = not revoked).
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "time::serde::rfc3339::option"
    )]
    pub revoked_at: Option<OffsetDateTime>,

    /// When this token was created.
    #[serde(with = "time::serde::rfc3339")]
    pub inserted_at: OffsetDateTime,
}

impl AccessToken {
    /// Returns the granted scopes, or an empty string.
    #[must_use]
    pub fn scope_str(&self) -> &str {
        self.scopes.as_deref().unwrap_or("")
    }
}

impl Lifecycle for AccessToken {
    fn inserted_at(&self) -> OffsetDateTime {
        self.inserted_at
    }

    fn expires_in(&self) -> Option<i64> {
        self.expires_in
    }

    fn revoked_at(&self) -> Option<OffsetDateTime> {
        self.revoked_at
    }

    fn set_revoked_at(&mut self, at: OffsetDateTime) {
        self.revoked_at = Some(at);
    }
}

impl Entity for AccessToken {
    const COLLECTION: &'static str = "access_tokens";
    const UNIQUE_FIELDS: &'static [&'static str] = &["token", "refresh_token"];

    fn id(&self) -> Uuid {
        self.id
    }

    fn field(&self, name: &str) -> FieldValue {
        match name {
            "resource_owner_id" => self.resource_owner_id.into(),
            "application_id" => self.application_id.into(),
            "token" => self.token.as_str().into(),
            "refresh_token" => self.refresh_token.clone().into(),
            "previous_refresh_token" => self.previous_refresh_token.clone().into(),
            "expires_in" => self.expires_in.into(),
            "scopes" => self.scopes.clone().into(),
            "revoked_at" => self.revoked_at.into(),
            "inserted_at" => self.inserted_at.into(),
            _ => FieldValue::Null,
        }
    }
}
