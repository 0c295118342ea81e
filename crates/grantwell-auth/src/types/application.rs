//! Application and resource owner value objects.
//!
//! Only the fields the token core reads are modelled here. Full registration
//! records live with the host application.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// OAuth 2.0 client application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    /// Application ID.
    pub id: Uuid,

    /// Public client identifier.
    pub uid: String,

    /// Human-readable application name.
    pub name: String,

    /// Registered redirect URI.
    pub redirect_uri: String,

    /// Scopes this application may request (space-separated).
    /// When set and non-empty, they replace the server's optional scopes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scopes: Option<String>,
}

impl Application {
    /// Creates a new application without declared scopes.
    pub fn new(uid: impl Into<String>, name: impl Into<String>, redirect_uri: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            uid: uid.into(),
            name: name.into(),
            redirect_uri: redirect_uri.into(),
            scopes: None,
        }
    }

    /// Sets the declared scopes.
    #[must_use]
    pub fn with_scopes(mut self, scopes: impl Into<String>) -> Self {
        self.scopes = Some(scopes.into());
        self
    }

    /// Returns the declared scopes, treating empty or blank as undeclared.
    #[must_use]
    pub fn declared_scopes(&self) -> Option<&str> {
        self.scopes.as_deref().filter(|s| !s.trim().is_empty())
    }
}

/// The user on whose behalf tokens are issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceOwner {
    /// Resource owner ID.
    pub id: Uuid,
}

impl ResourceOwner {
    /// Creates a resource owner reference.
    #[must_use]
    pub fn new(id: Uuid) -> Self {
        Self { id }
    }
}

/// Whose tokens or grants to list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Identity {
    /// Everything issued on behalf of this resource owner, for any application.
    ResourceOwner(Uuid),
    /// Tokens the application holds in its own name (no resource owner).
    Application(Uuid),
}
