//! # grantwell-auth
//!
//! OAuth 2.0 token and grant lifecycle core.
//!
//! This crate provides:
//! - Scope policy evaluation against server and application scope lists
//! - Opaque access token, refresh token and authorization code issuance
//! - Get-or-create reuse of live tokens with the same scope set
//! - Refresh token rotation with a backward link to the predecessor
//! - Idempotent revocation and read-time expiry
//!
//! ## Overview
//!
//! The core sits between a protocol layer (HTTP endpoints, client
//! authentication) and an entity store. It never deletes records: tokens and
//! grants are created once and only ever mutated by revocation.
//!
//! ## Modules
//!
//! - [`config`] - Token and grant configuration
//! - [`scope`] - Scope policy evaluation
//! - [`token`] - Token generation and the token lifecycle service
//! - [`grant`] - Authorization code service
//! - [`storage`] - Store accessors for tokens and grants
//! - [`types`] - Domain types
//! - [`observability`] - Tracing subscriber setup from [`LoggingConfig`]

pub mod config;
pub mod error;
pub mod grant;
pub mod observability;
pub mod scope;
pub mod storage;
pub mod token;
pub mod types;

pub use config::{ConfigError, GrantwellConfig, LoggingConfig, OAuthConfig};
pub use error::{AuthError, ErrorCategory, FieldError, ValidationErrors};
pub use grant::{GrantAttrs, GrantService};
pub use observability::LogHandle;
pub use scope::{PermittedScopes, ScopePolicy};
pub use storage::{AccessGrantStore, AccessTokenStore};
pub use token::{
    ExpiresIn, FnTokenGenerator, GeneratorContext, RandomTokenGenerator, TokenAttrs,
    TokenGenerator, TokenKind, TokenService,
};
pub use types::{AccessGrant, AccessToken, Application, Identity, Lifecycle, ResourceOwner};

/// Type alias for token and grant results.
pub type AuthResult<T> = Result<T, AuthError>;

/// Prelude module for convenient imports.
///
/// ```ignore
/// use grantwell_auth::prelude::*;
/// ```
pub mod prelude {
    pub use crate::AuthResult;
    pub use crate::config::{ConfigError, GrantwellConfig, OAuthConfig};
    pub use crate::error::{AuthError, ErrorCategory};
    pub use crate::grant::{GrantAttrs, GrantService};
    pub use crate::token::{ExpiresIn, TokenAttrs, TokenGenerator, TokenService};
    pub use crate::types::{
        AccessGrant, AccessToken, Application, Identity, Lifecycle, ResourceOwner,
    };
}
