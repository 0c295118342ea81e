//! Domain types shared by the token and grant modules.
//!
//! ## Domain Types
//!
//! - [`AccessToken`] - Issued bearer token with optional refresh token
//! - [`AccessGrant`] - Issued authorization code
//! - [`Application`] / [`ResourceOwner`] - Value objects the core reads
//! - [`Lifecycle`] - Expiry and revocation predicates

pub mod access_grant;
pub mod access_token;
pub mod application;
pub mod lifecycle;

pub use access_grant::AccessGrant;
pub use access_token::AccessToken;
pub use application::{Application, Identity, ResourceOwner};
pub use lifecycle::{Lifecycle, is_accessible, is_revoked};
