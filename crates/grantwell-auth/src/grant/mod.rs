//! Authorization grants (authorization codes).
//!
//! Grants mirror the access token operations minus refresh rotation and
//! get-or-create: every authorization request issues a fresh code.

pub mod service;

pub use service::{GrantAttrs, GrantService};
