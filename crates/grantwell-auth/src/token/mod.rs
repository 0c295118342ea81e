//! Access token issuance, reuse, rotation and revocation.
//!
//! This module provides:
//!
//! - Opaque token generation with a replaceable strategy
//! - The token lifecycle service

pub mod generator;
pub mod service;

pub use generator::{
    FnTokenGenerator, GeneratorContext, RandomTokenGenerator, TokenGenerator, TokenKind,
};
pub use service::{ExpiresIn, TokenAttrs, TokenService};
