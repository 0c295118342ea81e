//! Opaque token generation.
//!
//! Access tokens, refresh tokens and authorization codes are all produced by
//! the same [`TokenGenerator`]. Each value comes from an independent call, so
//! an access token and its refresh token never share randomness.
//!
//! # Usage
//!
//! ```ignore
//! use grantwell_auth::token::{FnTokenGenerator, GeneratorContext};
//!
//! let generator = FnTokenGenerator::new(|ctx: &GeneratorContext| {
//!     format!("{}-{}", ctx.kind, uuid::Uuid::new_v4())
//! });
//! let service = TokenService::new(store, config).with_generator(Arc::new(generator));
//! ```

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use uuid::Uuid;

/// What a generated value will be used as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Bearer access token.
    AccessToken,
    /// Refresh token issued alongside an access token.
    RefreshToken,
    /// Authorization code.
    AuthorizationCode,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AccessToken => write!(f, "access_token"),
            Self::RefreshToken => write!(f, "refresh_token"),
            Self::AuthorizationCode => write!(f, "authorization_code"),
        }
    }
}

/// Information about the record a value is generated for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorContext {
    /// Resource owner the record is issued to.
    pub resource_owner_id: Option<Uuid>,
    /// Application the record is issued for.
    pub application_id: Option<Uuid>,
    /// Resolved scopes (space-separated).
    pub scopes: String,
    /// Lifetime in seconds (None = never expires).
    pub expires_in: Option<i64>,
    /// What the value will be used as.
    pub kind: TokenKind,
}

/// Strategy for producing token values.
///
/// Implementations must make collisions negligible; a collision surfaces as
/// a uniqueness validation failure and is not retried.
pub trait TokenGenerator: Send + Sync {
    /// Produces a new token value.
    fn generate(&self, context: &GeneratorContext) -> String;
}

/// Default generator: 32 random bytes, base64url encoded without padding.
///
/// Ignores the context.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomTokenGenerator;

impl RandomTokenGenerator {
    /// Generates a random token value.
    #[must_use]
    pub fn generate_token() -> String {
        let mut bytes = [0u8; 32];
        rand::Rng::fill(&mut rand::thread_rng(), &mut bytes);
        URL_SAFE_NO_PAD.encode(bytes)
    }
}

impl TokenGenerator for RandomTokenGenerator {
    fn generate(&self, _context: &GeneratorContext) -> String {
        Self::generate_token()
    }
}

/// Adapts a closure into a [`TokenGenerator`].
pub struct FnTokenGenerator<F> {
    f: F,
}

impl<F> FnTokenGenerator<F>
where
    F: Fn(&GeneratorContext) -> String + Send + Sync,
{
    /// Wraps `f`.
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> TokenGenerator for FnTokenGenerator<F>
where
    F: Fn(&GeneratorContext) -> String + Send + Sync,
{
    fn generate(&self, context: &GeneratorContext) -> String {
        (self.f)(context)
    }
}

impl<F> fmt::Debug for FnTokenGenerator<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnTokenGenerator").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(kind: TokenKind) -> GeneratorContext {
        GeneratorContext {
            resource_owner_id: Some(Uuid::new_v4()),
            application_id: None,
            scopes: "public".to_string(),
            expires_in: Some(7200),
            kind,
        }
    }

    #[test]
    fn test_generate_token() {
        let token = RandomTokenGenerator.generate(&context(TokenKind::AccessToken));

        // 32 bytes base64url encoded = 43 characters
        assert_eq!(token.len(), 43);
        assert!(
            token
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
    }

    #[test]
    fn test_generate_token_uniqueness() {
        let tokens: Vec<String> = (0..100)
            .map(|_| RandomTokenGenerator::generate_token())
            .collect();

        let mut unique = tokens.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(tokens.len(), unique.len());
    }

    #[test]
    fn test_closure_generator_receives_context() {
        let generator = FnTokenGenerator::new(|ctx: &GeneratorContext| {
            format!("{}:{}", ctx.kind, ctx.scopes)
        });

        assert_eq!(
            generator.generate(&context(TokenKind::RefreshToken)),
            "refresh_token:public"
        );
        assert_eq!(
            generator.generate(&context(TokenKind::AuthorizationCode)),
            "authorization_code:public"
        );
    }

    #[test]
    fn test_generator_as_trait_object() {
        let generator: std::sync::Arc<dyn TokenGenerator> =
            std::sync::Arc::new(FnTokenGenerator::new(|_: &GeneratorContext| "fixed".to_string()));
        assert_eq!(generator.generate(&context(TokenKind::AccessToken)), "fixed");
    }
}
