//! Token lifecycle service.
//!
//! This module provides the service that issues, reuses, rotates and revokes
//! access tokens:
//!
//! - Scope validation against the server or application scope list
//! - Get-or-create reuse of a live token with the same scope set
//! - Refresh token rotation with a backward link to the predecessor
//! - Idempotent revocation
//!
//! # Usage
//!
//! ```ignore
//! use grantwell_auth::token::{TokenAttrs, TokenService};
//!
//! let service = TokenService::new(store, config.oauth.clone());
//! let token = service
//!     .get_or_create_token(&owner, Some(&application), TokenAttrs::new().with_scopes("read"))
//!     .await?;
//! ```
//!
//! # Reuse race
//!
//! Get-or-create is a lookup followed by an insert. Two concurrent identical
//! calls may both miss and both issue a token; matching then returns the
//! newer one.

use std::sync::Arc;

use grantwell_store::DynStore;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::AuthResult;
use crate::config::OAuthConfig;
use crate::error::AuthError;
use crate::scope::{PermittedScopes, ScopePolicy, parse};
use crate::storage::AccessTokenStore;
use crate::token::generator::{GeneratorContext, RandomTokenGenerator, TokenGenerator, TokenKind};
use crate::types::{AccessToken, Application, Identity, Lifecycle, ResourceOwner, lifecycle};

/// Per-call token lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExpiresIn {
    /// Use the configured access token lifetime.
    #[default]
    Default,
    /// The token never expires.
    Never,
    /// The token expires after this many seconds.
    After(i64),
}

impl ExpiresIn {
    /// Resolves to a lifetime in seconds given the configured default.
    #[must_use]
    pub fn resolve(self, default: Option<i64>) -> Option<i64> {
        match self {
            Self::Default => default,
            Self::Never => None,
            Self::After(secs) => Some(secs),
        }
    }
}

/// Caller-supplied attributes for a new token.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenAttrs {
    /// Requested scopes (space-separated). Absent or blank means the default
    /// scopes.
    pub scopes: Option<String>,

    /// Token lifetime.
    pub expires_in: ExpiresIn,

    /// Overrides `use_refresh_token` from the configuration.
    pub use_refresh_token: Option<bool>,

    /// Refresh token value of the token being rotated.
    pub previous_refresh_token: Option<String>,
}

impl TokenAttrs {
    /// Creates empty attributes: default scopes, default lifetime.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the requested scopes.
    #[must_use]
    pub fn with_scopes(mut self, scopes: impl Into<String>) -> Self {
        self.scopes = Some(scopes.into());
        self
    }

    /// Sets the token lifetime.
    #[must_use]
    pub fn with_expires_in(mut self, expires_in: ExpiresIn) -> Self {
        self.expires_in = expires_in;
        self
    }

    /// Forces refresh token issuance on or off.
    #[must_use]
    pub fn with_refresh_token(mut self, enabled: bool) -> Self {
        self.use_refresh_token = Some(enabled);
        self
    }

    /// Links the new token to `previous` through its refresh token.
    #[must_use]
    pub fn rotated_from(mut self, previous: &AccessToken) -> Self {
        self.previous_refresh_token = previous.refresh_token.clone();
        self
    }
}

/// Token service for issuing and managing access tokens.
pub struct TokenService {
    /// Token accessor.
    tokens: AccessTokenStore,

    /// Scope policy built from the configuration.
    policy: ScopePolicy,

    /// Service configuration.
    config: OAuthConfig,

    /// Token value strategy.
    generator: Arc<dyn TokenGenerator>,
}

impl TokenService {
    /// Creates a new token service using the random token generator.
    #[must_use]
    pub fn new(store: DynStore<AccessToken>, config: OAuthConfig) -> Self {
        Self {
            tokens: AccessTokenStore::new(store),
            policy: ScopePolicy::from_config(&config),
            config,
            generator: Arc::new(RandomTokenGenerator),
        }
    }

    /// Replaces the token generator.
    #[must_use]
    pub fn with_generator(mut self, generator: Arc<dyn TokenGenerator>) -> Self {
        self.generator = generator;
        self
    }

    /// Gets the configuration.
    #[must_use]
    pub fn config(&self) -> &OAuthConfig {
        &self.config
    }

    /// Gets the scope policy.
    #[must_use]
    pub fn policy(&self) -> &ScopePolicy {
        &self.policy
    }

    /// Issues a new token for a resource owner.
    ///
    /// # Errors
    ///
    /// - `AuthError::InvalidScope` if a requested scope is not permitted
    /// - `AuthError::Validation` if a generated value is blank or collides
    pub async fn create_token(
        &self,
        owner: &ResourceOwner,
        application: Option<&Application>,
        attrs: TokenAttrs,
    ) -> AuthResult<AccessToken> {
        self.issue(Some(owner.id), application, attrs).await
    }

    /// Issues a new token held by the application itself.
    ///
    /// # Errors
    ///
    /// See [`TokenService::create_token`].
    pub async fn create_application_token(
        &self,
        application: &Application,
        attrs: TokenAttrs,
    ) -> AuthResult<AccessToken> {
        self.issue(None, Some(application), attrs).await
    }

    /// Returns a live token with the same scope set for the pair, issuing a
    /// new one if there is none.
    ///
    /// # Errors
    ///
    /// See [`TokenService::create_token`].
    pub async fn get_or_create_token(
        &self,
        owner: &ResourceOwner,
        application: Option<&Application>,
        attrs: TokenAttrs,
    ) -> AuthResult<AccessToken> {
        self.find_or_issue(Some(owner.id), application, attrs).await
    }

    /// Get-or-create for tokens held by the application itself.
    ///
    /// # Errors
    ///
    /// See [`TokenService::create_token`].
    pub async fn get_or_create_application_token(
        &self,
        application: &Application,
        attrs: TokenAttrs,
    ) -> AuthResult<AccessToken> {
        self.find_or_issue(None, Some(application), attrs).await
    }

    /// Finds the newest accessible token for the pair whose scope set equals
    /// `scopes`.
    pub async fn get_matching_token_for(
        &self,
        owner: Option<&ResourceOwner>,
        application: Option<&Application>,
        scopes: &str,
    ) -> AuthResult<Option<AccessToken>> {
        self.tokens
            .find_matching(owner.map(|o| o.id), application.map(|a| a.id), scopes)
            .await
    }

    /// Finds a token by its bearer value, live or not.
    pub async fn get_by_token(&self, value: &str) -> AuthResult<Option<AccessToken>> {
        self.tokens.find_by_token(value).await
    }

    /// Finds a token by its refresh token value, live or not.
    pub async fn get_by_refresh_token(&self, value: &str) -> AuthResult<Option<AccessToken>> {
        self.tokens.find_by_refresh_token(value).await
    }

    /// Finds the token `token` was rotated from, revoked or not.
    pub async fn get_by_previous_refresh_token_for(
        &self,
        token: &AccessToken,
    ) -> AuthResult<Option<AccessToken>> {
        self.tokens.find_predecessor(token).await
    }

    /// Finds the token that was rotated from `token`.
    ///
    /// A refresh token presented after it has been superseded is a replay
    /// signal.
    pub async fn get_superseding_token_for(
        &self,
        token: &AccessToken,
    ) -> AuthResult<Option<AccessToken>> {
        self.tokens.find_by_previous_refresh_token(token).await
    }

    /// Revokes the token. Revoking a revoked token returns it unchanged.
    pub async fn revoke(&self, token: AccessToken) -> AuthResult<AccessToken> {
        self.tokens.revoke(token).await
    }

    /// Returns `true` if the token is present, not revoked and not expired.
    #[must_use]
    pub fn is_accessible(&self, token: Option<&AccessToken>) -> bool {
        lifecycle::is_accessible(token)
    }

    /// Returns `true` if the token is present and revoked.
    #[must_use]
    pub fn is_revoked(&self, token: Option<&AccessToken>) -> bool {
        lifecycle::is_revoked(token)
    }

    /// Lists the live tokens held by `identity`, newest first.
    pub async fn get_authorized_tokens_for(
        &self,
        identity: Identity,
    ) -> AuthResult<Vec<AccessToken>> {
        self.tokens.list_authorized(identity).await
    }

    /// Rotates `previous` into a new token for the same owner and application.
    ///
    /// The new token carries `previous.refresh_token` as its
    /// `previous_refresh_token`. Requested scopes may narrow the original set
    /// but never widen it. Unless `revoke_refresh_token_on_use` is enabled,
    /// the predecessor is revoked immediately; otherwise it stays live until
    /// [`TokenService::revoke_previous_refresh_token`] is called for the
    /// successor.
    ///
    /// # Errors
    ///
    /// - `AuthError::InvalidGrant` if `previous` has no refresh token, is
    ///   unknown to the store, or has been revoked
    /// - `AuthError::InvalidScope` if the request widens the original scopes
    pub async fn refresh(&self, previous: &AccessToken, attrs: TokenAttrs) -> AuthResult<AccessToken> {
        let refresh_token = previous
            .refresh_token
            .as_deref()
            .ok_or_else(|| AuthError::invalid_grant("Token has no refresh token"))?;

        // Re-read so a concurrent rotation is seen.
        let current = self
            .tokens
            .find_by_refresh_token(refresh_token)
            .await?
            .filter(|t| t.id == previous.id)
            .ok_or_else(|| AuthError::invalid_grant("Unknown refresh token"))?;

        if current.is_revoked() {
            tracing::debug!(token_id = %current.id, "Refresh attempted with revoked token");
            return Err(AuthError::invalid_grant("Refresh token has been revoked"));
        }

        let scopes = refresh_scopes(&current, attrs.scopes.as_deref())?;
        let attrs = TokenAttrs {
            use_refresh_token: Some(attrs.use_refresh_token.unwrap_or(true)),
            previous_refresh_token: current.refresh_token.clone(),
            ..attrs
        };

        let successor = self
            .issue_with_scopes(current.resource_owner_id, current.application_id, scopes, attrs)
            .await?;

        if !self.config.revoke_refresh_token_on_use {
            self.tokens.revoke(current.clone()).await?;
        }

        tracing::info!(
            token_id = %successor.id,
            previous_token_id = %current.id,
            "Refresh token rotated"
        );
        Ok(successor)
    }

    /// Revokes the predecessor of `token` on its first use.
    ///
    /// Does nothing unless `revoke_refresh_token_on_use` is enabled. Returns
    /// the predecessor if this call revoked it.
    pub async fn revoke_previous_refresh_token(
        &self,
        token: &AccessToken,
    ) -> AuthResult<Option<AccessToken>> {
        if !self.config.revoke_refresh_token_on_use {
            return Ok(None);
        }

        match self.tokens.find_predecessor(token).await? {
            Some(previous) if !previous.is_revoked() => {
                let revoked = self.tokens.revoke(previous).await?;
                tracing::debug!(
                    token_id = %token.id,
                    previous_token_id = %revoked.id,
                    "Previous refresh token revoked on first use"
                );
                Ok(Some(revoked))
            }
            _ => Ok(None),
        }
    }

    async fn find_or_issue(
        &self,
        owner_id: Option<Uuid>,
        application: Option<&Application>,
        attrs: TokenAttrs,
    ) -> AuthResult<AccessToken> {
        let scopes = self.resolve_scopes(application, &attrs)?;
        let application_id = application.map(|a| a.id);

        if let Some(existing) = self
            .tokens
            .find_matching(owner_id, application_id, &scopes)
            .await?
        {
            tracing::debug!(
                token_id = %existing.id,
                resource_owner_id = ?owner_id,
                application_id = ?application_id,
                "Reusing matching access token"
            );
            return Ok(existing);
        }

        self.issue_with_scopes(owner_id, application_id, scopes, attrs)
            .await
    }

    async fn issue(
        &self,
        owner_id: Option<Uuid>,
        application: Option<&Application>,
        attrs: TokenAttrs,
    ) -> AuthResult<AccessToken> {
        let scopes = self.resolve_scopes(application, &attrs)?;
        self.issue_with_scopes(owner_id, application.map(|a| a.id), scopes, attrs)
            .await
    }

    fn resolve_scopes(
        &self,
        application: Option<&Application>,
        attrs: &TokenAttrs,
    ) -> AuthResult<String> {
        self.policy.resolve(
            attrs.scopes.as_deref(),
            application.and_then(|a| a.declared_scopes()),
        )
    }

    async fn issue_with_scopes(
        &self,
        owner_id: Option<Uuid>,
        application_id: Option<Uuid>,
        scopes: String,
        attrs: TokenAttrs,
    ) -> AuthResult<AccessToken> {
        let expires_in = attrs
            .expires_in
            .resolve(self.config.access_token_expires_in());

        let mut context = GeneratorContext {
            resource_owner_id: owner_id,
            application_id,
            scopes,
            expires_in,
            kind: TokenKind::AccessToken,
        };
        let token = self.generator.generate(&context);
        let refresh_token = if attrs
            .use_refresh_token
            .unwrap_or(self.config.use_refresh_token)
        {
            context.kind = TokenKind::RefreshToken;
            Some(self.generator.generate(&context))
        } else {
            None
        };

        let record = AccessToken {
            id: Uuid::new_v4(),
            resource_owner_id: owner_id,
            application_id,
            token,
            refresh_token,
            previous_refresh_token: attrs.previous_refresh_token,
            expires_in,
            scopes: Some(context.scopes),
            revoked_at: None,
            inserted_at: OffsetDateTime::now_utc(),
        };

        let created = self.tokens.create(record).await?;
        tracing::info!(
            token_id = %created.id,
            resource_owner_id = ?owner_id,
            application_id = ?application_id,
            scopes = created.scope_str(),
            expires_in = ?created.expires_in,
            refresh = created.refresh_token.is_some(),
            "Access token issued"
        );
        Ok(created)
    }
}

/// Determines the scopes for a refreshed token.
///
/// The scope can be narrowed, not expanded.
fn refresh_scopes(previous: &AccessToken, requested: Option<&str>) -> AuthResult<String> {
    let original = previous.scope_str();
    let Some(requested) = requested.filter(|s| !s.trim().is_empty()) else {
        return Ok(parse(original).join(" "));
    };

    let granted = parse(original);
    let requested = parse(requested).join(" ");
    if parse(&requested).iter().any(|s| !granted.contains(s)) {
        let permitted = PermittedScopes::Application(original.to_string());
        return Err(AuthError::invalid_scope(requested, permitted.to_string()));
    }
    Ok(requested)
}
