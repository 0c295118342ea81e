//! Grant service for issuing and redeeming authorization codes.

use std::sync::Arc;

use grantwell_store::DynStore;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::AuthResult;
use crate::config::OAuthConfig;
use crate::scope::ScopePolicy;
use crate::storage::AccessGrantStore;
use crate::token::generator::{GeneratorContext, RandomTokenGenerator, TokenGenerator, TokenKind};
use crate::types::{AccessGrant, Application, Identity, Lifecycle, ResourceOwner, lifecycle};

/// Caller-supplied attributes for a new grant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GrantAttrs {
    /// Redirect URI the code is issued for.
    pub redirect_uri: String,

    /// Requested scopes (space-separated). Absent or blank means the default
    /// scopes.
    pub scopes: Option<String>,

    /// Lifetime in seconds. Defaults to `authorization_code_lifetime`.
    pub expires_in: Option<i64>,
}

impl GrantAttrs {
    /// Creates attributes for the given redirect URI.
    #[must_use]
    pub fn new(redirect_uri: impl Into<String>) -> Self {
        Self {
            redirect_uri: redirect_uri.into(),
            ..Self::default()
        }
    }

    /// Sets the requested scopes.
    #[must_use]
    pub fn with_scopes(mut self, scopes: impl Into<String>) -> Self {
        self.scopes = Some(scopes.into());
        self
    }

    /// Sets the lifetime in seconds.
    #[must_use]
    pub fn with_expires_in(mut self, seconds: i64) -> Self {
        self.expires_in = Some(seconds);
        self
    }
}

/// Grant service for issuing and managing authorization codes.
pub struct GrantService {
    grants: AccessGrantStore,
    policy: ScopePolicy,
    config: OAuthConfig,
    generator: Arc<dyn TokenGenerator>,
}

impl GrantService {
    /// Creates a new grant service using the random token generator.
    #[must_use]
    pub fn new(store: DynStore<AccessGrant>, config: OAuthConfig) -> Self {
        Self {
            grants: AccessGrantStore::new(store),
            policy: ScopePolicy::from_config(&config),
            config,
            generator: Arc::new(RandomTokenGenerator),
        }
    }

    /// Replaces the code generator.
    #[must_use]
    pub fn with_generator(mut self, generator: Arc<dyn TokenGenerator>) -> Self {
        self.generator = generator;
        self
    }

    /// Issues a new authorization code.
    ///
    /// # Errors
    ///
    /// - `AuthError::InvalidScope` if a requested scope is not permitted for
    ///   the application
    /// - `AuthError::Validation` if the redirect URI or generated code is
    ///   blank, or the code collides
    pub async fn create_grant(
        &self,
        owner: &ResourceOwner,
        application: &Application,
        attrs: GrantAttrs,
    ) -> AuthResult<AccessGrant> {
        let scopes = self
            .policy
            .resolve(attrs.scopes.as_deref(), application.declared_scopes())?;
        let expires_in = attrs
            .expires_in
            .unwrap_or_else(|| self.config.authorization_code_expires_in());

        let context = GeneratorContext {
            resource_owner_id: Some(owner.id),
            application_id: Some(application.id),
            scopes,
            expires_in: Some(expires_in),
            kind: TokenKind::AuthorizationCode,
        };
        let token = self.generator.generate(&context);

        let record = AccessGrant {
            id: Uuid::new_v4(),
            resource_owner_id: owner.id,
            application_id: application.id,
            token,
            expires_in,
            redirect_uri: attrs.redirect_uri,
            scopes: Some(context.scopes),
            revoked_at: None,
            inserted_at: OffsetDateTime::now_utc(),
        };

        let created = self.grants.create(record).await?;
        tracing::info!(
            grant_id = %created.id,
            resource_owner_id = %owner.id,
            application_id = %application.id,
            expires_in = created.expires_in,
            "Authorization grant issued"
        );
        Ok(created)
    }

    /// Finds a grant by its code, live or not.
    pub async fn get_by_token(&self, code: &str) -> AuthResult<Option<AccessGrant>> {
        self.grants.find_by_token(code).await
    }

    /// Finds a grant by its code if it was issued to `application` and is
    /// still accessible.
    pub async fn get_active_grant_for(
        &self,
        application: &Application,
        code: &str,
    ) -> AuthResult<Option<AccessGrant>> {
        let grant = self
            .grants
            .find_by_token(code)
            .await?
            .filter(|g| g.application_id == application.id && g.is_accessible());
        if grant.is_none() {
            tracing::debug!(application_id = %application.id, "No active grant for code");
        }
        Ok(grant)
    }

    /// Revokes the grant. Revoking a revoked grant returns it unchanged.
    pub async fn revoke(&self, grant: AccessGrant) -> AuthResult<AccessGrant> {
        self.grants.revoke(grant).await
    }

    /// Returns `true` if the grant is present, not revoked and not expired.
    #[must_use]
    pub fn is_accessible(&self, grant: Option<&AccessGrant>) -> bool {
        lifecycle::is_accessible(grant)
    }

    /// Returns `true` if the grant is present and revoked.
    #[must_use]
    pub fn is_revoked(&self, grant: Option<&AccessGrant>) -> bool {
        lifecycle::is_revoked(grant)
    }

    /// Lists the live grants issued to `identity`, newest first.
    pub async fn get_authorized_grants_for(
        &self,
        identity: Identity,
    ) -> AuthResult<Vec<AccessGrant>> {
        self.grants.list_authorized(identity).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AuthError;
    use grantwell_store_memory::create_store;

    const REDIRECT_URI: &str = "https://app.example.com/callback";

    fn service() -> GrantService {
        let config = OAuthConfig {
            optional_scopes: vec!["read".to_string(), "write".to_string()],
            ..OAuthConfig::default()
        };
        GrantService::new(create_store(), config)
    }

    fn owner() -> ResourceOwner {
        ResourceOwner::new(Uuid::new_v4())
    }

    fn application() -> Application {
        Application::new("client", "Client", REDIRECT_URI)
    }

    #[tokio::test]
    async fn test_create_grant_defaults() {
        let service = service();
        let grant = service
            .create_grant(&owner(), &application(), GrantAttrs::new(REDIRECT_URI))
            .await
            .unwrap();

        assert_eq!(grant.scopes.as_deref(), Some("public"));
        assert_eq!(grant.expires_in, 600);
        assert_eq!(grant.redirect_uri, REDIRECT_URI);
        assert_eq!(grant.token.len(), 43);
        assert!(service.is_accessible(Some(&grant)));
    }

    #[tokio::test]
    async fn test_create_grant_validates_against_application_scopes() {
        let service = service();
        let app = application().with_scopes("app:read");

        let err = service
            .create_grant(
                &owner(),
                &app,
                GrantAttrs::new(REDIRECT_URI).with_scopes("read"),
            )
            .await
            .unwrap_err();
        match err {
            AuthError::InvalidScope { permitted, .. } => assert_eq!(permitted, r#""app:read""#),
            other => panic!("expected invalid scope, got {other:?}"),
        }

        let grant = service
            .create_grant(
                &owner(),
                &app,
                GrantAttrs::new(REDIRECT_URI).with_scopes("app:read"),
            )
            .await
            .unwrap();
        assert_eq!(grant.scopes.as_deref(), Some("app:read"));
    }

    #[tokio::test]
    async fn test_create_grant_requires_redirect_uri() {
        let err = service()
            .create_grant(&owner(), &application(), GrantAttrs::new(""))
            .await
            .unwrap_err();
        match err {
            AuthError::Validation { errors } => assert_eq!(errors.on("redirect_uri").count(), 1),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_get_active_grant_for() {
        let service = service();
        let app = application();
        let grant = service
            .create_grant(&owner(), &app, GrantAttrs::new(REDIRECT_URI))
            .await
            .unwrap();

        let found = service
            .get_active_grant_for(&app, &grant.token)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, grant.id);

        // Issued to another application
        let other = application();
        assert!(
            service
                .get_active_grant_for(&other, &grant.token)
                .await
                .unwrap()
                .is_none()
        );

        // Revoked codes are no longer active but can still be looked up
        let revoked = service.revoke(found).await.unwrap();
        assert!(service.is_revoked(Some(&revoked)));
        assert!(
            service
                .get_active_grant_for(&app, &grant.token)
                .await
                .unwrap()
                .is_none()
        );
        assert!(service.get_by_token(&grant.token).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_expired_grant_is_not_active() {
        let service = service();
        let app = application();
        let grant = service
            .create_grant(
                &owner(),
                &app,
                GrantAttrs::new(REDIRECT_URI).with_expires_in(0),
            )
            .await
            .unwrap();

        assert!(!service.is_accessible(Some(&grant)));
        assert!(
            service
                .get_active_grant_for(&app, &grant.token)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_get_authorized_grants_for() {
        let service = service();
        let owner = owner();
        let app = application();

        let first = service
            .create_grant(&owner, &app, GrantAttrs::new(REDIRECT_URI))
            .await
            .unwrap();
        let second = service
            .create_grant(&owner, &app, GrantAttrs::new(REDIRECT_URI))
            .await
            .unwrap();
        service.revoke(first).await.unwrap();

        let live = service
            .get_authorized_grants_for(Identity::ResourceOwner(owner.id))
            .await
            .unwrap();
        assert_eq!(live.len(), 1);
        assert_eq!(live[0].id, second.id);
    }
}
