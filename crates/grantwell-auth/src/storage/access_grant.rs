//! Access grant accessor.

use grantwell_store::{DynStore, Filter, Query};

use crate::AuthResult;
use crate::error::ValidationErrors;
use crate::types::{AccessGrant, Identity};

use super::{insert_record, list_accessible, require_present, revoke_record};

/// Accessor for persisted authorization grants.
#[derive(Clone)]
pub struct AccessGrantStore {
    store: DynStore<AccessGrant>,
}

impl AccessGrantStore {
    /// Creates an accessor over the given store.
    #[must_use]
    pub fn new(store: DynStore<AccessGrant>) -> Self {
        Self { store }
    }

    /// Validates and persists a new grant.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` if the code or redirect URI is blank,
    /// or the code collides with an existing grant.
    pub async fn create(&self, grant: AccessGrant) -> AuthResult<AccessGrant> {
        let mut errors = ValidationErrors::new();
        require_present(&mut errors, "token", &grant.token);
        require_present(&mut errors, "redirect_uri", &grant.redirect_uri);
        errors.into_result()?;

        insert_record(self.store.as_ref(), grant).await
    }

    /// Finds a grant by its code.
    pub async fn find_by_token(&self, value: &str) -> AuthResult<Option<AccessGrant>> {
        let query = Query::new().filter(Filter::eq("token", value));
        Ok(self.store.find_one(&query).await?)
    }

    /// Revokes the grant. Revoking a revoked grant returns it unchanged.
    pub async fn revoke(&self, grant: AccessGrant) -> AuthResult<AccessGrant> {
        revoke_record(self.store.as_ref(), grant).await
    }

    /// Lists the live grants issued to `identity`, newest first.
    pub async fn list_authorized(&self, identity: Identity) -> AuthResult<Vec<AccessGrant>> {
        let filter = match identity {
            Identity::ResourceOwner(id) => Filter::eq("resource_owner_id", id),
            Identity::Application(id) => Filter::eq("application_id", id),
        };
        list_accessible(self.store.as_ref(), vec![filter]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AuthError;
    use grantwell_store_memory::create_store;
    use time::{Duration, OffsetDateTime};
    use uuid::Uuid;

    fn grant(owner: Uuid, app: Uuid, code: &str) -> AccessGrant {
        AccessGrant {
            id: Uuid::new_v4(),
            resource_owner_id: owner,
            application_id: app,
            token: code.to_string(),
            expires_in: 600,
            redirect_uri: "https://app.example.com/callback".to_string(),
            scopes: Some("public".to_string()),
            revoked_at: None,
            inserted_at: OffsetDateTime::now_utc(),
        }
    }

    #[tokio::test]
    async fn test_create_requires_code_and_redirect_uri() {
        let grants = AccessGrantStore::new(create_store());
        let mut g = grant(Uuid::new_v4(), Uuid::new_v4(), "");
        g.redirect_uri = String::new();

        match grants.create(g).await.unwrap_err() {
            AuthError::Validation { errors } => {
                assert_eq!(errors.errors().len(), 2);
                assert_eq!(errors.on("redirect_uri").count(), 1);
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_duplicate_code_is_rejected() {
        let grants = AccessGrantStore::new(create_store());
        grants
            .create(grant(Uuid::new_v4(), Uuid::new_v4(), "code"))
            .await
            .unwrap();
        let err = grants
            .create(grant(Uuid::new_v4(), Uuid::new_v4(), "code"))
            .await
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn test_list_and_revoke() {
        let grants = AccessGrantStore::new(create_store());
        let owner = Uuid::new_v4();
        let app = Uuid::new_v4();

        let live = grants.create(grant(owner, app, "live")).await.unwrap();
        let mut stale = grant(owner, app, "stale");
        stale.inserted_at -= Duration::minutes(11);
        grants.create(stale).await.unwrap();

        let listed = grants
            .list_authorized(Identity::ResourceOwner(owner))
            .await
            .unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, live.id);

        let revoked = grants.revoke(live).await.unwrap();
        assert!(revoked.revoked_at.is_some());
        assert!(
            grants
                .list_authorized(Identity::Application(app))
                .await
                .unwrap()
                .is_empty()
        );

        let found = grants.find_by_token("live").await.unwrap().unwrap();
        assert!(found.revoked_at.is_some());
    }
}
