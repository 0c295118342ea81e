//! Access token accessor.
//!
//! Lookups by token value never filter on revocation or expiry; callers
//! decide what to do with a dead record. Only [`AccessTokenStore::find_matching`]
//! and [`AccessTokenStore::list_authorized`] restrict themselves to live tokens.

use grantwell_store::{DynStore, Filter, OrderBy, Query};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::AuthResult;
use crate::error::ValidationErrors;
use crate::scope::scopes_equal;
use crate::types::{AccessToken, Identity, Lifecycle};

use super::{insert_record, list_accessible, require_present, revoke_record};

/// Accessor for persisted access tokens.
#[derive(Clone)]
pub struct AccessTokenStore {
    store: DynStore<AccessToken>,
}

impl AccessTokenStore {
    /// Creates an accessor over the given store.
    #[must_use]
    pub fn new(store: DynStore<AccessToken>) -> Self {
        Self { store }
    }

    /// Validates and persists a new token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` if the token value is blank or the
    /// token or refresh token collides with an existing record.
    pub async fn create(&self, token: AccessToken) -> AuthResult<AccessToken> {
        let mut errors = ValidationErrors::new();
        require_present(&mut errors, "token", &token.token);
        if let Some(refresh) = &token.refresh_token {
            require_present(&mut errors, "refresh_token", refresh);
        }
        errors.into_result()?;

        insert_record(self.store.as_ref(), token).await
    }

    /// Finds a token by its bearer value.
    pub async fn find_by_token(&self, value: &str) -> AuthResult<Option<AccessToken>> {
        let query = Query::new().filter(Filter::eq("token", value));
        Ok(self.store.find_one(&query).await?)
    }

    /// Finds a token by its refresh token value.
    pub async fn find_by_refresh_token(&self, value: &str) -> AuthResult<Option<AccessToken>> {
        let query = Query::new().filter(Filter::eq("refresh_token", value));
        Ok(self.store.find_one(&query).await?)
    }

    /// Finds the token that superseded `token`: the most recently created
    /// record whose `previous_refresh_token` is `token.refresh_token`, issued
    /// to the same resource owner and application.
    ///
    /// Returns `None` if `token` carries no refresh token.
    pub async fn find_by_previous_refresh_token(
        &self,
        token: &AccessToken,
    ) -> AuthResult<Option<AccessToken>> {
        let Some(refresh) = token.refresh_token.as_deref() else {
            return Ok(None);
        };
        let query = same_pair(token)
            .filter(Filter::eq("previous_refresh_token", refresh))
            .order_by(OrderBy::desc("inserted_at"));
        Ok(self.store.find_one(&query).await?)
    }

    /// Finds the token `token` was rotated from: the most recently created
    /// record whose `refresh_token` is `token.previous_refresh_token`, issued
    /// to the same resource owner and application.
    ///
    /// Revoked predecessors are returned too. Returns `None` if `token` was
    /// not issued by rotation.
    pub async fn find_predecessor(&self, token: &AccessToken) -> AuthResult<Option<AccessToken>> {
        let Some(previous) = token
            .previous_refresh_token
            .as_deref()
            .filter(|p| !p.is_empty())
        else {
            return Ok(None);
        };
        let query = same_pair(token)
            .filter(Filter::eq("refresh_token", previous))
            .order_by(OrderBy::desc("inserted_at"));
        Ok(self.store.find_one(&query).await?)
    }

    /// Finds the newest accessible token for the pair whose scope set equals
    /// `scopes`, ignoring order and duplicates.
    pub async fn find_matching(
        &self,
        resource_owner_id: Option<Uuid>,
        application_id: Option<Uuid>,
        scopes: &str,
    ) -> AuthResult<Option<AccessToken>> {
        let query = Query::new()
            .filter(Filter::eq("resource_owner_id", resource_owner_id))
            .filter(Filter::eq("application_id", application_id))
            .filter(Filter::IsNull("revoked_at"))
            .order_by(OrderBy::desc("inserted_at"));

        let now = OffsetDateTime::now_utc();
        let candidates = self.store.list_all(&query).await?;
        Ok(candidates
            .into_iter()
            .find(|t| t.is_accessible_at(now) && scopes_equal(t.scope_str(), scopes)))
    }

    /// Revokes the token. Revoking a revoked token returns it unchanged.
    pub async fn revoke(&self, token: AccessToken) -> AuthResult<AccessToken> {
        revoke_record(self.store.as_ref(), token).await
    }

    /// Lists the live tokens held by `identity`, newest first.
    ///
    /// For a resource owner this covers every application; for an application
    /// only the tokens it holds in its own name.
    pub async fn list_authorized(&self, identity: Identity) -> AuthResult<Vec<AccessToken>> {
        let filters = match identity {
            Identity::ResourceOwner(id) => vec![Filter::eq("resource_owner_id", id)],
            Identity::Application(id) => vec![
                Filter::eq("application_id", id),
                Filter::IsNull("resource_owner_id"),
            ],
        };
        list_accessible(self.store.as_ref(), filters).await
    }
}

/// Query constrained to the token's (resource owner, application) pair.
/// An absent side only matches an absent side.
fn same_pair(token: &AccessToken) -> Query {
    Query::new()
        .filter(Filter::eq("resource_owner_id", token.resource_owner_id))
        .filter(Filter::eq("application_id", token.application_id))
}
