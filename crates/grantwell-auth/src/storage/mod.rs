//! Store accessors for tokens and grants.
//!
//! This module wraps the generic entity store with the lookups the token and
//! grant services need:
//!
//! - Exact lookups by token value
//! - Rotation chain lookups (predecessor and successor)
//! - Idempotent revocation
//! - Listing live records per identity
//!
//! # Implementations
//!
//! Backends implement `grantwell_store::EntityStore`; the in-memory backend
//! lives in `grantwell-store-memory`.

pub mod access_grant;
pub mod access_token;

pub use access_grant::AccessGrantStore;
pub use access_token::AccessTokenStore;

use grantwell_store::{Entity, EntityStore, Filter, OrderBy, Query, StoreError};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::AuthResult;
use crate::error::ValidationErrors;
use crate::types::Lifecycle;

/// Sets `revoked_at` on the stored copy of `record`, unless it is already
/// revoked.
///
/// Only the id of `record` is used: other fields on the caller's copy are
/// never persisted, and a stale copy cannot move an existing `revoked_at`.
async fn revoke_record<E>(store: &dyn EntityStore<E>, record: E) -> AuthResult<E>
where
    E: Entity + Lifecycle,
{
    let id = record.id();
    let mut stored = fetch_stored(store, id).await?;
    if stored.is_revoked() {
        return Ok(stored);
    }

    stored.set_revoked_at(OffsetDateTime::now_utc());
    let unrevoked = Query::new().filter(Filter::IsNull("revoked_at"));
    match store.update_if(stored, &unrevoked).await? {
        Some(revoked) => {
            tracing::info!(
                collection = E::COLLECTION,
                id = %revoked.id(),
                "Record revoked"
            );
            Ok(revoked)
        }
        // Revoked concurrently; keep the first timestamp
        None => fetch_stored(store, id).await,
    }
}

async fn fetch_stored<E>(store: &dyn EntityStore<E>, id: Uuid) -> AuthResult<E>
where
    E: Entity,
{
    store
        .get(id)
        .await?
        .ok_or_else(|| StoreError::not_found(E::COLLECTION, id.to_string()).into())
}

/// Lists the records matching `filters` that are accessible now, newest
/// first.
async fn list_accessible<E>(store: &dyn EntityStore<E>, filters: Vec<Filter>) -> AuthResult<Vec<E>>
where
    E: Entity + Lifecycle,
{
    let mut query = Query::new()
        .filter(Filter::IsNull("revoked_at"))
        .order_by(OrderBy::desc("inserted_at"));
    query.filters.extend(filters);

    let now = OffsetDateTime::now_utc();
    let records = store.list_all(&query).await?;
    Ok(records
        .into_iter()
        .filter(|r| r.is_accessible_at(now))
        .collect())
}

/// Inserts a record, logging uniqueness collisions.
async fn insert_record<E>(store: &dyn EntityStore<E>, record: E) -> AuthResult<E>
where
    E: Entity,
{
    let id = record.id();
    match store.insert(record).await {
        Ok(inserted) => Ok(inserted),
        Err(err) if err.is_unique_violation() => {
            tracing::warn!(
                collection = E::COLLECTION,
                id = %id,
                error = %err,
                "Generated value collided with an existing record"
            );
            Err(err.into())
        }
        Err(err) => Err(err.into()),
    }
}

fn require_present(errors: &mut ValidationErrors, field: &str, value: &str) {
    if value.trim().is_empty() {
        errors.add(field, "can't be blank");
    }
}
