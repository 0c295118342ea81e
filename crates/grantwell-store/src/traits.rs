//! Store traits for the entity store abstraction layer.
//!
//! This module defines the core traits that all store backends must implement.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::StoreError;
use crate::types::{FieldValue, Query};

/// A record type that can be kept in an [`EntityStore`].
///
/// Entities expose their fields by name so backends can evaluate filters,
/// ordering and unique constraints without knowing the concrete type.
pub trait Entity: Clone + Send + Sync + 'static {
    /// Name of the collection (table) holding this entity.
    const COLLECTION: &'static str;

    /// Fields whose non-null values must be unique across the collection.
    const UNIQUE_FIELDS: &'static [&'static str] = &[];

    /// Primary key.
    fn id(&self) -> Uuid;

    /// Returns the value of a named field, or `FieldValue::Null` for absent
    /// or unknown fields.
    fn field(&self, name: &str) -> FieldValue;
}

/// The store contract consumed by the token and grant accessors.
///
/// Every call is atomic on its own; nothing spans multiple calls.
/// Implementations must be thread-safe (`Send + Sync`).
///
/// # Example
///
/// ```ignore
/// use grantwell_store::{EntityStore, Filter, Query};
///
/// async fn by_token(store: &dyn EntityStore<AccessToken>, value: &str) -> StoreResult<Option<AccessToken>> {
///     store.find_one(&Query::new().filter(Filter::eq("token", value))).await
/// }
/// ```
#[async_trait]
pub trait EntityStore<E: Entity>: Send + Sync {
    /// Inserts a new record.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::UniqueViolation` if a unique field collides with
    /// an existing record, naming the first colliding field.
    async fn insert(&self, entity: E) -> Result<E, StoreError>;

    /// Returns the first record matching the query, honouring its ordering.
    ///
    /// # Errors
    ///
    /// Returns an error only for infrastructure issues, not for missing records.
    async fn find_one(&self, query: &Query) -> Result<Option<E>, StoreError>;

    /// Returns the record with the given id.
    ///
    /// # Errors
    ///
    /// Returns an error only for infrastructure issues, not for missing records.
    async fn get(&self, id: Uuid) -> Result<Option<E>, StoreError>;

    /// Replaces an existing record (matched by `id`) with the given one.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if no record has this id.
    /// Returns `StoreError::UniqueViolation` if the new values collide with
    /// another record.
    async fn update(&self, entity: E) -> Result<E, StoreError>;

    /// Replaces an existing record only if the stored copy still matches
    /// `condition`. The check and the write happen under one lock or
    /// transaction.
    ///
    /// Returns `Ok(None)` when the stored copy no longer matches.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if no record has this id.
    /// Returns `StoreError::UniqueViolation` if the new values collide with
    /// another record.
    async fn update_if(&self, entity: E, condition: &Query) -> Result<Option<E>, StoreError>;

    /// Returns all records matching the query, honouring ordering and limit.
    ///
    /// # Errors
    ///
    /// Returns an error only for infrastructure issues.
    async fn list_all(&self, query: &Query) -> Result<Vec<E>, StoreError>;
}
