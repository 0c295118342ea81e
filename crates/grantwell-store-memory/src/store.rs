use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use grantwell_store::{Direction, Entity, EntityStore, Query, StoreError, StoreResult};
use tokio::sync::RwLock;
use uuid::Uuid;

/// A stored record together with its insertion sequence number.
#[derive(Debug, Clone)]
struct Row<E> {
    seq: u64,
    entity: E,
}

/// In-memory entity store.
///
/// This store implementation provides:
/// - Unique field enforcement on insert and update (`Entity::UNIQUE_FIELDS`)
/// - Equality, null and range filtering
/// - Ordering on any field with insertion-sequence tie-breaking
///
/// Records are kept in insertion order behind a single `RwLock`, so every
/// call is atomic with respect to the others.
#[derive(Debug)]
pub struct InMemoryStore<E> {
    rows: RwLock<Vec<Row<E>>>,
    /// Atomic counter for insertion sequence numbers
    sequence: AtomicU64,
}

impl<E: Entity> InMemoryStore<E> {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(Vec::new()),
            sequence: AtomicU64::new(1),
        }
    }

    /// Returns the number of stored records.
    pub async fn count(&self) -> usize {
        self.rows.read().await.len()
    }

    fn next_sequence(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::SeqCst)
    }

    /// Returns the first unique field of `entity` that collides with a record
    /// other than `except`.
    fn unique_conflict(
        rows: &[Row<E>],
        entity: &E,
        except: Option<Uuid>,
    ) -> Option<&'static str> {
        E::UNIQUE_FIELDS.iter().copied().find(|field| {
            let value = entity.field(field);
            !value.is_null()
                && rows.iter().any(|row| {
                    Some(row.entity.id()) != except && row.entity.field(field) == value
                })
        })
    }

    /// Overwrites the row with `entity`'s id. Returns `false` without
    /// writing when the stored copy does not match `condition`.
    fn replace(rows: &mut [Row<E>], entity: &E, condition: Option<&Query>) -> StoreResult<bool> {
        let index = rows
            .iter()
            .position(|row| row.entity.id() == entity.id())
            .ok_or_else(|| StoreError::not_found(E::COLLECTION, entity.id().to_string()))?;

        if condition.is_some_and(|query| !query.matches(&rows[index].entity)) {
            return Ok(false);
        }
        if let Some(field) = Self::unique_conflict(rows, entity, Some(entity.id())) {
            return Err(StoreError::unique_violation(E::COLLECTION, field));
        }

        rows[index].entity = entity.clone();
        Ok(true)
    }

    fn select(rows: &[Row<E>], query: &Query) -> Vec<E> {
        let mut matched: Vec<&Row<E>> = rows
            .iter()
            .filter(|row| query.matches(&row.entity))
            .collect();

        if let Some(order) = &query.order {
            matched.sort_by(|a, b| {
                let ord = a
                    .entity
                    .field(order.field)
                    .cmp(&b.entity.field(order.field))
                    .then(a.seq.cmp(&b.seq));
                match order.direction {
                    Direction::Asc => ord,
                    Direction::Desc => ord.reverse(),
                }
            });
        }

        let limit = query.limit.unwrap_or(usize::MAX);
        matched
            .into_iter()
            .take(limit)
            .map(|row| row.entity.clone())
            .collect()
    }
}

impl<E: Entity> Default for InMemoryStore<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<E: Entity> EntityStore<E> for InMemoryStore<E> {
    async fn insert(&self, entity: E) -> StoreResult<E> {
        let mut rows = self.rows.write().await;

        if rows.iter().any(|row| row.entity.id() == entity.id()) {
            return Err(StoreError::unique_violation(E::COLLECTION, "id"));
        }
        if let Some(field) = Self::unique_conflict(&rows, &entity, None) {
            return Err(StoreError::unique_violation(E::COLLECTION, field));
        }

        rows.push(Row {
            seq: self.next_sequence(),
            entity: entity.clone(),
        });
        Ok(entity)
    }

    async fn find_one(&self, query: &Query) -> StoreResult<Option<E>> {
        let rows = self.rows.read().await;
        let query = query.clone().limit(1);
        Ok(Self::select(&rows, &query).into_iter().next())
    }

    async fn get(&self, id: Uuid) -> StoreResult<Option<E>> {
        let rows = self.rows.read().await;
        Ok(rows
            .iter()
            .find(|row| row.entity.id() == id)
            .map(|row| row.entity.clone()))
    }

    async fn update(&self, entity: E) -> StoreResult<E> {
        let mut rows = self.rows.write().await;
        Self::replace(&mut rows, &entity, None)?;
        Ok(entity)
    }

    async fn update_if(&self, entity: E, condition: &Query) -> StoreResult<Option<E>> {
        let mut rows = self.rows.write().await;
        let written = Self::replace(&mut rows, &entity, Some(condition))?;
        Ok(written.then_some(entity))
    }

    async fn list_all(&self, query: &Query) -> StoreResult<Vec<E>> {
        let rows = self.rows.read().await;
        Ok(Self::select(&rows, query))
    }
}
