//! # grantwell-store
//!
//! Entity store abstraction layer for grantwell.
//!
//! This crate defines the traits and types that every store backend must
//! implement. It does not contain any implementations - those are provided by
//! separate crates (`grantwell-store-memory`).
//!
//! ## Overview
//!
//! - [`Entity`] describes a record type: its collection, unique fields and
//!   named field values.
//! - [`EntityStore`] is the contract: `insert`, `find_one`, `update` and
//!   `list_all`.
//! - [`Query`] is a conjunction of [`Filter`]s with an optional [`OrderBy`].

mod error;
mod traits;
mod types;

pub use error::StoreError;
pub use traits::{Entity, EntityStore};
pub use types::{Direction, FieldValue, Filter, OrderBy, Query};

/// Type alias for a store result.
pub type StoreResult<T> = Result<T, StoreError>;

/// Type alias for a shareable store trait object.
pub type DynStore<E> = std::sync::Arc<dyn EntityStore<E>>;
