//! In-memory entity store backend for grantwell.
//!
//! This crate provides an in-memory implementation of the `EntityStore` trait
//! from `grantwell-store`. It backs the test suites and embedded deployments
//! that do not need persistence.
//!
//! # Example
//!
//! ```ignore
//! use grantwell_store_memory::InMemoryStore;
//! use grantwell_store::{EntityStore, Filter, Query};
//!
//! let store = InMemoryStore::<AccessToken>::new();
//! store.insert(token).await?;
//! let found = store.find_one(&Query::new().filter(Filter::eq("token", value))).await?;
//! ```

pub mod store;

pub use grantwell_store::{EntityStore, StoreError};
pub use store::InMemoryStore;

/// Creates a new in-memory store behind a shareable trait object.
pub fn create_store<E: grantwell_store::Entity>() -> grantwell_store::DynStore<E> {
    std::sync::Arc::new(InMemoryStore::<E>::new())
}
