//! Resource stores
//!
//! A store translates CRUD calls into document operations for one entity.
//! [`MongoStore`] backs production; [`MemoryStore`] serves development runs
//! without a database and the test suite.

pub mod memory;
pub mod mongo;

use async_trait::async_trait;
use bson::oid::ObjectId;
use chrono::{DateTime, Utc};

use crate::resource::{Page, PageRequest, Record, Resource};
use crate::types::Result;

pub use memory::MemoryStore;
pub use mongo::MongoStore;

/// Repository contract shared by every entity
#[async_trait]
pub trait ResourceStore<R: Resource>: Send + Sync {
    /// Assign identity and timestamps, persist, return the stored record
    async fn create(&self, body: R) -> Result<Record<R>>;

    /// Filtered page in the entity's sort order, with the unpaginated total
    async fn find_page(&self, filter: &R::Filter, page: PageRequest) -> Result<Page<R>>;

    async fn find_by_id(&self, id: &ObjectId) -> Result<Option<Record<R>>>;

    /// Overwrite all mutable fields and the update timestamp.
    ///
    /// Returns `false` when no record matched `id`.
    async fn update(&self, id: &ObjectId, body: &R, updated_at: DateTime<Utc>) -> Result<bool>;

    /// Returns `false` when no record matched `id`
    async fn delete(&self, id: &ObjectId) -> Result<bool>;
}
