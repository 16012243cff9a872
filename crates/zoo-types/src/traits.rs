//! Traits for the entity registry and the time-series store.

use crate::{Animal, AuditRecord, NewAnimal, RangeQuery, TagEventRow};
use async_trait::async_trait;

/// Entity registry: CRUD over animals keyed by integer id.
///
/// Contract: `get` and `delete` return `Ok(None)` when the id is unknown. The API layer maps
/// `Ok(None)` to HTTP 404.
#[async_trait]
pub trait EntityRegistry: Send + Sync {
    /// Store a new animal under the next unused id.
    async fn create(&self, animal: NewAnimal) -> Result<Animal, RegistryError>;

    /// Get one animal by id.
    async fn get(&self, id: i64) -> Result<Option<Animal>, RegistryError>;

    /// Replace type and name for `animal.id`. Inserts when the id is absent.
    async fn update(&self, animal: Animal) -> Result<Animal, RegistryError>;

    /// Remove an animal; returns the removed entity.
    async fn delete(&self, id: i64) -> Result<Option<Animal>, RegistryError>;
}

/// Relational time-series store. Each call to `open` acquires one connection, released
/// when the returned session is dropped.
#[async_trait]
pub trait TimeSeriesStore: Send + Sync {
    async fn open(&self) -> Result<Box<dyn StoreSession>, StoreError>;
}

/// One open store connection.
#[async_trait]
pub trait StoreSession: Send {
    /// Rows matching `query`, ordered by tag id then timestamp ascending.
    async fn fetch_events(&mut self, query: &RangeQuery) -> Result<Vec<TagEventRow>, StoreError>;

    /// Append one audit record.
    async fn insert_audit(&mut self, record: &AuditRecord) -> Result<(), StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("registry error: {0}")]
    Other(String),
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store connection failed: {0}")]
    Connect(String),
    #[error("store query failed: {0}")]
    Query(String),
    #[error("store query timed out after {0:?}")]
    Timeout(std::time::Duration),
    #[error("store error: {0}")]
    Other(String),
}
