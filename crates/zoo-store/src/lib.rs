//! Time-series store trait with in-memory and SQLite implementations.

mod memory;

#[cfg(feature = "sqlite")]
mod sqlite;

pub use memory::InMemoryTimeSeriesStore;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteTimeSeriesStore;
pub use zoo_types::{StoreError, StoreSession, TimeSeriesStore};
