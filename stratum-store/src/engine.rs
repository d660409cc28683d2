use async_trait::async_trait;

use crate::error::Result;
use crate::record::HistoryRecord;

#[cfg(feature = "memory")]
mod memory;
#[cfg(any(feature = "pg", feature = "sqlite", feature = "mysql"))]
mod sql;

#[cfg(feature = "memory")]
pub use memory::*;
#[cfg(any(feature = "pg", feature = "sqlite", feature = "mysql"))]
pub use sql::*;

/// Storage backend for the migration history collection.
///
/// `add` and `remove_most_recent` are read-check-write composites; each
/// implementation runs them atomically inside its own execution scope.
#[async_trait]
pub trait Engine: Send + Sync {
    /// Creates the history table when missing. Idempotent.
    async fn prepare(&mut self) -> Result<()>;

    /// Inserts one record after verifying its identifier sorts strictly
    /// after the most recent recorded one.
    async fn add(&mut self, record: HistoryRecord) -> Result<()>;

    /// Every recorded identifier for the context, unordered.
    async fn ids(&mut self, context_name: &str) -> Result<Vec<String>>;

    /// The byte-wise greatest recorded identifier.
    async fn most_recent_id(&mut self, context_name: &str) -> Result<Option<String>>;

    /// Deletes the most recent record. `false` when history is empty.
    async fn remove_most_recent(&mut self, context_name: &str) -> Result<bool>;

    /// Full history rows ordered by identifier.
    async fn records(&mut self, context_name: &str) -> Result<Vec<HistoryRecord>>;
}
