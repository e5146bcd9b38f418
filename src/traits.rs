use async_trait::async_trait;

use crate::error::StorageResult;
use crate::record::{LogRecord, RecordFilter};

/// The seam between the bounded store and a concrete persistence engine.
///
/// Implementors must be safe to call from multiple threads, though the store
/// funnels every call through a single worker task so operations never
/// interleave mid-transaction. The ordering contract:
///
/// - `query_page` returns matching records newest first (timestamp
///   descending, ties broken by id descending), starting at `offset`,
///   at most `limit` records.
/// - `delete_oldest` removes the `count` oldest records (timestamp
///   ascending, ties by id ascending) and returns how many were removed.
#[async_trait]
pub trait LogStorage: Send + Sync {
    /// Persist one record.
    async fn insert_one(&self, record: LogRecord) -> StorageResult<()>;

    /// Fetch a newest-first page of records matching `filter`.
    async fn query_page(
        &self,
        filter: &RecordFilter,
        offset: usize,
        limit: usize,
    ) -> StorageResult<Vec<LogRecord>>;

    /// Remove up to `count` oldest records. Returns the number removed.
    async fn delete_oldest(&self, count: usize) -> StorageResult<usize>;

    /// Remove every record.
    async fn delete_all(&self) -> StorageResult<()>;

    /// Number of persisted records.
    async fn count(&self) -> StorageResult<usize>;

    /// Highest record id ever persisted, or 0 when empty. Used to seed the
    /// store's id sequence after reopening durable storage.
    async fn last_id(&self) -> StorageResult<u64>;
}
