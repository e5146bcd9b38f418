use async_trait::async_trait;
use parking_lot::RwLock;

use crate::error::StorageResult;
use crate::record::{LogRecord, RecordFilter};
use crate::traits::LogStorage;

/// In-memory engine. Records live in a vector kept sorted oldest first, so
/// eviction is a drain from the front and reads iterate in reverse.
///
/// The default engine; also what the store tests run against.
#[derive(Default)]
pub struct MemoryStorage {
    records: RwLock<Vec<LogRecord>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LogStorage for MemoryStorage {
    async fn insert_one(&self, record: LogRecord) -> StorageResult<()> {
        let mut records = self.records.write();
        // Inserts normally arrive in timestamp order; the partition point
        // keeps the vector sorted even if the wall clock steps backwards.
        let pos = records.partition_point(|r| r.sort_key() <= record.sort_key());
        records.insert(pos, record);
        Ok(())
    }

    async fn query_page(
        &self,
        filter: &RecordFilter,
        offset: usize,
        limit: usize,
    ) -> StorageResult<Vec<LogRecord>> {
        let records = self.records.read();
        Ok(records
            .iter()
            .rev()
            .filter(|r| filter.matches(r))
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn delete_oldest(&self, count: usize) -> StorageResult<usize> {
        let mut records = self.records.write();
        let removed = count.min(records.len());
        records.drain(..removed);
        Ok(removed)
    }

    async fn delete_all(&self) -> StorageResult<()> {
        self.records.write().clear();
        Ok(())
    }

    async fn count(&self) -> StorageResult<usize> {
        Ok(self.records.read().len())
    }

    async fn last_id(&self) -> StorageResult<u64> {
        Ok(self
            .records
            .read()
            .iter()
            .map(|r| r.id.0)
            .max()
            .unwrap_or(0))
    }
}
