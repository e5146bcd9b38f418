use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::PathBuf;

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::{info, warn};

use crate::error::{StorageResult, StoreError};
use crate::record::{LogRecord, RecordFilter};
use crate::traits::LogStorage;

/// Configuration for the file-backed engine.
#[derive(Debug, Clone)]
pub struct FileStorageOptions {
    /// Path of the single append file holding all record frames.
    pub path: PathBuf,
    /// Whether to sync data to disk after each write.
    pub sync_on_write: bool,
}

impl Default for FileStorageOptions {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./data/session.log"),
            sync_on_write: true,
        }
    }
}

impl FileStorageOptions {
    pub fn with_path<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }
}

struct FileInner {
    file: File,
    /// In-memory mirror of the file contents, kept sorted oldest first.
    records: Vec<LogRecord>,
}

/// File-backed engine: one append file of u32-length-prefixed bincode
/// frames, replayed on open. Deletes compact by rewriting the whole file,
/// which is fine at the record counts a bounded debug log runs at.
///
/// A torn or garbage tail (e.g. after a crash mid-append) is not an error:
/// the valid prefix is kept and the file is truncated at the last good
/// frame boundary.
pub struct FileStorage {
    options: FileStorageOptions,
    inner: RwLock<FileInner>,
}

impl FileStorage {
    pub fn open(options: FileStorageOptions) -> StorageResult<Self> {
        if let Some(parent) = options.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(StoreError::Open)?;
            }
        }

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&options.path)
            .map_err(StoreError::Open)?;

        let (mut records, valid_len, file_len) = replay(&mut file)?;
        if valid_len < file_len {
            warn!(
                path = %options.path.display(),
                valid_len,
                file_len,
                "truncating corrupt tail of log file"
            );
            file.set_len(valid_len).map_err(StoreError::Open)?;
        }
        records.sort_by_key(LogRecord::sort_key);

        info!(
            path = %options.path.display(),
            records = records.len(),
            "opened file log storage"
        );

        Ok(Self {
            options,
            inner: RwLock::new(FileInner { file, records }),
        })
    }

    fn append_frame(&self, inner: &mut FileInner, record: &LogRecord) -> StorageResult<()> {
        let payload = bincode::serialize(record)?;
        let mut frame = Vec::with_capacity(4 + payload.len());
        frame.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        frame.extend_from_slice(&payload);

        inner
            .file
            .seek(SeekFrom::End(0))
            .map_err(StoreError::Write)?;
        inner.file.write_all(&frame).map_err(StoreError::Write)?;
        if self.options.sync_on_write {
            inner.file.sync_data().map_err(StoreError::Write)?;
        }
        Ok(())
    }

    /// Rewrites the file from the in-memory mirror. Used after deletes.
    fn rewrite(&self, inner: &mut FileInner) -> StorageResult<()> {
        let mut buf = Vec::new();
        for record in &inner.records {
            let payload = bincode::serialize(record)?;
            buf.extend_from_slice(&(payload.len() as u32).to_le_bytes());
            buf.extend_from_slice(&payload);
        }

        inner.file.set_len(0).map_err(StoreError::Delete)?;
        inner
            .file
            .seek(SeekFrom::Start(0))
            .map_err(StoreError::Delete)?;
        inner.file.write_all(&buf).map_err(StoreError::Delete)?;
        if self.options.sync_on_write {
            inner.file.sync_data().map_err(StoreError::Delete)?;
        }
        Ok(())
    }
}

/// Reads back every intact frame. Returns the records, the offset of the
/// last intact frame boundary, and the total file length.
fn replay(file: &mut File) -> StorageResult<(Vec<LogRecord>, u64, u64)> {
    let mut buf = Vec::new();
    file.seek(SeekFrom::Start(0)).map_err(StoreError::Open)?;
    file.read_to_end(&mut buf).map_err(StoreError::Open)?;

    let mut records = Vec::new();
    let mut offset = 0usize;
    while buf.len() - offset >= 4 {
        let len = u32::from_le_bytes(buf[offset..offset + 4].try_into().unwrap()) as usize;
        if buf.len() - offset - 4 < len {
            break;
        }
        match bincode::deserialize::<LogRecord>(&buf[offset + 4..offset + 4 + len]) {
            Ok(record) => {
                records.push(record);
                offset += 4 + len;
            }
            Err(e) => {
                warn!(offset, "undecodable record frame: {}", e);
                break;
            }
        }
    }

    Ok((records, offset as u64, buf.len() as u64))
}

#[async_trait]
impl LogStorage for FileStorage {
    async fn insert_one(&self, record: LogRecord) -> StorageResult<()> {
        let mut inner = self.inner.write();
        self.append_frame(&mut inner, &record)?;
        let pos = inner
            .records
            .partition_point(|r| r.sort_key() <= record.sort_key());
        inner.records.insert(pos, record);
        Ok(())
    }

    async fn query_page(
        &self,
        filter: &RecordFilter,
        offset: usize,
        limit: usize,
    ) -> StorageResult<Vec<LogRecord>> {
        let inner = self.inner.read();
        Ok(inner
            .records
            .iter()
            .rev()
            .filter(|r| filter.matches(r))
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn delete_oldest(&self, count: usize) -> StorageResult<usize> {
        let mut inner = self.inner.write();
        let removed = count.min(inner.records.len());
        if removed == 0 {
            return Ok(0);
        }
        inner.records.drain(..removed);
        self.rewrite(&mut inner)?;
        Ok(removed)
    }

    async fn delete_all(&self) -> StorageResult<()> {
        let mut inner = self.inner.write();
        inner.records.clear();
        inner.file.set_len(0).map_err(StoreError::Delete)?;
        if self.options.sync_on_write {
            inner.file.sync_data().map_err(StoreError::Delete)?;
        }
        Ok(())
    }

    async fn count(&self) -> StorageResult<usize> {
        Ok(self.inner.read().records.len())
    }

    async fn last_id(&self) -> StorageResult<u64> {
        Ok(self
            .inner
            .read()
            .records
            .iter()
            .map(|r| r.id.0)
            .max()
            .unwrap_or(0))
    }
}
