use thiserror::Error;

pub type StorageResult<T> = Result<T, StoreError>;

/// Storage-layer failures. Every variant is non-fatal at the public store
/// surface: the store logs it and degrades to an empty result or a no-op,
/// never surfacing an error to the caller.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to open log storage: {0}")]
    Open(#[source] std::io::Error),

    #[error("failed to write log record: {0}")]
    Write(#[source] std::io::Error),

    #[error("failed to read log records: {0}")]
    Read(#[source] std::io::Error),

    #[error("failed to delete log records: {0}")]
    Delete(#[source] std::io::Error),

    #[error("corrupted record frame at offset {offset}: {reason}")]
    Corrupt { offset: u64, reason: String },

    #[error("record serialization failed: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("log store worker channel closed")]
    ChannelClosed,
}
