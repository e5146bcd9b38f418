//! Bounded session log store for in-app diagnostics.
//!
//! A [`BoundedLogStore`] accepts log records from any number of concurrent
//! producers, keeps the persisted set under a fixed cap by evicting the
//! oldest records, and serves paginated, severity- and keyword-filtered
//! reads newest first. All storage access is serialized through a single
//! worker task, so a clear never interleaves with a fetch.
//!
//! Two engines ship with the crate: [`storage::MemoryStorage`] (default)
//! and [`storage::FileStorage`], a single-file durable engine. Anything
//! implementing [`LogStorage`] plugs in at the same seam.
//!
//! ```rust,ignore
//! let store = BoundedLogStore::with_max_items(1000);
//! store.insert(Level::Info, "auth", "token refreshed");
//! let page = store.read(Level::Info, None, PageDirection::Forward).await;
//! ```

pub mod error;
pub mod record;
pub mod session;
pub mod storage;
pub mod store;
pub mod traits;

pub use error::{StorageResult, StoreError};
pub use record::{Level, LogRecord, RecordFilter, RecordId};
pub use session::{FetchSession, PageDirection};
pub use store::{BoundedLogStore, BoundedLogStoreOptions, InsertRequest, StoreOp};
pub use traits::LogStorage;
