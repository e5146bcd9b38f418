use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use crate::record::{Level, LogRecord, RecordId};
use crate::session::{FetchSession, PageDirection};
use crate::storage::MemoryStorage;
use crate::traits::LogStorage;

/// Tuning knobs for the bounded store.
#[derive(Debug, Clone)]
pub struct BoundedLogStoreOptions {
    /// Hard cap on persisted records. Reaching it evicts the oldest 20%
    /// (at least one record) before the next insert lands.
    pub max_items_count: usize,
    /// Records per read page.
    pub page_size: usize,
    /// How many queued operations the worker drains per wakeup.
    pub batch_size: usize,
}

impl Default for BoundedLogStoreOptions {
    fn default() -> Self {
        Self {
            max_items_count: 1000,
            page_size: 50,
            batch_size: 100,
        }
    }
}

/// One queued operation. Everything that touches storage travels through
/// this queue, so inserts, reads, evictions and clears never interleave.
pub enum StoreOp {
    Insert(InsertRequest),
    Read {
        max_level: Level,
        keyword: Option<String>,
        direction: PageDirection,
        reply: oneshot::Sender<Vec<LogRecord>>,
    },
    Clear {
        reply: oneshot::Sender<()>,
    },
}

/// Insert payload. The timestamp is taken at the call site; the record id
/// is assigned by the worker when the op is applied.
pub struct InsertRequest {
    pub level: Level,
    pub module: String,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

/// Bounded, paginated, concurrently-writable log store.
///
/// Producers on any thread call [`insert`](Self::insert) fire-and-forget;
/// reads and clears come in sync and async flavors. A single worker task
/// owns the storage handle and the pagination session, so the count check,
/// eviction and append of each insert form one serialized unit.
///
/// This is a best-effort diagnostic facility: storage failures are logged
/// and swallowed, never surfaced to the caller.
#[derive(Clone)]
pub struct BoundedLogStore {
    options: BoundedLogStoreOptions,
    storage: Arc<dyn LogStorage>,
    // Running record count for eviction decisions, guarded independently of
    // the engine's own serialization so it reads consistently from any
    // thread (see approximate_len).
    counter: Arc<Mutex<usize>>,
    op_sender: mpsc::UnboundedSender<StoreOp>,
}

impl BoundedLogStore {
    /// Create a store over `storage` and return it along with the receiver
    /// that must be passed to [`start`](Self::start).
    pub fn new(
        storage: Arc<dyn LogStorage>,
        mut options: BoundedLogStoreOptions,
    ) -> (Self, mpsc::UnboundedReceiver<StoreOp>) {
        options.max_items_count = options.max_items_count.max(1);
        options.page_size = options.page_size.max(1);
        options.batch_size = options.batch_size.max(1);

        let (tx, rx) = mpsc::unbounded_channel();
        let store = Self {
            options,
            storage,
            counter: Arc::new(Mutex::new(0)),
            op_sender: tx,
        };
        (store, rx)
    }

    /// Convenience constructor matching the one-argument surface most call
    /// sites want: in-memory engine, defaults elsewhere, worker started.
    /// Must be called within a tokio runtime.
    pub fn with_max_items(max_items_count: usize) -> Self {
        let options = BoundedLogStoreOptions {
            max_items_count,
            ..Default::default()
        };
        let (store, rx) = Self::new(Arc::new(MemoryStorage::new()), options);
        store.start(rx);
        store
    }

    /// Spawn the worker task that owns storage access. Operations enqueued
    /// before `start` are processed once it runs.
    pub fn start(&self, receiver: mpsc::UnboundedReceiver<StoreOp>) {
        let worker = StoreWorker {
            storage: self.storage.clone(),
            counter: self.counter.clone(),
            max_items_count: self.options.max_items_count,
            evict_chunk: (self.options.max_items_count / 5).max(1),
            page_size: self.options.page_size,
            next_id: 1,
            session: None,
        };
        let batch_size = self.options.batch_size;
        tokio::spawn(worker.run(receiver, batch_size));
    }

    /// Append one record, fire-and-forget. Safe to call from any thread.
    pub fn insert(&self, level: Level, module: impl Into<String>, text: impl Into<String>) {
        let request = InsertRequest {
            level,
            module: module.into(),
            text: text.into(),
            timestamp: Utc::now(),
        };
        if self.op_sender.send(StoreOp::Insert(request)).is_err() {
            warn!("log record dropped, store worker is gone");
        }
    }

    /// Fetch the next page of records, newest first. The returned future
    /// resumes on the caller's task, so results arrive on the caller's
    /// execution context.
    ///
    /// A changed `max_level` or `keyword` resets pagination to page zero
    /// and `direction` is not applied on that call.
    pub async fn read(
        &self,
        max_level: Level,
        keyword: Option<&str>,
        direction: PageDirection,
    ) -> Vec<LogRecord> {
        let Some(rx) = self.send_read(max_level, keyword, direction) else {
            return Vec::new();
        };
        match rx.await {
            Ok(records) => records,
            Err(_) => {
                warn!("log read reply dropped, returning empty page");
                Vec::new()
            }
        }
    }

    /// Blocking variant of [`read`](Self::read). Must not be called from an
    /// async context; intended for plain producer/inspector threads.
    pub fn read_blocking(
        &self,
        max_level: Level,
        keyword: Option<&str>,
        direction: PageDirection,
    ) -> Vec<LogRecord> {
        let Some(rx) = self.send_read(max_level, keyword, direction) else {
            return Vec::new();
        };
        match rx.blocking_recv() {
            Ok(records) => records,
            Err(_) => {
                warn!("log read reply dropped, returning empty page");
                Vec::new()
            }
        }
    }

    fn send_read(
        &self,
        max_level: Level,
        keyword: Option<&str>,
        direction: PageDirection,
    ) -> Option<oneshot::Receiver<Vec<LogRecord>>> {
        let (tx, rx) = oneshot::channel();
        let op = StoreOp::Read {
            max_level,
            keyword: keyword.map(str::to_owned),
            direction,
            reply: tx,
        };
        if self.op_sender.send(op).is_err() {
            warn!("log read dropped, store worker is gone");
            return None;
        }
        Some(rx)
    }

    /// Delete every record and drop the pagination session. Resolves once
    /// the worker has applied the clear, so no concurrent fetch observes a
    /// partially-cleared set.
    pub async fn clear(&self) {
        if let Some(rx) = self.send_clear() {
            let _ = rx.await;
        }
    }

    /// Blocking variant of [`clear`](Self::clear). Must not be called from
    /// an async context.
    pub fn clear_blocking(&self) {
        if let Some(rx) = self.send_clear() {
            let _ = rx.blocking_recv();
        }
    }

    fn send_clear(&self) -> Option<oneshot::Receiver<()>> {
        let (tx, rx) = oneshot::channel();
        if self.op_sender.send(StoreOp::Clear { reply: tx }).is_err() {
            warn!("log clear dropped, store worker is gone");
            return None;
        }
        Some(rx)
    }

    /// Current record count as tracked for eviction decisions. May lag
    /// storage briefly while inserts are in flight.
    pub fn approximate_len(&self) -> usize {
        *self.counter.lock()
    }

    pub fn options(&self) -> &BoundedLogStoreOptions {
        &self.options
    }
}

struct StoreWorker {
    storage: Arc<dyn LogStorage>,
    counter: Arc<Mutex<usize>>,
    max_items_count: usize,
    evict_chunk: usize,
    page_size: usize,
    next_id: u64,
    session: Option<FetchSession>,
}

impl StoreWorker {
    async fn run(mut self, mut receiver: mpsc::UnboundedReceiver<StoreOp>, batch_size: usize) {
        self.recover().await;

        loop {
            let mut buf = Vec::with_capacity(batch_size);
            let size = receiver.recv_many(&mut buf, batch_size).await;
            if size == 0 {
                debug!("op channel closed, log store worker exiting");
                break;
            }

            for op in buf {
                match op {
                    StoreOp::Insert(request) => self.handle_insert(request).await,
                    StoreOp::Read {
                        max_level,
                        keyword,
                        direction,
                        reply,
                    } => {
                        let page = self
                            .handle_read(max_level, keyword.as_deref(), direction)
                            .await;
                        let _ = reply.send(page);
                    }
                    StoreOp::Clear { reply } => {
                        self.handle_clear().await;
                        let _ = reply.send(());
                    }
                }
            }
        }
    }

    /// Seed the running count and the id sequence from whatever the engine
    /// already holds (relevant after reopening durable storage).
    async fn recover(&mut self) {
        match self.storage.count().await {
            Ok(count) => *self.counter.lock() = count,
            Err(e) => warn!("failed to count existing records, assuming empty: {}", e),
        }
        match self.storage.last_id().await {
            Ok(last) => self.next_id = last + 1,
            Err(e) => warn!("failed to read last record id, restarting sequence: {}", e),
        }
    }

    async fn handle_insert(&mut self, request: InsertRequest) {
        let record = LogRecord {
            id: RecordId(self.next_id),
            timestamp: request.timestamp,
            level: request.level,
            module: request.module,
            text: request.text,
        };
        self.next_id += 1;

        // Count check, eviction and increment are serialized by this worker;
        // the mutex additionally keeps approximate_len consistent for
        // readers on other threads.
        let at_cap = *self.counter.lock() >= self.max_items_count;
        if at_cap {
            match self.storage.delete_oldest(self.evict_chunk).await {
                Ok(removed) => {
                    let mut count = self.counter.lock();
                    *count = count.saturating_sub(removed);
                    debug!(removed, "evicted oldest records at cap");
                }
                // The counter may now disagree with storage; accepted for a
                // best-effort debug facility.
                Err(e) => warn!("failed to evict oldest records: {}", e),
            }
        }

        match self.storage.insert_one(record).await {
            Ok(()) => *self.counter.lock() += 1,
            Err(e) => warn!("dropping log record, write failed: {}", e),
        }
    }

    async fn handle_read(
        &mut self,
        max_level: Level,
        keyword: Option<&str>,
        direction: PageDirection,
    ) -> Vec<LogRecord> {
        // Fresh session and filter-change resync both land on page zero
        // without applying the direction; only a repeat of the same filter
        // moves the cursor.
        let session = match self.session.take() {
            Some(session) if session.matches_filter(max_level, keyword) => {
                session.advance(direction)
            }
            _ => FetchSession::new(max_level, keyword, self.page_size),
        };

        let filter = session.filter();
        let offset = session.offset();
        let limit = session.limit();
        self.session = Some(session);

        match self.storage.query_page(&filter, offset, limit).await {
            Ok(records) => records,
            Err(e) => {
                warn!("log query failed, returning empty page: {}", e);
                Vec::new()
            }
        }
    }

    async fn handle_clear(&mut self) {
        match self.storage.delete_all().await {
            Ok(()) => {
                *self.counter.lock() = 0;
                self.session = None;
            }
            Err(e) => warn!("clear failed, keeping prior records: {}", e),
        }
    }
}
