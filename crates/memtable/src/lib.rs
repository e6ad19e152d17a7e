//! # MemTable
//!
//! An in-memory, append-only, columnar write buffer sitting in front of the
//! sealed on-disk segments.
//!
//! Every ingested row is appended to six parallel columns behind a single
//! `RwLock`, rather than a `BTreeMap` keyed by a sort key — there is no notion
//! of key order here, only arrival order and timestamp. Reads (`search`) take
//! the read lock and scan; writes (`append`) take the write lock. A running
//! byte-size counter tells the engine when to seal the table into a segment
//! and swap in a fresh one.
//!
//! ## Example
//! ```rust
//! use memtable::MemTable;
//! use ql::{Filter, Level, LogRow};
//!
//! let mt = MemTable::new();
//! mt.append(LogRow {
//!     timestamp: 1,
//!     level: Level::Info,
//!     service: "api".to_string(),
//!     host: "h1".to_string(),
//!     message: "started".to_string(),
//!     trace_id: None,
//! });
//! assert_eq!(mt.len(), 1);
//! let rows = mt.search(&Filter::match_all(), None, 10);
//! assert_eq!(rows.len(), 1);
//! ```

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use ql::{evaluate, Filter, Level, LogRow, QlNode};

/// Snapshot of a memtable's current contents, used to build the `GET
/// /api/stats` response and to decide seal eligibility.
#[derive(Debug, Clone, PartialEq)]
pub struct MemTableStats {
    pub row_count: u64,
    pub size_bytes: usize,
    pub min_timestamp: i64,
    pub max_timestamp: i64,
    /// Count of rows per level, indexed by [`level_slot`]. `UNKNOWN` folds
    /// into index 5 here to keep this a dense fixed-size array.
    pub level_dist: [u64; 6],
    /// Count of buffered rows per service, not yet reflected in any sealed
    /// segment's persisted totals.
    pub service_counts: BTreeMap<String, u64>,
    /// Rows ingested per second, averaged over the last full second.
    pub ingest_rate: f64,
}

fn level_slot(level: Level) -> usize {
    match level {
        Level::Debug => 0,
        Level::Info => 1,
        Level::Warn => 2,
        Level::Error => 3,
        Level::Fatal => 4,
        Level::Unknown => 5,
    }
}

struct Columns {
    timestamps: Vec<i64>,
    levels: Vec<Level>,
    services: Vec<String>,
    hosts: Vec<String>,
    messages: Vec<String>,
    trace_ids: Vec<Option<String>>,
    level_dist: [u64; 6],
    service_counts: BTreeMap<String, u64>,
}

impl Columns {
    fn new() -> Self {
        Self {
            timestamps: Vec::new(),
            levels: Vec::new(),
            services: Vec::new(),
            hosts: Vec::new(),
            messages: Vec::new(),
            trace_ids: Vec::new(),
            level_dist: [0; 6],
            service_counts: BTreeMap::new(),
        }
    }

    fn row_at(&self, i: usize) -> LogRow {
        LogRow {
            timestamp: self.timestamps[i],
            level: self.levels[i],
            service: self.services[i].clone(),
            host: self.hosts[i].clone(),
            message: self.messages[i].clone(),
            trace_id: self.trace_ids[i].clone(),
        }
    }
}

/// Tracks a one-second rolling ingest rate with a background ticker that
/// atomically swaps the write counter with zero, so reads never take a lock.
struct RateTracker {
    writes_this_second: AtomicU64,
    last_rate_bits: AtomicU64,
}

impl RateTracker {
    fn new() -> Self {
        Self {
            writes_this_second: AtomicU64::new(0),
            last_rate_bits: AtomicU64::new(0),
        }
    }

    fn record(&self) {
        self.writes_this_second.fetch_add(1, Ordering::Relaxed);
    }

    /// Called once per second by [`run_rate_ticker`].
    fn tick(&self) {
        let count = self.writes_this_second.swap(0, Ordering::Relaxed);
        self.last_rate_bits.store((count as f64).to_bits(), Ordering::Relaxed);
    }

    fn current_rate(&self) -> f64 {
        f64::from_bits(self.last_rate_bits.load(Ordering::Relaxed))
    }
}

/// Runs until `shutdown` is cancelled, ticking `rate` once a second. Mirrors
/// the engine's retention cleaner: a ticking interval raced against a
/// cancellation token inside `select!`.
async fn run_rate_ticker(rate: Arc<RateTracker>, shutdown: CancellationToken) {
    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => rate.tick(),
            _ = shutdown.cancelled() => break,
        }
    }
}

/// The approximate per-row byte cost counted toward `size_bytes`: the
/// variable-length string fields plus a fixed overhead for the scalar columns.
fn row_size(row: &LogRow) -> usize {
    row.service.len()
        + row.host.len()
        + row.message.len()
        + row.trace_id.as_deref().map_or(0, str::len)
        + 8 // timestamp
        + 1 // level
}

/// An in-memory, columnar write buffer holding not-yet-sealed rows.
pub struct MemTable {
    columns: RwLock<Columns>,
    size_bytes: AtomicUsize,
    row_count: AtomicU64,
    min_ts: AtomicI64,
    max_ts: AtomicI64,
    rate: Arc<RateTracker>,
    rate_ticker_shutdown: CancellationToken,
}

impl Default for MemTable {
    fn default() -> Self {
        Self::new()
    }
}

impl MemTable {
    /// Creates a new, empty memtable.
    ///
    /// If called from within a Tokio runtime, spawns the background rate
    /// ticker; outside one (plain unit tests, for instance) the ingest rate
    /// simply stays at its last-ticked value, since there is no runtime to
    /// run a ticker on.
    pub fn new() -> Self {
        let rate = Arc::new(RateTracker::new());
        let rate_ticker_shutdown = CancellationToken::new();
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(run_rate_ticker(rate.clone(), rate_ticker_shutdown.clone()));
        }
        Self {
            columns: RwLock::new(Columns::new()),
            size_bytes: AtomicUsize::new(0),
            row_count: AtomicU64::new(0),
            min_ts: AtomicI64::new(i64::MAX),
            max_ts: AtomicI64::new(i64::MIN),
            rate,
            rate_ticker_shutdown,
        }
    }

    /// Appends a row to the write buffer. Never rejects a row: an unparsed
    /// level has already become `Level::Unknown` upstream, not an error here.
    pub fn append(&self, row: LogRow) {
        let size = row_size(&row);
        let ts = row.timestamp;
        let slot = level_slot(row.level);

        {
            let mut cols = self.columns.write().expect("memtable lock poisoned");
            cols.timestamps.push(ts);
            cols.levels.push(row.level);
            *cols.service_counts.entry(row.service.clone()).or_insert(0) += 1;
            cols.services.push(row.service);
            cols.hosts.push(row.host);
            cols.messages.push(row.message);
            cols.trace_ids.push(row.trace_id);
            cols.level_dist[slot] += 1;
        }

        self.size_bytes.fetch_add(size, Ordering::Relaxed);
        self.row_count.fetch_add(1, Ordering::Relaxed);
        self.min_ts.fetch_min(ts, Ordering::Relaxed);
        self.max_ts.fetch_max(ts, Ordering::Relaxed);
        self.rate.record();
    }

    /// Number of rows currently buffered.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.row_count.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Approximate byte size of the buffered rows.
    #[must_use]
    pub fn size_bytes(&self) -> usize {
        self.size_bytes.load(Ordering::Relaxed)
    }

    /// Smallest timestamp buffered, or `i64::MAX` if empty.
    #[must_use]
    pub fn min_timestamp(&self) -> i64 {
        self.min_ts.load(Ordering::Relaxed)
    }

    /// Largest timestamp buffered, or `i64::MIN` if empty.
    #[must_use]
    pub fn max_timestamp(&self) -> i64 {
        self.max_ts.load(Ordering::Relaxed)
    }

    /// Scans the buffer for rows matching `filter`'s scalar predicates and
    /// `query`'s QL predicate, most recent first, capped at `limit` rows.
    ///
    /// Skips the scan entirely if the buffer's timestamp range cannot
    /// intersect the filter's time window.
    pub fn search(&self, filter: &Filter, query: Option<&QlNode>, limit: usize) -> Vec<LogRow> {
        let cols = self.columns.read().expect("memtable lock poisoned");
        if cols.timestamps.is_empty() {
            return Vec::new();
        }
        let (min_ts, max_ts) = (self.min_timestamp(), self.max_timestamp());
        if !filter.intersects(min_ts, max_ts) {
            return Vec::new();
        }

        let mut out = Vec::new();
        for i in (0..cols.timestamps.len()).rev() {
            if out.len() >= limit {
                break;
            }
            let row = cols.row_at(i);
            if filter.matches_scalars(&row) && evaluate(query, &row) {
                out.push(row);
            }
        }
        out
    }

    /// A point-in-time snapshot of counters, for `GET /api/stats` and seal
    /// decisions.
    pub fn stats_snapshot(&self) -> MemTableStats {
        let cols = self.columns.read().expect("memtable lock poisoned");
        MemTableStats {
            row_count: self.len(),
            size_bytes: self.size_bytes(),
            min_timestamp: self.min_timestamp(),
            max_timestamp: self.max_timestamp(),
            level_dist: cols.level_dist,
            service_counts: cols.service_counts.clone(),
            ingest_rate: self.rate.current_rate(),
        }
    }

    /// Clears the buffer in place, for reuse after a seal swap.
    pub fn reset(&self) {
        let mut cols = self.columns.write().expect("memtable lock poisoned");
        *cols = Columns::new();
        self.size_bytes.store(0, Ordering::Relaxed);
        self.row_count.store(0, Ordering::Relaxed);
        self.min_ts.store(i64::MAX, Ordering::Relaxed);
        self.max_ts.store(i64::MIN, Ordering::Relaxed);
    }
}

impl Drop for MemTable {
    fn drop(&mut self) {
        self.rate_ticker_shutdown.cancel();
    }
}

impl std::fmt::Debug for MemTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemTable")
            .field("row_count", &self.len())
            .field("size_bytes", &self.size_bytes())
            .finish()
    }
}

#[cfg(test)]
mod tests;
