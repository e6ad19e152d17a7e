//! # Engine — NANOLOG storage engine
//!
//! Ties [`memtable`], [`wal`], and [`segment`] into the ingest/seal/scan core:
//! every row lands in the write-ahead log and the current memtable; once the
//! memtable crosses its byte threshold it is swapped out and sealed into an
//! immutable segment off the ingest path.
//!
//! ## Module responsibilities
//!
//! | Module | Purpose |
//! |---|---|
//! | [`lib.rs`] | `Engine` struct, constructor, accessors, `Debug`, `Drop` |
//! | [`recovery`] | WAL replay, segment directory scan, tmp-file cleanup |
//! | [`ingest`] | `ingest()`, `sync_wal()`, the async seal task |
//! | [`read`] | `scan()` |
//! | [`histogram`] | `histogram()` |
//! | [`context`] | `context()` |
//! | [`stats`] | `PersistentStats`, `stats()` |
//! | [`cleaner`] | `run_cleaner()`, retention-driven segment deletion |
//!
//! ## Crash safety
//!
//! Every row is appended to the WAL before it is visible in the memtable. The
//! WAL is only reset after a successful seal. Segments are written atomically
//! via temp file + rename (see the `segment` crate).

mod cleaner;
mod context;
mod histogram;
mod ingest;
mod read;
mod recovery;
mod stats;

pub use cleaner::run_cleaner;
pub use context::Context;
pub use histogram::HistogramBucket;
pub use recovery::{parse_segment_filename, SegmentHandle};
pub use stats::{PersistentStats, StatTotals, SystemStats};

use anyhow::Result;
use config::EngineConfig;
use memtable::MemTable;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;
use wal::WalWriter;

/// Filename of the write-ahead log within the data directory.
pub const WAL_FILENAME: &str = "wal.log";

/// The central storage engine: the current memtable, WAL writer, persistent
/// stats, and the data directory the sealed segments live in.
///
/// # Write path
/// 1. Append to the WAL.
/// 2. Append to the current memtable (visible to `scan` immediately).
/// 3. If the memtable's `size_bytes()` crosses `flush_threshold`, swap in a
///    fresh one under the engine's write lock and spawn an async seal of the
///    old one.
///
/// # Read path
/// `scan()` checks the current memtable (newest-first), then sealed segments
/// newest-first by filename, collecting matches up to a limit.
///
/// # Recovery
/// On construction ([`Engine::new`]), the WAL is replayed into a fresh
/// memtable and existing `.nano` segments are discovered by directory scan —
/// there is no persisted manifest of segment files, since each filename
/// already carries its own time range.
pub struct Engine {
    pub(crate) data_dir: PathBuf,
    pub(crate) wal_path: PathBuf,
    /// Swappable pointer to the current memtable. Readers take the read lock
    /// just long enough to clone the `Arc`; the swap itself (on seal) takes
    /// the write lock. Columns inside the memtable have their own locking,
    /// so an ordinary append only ever needs the engine's read lock.
    pub(crate) mem: RwLock<Arc<MemTable>>,
    pub(crate) wal: Mutex<WalWriter>,
    pub(crate) stats: Mutex<PersistentStats>,
    pub(crate) flush_threshold: usize,
    pub(crate) retention: Duration,
}

impl Engine {
    /// Opens (or creates) the engine at `config.data_dir`, replaying the WAL
    /// and scanning for existing sealed segments.
    ///
    /// # Recovery steps
    /// 1. Create the data directory if missing.
    /// 2. Clean up leftover `.nano.tmp` files from an interrupted seal.
    /// 3. Replay the WAL into a fresh memtable.
    /// 4. Open the WAL writer in append mode.
    /// 5. Load persistent stats (or start from zero).
    pub fn new(config: &EngineConfig) -> Result<Self> {
        config.validate()?;
        std::fs::create_dir_all(&config.data_dir)?;
        recovery::cleanup_tmp_files(&config.data_dir);

        let wal_path = config.data_dir.join(WAL_FILENAME);
        let mem = recovery::replay_wal_into_memtable(&wal_path)?;
        let wal = WalWriter::create(&wal_path, false)?;
        let stats = PersistentStats::load_or_create(&config.data_dir)?;

        tracing::info!(
            data_dir = %config.data_dir.display(),
            memtable_rows = mem.len(),
            "engine recovered"
        );

        Ok(Self {
            data_dir: config.data_dir.clone(),
            wal_path,
            mem: RwLock::new(Arc::new(mem)),
            wal: Mutex::new(wal),
            stats: Mutex::new(stats),
            flush_threshold: config.flush_threshold,
            retention: config.retention,
        })
    }

    /// The data directory this engine was configured with.
    pub fn data_dir(&self) -> &std::path::Path {
        &self.data_dir
    }

    /// A clone of the pointer to the current memtable.
    pub(crate) fn current_memtable(&self) -> Arc<MemTable> {
        self.mem.read().expect("engine memtable lock poisoned").clone()
    }

    /// Discovers every sealed segment in the data directory, newest first.
    pub(crate) fn segments(&self) -> Result<Vec<SegmentHandle>> {
        recovery::list_segments(&self.data_dir)
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mem = self.current_memtable();
        f.debug_struct("Engine")
            .field("data_dir", &self.data_dir)
            .field("flush_threshold", &self.flush_threshold)
            .field("retention", &self.retention)
            .field("memtable_rows", &mem.len())
            .field("memtable_size_bytes", &mem.size_bytes())
            .finish()
    }
}

/// Best-effort flush on drop: whatever is still buffered in the memtable is
/// sealed so it is not lost. Errors are logged, not propagated — `Drop`
/// cannot return a `Result`, and the rows are still safe in the WAL for the
/// next startup's replay.
impl Drop for Engine {
    fn drop(&mut self) {
        let mem = self.current_memtable();
        if mem.is_empty() {
            return;
        }
        if let Err(e) = ingest::seal_sync(self, &mem) {
            tracing::warn!(error = %e, "final flush on drop failed; rows remain in the WAL");
        }
    }
}

#[cfg(test)]
mod tests;
