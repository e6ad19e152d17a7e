//! The write path: WAL append, memtable append, and the threshold-triggered
//! async seal.

use anyhow::{Context as _, Result};
use memtable::MemTable;
use ql::{Filter, LogRow};
use segment::SegmentWriter;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::Engine;

impl Engine {
    /// Appends `row` to the WAL, then makes it visible in the current
    /// memtable. The timestamp is stored exactly as given — any "default to
    /// now" policy for a missing or zero timestamp is applied upstream, at
    /// the boundary that translates untyped input into a `LogRow`, not here.
    ///
    /// If the memtable crosses `flush_threshold` as a result, a seal is
    /// spawned in the background; `ingest` itself never blocks on it.
    pub fn ingest(self: &Arc<Self>, row: LogRow) -> Result<()> {
        {
            let mut wal = self.wal.lock().expect("wal lock poisoned");
            wal.append(&row).context("failed to append row to WAL")?;
        }

        let mem = self.current_memtable();
        mem.append(row);

        if mem.size_bytes() >= self.flush_threshold {
            self.maybe_seal();
        }
        Ok(())
    }

    /// Forces a fsync of the WAL, for callers that need durability
    /// acknowledged before responding (e.g. a future synchronous-write mode).
    pub fn sync_wal(&self) -> Result<()> {
        self.wal.lock().expect("wal lock poisoned").sync().context("failed to sync WAL")
    }

    /// Re-checks the threshold under the write lock and, if still exceeded,
    /// swaps in a fresh memtable and spawns the seal of the old one.
    ///
    /// The re-check matters because multiple ingesting tasks can race past
    /// the unlocked check in `ingest` at once; only the first to take the
    /// write lock should actually perform the swap.
    fn maybe_seal(self: &Arc<Self>) {
        let old = {
            let mut guard = self.mem.write().expect("engine memtable lock poisoned");
            if guard.size_bytes() < self.flush_threshold {
                return;
            }
            std::mem::replace(&mut *guard, Arc::new(MemTable::new()))
        };

        let engine = Arc::clone(self);
        tokio::spawn(async move {
            if let Err(e) = engine.seal(&old).await {
                tracing::warn!(error = %e, "background seal failed");
            }
        });
    }

    async fn seal(&self, old: &MemTable) -> Result<()> {
        seal_sync(self, old)
    }
}

/// Writes `old`'s rows to a segment file, folds its counts into the
/// persistent stats, and resets the WAL now that its rows are durable on
/// disk in the segment. Shared between the background seal task and the
/// best-effort flush on `Drop`, which cannot be `async`.
pub(crate) fn seal_sync(engine: &Engine, old: &MemTable) -> Result<()> {
    if old.is_empty() {
        return Ok(());
    }

    let rows = old.search(&Filter::match_all(), None, old.len() as usize);
    let min_ts = old.min_timestamp();
    let max_ts = old.max_timestamp();
    let path = engine.data_dir.join(format!("log_{min_ts}_{max_ts}.nano"));

    SegmentWriter::write(&path, &rows).context("failed to write sealed segment")?;

    let mut service_counts: BTreeMap<String, u64> = BTreeMap::new();
    for row in &rows {
        *service_counts.entry(row.service.clone()).or_insert(0) += 1;
    }
    let snapshot = old.stats_snapshot();

    {
        let mut stats = engine.stats.lock().expect("stats lock poisoned");
        stats.record_seal(snapshot.row_count, snapshot.size_bytes as u64, snapshot.level_dist, &service_counts);
        if let Err(e) = stats.save() {
            tracing::warn!(error = %e, "failed to persist stats after seal");
        }
    }

    if let Err(e) = engine.wal.lock().expect("wal lock poisoned").reset() {
        tracing::warn!(error = %e, "failed to reset WAL after seal");
    }

    tracing::info!(rows = rows.len(), path = %path.display(), "sealed memtable into segment");
    Ok(())
}
