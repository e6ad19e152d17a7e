//! Persistent, cross-restart counters, plus the combined live+sealed view
//! served by `GET /api/stats`.
//!
//! Replaces the teacher's text manifest: there is no segment list to persist
//! here (see [`crate::recovery`]), only aggregate counts that would otherwise
//! be lost every time a memtable is sealed and reset.

use anyhow::{Context as _, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::Engine;

const STATS_FILENAME: &str = ".nanolog.stats";
const STATS_TMP_FILENAME: &str = ".nanolog.stats.tmp";

/// Cumulative counters over every row this engine has ever sealed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatTotals {
    pub total_logs: u64,
    pub total_bytes: u64,
    pub level_dist: [u64; 6],
    pub service_counts: BTreeMap<String, u64>,
}

/// JSON-backed, atomically-persisted store of [`StatTotals`].
pub struct PersistentStats {
    path: PathBuf,
    pub totals: StatTotals,
}

impl PersistentStats {
    /// Loads `data_dir/.nanolog.stats`, or starts from zero if it doesn't
    /// exist yet.
    pub fn load_or_create(data_dir: &Path) -> Result<Self> {
        let path = data_dir.join(STATS_FILENAME);
        let totals = match fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes).context("failed to parse stats file")?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => StatTotals::default(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self { path, totals })
    }

    /// Folds a just-sealed memtable's counts into the running totals.
    /// Does not persist; call [`save`](Self::save) afterward.
    pub fn record_seal(&mut self, row_count: u64, byte_size: u64, level_dist: [u64; 6], service_counts: &BTreeMap<String, u64>) {
        self.totals.total_logs += row_count;
        self.totals.total_bytes += byte_size;
        for (slot, count) in level_dist.iter().enumerate() {
            self.totals.level_dist[slot] += count;
        }
        for (service, count) in service_counts {
            *self.totals.service_counts.entry(service.clone()).or_insert(0) += count;
        }
    }

    /// Writes the current totals to disk via write-temp-then-rename, the
    /// same atomic pattern segment files use.
    pub fn save(&self) -> Result<()> {
        let tmp_path = self.path.with_file_name(STATS_TMP_FILENAME);
        let mut file = File::create(&tmp_path)?;
        serde_json::to_writer(&mut file, &self.totals).context("failed to serialize stats")?;
        file.flush()?;
        file.sync_all()?;
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

/// Combined live-memtable-plus-persisted view returned by `GET /api/stats`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SystemStats {
    pub ingestion_rate: f64,
    pub total_logs: u64,
    pub disk_usage: u64,
    pub level_dist: [u64; 6],
    pub top_services: BTreeMap<String, u64>,
}

fn directory_byte_usage(dir: &Path) -> u64 {
    let Ok(entries) = fs::read_dir(dir) else { return 0 };
    entries
        .flatten()
        .filter_map(|entry| entry.metadata().ok())
        .filter(|meta| meta.is_file())
        .map(|meta| meta.len())
        .sum()
}

impl Engine {
    /// Combines the live memtable's counters with persisted totals from
    /// already-sealed segments, so `top_services` reflects buffered rows too.
    pub fn stats(&self) -> Result<SystemStats> {
        let mem = self.current_memtable().stats_snapshot();
        let persisted = self.stats.lock().expect("stats lock poisoned");

        let mut level_dist = persisted.totals.level_dist;
        for (slot, count) in mem.level_dist.iter().enumerate() {
            level_dist[slot] += count;
        }

        let mut top_services = persisted.totals.service_counts.clone();
        for (service, count) in &mem.service_counts {
            *top_services.entry(service.clone()).or_insert(0) += count;
        }

        Ok(SystemStats {
            ingestion_rate: mem.ingest_rate,
            total_logs: persisted.totals.total_logs + mem.row_count,
            disk_usage: directory_byte_usage(&self.data_dir),
            level_dist,
            top_services,
        })
    }
}
