//! WAL replay and segment discovery run once, on [`Engine::new`][crate::Engine::new].
//!
//! There is no persisted manifest of segment files: each segment's filename
//! already encodes its own `[min_ts, max_ts]` range, so the set of segments
//! is just whatever `.nano` files happen to be in the data directory.

use anyhow::Result;
use memtable::MemTable;
use std::path::{Path, PathBuf};
use wal::{WalError, WalReader};

/// A discovered, unopened segment file and the time range its filename claims.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentHandle {
    pub path: PathBuf,
    pub min_ts: i64,
    pub max_ts: i64,
}

/// Parses a `log_{min_ts}_{max_ts}.nano` filename into its time range.
///
/// Returns `None` for anything that doesn't match, including the WAL file
/// and leftover `.tmp` files, so callers can simply filter a directory
/// listing through this function.
pub fn parse_segment_filename(name: &str) -> Option<(i64, i64)> {
    let stem = name.strip_prefix("log_")?.strip_suffix(".nano")?;
    let (min_s, max_s) = stem.split_once('_')?;
    let min_ts: i64 = min_s.parse().ok()?;
    let max_ts: i64 = max_s.parse().ok()?;
    Some((min_ts, max_ts))
}

/// Scans `data_dir` for segment files, returning them newest first (by
/// descending `min_ts`). A missing directory is treated as no segments
/// rather than an error, so a freshly-initialized engine can call this
/// before anything has ever been sealed.
pub fn list_segments(data_dir: &Path) -> Result<Vec<SegmentHandle>> {
    let entries = match std::fs::read_dir(data_dir) {
        Ok(rd) => rd,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut handles = Vec::new();
    for entry in entries {
        let entry = entry?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if let Some((min_ts, max_ts)) = parse_segment_filename(name) {
            handles.push(SegmentHandle { path: entry.path(), min_ts, max_ts });
        }
    }
    handles.sort_by(|a, b| b.min_ts.cmp(&a.min_ts));
    Ok(handles)
}

/// Removes any `*.nano.tmp` files left behind by a seal that crashed between
/// writing and renaming. Best-effort: a failure to remove one is logged and
/// skipped rather than propagated, since it doesn't block startup.
pub fn cleanup_tmp_files(data_dir: &Path) {
    let Ok(entries) = std::fs::read_dir(data_dir) else { return };
    for entry in entries.flatten() {
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if name.ends_with(".nano.tmp") {
            if let Err(e) = std::fs::remove_file(entry.path()) {
                tracing::warn!(path = %entry.path().display(), error = %e, "failed to remove leftover tmp segment");
            }
        }
    }
}

/// Rebuilds a memtable from the WAL. A missing WAL file (first ever startup)
/// yields an empty memtable rather than an error.
pub fn replay_wal_into_memtable(wal_path: &Path) -> Result<MemTable> {
    let mem = MemTable::new();
    let mut reader = match WalReader::open(wal_path) {
        Ok(r) => r,
        Err(WalError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => return Ok(mem),
        Err(e) => return Err(e.into()),
    };
    for row in reader.replay()? {
        mem.append(row);
    }
    Ok(mem)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_filename() {
        assert_eq!(parse_segment_filename("log_100_200.nano"), Some((100, 200)));
        assert_eq!(parse_segment_filename("log_-5_5.nano"), Some((-5, 5)));
    }

    #[test]
    fn rejects_malformed_filenames() {
        assert_eq!(parse_segment_filename("wal.log"), None);
        assert_eq!(parse_segment_filename("log_100_200.nano.tmp"), None);
        assert_eq!(parse_segment_filename("log_abc_def.nano"), None);
        assert_eq!(parse_segment_filename("log_100.nano"), None);
    }

    #[test]
    fn list_segments_on_missing_dir_is_empty() {
        let handles = list_segments(Path::new("/tmp/nanolog-does-not-exist-xyz")).unwrap();
        assert!(handles.is_empty());
    }
}
