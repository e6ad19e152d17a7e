use std::fs::{rename, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use ql::LogRow;

use crate::error::SegmentError;
use crate::format::{self, Version};

/// Writes rows to disk as an immutable, columnar, zstd-compressed segment
/// file. Always writes the current `NANOLOG2` (six-block) layout.
///
/// Stateless, like the teacher's `SSTableWriter` — all the work happens in
/// the single static method below.
pub struct SegmentWriter {}

impl SegmentWriter {
    /// Writes `rows` to a new segment file at `path`.
    ///
    /// # Crash Safety
    ///
    /// Writes to `path` with a `.tmp` extension, flushes, calls
    /// `sync_all()`, then atomically renames into place and best-effort
    /// fsyncs the parent directory — the same pattern the on-disk SSTable
    /// writer in this codebase uses.
    ///
    /// # Errors
    ///
    /// Returns [`SegmentError::EmptyInput`] if `rows` is empty. The engine's
    /// seal path never calls this on an empty MemTable, so this is a
    /// defensive guard, not a reachable runtime condition.
    pub fn write(path: &Path, rows: &[LogRow]) -> Result<(), SegmentError> {
        if rows.is_empty() {
            return Err(SegmentError::EmptyInput);
        }

        let tmp_path = path.with_extension("nano.tmp");
        let raw_file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&tmp_path)?;
        let mut file = BufWriter::new(raw_file);
        format::write_magic(&mut file, Version::V2)?;

        let mut min_ts = i64::MAX;
        let mut max_ts = i64::MIN;
        let mut timestamps = Vec::with_capacity(rows.len());
        let mut levels = Vec::with_capacity(rows.len());
        let mut services = Vec::with_capacity(rows.len());
        let mut hosts = Vec::with_capacity(rows.len());
        let mut messages = Vec::with_capacity(rows.len());
        let mut trace_ids = Vec::with_capacity(rows.len());

        for row in rows {
            min_ts = min_ts.min(row.timestamp);
            max_ts = max_ts.max(row.timestamp);
            timestamps.push(row.timestamp);
            levels.push(row.level.as_u8());
            services.push(row.service.clone());
            hosts.push(row.host.clone());
            messages.push(row.message.clone());
            trace_ids.push(row.trace_id.clone());
        }

        format::write_block(&mut file, &format::encode_i64_column(&timestamps))?;
        format::write_block(&mut file, &format::encode_u8_column(&levels))?;
        format::write_block(&mut file, &format::encode_string_column(&services))?;
        format::write_block(&mut file, &format::encode_string_column(&hosts))?;
        format::write_block(&mut file, &format::encode_string_column(&messages))?;
        format::write_block(&mut file, &format::encode_optional_string_column(&trace_ids))?;

        format::write_footer(&mut file, rows.len() as u32, min_ts, max_ts)?;

        file.flush()?;
        file.into_inner().map_err(|e| e.into_error())?.sync_all()?;

        rename(&tmp_path, path)?;

        if let Some(parent) = path.parent() {
            if let Ok(dir) = File::open(parent) {
                let _ = dir.sync_all();
            }
        }

        Ok(())
    }
}
