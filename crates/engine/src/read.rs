//! Read path: `scan()`.
//!
//! Checks the current memtable first (freshest data), then sealed segments
//! newest-first by filename, stopping once `limit` rows have been collected.
//! A malformed QL query is a hard error — it is never silently treated as
//! "no match."

use anyhow::{Context as _, Result};

use crate::Engine;
use ql::Filter;
use ql::LogRow;
use segment::SegmentReader;

impl Engine {
    /// Runs `filter` (scalar predicates plus an optional QL `query`) against
    /// the current memtable and sealed segments, newest data first, up to
    /// `limit` rows.
    ///
    /// Pass `usize::MAX` for an effectively unbounded scan.
    ///
    /// Segments whose footer cannot be read (corruption, partial write that
    /// slipped past cleanup) are logged and skipped rather than causing the
    /// whole scan to fail or being deleted automatically.
    pub fn scan(&self, filter: &Filter, limit: usize) -> Result<Vec<LogRow>> {
        let ast = match filter.query.as_deref() {
            Some(q) => ql::parse(q).with_context(|| format!("invalid query: {q}"))?,
            None => None,
        };

        let mem = self.current_memtable();
        let mut out = mem.search(filter, ast.as_ref(), limit);

        if out.len() >= limit {
            return Ok(out);
        }

        for handle in self.segments()? {
            if out.len() >= limit {
                break;
            }
            if !filter.intersects(handle.min_ts, handle.max_ts) {
                continue;
            }
            let reader = match SegmentReader::open(&handle.path) {
                Ok(r) => r,
                Err(e) => {
                    tracing::warn!(path = %handle.path.display(), error = %e, "skipping unreadable segment");
                    continue;
                }
            };
            match reader.read_rows(filter, ast.as_ref(), limit - out.len()) {
                Ok(rows) => out.extend(rows),
                Err(e) => {
                    tracing::warn!(path = %handle.path.display(), error = %e, "skipping corrupt segment");
                }
            }
        }

        Ok(out)
    }
}
