//! "Show me what happened around this log line" — the surrounding-context
//! lookup used by the UI's drill-down view.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::Engine;
use ql::Filter;
use ql::LogRow;
use segment::SegmentReader;

/// Rows immediately preceding and following an anchor row from the same
/// service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Context {
    pub pre: Vec<LogRow>,
    pub anchor: Option<LogRow>,
    pub post: Vec<LogRow>,
}

impl Engine {
    /// Finds the row from `service` closest to timestamp `ts` (exact match
    /// preferred) and returns up to `limit` rows immediately before and
    /// after it, in timestamp order.
    ///
    /// Scans the whole service's history across the memtable and every
    /// segment rather than a windowed range, since the anchor's position is
    /// not known ahead of time.
    pub fn context(&self, ts: i64, service: &str, limit: usize) -> Result<Context> {
        let filter = Filter {
            service: Some(service.to_string()),
            ..Filter::match_all()
        };

        let mut rows = self.current_memtable().search(&filter, None, usize::MAX);

        for handle in self.segments()? {
            let reader = match SegmentReader::open(&handle.path) {
                Ok(r) => r,
                Err(e) => {
                    tracing::warn!(path = %handle.path.display(), error = %e, "skipping unreadable segment");
                    continue;
                }
            };
            match reader.read_rows(&filter, None, usize::MAX) {
                Ok(r) => rows.extend(r),
                Err(e) => {
                    tracing::warn!(path = %handle.path.display(), error = %e, "skipping corrupt segment");
                }
            }
        }

        if rows.is_empty() {
            return Ok(Context::default());
        }
        rows.sort_by_key(|r| r.timestamp);

        let anchor_idx = rows
            .iter()
            .position(|r| r.timestamp == ts)
            .unwrap_or_else(|| {
                rows.iter()
                    .enumerate()
                    .min_by_key(|(_, r)| (r.timestamp - ts).abs())
                    .map(|(i, _)| i)
                    .expect("rows is non-empty")
            });

        let pre_start = anchor_idx.saturating_sub(limit);
        let post_end = (anchor_idx + 1 + limit).min(rows.len());

        Ok(Context {
            pre: rows[pre_start..anchor_idx].to_vec(),
            anchor: Some(rows[anchor_idx].clone()),
            post: rows[anchor_idx + 1..post_end].to_vec(),
        })
    }
}
