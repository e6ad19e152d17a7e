//! Time-bucketed row counts for the histogram panel of the query surface.

use anyhow::{bail, Context as _, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::Engine;
use ql::Filter;
use segment::SegmentReader;

/// One bucket of a histogram response: a bucket start time and the count of
/// rows whose timestamp falls in `[time, time + interval)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistogramBucket {
    pub time: i64,
    pub count: u64,
}

impl Engine {
    /// Buckets rows matching `filter` (overriding its time window with
    /// `[start, end]`) into fixed-width buckets of `interval_nanos`,
    /// returning only non-empty buckets in ascending time order.
    pub fn histogram(&self, start: i64, end: i64, interval_nanos: i64, filter: &Filter) -> Result<Vec<HistogramBucket>> {
        if interval_nanos <= 0 {
            bail!("histogram interval must be positive, got {interval_nanos}");
        }

        let ast = match filter.query.as_deref() {
            Some(q) => ql::parse(q).with_context(|| format!("invalid query: {q}"))?,
            None => None,
        };

        let window = Filter {
            min_time: start,
            max_time: end,
            ..filter.clone()
        };

        let mut buckets: BTreeMap<i64, u64> = BTreeMap::new();
        let bucket_of = |ts: i64| ts.div_euclid(interval_nanos) * interval_nanos;

        let mem = self.current_memtable();
        for row in mem.search(&window, ast.as_ref(), usize::MAX) {
            *buckets.entry(bucket_of(row.timestamp)).or_insert(0) += 1;
        }

        for handle in self.segments()? {
            if !window.intersects(handle.min_ts, handle.max_ts) {
                continue;
            }
            let reader = match SegmentReader::open(&handle.path) {
                Ok(r) => r,
                Err(e) => {
                    tracing::warn!(path = %handle.path.display(), error = %e, "skipping unreadable segment");
                    continue;
                }
            };
            match reader.read_rows(&window, ast.as_ref(), usize::MAX) {
                Ok(rows) => {
                    for row in rows {
                        *buckets.entry(bucket_of(row.timestamp)).or_insert(0) += 1;
                    }
                }
                Err(e) => {
                    tracing::warn!(path = %handle.path.display(), error = %e, "skipping corrupt segment");
                }
            }
        }

        Ok(buckets.into_iter().map(|(time, count)| HistogramBucket { time, count }).collect())
    }
}
