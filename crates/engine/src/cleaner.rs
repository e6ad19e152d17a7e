//! Background retention sweep: periodically deletes sealed segments that
//! have aged out of the retention window.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio_util::sync::CancellationToken;

use crate::Engine;

fn now_ns() -> i64 {
    SystemTime::now().duration_since(UNIX_EPOCH).expect("system clock before epoch").as_nanos() as i64
}

/// Runs until `shutdown` is cancelled, waking every `interval` to remove any
/// segment whose `max_ts` has fallen entirely outside the retention window.
///
/// Mirrors a standard background-worker shape: a ticking interval raced
/// against a cancellation token inside `select!`, so shutdown is prompt
/// instead of waiting for the next tick.
pub async fn run_cleaner(engine: Arc<Engine>, interval: Duration, shutdown: CancellationToken) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = shutdown.cancelled() => {
                tracing::info!("retention cleaner shutting down");
                break;
            }
        }

        let cutoff = now_ns() - engine.retention.as_nanos() as i64;
        let segments = match engine.segments() {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(error = %e, "retention sweep failed to list segments");
                continue;
            }
        };

        for handle in segments {
            if handle.max_ts >= cutoff {
                continue;
            }
            match std::fs::remove_file(&handle.path) {
                Ok(()) => tracing::info!(path = %handle.path.display(), "removed segment past retention"),
                Err(e) => tracing::warn!(path = %handle.path.display(), error = %e, "failed to remove expired segment"),
            }
        }
    }
}
