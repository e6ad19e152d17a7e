use config::EngineConfig;
use ql::{Level, LogRow};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

use crate::Engine;

/// Builds a fresh engine in a temp directory with the given flush threshold
/// and a long retention, so tests don't race the cleaner.
pub fn test_engine(flush_threshold: usize) -> (TempDir, Arc<Engine>) {
    let dir = tempfile::tempdir().unwrap();
    let cfg = EngineConfig {
        data_dir: dir.path().to_path_buf(),
        flush_threshold,
        retention: Duration::from_secs(3600 * 168),
        cleaner_interval: Duration::from_secs(3600),
    };
    let engine = Arc::new(Engine::new(&cfg).unwrap());
    (dir, engine)
}

pub fn row(ts: i64, service: &str, message: &str) -> LogRow {
    LogRow {
        timestamp: ts,
        level: Level::Info,
        service: service.to_string(),
        host: "h1".to_string(),
        message: message.to_string(),
        trace_id: None,
    }
}
