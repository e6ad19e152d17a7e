use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio_util::sync::CancellationToken;

use super::helpers::test_engine;
use crate::run_cleaner;
use ql::{Level, LogRow};
use segment::SegmentWriter;

fn now_ns() -> i64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_nanos() as i64
}

#[tokio::test]
async fn cleaner_removes_only_expired_segments() {
    let (dir, engine) = test_engine(1024 * 1024);

    let stale = vec![LogRow {
        timestamp: 100,
        level: Level::Info,
        service: "api".to_string(),
        host: "h1".to_string(),
        message: "old".to_string(),
        trace_id: None,
    }];
    SegmentWriter::write(&dir.path().join("log_0_100.nano"), &stale).unwrap();

    let now = now_ns();
    let fresh = vec![LogRow {
        timestamp: now,
        level: Level::Info,
        service: "api".to_string(),
        host: "h1".to_string(),
        message: "new".to_string(),
        trace_id: None,
    }];
    SegmentWriter::write(&dir.path().join(format!("log_{now}_{now}.nano")), &fresh).unwrap();

    let shutdown = CancellationToken::new();
    let handle = tokio::spawn(run_cleaner(engine.clone(), Duration::from_millis(10), shutdown.clone()));

    tokio::time::sleep(Duration::from_millis(100)).await;
    shutdown.cancel();
    handle.await.unwrap();

    let remaining: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_str().is_some_and(|n| n.ends_with(".nano")))
        .collect();

    assert_eq!(remaining.len(), 1);
}
