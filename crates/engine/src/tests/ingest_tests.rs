use std::time::Duration;

use super::helpers::{row, test_engine};
use ql::Filter;

#[test]
fn ingest_is_immediately_visible_to_scan() {
    let (_dir, engine) = test_engine(1024 * 1024);
    engine.ingest(row(1, "api", "hello")).unwrap();

    let rows = engine.scan(&Filter::match_all(), 10).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].message, "hello");
}

#[tokio::test]
async fn crossing_threshold_seals_into_a_segment_file() {
    let (dir, engine) = test_engine(16);
    engine.ingest(row(1, "api", "this message is long enough to cross the tiny threshold")).unwrap();

    tokio::time::sleep(Duration::from_millis(200)).await;

    let has_segment = std::fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .any(|e| e.file_name().to_str().is_some_and(|n| n.ends_with(".nano")));
    assert!(has_segment, "expected a sealed segment file after crossing the threshold");
}

#[test]
fn sync_wal_does_not_error_on_empty_wal() {
    let (_dir, engine) = test_engine(1024 * 1024);
    engine.sync_wal().unwrap();
}

#[test]
fn literal_zero_timestamp_is_stored_verbatim() {
    let (_dir, engine) = test_engine(1024 * 1024);
    engine.ingest(row(0, "api", "boot")).unwrap();

    let rows = engine.scan(&Filter::match_all(), 10).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].timestamp, 0);
}
