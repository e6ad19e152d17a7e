use segment::SegmentWriter;

use super::helpers::{row, test_engine};
use ql::Filter;

#[tokio::test]
async fn scan_merges_memtable_and_sealed_segments() {
    let (dir, engine) = test_engine(16);
    engine.ingest(row(1, "api", "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa")).unwrap();

    tokio::time::sleep(std::time::Duration::from_millis(200)).await;
    engine.ingest(row(2, "api", "fresh")).unwrap();

    let rows = engine.scan(&Filter::match_all(), 10).unwrap();
    assert!(rows.len() >= 2, "expected rows from both the sealed segment and the live memtable, got {rows:?}");
    let _ = dir;
}

#[test]
fn scan_respects_limit() {
    let (_dir, engine) = test_engine(1024 * 1024);
    for i in 0..5 {
        engine.ingest(row(i, "api", "x")).unwrap();
    }
    let rows = engine.scan(&Filter::match_all(), 3).unwrap();
    assert_eq!(rows.len(), 3);
}

#[test]
fn scan_applies_ql_query_syntax_errors() {
    let (_dir, engine) = test_engine(1024 * 1024);
    engine.ingest(row(1, "api", "x")).unwrap();

    let filter = Filter {
        query: Some("(((".to_string()),
        ..Filter::match_all()
    };
    let result = engine.scan(&filter, 10);
    assert!(result.is_err());
}

#[test]
fn scan_reads_from_sealed_segments_too() {
    let (dir, engine) = test_engine(1024 * 1024);
    let rows = vec![row(10, "worker", "first"), row(20, "worker", "second")];
    SegmentWriter::write(&dir.path().join("log_10_20.nano"), &rows).unwrap();

    let found = engine.scan(&Filter::match_all(), 10).unwrap();
    assert_eq!(found.len(), 2);
}
