use crate::recovery::{list_segments, parse_segment_filename, replay_wal_into_memtable};
use std::path::Path;
use tempfile::tempdir;

use super::helpers::{row, test_engine};

#[test]
fn replay_empty_wal_path_gives_empty_memtable() {
    let mem = replay_wal_into_memtable(Path::new("/tmp/nanolog-missing-wal.log")).unwrap();
    assert!(mem.is_empty());
}

#[test]
fn replay_restores_previously_appended_rows() {
    let dir = tempdir().unwrap();
    let wal_path = dir.path().join("wal.log");

    {
        let mut w = wal::WalWriter::create(&wal_path, true).unwrap();
        w.append(&row(1, "api", "one")).unwrap();
        w.append(&row(2, "api", "two")).unwrap();
    }

    let mem = replay_wal_into_memtable(&wal_path).unwrap();
    assert_eq!(mem.len(), 2);
}

#[test]
fn list_segments_sorts_newest_first_and_skips_non_segment_files() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("log_100_200.nano"), b"x").unwrap();
    std::fs::write(dir.path().join("log_300_400.nano"), b"x").unwrap();
    std::fs::write(dir.path().join("wal.log"), b"x").unwrap();
    std::fs::write(dir.path().join(".nanolog.stats"), b"x").unwrap();

    let segments = list_segments(dir.path()).unwrap();
    assert_eq!(segments.len(), 2);
    assert_eq!(segments[0].min_ts, 300);
    assert_eq!(segments[1].min_ts, 100);
}

#[test]
fn parse_segment_filename_rejects_garbage() {
    assert_eq!(parse_segment_filename("not-a-segment"), None);
}

#[test]
fn engine_recovers_memtable_rows_across_restart() {
    let (dir, engine) = test_engine(1024 * 1024);
    engine.ingest(row(1, "api", "hello")).unwrap();
    drop(engine);

    let cfg = config::EngineConfig {
        data_dir: dir.path().to_path_buf(),
        flush_threshold: 1024 * 1024,
        retention: std::time::Duration::from_secs(3600 * 168),
        cleaner_interval: std::time::Duration::from_secs(3600),
    };
    let reopened = crate::Engine::new(&cfg).unwrap();
    let rows = reopened.scan(&ql::Filter::match_all(), 10).unwrap();
    assert_eq!(rows.len(), 1);
}
