use tempfile::tempdir;

use super::helpers::{row, test_engine};
use crate::PersistentStats;

#[test]
fn load_or_create_starts_empty_when_missing() {
    let dir = tempdir().unwrap();
    let stats = PersistentStats::load_or_create(dir.path()).unwrap();
    assert_eq!(stats.totals.total_logs, 0);
}

#[test]
fn record_seal_accumulates_and_persists() {
    let dir = tempdir().unwrap();
    let mut stats = PersistentStats::load_or_create(dir.path()).unwrap();

    let mut services = std::collections::BTreeMap::new();
    services.insert("api".to_string(), 3u64);
    stats.record_seal(3, 300, [0, 3, 0, 0, 0, 0], &services);
    stats.save().unwrap();

    let reloaded = PersistentStats::load_or_create(dir.path()).unwrap();
    assert_eq!(reloaded.totals.total_logs, 3);
    assert_eq!(reloaded.totals.total_bytes, 300);
    assert_eq!(reloaded.totals.service_counts.get("api"), Some(&3));
}

#[test]
fn stats_includes_live_memtable_counts() {
    let (_dir, engine) = test_engine(1024 * 1024);
    engine.ingest(row(1, "api", "hello")).unwrap();

    let stats = engine.stats().unwrap();
    assert_eq!(stats.total_logs, 1);
}

#[test]
fn top_services_reflects_unsealed_rows() {
    let (_dir, engine) = test_engine(1024 * 1024);
    engine.ingest(row(1, "api", "hello")).unwrap();
    engine.ingest(row(2, "api", "hello again")).unwrap();
    engine.ingest(row(3, "worker", "working")).unwrap();

    let stats = engine.stats().unwrap();
    assert_eq!(stats.top_services.get("api"), Some(&2));
    assert_eq!(stats.top_services.get("worker"), Some(&1));
}
