use super::*;
use ql::{Filter, Level, LogRow};

fn row(ts: i64, level: Level, service: &str, host: &str, message: &str) -> LogRow {
    LogRow {
        timestamp: ts,
        level,
        service: service.to_string(),
        host: host.to_string(),
        message: message.to_string(),
        trace_id: None,
    }
}

// -------------------- append / len --------------------

#[test]
fn append_single_row() {
    let mt = MemTable::new();
    mt.append(row(1, Level::Info, "api", "h1", "hello"));
    assert_eq!(mt.len(), 1);
    assert!(!mt.is_empty());
}

#[test]
fn is_empty_on_new() {
    let mt = MemTable::new();
    assert!(mt.is_empty());
    assert_eq!(mt.len(), 0);
}

#[test]
fn append_many_rows() {
    let mt = MemTable::new();
    for i in 0..10_000i64 {
        mt.append(row(i, Level::Info, "api", "h1", "m"));
    }
    assert_eq!(mt.len(), 10_000);
}

// -------------------- timestamp range --------------------

#[test]
fn min_max_timestamp_track_appends() {
    let mt = MemTable::new();
    mt.append(row(50, Level::Info, "a", "h", "m"));
    mt.append(row(10, Level::Info, "a", "h", "m"));
    mt.append(row(90, Level::Info, "a", "h", "m"));
    assert_eq!(mt.min_timestamp(), 10);
    assert_eq!(mt.max_timestamp(), 90);
}

#[test]
fn empty_memtable_has_sentinel_range() {
    let mt = MemTable::new();
    assert_eq!(mt.min_timestamp(), i64::MAX);
    assert_eq!(mt.max_timestamp(), i64::MIN);
}

// -------------------- size tracking --------------------

#[test]
fn size_bytes_grows_with_appends() {
    let mt = MemTable::new();
    assert_eq!(mt.size_bytes(), 0);
    mt.append(row(1, Level::Info, "api", "h1", "hello"));
    assert!(mt.size_bytes() > 0);
    let after_one = mt.size_bytes();
    mt.append(row(2, Level::Info, "api", "h1", "hello again"));
    assert!(mt.size_bytes() > after_one);
}

// -------------------- search: scalar filters --------------------

#[test]
fn search_match_all_returns_everything_newest_first() {
    let mt = MemTable::new();
    mt.append(row(1, Level::Info, "a", "h", "first"));
    mt.append(row(2, Level::Info, "a", "h", "second"));
    mt.append(row(3, Level::Info, "a", "h", "third"));

    let rows = mt.search(&Filter::match_all(), None, 10);
    let messages: Vec<&str> = rows.iter().map(|r| r.message.as_str()).collect();
    assert_eq!(messages, vec!["third", "second", "first"]);
}

#[test]
fn search_respects_limit() {
    let mt = MemTable::new();
    for i in 0..100i64 {
        mt.append(row(i, Level::Info, "a", "h", "m"));
    }
    let rows = mt.search(&Filter::match_all(), None, 5);
    assert_eq!(rows.len(), 5);
}

#[test]
fn search_filters_by_time_window() {
    let mt = MemTable::new();
    for i in 0..10i64 {
        mt.append(row(i, Level::Info, "a", "h", "m"));
    }
    let filter = Filter {
        min_time: 3,
        max_time: 6,
        ..Filter::match_all()
    };
    let rows = mt.search(&filter, None, 100);
    let timestamps: Vec<i64> = rows.iter().map(|r| r.timestamp).collect();
    assert_eq!(timestamps, vec![6, 5, 4, 3]);
}

#[test]
fn search_skips_scan_when_time_window_cannot_intersect() {
    let mt = MemTable::new();
    mt.append(row(100, Level::Info, "a", "h", "m"));
    let filter = Filter {
        min_time: 0,
        max_time: 10,
        ..Filter::match_all()
    };
    assert!(mt.search(&filter, None, 10).is_empty());
}

#[test]
fn search_filters_by_level_and_service() {
    let mt = MemTable::new();
    mt.append(row(1, Level::Info, "api", "h1", "ok"));
    mt.append(row(2, Level::Error, "api", "h1", "boom"));
    mt.append(row(3, Level::Error, "worker", "h2", "boom too"));

    let filter = Filter {
        level: Some(Level::Error),
        service: Some("api".to_string()),
        ..Filter::match_all()
    };
    let rows = mt.search(&filter, None, 10);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].message, "boom");
}

// -------------------- search: QL integration --------------------

#[test]
fn search_applies_ql_predicate() {
    let mt = MemTable::new();
    mt.append(row(1, Level::Info, "api", "h1", "request ok"));
    mt.append(row(2, Level::Error, "api", "h1", "request failed"));

    let ast = ql::parse("failed").unwrap();
    let rows = mt.search(&Filter::match_all(), ast.as_ref(), 10);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].message, "request failed");
}

#[test]
fn search_on_empty_memtable_returns_empty() {
    let mt = MemTable::new();
    assert!(mt.search(&Filter::match_all(), None, 10).is_empty());
}

// -------------------- stats_snapshot --------------------

#[test]
fn stats_snapshot_counts_level_distribution() {
    let mt = MemTable::new();
    mt.append(row(1, Level::Info, "a", "h", "m"));
    mt.append(row(2, Level::Info, "a", "h", "m"));
    mt.append(row(3, Level::Error, "a", "h", "m"));
    mt.append(row(4, Level::Unknown, "a", "h", "m"));

    let stats = mt.stats_snapshot();
    assert_eq!(stats.row_count, 4);
    assert_eq!(stats.level_dist[level_slot(Level::Info)], 2);
    assert_eq!(stats.level_dist[level_slot(Level::Error)], 1);
    assert_eq!(stats.level_dist[level_slot(Level::Unknown)], 1);
    assert_eq!(stats.min_timestamp, 1);
    assert_eq!(stats.max_timestamp, 4);
}

#[test]
fn stats_snapshot_on_empty_memtable() {
    let mt = MemTable::new();
    let stats = mt.stats_snapshot();
    assert_eq!(stats.row_count, 0);
    assert_eq!(stats.size_bytes, 0);
    assert_eq!(stats.level_dist, [0u64; 6]);
    assert!(stats.service_counts.is_empty());
}

#[test]
fn stats_snapshot_counts_rows_per_service() {
    let mt = MemTable::new();
    mt.append(row(1, Level::Info, "api", "h", "m"));
    mt.append(row(2, Level::Info, "api", "h", "m"));
    mt.append(row(3, Level::Error, "worker", "h", "m"));

    let stats = mt.stats_snapshot();
    assert_eq!(stats.service_counts.get("api"), Some(&2));
    assert_eq!(stats.service_counts.get("worker"), Some(&1));
}

// -------------------- reset --------------------

#[test]
fn reset_clears_everything() {
    let mt = MemTable::new();
    mt.append(row(1, Level::Info, "a", "h", "m"));
    mt.append(row(2, Level::Error, "a", "h", "m"));
    assert!(!mt.is_empty());

    mt.reset();
    assert_eq!(mt.len(), 0);
    assert_eq!(mt.size_bytes(), 0);
    assert_eq!(mt.min_timestamp(), i64::MAX);
    assert_eq!(mt.max_timestamp(), i64::MIN);
    assert!(mt.search(&Filter::match_all(), None, 10).is_empty());
}

#[test]
fn reset_then_reuse() {
    let mt = MemTable::new();
    mt.append(row(1, Level::Info, "old", "h", "m"));
    mt.reset();
    mt.append(row(2, Level::Info, "new", "h", "m"));
    let rows = mt.search(&Filter::match_all(), None, 10);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].service, "new");
}

// -------------------- Default --------------------

#[test]
fn default_creates_empty() {
    let mt = MemTable::default();
    assert!(mt.is_empty());
    assert_eq!(mt.size_bytes(), 0);
}
