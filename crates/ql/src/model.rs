//! The shared log data model: [`LogRow`], [`Level`], and the query [`Filter`].
//!
//! This crate is the workspace's leaf data-model crate: `memtable`, `wal`,
//! `segment`, and `engine` all depend on it instead of on each other,
//! mirroring the teacher's decision to keep `engine` depending on leaf
//! crates rather than the codec depending on the engine.

use serde::{Deserialize, Serialize};

/// Log severity level. `Unknown` (255) covers rows whose level string did not
/// match any known name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Level {
    Debug = 0,
    Info = 1,
    Warn = 2,
    Error = 3,
    Fatal = 4,
    Unknown = 255,
}

impl Level {
    /// Parses a level name case-insensitively. Unknown names map to `Unknown`
    /// rather than failing — ingest must never reject a row over its level.
    pub fn parse(s: &str) -> Level {
        match s.to_ascii_uppercase().as_str() {
            "DEBUG" => Level::Debug,
            "INFO" => Level::Info,
            "WARN" | "WARNING" => Level::Warn,
            "ERROR" => Level::Error,
            "FATAL" => Level::Fatal,
            _ => Level::Unknown,
        }
    }

    /// The raw byte stored in a sealed segment's `levels` column.
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Decodes a raw level byte back into a `Level`.
    pub fn from_u8(v: u8) -> Level {
        match v {
            0 => Level::Debug,
            1 => Level::Info,
            2 => Level::Warn,
            3 => Level::Error,
            4 => Level::Fatal,
            _ => Level::Unknown,
        }
    }

    /// The canonical uppercase string form used for QL matching and the wire
    /// format's human-readable fields.
    pub fn as_str(self) -> &'static str {
        match self {
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
            Level::Fatal => "FATAL",
            Level::Unknown => "UNKNOWN",
        }
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The logical unit stored by this engine: one structured log line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRow {
    /// Nanoseconds since the Unix epoch.
    pub timestamp: i64,
    pub level: Level,
    pub service: String,
    pub host: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
}

/// A time window plus scalar equality filters and an optional QL query.
///
/// `min_time`/`max_time` are inclusive bounds in nanoseconds. Use
/// `i64::MIN`/`i64::MAX` for "unbounded."
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Filter {
    pub min_time: i64,
    pub max_time: i64,
    pub level: Option<Level>,
    pub service: Option<String>,
    pub host: Option<String>,
    /// Raw QL source. Parsed once by the caller via [`crate::parse`] and
    /// passed alongside this filter to evaluation functions — kept here only
    /// so the filter round-trips through the wire format untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
}

impl Filter {
    /// An unbounded filter matching everything.
    pub fn match_all() -> Self {
        Self {
            min_time: i64::MIN,
            max_time: i64::MAX,
            level: None,
            service: None,
            host: None,
            query: None,
        }
    }

    /// `true` if a row's timestamp falls within `[min_time, max_time]`.
    pub fn time_matches(&self, ts: i64) -> bool {
        ts >= self.min_time && ts <= self.max_time
    }

    /// `true` if the file-level range `[file_min, file_max]` could contain any
    /// row passing this filter's time window — the pruning check described in
    /// spec §4.1 / §4.5. A `false` result means the caller may skip the file
    /// entirely without opening it.
    pub fn intersects(&self, file_min: i64, file_max: i64) -> bool {
        !(file_max < self.min_time || file_min > self.max_time)
    }

    /// Checks only the scalar (non-QL) predicates: time window, level,
    /// service, host.
    pub fn matches_scalars(&self, row: &LogRow) -> bool {
        if !self.time_matches(row.timestamp) {
            return false;
        }
        if let Some(level) = self.level {
            if row.level != level {
                return false;
            }
        }
        if let Some(ref service) = self.service {
            if !row.service.eq_ignore_ascii_case(service) {
                return false;
            }
        }
        if let Some(ref host) = self.host {
            if !row.host.eq_ignore_ascii_case(host) {
                return false;
            }
        }
        true
    }
}
