//! # Config
//!
//! Engine and server configuration for the nanolog storage core.
//!
//! Mirrors the builder + `validate()` shape used elsewhere in this codebase:
//! construct with defaults, override via a builder or environment variables,
//! then validate before handing the result to `Engine::new` or the HTTP
//! server.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Default MemTable byte-size threshold that triggers an async seal (64 MiB).
pub const DEFAULT_FLUSH_THRESHOLD: usize = 64 * 1024 * 1024;

/// Default retention window: 168 hours (7 days).
pub const DEFAULT_RETENTION: &str = "168h";

/// Default HTTP listen port.
pub const DEFAULT_PORT: u16 = 8088;

/// Default data directory.
pub const DEFAULT_DATA_DIR: &str = "./data";

/// Operational role, selected via `--role` on the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    /// Hosts both an `Engine` and an `Aggregator` over its own data.
    Standalone,
    /// Hosts only an `Aggregator`, fanning out to `--data-nodes`.
    Console,
    /// Hosts only an `Engine`.
    Ingester,
}

impl Role {
    /// Parses a role name, accepted case-insensitively.
    pub fn parse(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "standalone" => Ok(Role::Standalone),
            "console" => Ok(Role::Console),
            "ingester" => Ok(Role::Ingester),
            other => bail!("unknown role '{other}' (expected standalone, console, or ingester)"),
        }
    }

    /// `true` for roles that own a local `Engine`.
    pub fn hosts_engine(self) -> bool {
        matches!(self, Role::Standalone | Role::Ingester)
    }

    /// `true` for roles that own an `Aggregator`.
    pub fn hosts_aggregator(self) -> bool {
        matches!(self, Role::Standalone | Role::Console)
    }
}

impl Default for Role {
    fn default() -> Self {
        Role::Standalone
    }
}

/// Configuration for the storage engine (data directory, thresholds, retention).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Directory holding the WAL, sealed segments, and the stats file.
    pub data_dir: PathBuf,
    /// MemTable byte-size threshold that triggers an async seal.
    pub flush_threshold: usize,
    /// How long a sealed segment is retained before the cleaner deletes it.
    #[serde(with = "duration_secs")]
    pub retention: Duration,
    /// Interval between retention-cleaner ticks.
    #[serde(with = "duration_secs")]
    pub cleaner_interval: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            flush_threshold: DEFAULT_FLUSH_THRESHOLD,
            retention: parse_duration(DEFAULT_RETENTION).expect("default retention parses"),
            cleaner_interval: Duration::from_secs(3600),
        }
    }
}

impl EngineConfig {
    /// Validates the configuration, mirroring the range checks the pack's
    /// other `config` modules perform before handing a config to an engine.
    pub fn validate(&self) -> Result<()> {
        if self.flush_threshold == 0 {
            bail!("flush_threshold must be > 0");
        }
        if self.retention.as_secs() == 0 {
            bail!("retention must be > 0");
        }
        Ok(())
    }
}

/// Configuration for the HTTP boundary server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub role: Role,
    /// Peer base URLs for the aggregator (console/standalone roles).
    pub data_nodes: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            role: Role::default(),
            data_nodes: Vec::new(),
        }
    }
}

/// Parses a duration string of the form `"168h"`, `"90m"`, `"30s"`, or a bare
/// integer (seconds). This is the minimal subset of Go's `time.ParseDuration`
/// the CLI's `--retention` flag needs (spec.md §6).
pub fn parse_duration(s: &str) -> Result<Duration> {
    let s = s.trim();
    if s.is_empty() {
        bail!("empty duration string");
    }
    let (num_part, unit) = match s.chars().last() {
        Some(c) if c.is_ascii_digit() => (s, 's'),
        Some(c) => (&s[..s.len() - 1], c),
        None => bail!("empty duration string"),
    };
    let n: u64 = num_part
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid duration '{s}'"))?;
    let secs = match unit {
        's' => n,
        'm' => n * 60,
        'h' => n * 3600,
        'd' => n * 86_400,
        other => bail!("unknown duration unit '{other}' in '{s}'"),
    };
    Ok(Duration::from_secs(secs))
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        d.as_secs().serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let secs = u64::deserialize(d)?;
        Ok(Duration::from_secs(secs))
    }
}
