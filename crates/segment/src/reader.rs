use std::fs::File;
use std::io::{BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use ql::{evaluate, Filter, Level, LogRow, QlNode};

use crate::error::SegmentError;
use crate::format::{self, Footer, Version};

/// A handle onto a sealed segment file. Opening reads only the trailing
/// footer (20 bytes + 8-byte magic); the column blocks are decoded lazily by
/// [`SegmentReader::read_rows`], so scanning many segments for a narrow time
/// window only pays the full decode cost for files that actually intersect.
pub struct SegmentReader {
    path: PathBuf,
    footer: Footer,
}

impl SegmentReader {
    /// Opens a segment file and reads its magic and footer.
    pub fn open(path: &Path) -> Result<Self, SegmentError> {
        let mut file = File::open(path)?;
        if file.metadata()?.len() < format::MAGIC_BYTES + format::FOOTER_BYTES {
            return Err(SegmentError::Corrupt("file too small for segment magic and footer".into()));
        }
        let version = format::read_magic(&mut file)?;
        let footer = format::read_footer(&mut file, version)?;
        Ok(Self {
            path: path.to_path_buf(),
            footer,
        })
    }

    pub fn row_count(&self) -> u32 {
        self.footer.row_count
    }

    pub fn min_timestamp(&self) -> i64 {
        self.footer.min_ts
    }

    pub fn max_timestamp(&self) -> i64 {
        self.footer.max_ts
    }

    /// `true` if this file's timestamp range could contain any row matching
    /// `filter`'s time window. A `false` result means the caller can skip
    /// [`read_rows`](Self::read_rows) entirely without opening the blocks.
    pub fn intersects(&self, filter: &Filter) -> bool {
        self.footer.intersects(filter.min_time, filter.max_time)
    }

    /// Decodes every column block, reconstructs rows in physical (append)
    /// order, and applies `filter`'s scalar predicates plus the QL `query`
    /// predicate, stopping once `limit` matching rows have been collected.
    pub fn read_rows(&self, filter: &Filter, query: Option<&QlNode>, limit: usize) -> Result<Vec<LogRow>, SegmentError> {
        if !self.intersects(filter) {
            return Ok(Vec::new());
        }

        let mut file = BufReader::new(File::open(&self.path)?);
        file.seek(SeekFrom::Start(format::MAGIC_BYTES))?;

        let count = self.footer.row_count as usize;

        let timestamps = format::decode_i64_column(&format::read_block(&mut file)?)?;
        let levels = format::decode_u8_column(&format::read_block(&mut file)?);
        let services = format::decode_string_column(&format::read_block(&mut file)?, count)?;

        let (hosts, messages, trace_ids) = match self.footer.version {
            Version::V2 => {
                let hosts = format::decode_string_column(&format::read_block(&mut file)?, count)?;
                let messages = format::decode_string_column(&format::read_block(&mut file)?, count)?;
                let trace_ids = format::decode_optional_string_column(&format::read_block(&mut file)?, count)?;
                (hosts, messages, trace_ids)
            }
            Version::V1 => {
                let messages = format::decode_string_column(&format::read_block(&mut file)?, count)?;
                let hosts = vec![String::new(); count];
                let trace_ids = vec![None; count];
                (hosts, messages, trace_ids)
            }
        };

        if timestamps.len() != count || levels.len() != count || services.len() != count {
            return Err(SegmentError::Corrupt(format!(
                "column length mismatch: footer says {count} rows"
            )));
        }

        let mut out = Vec::new();
        for i in 0..count {
            if out.len() >= limit {
                break;
            }
            let row = LogRow {
                timestamp: timestamps[i],
                level: Level::from_u8(levels[i]),
                service: services[i].clone(),
                host: hosts[i].clone(),
                message: messages[i].clone(),
                trace_id: trace_ids[i].clone(),
            };
            if filter.matches_scalars(&row) && evaluate(query, &row) {
                out.push(row);
            }
        }

        Ok(out)
    }
}
