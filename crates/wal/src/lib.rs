//! # WAL — Write-Ahead Log
//!
//! Crash-safe durability for the storage engine: every ingested row is
//! appended here **before** it is visible in the MemTable. On restart the
//! WAL is replayed to reconstruct the MemTable, so no acknowledged write is
//! lost to a crash.
//!
//! ## Record Format
//!
//! ```text
//! [record_len: u32 LE][json body ...]
//! ```
//!
//! `record_len` is the length of the JSON body in bytes and does not include
//! itself. JSON (rather than fixed binary framing) is chosen so new optional
//! row fields can be added without breaking readers built against an older
//! version.
//!
//! ## Example
//!
//! ```rust,no_run
//! use wal::WalWriter;
//! use ql::{Level, LogRow};
//!
//! let mut w = WalWriter::create("wal.log", true).unwrap();
//! w.append(&LogRow {
//!     timestamp: 1,
//!     level: Level::Info,
//!     service: "api".to_string(),
//!     host: "h1".to_string(),
//!     message: "started".to_string(),
//!     trace_id: None,
//! }).unwrap();
//! ```

use byteorder::{LittleEndian, ReadBytesExt};
use std::fs::{File, OpenOptions};
use std::io::{self, BufReader, Read, Seek, SeekFrom, Write};
use std::path::Path;

use ql::LogRow;
use thiserror::Error;

/// Records larger than this are treated as corruption rather than an
/// attempt to allocate an arbitrarily large buffer from a garbage length
/// prefix.
const MAX_RECORD_SIZE: u32 = 64 * 1024 * 1024;

/// Errors that can occur during WAL operations.
#[derive(Debug, Error)]
pub enum WalError {
    /// An underlying I/O error.
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// A complete frame whose body was not valid JSON, or whose length
    /// prefix could not possibly be real.
    #[error("corrupt record: {0}")]
    Corrupt(String),
}

/// Append-only WAL writer.
///
/// Each record is serialized to JSON into a reusable scratch buffer, framed
/// with its length, and written in a single `write_all` call. `append` never
/// fsyncs on its own — call [`sync`](WalWriter::sync) to force durability.
pub struct WalWriter {
    file: File,
    /// Reusable scratch buffer to avoid allocation on every append.
    buf: Vec<u8>,
}

impl WalWriter {
    /// Opens (or creates) a WAL file in append mode.
    ///
    /// `sync` is accepted for symmetry with callers that pass a config flag
    /// straight through; durability is controlled by calling
    /// [`sync`](WalWriter::sync) explicitly rather than on every append.
    pub fn create<P: AsRef<Path>>(path: P, _sync: bool) -> Result<Self, WalError> {
        let file = OpenOptions::new().create(true).append(true).read(true).open(path)?;
        Ok(Self {
            file,
            buf: Vec::with_capacity(256),
        })
    }

    /// Serializes `row` to JSON and appends the length-prefixed record.
    pub fn append(&mut self, row: &LogRow) -> Result<(), WalError> {
        self.buf.clear();
        self.buf.extend_from_slice(&[0u8; 4]);
        serde_json::to_writer(&mut self.buf, row).map_err(|e| WalError::Corrupt(e.to_string()))?;

        let body_len = self.buf.len() - 4;
        if body_len as u64 > MAX_RECORD_SIZE as u64 {
            return Err(WalError::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                "WAL record exceeds maximum size",
            )));
        }
        self.buf[0..4].copy_from_slice(&(body_len as u32).to_le_bytes());

        self.file.write_all(&self.buf)?;
        self.file.flush()?;
        Ok(())
    }

    /// Flushes and fsyncs the WAL file, guaranteeing every prior `append` is
    /// durable on disk.
    pub fn sync(&mut self) -> Result<(), WalError> {
        self.file.flush()?;
        self.file.sync_all()?;
        Ok(())
    }

    /// Truncates the WAL back to empty and reseeks to the start, for reuse
    /// once the rows it describes have been sealed into a segment.
    pub fn reset(&mut self) -> Result<(), WalError> {
        self.file.set_len(0)?;
        self.file.seek(SeekFrom::Start(0))?;
        Ok(())
    }

    /// Consumes the writer, closing the underlying file.
    pub fn close(self) {
        drop(self);
    }
}

/// Sequential WAL reader that replays rows in the order they were appended.
///
/// Generic over any `Read` implementor, allowing tests to replay from an
/// in-memory buffer instead of a real file.
pub struct WalReader<R: Read> {
    rdr: BufReader<R>,
}

impl WalReader<File> {
    /// Opens an existing WAL file for replay.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<WalReader<File>, WalError> {
        let f = File::open(path)?;
        Ok(WalReader { rdr: BufReader::new(f) })
    }
}

impl<R: Read> WalReader<R> {
    /// Constructs a reader from any `Read` implementor.
    ///
    /// Useful for unit tests that supply an in-memory buffer (e.g., `Cursor<Vec<u8>>`).
    pub fn from_reader(reader: R) -> Self {
        WalReader { rdr: BufReader::new(reader) }
    }

    /// Replays every complete record, returning the rows in append order.
    ///
    /// # Termination
    ///
    /// - **Clean EOF** between records -> returns the rows collected so far.
    /// - **Truncated tail** (a partial length prefix, or a body cut short by
    ///   a crash mid-write) -> returns the rows collected so far, the same
    ///   as a clean EOF.
    /// - **Malformed JSON inside a fully-read frame** -> returns
    ///   `Err(WalError::Corrupt)`; a complete frame with invalid JSON means
    ///   real corruption, not an in-progress write.
    pub fn replay(&mut self) -> Result<Vec<LogRow>, WalError> {
        let mut rows = Vec::new();
        let mut body = Vec::with_capacity(256);

        loop {
            let record_len = match self.rdr.read_u32::<LittleEndian>() {
                Ok(v) => v,
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(rows),
                Err(e) => return Err(WalError::Io(e)),
            };

            if record_len == 0 || record_len > MAX_RECORD_SIZE {
                return Err(WalError::Corrupt(format!("implausible record length {record_len}")));
            }

            body.clear();
            body.resize(record_len as usize, 0);
            match self.rdr.read_exact(&mut body) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(rows),
                Err(e) => return Err(WalError::Io(e)),
            }

            let row: LogRow = serde_json::from_slice(&body).map_err(|e| WalError::Corrupt(e.to_string()))?;
            rows.push(row);
        }
    }
}
