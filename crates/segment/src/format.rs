//! Segment binary format: magic, footer, and per-column block framing.
//!
//! ## Layout
//!
//! ```text
//! [magic: 8 bytes] [block]+ [footer: 20 bytes]
//! ```
//!
//! The magic is the first 8 bytes of the file, so a reader knows which
//! column shape it is holding before decoding a single block. Each block is
//! `compressed_size(u32 LE) | zstd(raw column bytes)`. The footer is
//! `row_count(u32 LE) | min_ts(i64 LE) | max_ts(i64 LE)`, always the last 20
//! bytes of the file so it can be read in one seek from the end without
//! first knowing the block count.
//!
//! `NANOLOG1` files carry four blocks (timestamps, levels, services,
//! messages). `NANOLOG2` files add `hosts` and `trace_ids`, written in that
//! order after `messages`.

use crate::error::SegmentError;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Read, Seek, SeekFrom, Write};

pub const MAGIC_V1: &[u8; 8] = b"NANOLOG1";
pub const MAGIC_V2: &[u8; 8] = b"NANOLOG2";

pub const FOOTER_BYTES: u64 = 4 + 8 + 8;
pub const MAGIC_BYTES: u64 = 8;

/// Sentinel length marking an absent (`None`) optional string column value.
/// No real string needs 4 GiB, so this value is safe to reserve.
pub const ABSENT_LEN: u32 = u32::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Version {
    V1,
    V2,
}

impl Version {
    /// Number of column blocks this version's files carry.
    pub fn block_count(self) -> usize {
        match self {
            Version::V1 => 4,
            Version::V2 => 6,
        }
    }

    pub fn magic(self) -> &'static [u8; 8] {
        match self {
            Version::V1 => MAGIC_V1,
            Version::V2 => MAGIC_V2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Footer {
    pub version: Version,
    pub row_count: u32,
    pub min_ts: i64,
    pub max_ts: i64,
}

impl Footer {
    /// `true` if `[self.min_ts, self.max_ts]` could overlap `[min, max]`.
    pub fn intersects(&self, min: i64, max: i64) -> bool {
        !(self.max_ts < min || self.min_ts > max)
    }
}

/// Writes the 8-byte magic. Must be the first thing written to a segment file.
pub fn write_magic<W: Write>(w: &mut W, version: Version) -> std::io::Result<()> {
    w.write_all(version.magic())
}

/// Reads the magic from the current position, which must be the start of the
/// file. Leaves the cursor positioned right after it, at the first block.
pub fn read_magic<R: Read>(r: &mut R) -> Result<Version, SegmentError> {
    let mut magic = [0u8; 8];
    r.read_exact(&mut magic)?;
    match &magic {
        MAGIC_V1 => Ok(Version::V1),
        MAGIC_V2 => Ok(Version::V2),
        other => Err(SegmentError::Corrupt(format!(
            "unknown segment magic {:?}",
            String::from_utf8_lossy(other)
        ))),
    }
}

/// Writes the 20-byte footer. Must be the last thing written to a segment file.
pub fn write_footer<W: Write>(w: &mut W, row_count: u32, min_ts: i64, max_ts: i64) -> std::io::Result<()> {
    w.write_u32::<LittleEndian>(row_count)?;
    w.write_i64::<LittleEndian>(min_ts)?;
    w.write_i64::<LittleEndian>(max_ts)?;
    Ok(())
}

/// Reads the trailing 20-byte footer from `r`, seeking from the end. Leaves
/// the cursor positioned at end-of-file. The magic must be read separately
/// (with [`read_magic`]) to learn the file's [`Version`].
pub fn read_footer<R: Read + Seek>(r: &mut R, version: Version) -> Result<Footer, SegmentError> {
    let filesize = r.seek(SeekFrom::End(0))?;
    if filesize < MAGIC_BYTES + FOOTER_BYTES {
        return Err(SegmentError::Corrupt("file too small for segment footer".into()));
    }

    r.seek(SeekFrom::End(-(FOOTER_BYTES as i64)))?;
    let row_count = r.read_u32::<LittleEndian>()?;
    let min_ts = r.read_i64::<LittleEndian>()?;
    let max_ts = r.read_i64::<LittleEndian>()?;

    Ok(Footer {
        version,
        row_count,
        min_ts,
        max_ts,
    })
}

/// Compresses `raw` and writes it as one length-prefixed block.
pub fn write_block<W: Write>(w: &mut W, raw: &[u8]) -> Result<(), SegmentError> {
    let compressed = zstd::encode_all(raw, 0)?;
    w.write_u32::<LittleEndian>(compressed.len() as u32)?;
    w.write_all(&compressed)?;
    Ok(())
}

/// Reads one length-prefixed block and decompresses it.
pub fn read_block<R: Read>(r: &mut R) -> Result<Vec<u8>, SegmentError> {
    let len = r.read_u32::<LittleEndian>()? as usize;
    let mut compressed = vec![0u8; len];
    r.read_exact(&mut compressed)?;
    let raw = zstd::decode_all(compressed.as_slice())?;
    Ok(raw)
}

/// Encodes a column of `i64` timestamps as raw little-endian bytes.
pub fn encode_i64_column(values: &[i64]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(values.len() * 8);
    for v in values {
        buf.extend_from_slice(&v.to_le_bytes());
    }
    buf
}

pub fn decode_i64_column(raw: &[u8]) -> Result<Vec<i64>, SegmentError> {
    if raw.len() % 8 != 0 {
        return Err(SegmentError::Corrupt("timestamp block length not a multiple of 8".into()));
    }
    Ok(raw.chunks_exact(8).map(|c| i64::from_le_bytes(c.try_into().unwrap())).collect())
}

/// Encodes a column of raw `u8` level bytes.
pub fn encode_u8_column(values: &[u8]) -> Vec<u8> {
    values.to_vec()
}

pub fn decode_u8_column(raw: &[u8]) -> Vec<u8> {
    raw.to_vec()
}

/// Encodes a column of required UTF-8 strings as `[len(u32 LE) | bytes] × N`.
pub fn encode_string_column(values: &[String]) -> Vec<u8> {
    let mut buf = Vec::new();
    for v in values {
        buf.extend_from_slice(&(v.len() as u32).to_le_bytes());
        buf.extend_from_slice(v.as_bytes());
    }
    buf
}

pub fn decode_string_column(raw: &[u8], count: usize) -> Result<Vec<String>, SegmentError> {
    let mut out = Vec::with_capacity(count);
    let mut cursor = &raw[..];
    for _ in 0..count {
        let s = read_one_string(&mut cursor)?.ok_or_else(|| {
            SegmentError::Corrupt("unexpected absent marker in required string column".into())
        })?;
        out.push(s);
    }
    Ok(out)
}

/// Encodes a column of optional UTF-8 strings, using [`ABSENT_LEN`] as the
/// length sentinel for `None`.
pub fn encode_optional_string_column(values: &[Option<String>]) -> Vec<u8> {
    let mut buf = Vec::new();
    for v in values {
        match v {
            Some(s) => {
                buf.extend_from_slice(&(s.len() as u32).to_le_bytes());
                buf.extend_from_slice(s.as_bytes());
            }
            None => buf.extend_from_slice(&ABSENT_LEN.to_le_bytes()),
        }
    }
    buf
}

pub fn decode_optional_string_column(raw: &[u8], count: usize) -> Result<Vec<Option<String>>, SegmentError> {
    let mut out = Vec::with_capacity(count);
    let mut cursor = &raw[..];
    for _ in 0..count {
        out.push(read_one_string(&mut cursor)?);
    }
    Ok(out)
}

fn read_one_string(cursor: &mut &[u8]) -> Result<Option<String>, SegmentError> {
    if cursor.len() < 4 {
        return Err(SegmentError::Corrupt("truncated string length prefix".into()));
    }
    let len = cursor.read_u32::<LittleEndian>()?;
    if len == ABSENT_LEN {
        return Ok(None);
    }
    let len = len as usize;
    if cursor.len() < len {
        return Err(SegmentError::Corrupt("truncated string body".into()));
    }
    let (body, rest) = cursor.split_at(len);
    *cursor = rest;
    let s = String::from_utf8(body.to_vec()).map_err(|e| SegmentError::Corrupt(e.to_string()))?;
    Ok(Some(s))
}
