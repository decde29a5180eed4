//! On-disk layout of the rsid index.
//!
//! The data file is BGZF-compressed text, one entry per line, sorted by rsid:
//!
//! ```text
//! rs<TAB>231360<TAB>231361<TAB>NC_000008.10<TAB>118184783
//! ```
//!
//! Columns 1-3 follow the BED-like `(bucket, begin, end)` convention with the
//! single bucket `rs`, so `tabix --csi -s1 -b2 -e3` can also index the file.
//! The sidecar `<data>.rsi` holds a sparse [`BlockIndex`]: the rsid and BGZF
//! virtual position of every Nth line, plus the data file's byte length so a
//! sidecar left over from another build is rejected on open.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::core::record::parse_position;
use crate::core::types::Locus;

/// Synthetic chromosome bucket every entry lives in
pub const RSID_BUCKET: &str = "rs";

/// Sidecar format version
pub const INDEX_VERSION: u32 = 2;

/// Magic bytes at the start of a sidecar file
pub const INDEX_MAGIC: [u8; 4] = *b"RSI\x01";

/// Sidecar extension appended to the data file name
pub const INDEX_EXTENSION: &str = "rsi";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EntryError {
    #[error("rsid index line has {0} fields, expected 5")]
    FieldCount(usize),

    #[error("rsid index line has bucket '{0}', expected 'rs'")]
    Bucket(String),

    #[error("rsid index line has invalid number '{0}'")]
    Number(String),

    #[error("rsid index line has begin {begin} for rsid {rsid}, expected rsid - 1")]
    Range { begin: u64, rsid: u64 },
}

/// One identifier occurrence in the primary store
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RsidEntry {
    pub rsid: u64,
    pub chromosome: String,
    pub position: u64,
}

impl RsidEntry {
    pub fn new(rsid: u64, chromosome: impl Into<String>, position: u64) -> Self {
        Self {
            rsid,
            chromosome: chromosome.into(),
            position,
        }
    }

    #[must_use]
    pub fn locus(&self) -> Locus {
        Locus::new(self.chromosome.clone(), self.position)
    }

    /// Encode as a tab-separated line, newline included
    #[must_use]
    pub fn to_line(&self) -> String {
        format!(
            "{RSID_BUCKET}\t{}\t{}\t{}\t{}\n",
            self.rsid.saturating_sub(1),
            self.rsid,
            self.chromosome,
            self.position
        )
    }

    /// Decode a line written by [`RsidEntry::to_line`]
    ///
    /// # Errors
    ///
    /// Returns `EntryError` if the line is not a well-formed index entry.
    pub fn from_line(line: &str) -> Result<Self, EntryError> {
        let line = line.trim_end_matches(['\n', '\r']);
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() != 5 {
            return Err(EntryError::FieldCount(fields.len()));
        }
        if fields[0] != RSID_BUCKET {
            return Err(EntryError::Bucket(fields[0].to_string()));
        }

        let begin = parse_number(fields[1])?;
        let rsid = parse_number(fields[2])?;
        if rsid == 0 || begin != rsid - 1 {
            return Err(EntryError::Range { begin, rsid });
        }
        let position =
            parse_position(fields[4]).map_err(|_| EntryError::Number(fields[4].to_string()))?;

        Ok(Self {
            rsid,
            chromosome: fields[3].to_string(),
            position,
        })
    }
}

fn parse_number(field: &str) -> Result<u64, EntryError> {
    field
        .parse()
        .map_err(|_| EntryError::Number(field.to_string()))
}

/// A sampled line: its rsid and the BGZF virtual position where it starts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockSample {
    pub rsid: u64,
    pub virtual_position: u64,
}

/// Sparse index over the sorted data file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockIndex {
    pub version: u32,
    pub created_at: String,
    /// Primary store the index was built from
    pub source: String,
    pub entry_count: u64,
    /// Byte length of the data file this index was written alongside
    pub data_length: u64,
    /// Lines between consecutive samples
    pub sample_interval: u64,
    /// Samples in ascending rsid order
    pub samples: Vec<BlockSample>,
}

impl BlockIndex {
    pub fn new(source: impl Into<String>, sample_interval: u64) -> Self {
        Self {
            version: INDEX_VERSION,
            created_at: chrono::Utc::now().to_rfc3339(),
            source: source.into(),
            entry_count: 0,
            data_length: 0,
            sample_interval,
            samples: Vec::new(),
        }
    }

    /// Virtual position to start scanning from when looking for `rsid`
    ///
    /// This is the last sample strictly below `rsid`, so duplicate entries for
    /// `rsid` that straddle a sample boundary are not skipped. `None` means
    /// scan from the first line.
    #[must_use]
    pub fn seek_position(&self, rsid: u64) -> Option<u64> {
        let idx = self.samples.partition_point(|s| s.rsid < rsid);
        idx.checked_sub(1)
            .map(|i| self.samples[i].virtual_position)
    }
}

/// Sidecar path for a data file (`foo.rsid.bgz` -> `foo.rsid.bgz.rsi`)
#[must_use]
pub fn index_path(data_path: &Path) -> PathBuf {
    let mut name = data_path.as_os_str().to_owned();
    name.push(".");
    name.push(INDEX_EXTENSION);
    PathBuf::from(name)
}
