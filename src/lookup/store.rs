//! Read-only access to the two indexed files.
//!
//! The resolver only sees the [`PrimaryStore`] and [`SecondaryIndex`] traits.
//! File-backed implementations wrap noodles (tabix-indexed VCF) and
//! [`RsidIndexReader`]; the in-memory ones back tests and small fixtures.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use noodles::core::{Position, Region};
use noodles::csi::BinningIndex;
use noodles::vcf;
use tracing::debug;

use crate::core::error::LookupError;
use crate::core::query::parse_rsid;
use crate::core::record::{RecordError, VariantRecord};
use crate::core::types::Locus;
use crate::index::format::{index_path, RsidEntry};
use crate::index::reader::RsidIndexReader;

/// Records at a single (chromosome, position), in file order
pub trait PrimaryStore: Send + Sync {
    /// Records whose POS equals `position` exactly
    ///
    /// # Errors
    ///
    /// Returns `LookupError` if the store cannot be read.
    fn fetch(&self, chromosome: &str, position: u64) -> Result<Vec<VariantRecord>, LookupError>;
}

/// Loci recorded for an rsid, in index order
pub trait SecondaryIndex: Send + Sync {
    /// # Errors
    ///
    /// Returns `LookupError` if the index cannot be read.
    fn lookup(&self, rsid: u64) -> Result<Vec<Locus>, LookupError>;
}

/// BGZF-compressed VCF with a tabix (`.tbi`) or CSI index
#[derive(Debug, Clone)]
pub struct TabixVcfStore {
    path: PathBuf,
}

impl TabixVcfStore {
    /// # Errors
    ///
    /// Returns `LookupError::Io` if the VCF is missing.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, LookupError> {
        let path = path.into();
        if !path.is_file() {
            return Err(LookupError::io(
                &path,
                io::Error::new(io::ErrorKind::NotFound, "VCF not found"),
            ));
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn noodles_error(&self, e: impl std::fmt::Display) -> LookupError {
        LookupError::Noodles {
            path: self.path.clone(),
            message: e.to_string(),
        }
    }
}

impl PrimaryStore for TabixVcfStore {
    fn fetch(&self, chromosome: &str, position: u64) -> Result<Vec<VariantRecord>, LookupError> {
        let mut reader = vcf::io::indexed_reader::Builder::default()
            .build_from_path(&self.path)
            .map_err(|e| LookupError::io(&self.path, e))?;
        let header = reader
            .read_header()
            .map_err(|e| self.noodles_error(e))?;

        let start = usize::try_from(position)
            .ok()
            .and_then(|p| Position::try_from(p).ok())
            .ok_or_else(|| self.noodles_error(format!("position {position} out of range")))?;
        let region = Region::new(chromosome, start..=start);

        let Some(index_header) = reader.index().header() else {
            return Err(self.noodles_error("VCF index has no tabix header"));
        };
        if !index_header
            .reference_sequence_names()
            .contains(region.name())
        {
            debug!(chromosome, path = %self.path.display(), "Sequence not in VCF index");
            return Ok(Vec::new());
        }

        let query = reader
            .query(&header, &region)
            .map_err(|e| self.noodles_error(e))?;

        let mut records = Vec::new();
        for result in query {
            let record = result.map_err(|e| self.noodles_error(e))?;
            let pos = match record.variant_start() {
                Some(Ok(p)) => usize::from(p) as u64,
                Some(Err(e)) => return Err(self.noodles_error(e)),
                None => continue,
            };
            // The region query also yields records overlapping from upstream
            if pos != position {
                continue;
            }
            records.push(from_noodles(&record, pos));
        }

        debug!(chromosome, position, records = records.len(), "Primary lookup");
        Ok(records)
    }
}

fn from_noodles(record: &vcf::Record, pos: u64) -> VariantRecord {
    let ids = record.ids();
    let alt = record.alternate_bases();
    let info = record.info();

    VariantRecord {
        chrom: record.reference_sequence_name().to_string(),
        pos,
        id: non_empty(ids.as_ref()),
        ref_allele: record.reference_bases().to_string(),
        alt: non_empty(alt.as_ref())
            .split(',')
            .map(str::to_string)
            .collect(),
        info: non_empty(info.as_ref()),
    }
}

fn non_empty(field: &str) -> String {
    if field.is_empty() {
        ".".to_string()
    } else {
        field.to_string()
    }
}

impl SecondaryIndex for RsidIndexReader {
    fn lookup(&self, rsid: u64) -> Result<Vec<Locus>, LookupError> {
        let entries = RsidIndexReader::lookup(self, rsid).map_err(|e| match e.kind() {
            io::ErrorKind::InvalidData => LookupError::Index {
                path: self.data_path().to_path_buf(),
                message: e.to_string(),
            },
            _ => LookupError::io(self.data_path(), e),
        })?;
        Ok(entries.iter().map(RsidEntry::locus).collect())
    }
}

/// Open the rsid index at `path`, mapping a missing or invalid sidecar to `LookupError`
///
/// # Errors
///
/// Returns `LookupError::Io` if either file is missing, or
/// `LookupError::Index` if the sidecar is invalid.
pub fn open_rsid_index(path: &Path) -> Result<RsidIndexReader, LookupError> {
    if !path.is_file() {
        return Err(LookupError::io(
            path,
            io::Error::new(io::ErrorKind::NotFound, "rsid index not found"),
        ));
    }
    RsidIndexReader::open(path).map_err(|e| match e.kind() {
        io::ErrorKind::InvalidData | io::ErrorKind::UnexpectedEof => LookupError::Index {
            path: index_path(path),
            message: e.to_string(),
        },
        _ => LookupError::io(index_path(path), e),
    })
}

/// Primary store held in memory, in file order
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    records: Vec<VariantRecord>,
    by_locus: HashMap<(String, u64), Vec<usize>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every data line of a plain-text VCF
    ///
    /// # Errors
    ///
    /// Returns `RecordError` for the first malformed data line.
    pub fn from_vcf_text(text: &str) -> Result<Self, RecordError> {
        let mut store = Self::new();
        for line in text.lines() {
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            store.push(VariantRecord::from_vcf_line(line)?);
        }
        Ok(store)
    }

    pub fn push(&mut self, record: VariantRecord) {
        self.by_locus
            .entry((record.chrom.clone(), record.pos))
            .or_default()
            .push(self.records.len());
        self.records.push(record);
    }

    /// One entry per rsid occurrence, in file order
    pub fn entries(&self) -> impl Iterator<Item = RsidEntry> + '_ {
        self.records.iter().flat_map(|record| {
            record
                .ids()
                .filter_map(|id| parse_rsid(id).ok())
                .map(|rsid| RsidEntry::new(rsid, record.chrom.clone(), record.pos))
                .collect::<Vec<_>>()
        })
    }
}

impl PrimaryStore for InMemoryStore {
    fn fetch(&self, chromosome: &str, position: u64) -> Result<Vec<VariantRecord>, LookupError> {
        Ok(self
            .by_locus
            .get(&(chromosome.to_string(), position))
            .map(|rows| rows.iter().map(|&i| self.records[i].clone()).collect())
            .unwrap_or_default())
    }
}

/// Secondary index held in memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryRsidIndex {
    loci: HashMap<u64, Vec<Locus>>,
}

impl InMemoryRsidIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, rsid: u64, locus: Locus) {
        self.loci.entry(rsid).or_default().push(locus);
    }
}

impl FromIterator<RsidEntry> for InMemoryRsidIndex {
    fn from_iter<I: IntoIterator<Item = RsidEntry>>(iter: I) -> Self {
        let mut index = Self::new();
        for entry in iter {
            let locus = entry.locus();
            index.insert(entry.rsid, locus);
        }
        index
    }
}

impl SecondaryIndex for InMemoryRsidIndex {
    fn lookup(&self, rsid: u64) -> Result<Vec<Locus>, LookupError> {
        Ok(self.loci.get(&rsid).cloned().unwrap_or_default())
    }
}
