//! Stable external sort of index entries by rsid.
//!
//! Entries are buffered in memory; a full buffer is stably sorted and spilled
//! to an anonymous temporary file (a *run*). Finishing merges the runs with a
//! k-way heap merge. Ties on rsid are broken by run number, and each run is
//! stably sorted, so duplicate rsids keep their original emission order.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use super::format::RsidEntry;

/// Default number of entries held in memory before spilling a run
pub const DEFAULT_SORT_BUFFER_ENTRIES: usize = 4_000_000;

pub struct ExternalSorter {
    temp_dir: PathBuf,
    buffer_capacity: usize,
    buffer: Vec<RsidEntry>,
    runs: Vec<File>,
    total: u64,
}

impl ExternalSorter {
    pub fn new(temp_dir: impl Into<PathBuf>, buffer_capacity: usize) -> Self {
        let buffer_capacity = buffer_capacity.max(1);
        Self {
            temp_dir: temp_dir.into(),
            buffer_capacity,
            buffer: Vec::with_capacity(buffer_capacity.min(DEFAULT_SORT_BUFFER_ENTRIES)),
            runs: Vec::new(),
            total: 0,
        }
    }

    pub fn temp_dir(&self) -> &Path {
        &self.temp_dir
    }

    /// Add an entry, spilling a sorted run when the buffer is full
    ///
    /// # Errors
    ///
    /// Returns an error if a run cannot be written to the temp directory.
    pub fn push(&mut self, entry: RsidEntry) -> io::Result<()> {
        self.buffer.push(entry);
        self.total += 1;
        if self.buffer.len() >= self.buffer_capacity {
            self.spill()?;
        }
        Ok(())
    }

    /// Number of runs spilled so far
    pub fn run_count(&self) -> usize {
        self.runs.len()
    }

    pub fn len(&self) -> u64 {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    fn spill(&mut self) -> io::Result<()> {
        self.buffer.sort_by_key(|e| e.rsid);

        let file = tempfile::tempfile_in(&self.temp_dir).map_err(|e| {
            io::Error::new(
                e.kind(),
                format!(
                    "cannot create sort spill file in {}: {e}",
                    self.temp_dir.display()
                ),
            )
        })?;
        let mut writer = BufWriter::new(file);
        for entry in self.buffer.drain(..) {
            writer.write_all(entry.to_line().as_bytes())?;
        }
        let mut file = writer.into_inner().map_err(io::IntoInnerError::into_error)?;
        file.seek(SeekFrom::Start(0))?;

        debug!(run = self.runs.len(), "Spilled sorted run");
        self.runs.push(file);
        Ok(())
    }

    /// Finish sorting and stream the entries in rsid order
    ///
    /// # Errors
    ///
    /// Returns an error if the last run cannot be spilled.
    pub fn finish(mut self) -> io::Result<SortedEntries> {
        if self.runs.is_empty() {
            self.buffer.sort_by_key(|e| e.rsid);
            return Ok(SortedEntries::Memory(self.buffer.into_iter()));
        }

        if !self.buffer.is_empty() {
            self.spill()?;
        }
        Ok(SortedEntries::Merge(RunMerger::new(self.runs)?))
    }
}

/// Sorted output of an [`ExternalSorter`]
pub enum SortedEntries {
    Memory(std::vec::IntoIter<RsidEntry>),
    Merge(RunMerger),
}

impl Iterator for SortedEntries {
    type Item = io::Result<RsidEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Self::Memory(entries) => entries.next().map(Ok),
            Self::Merge(merger) => merger.next(),
        }
    }
}

/// K-way merge over sorted runs
pub struct RunMerger {
    readers: Vec<BufReader<File>>,
    heads: Vec<Option<RsidEntry>>,
    heap: BinaryHeap<Reverse<(u64, usize)>>,
    line: String,
}

impl RunMerger {
    fn new(runs: Vec<File>) -> io::Result<Self> {
        let mut merger = Self {
            heads: vec![None; runs.len()],
            readers: runs.into_iter().map(BufReader::new).collect(),
            heap: BinaryHeap::new(),
            line: String::new(),
        };
        for run in 0..merger.readers.len() {
            merger.advance(run)?;
        }
        Ok(merger)
    }

    fn advance(&mut self, run: usize) -> io::Result<()> {
        self.line.clear();
        if self.readers[run].read_line(&mut self.line)? == 0 {
            self.heads[run] = None;
            return Ok(());
        }
        let entry = RsidEntry::from_line(&self.line)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        self.heap.push(Reverse((entry.rsid, run)));
        self.heads[run] = Some(entry);
        Ok(())
    }
}

impl Iterator for RunMerger {
    type Item = io::Result<RsidEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        let Reverse((_, run)) = self.heap.pop()?;
        let entry = self.heads[run].take()?;
        match self.advance(run) {
            Ok(()) => Some(Ok(entry)),
            Err(e) => Some(Err(e)),
        }
    }
}
