use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Seek};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use noodles::bgzf;
use tracing::debug;

use super::format::{index_path, BlockIndex, RsidEntry};
use super::writer::read_block_index;

/// Random-access reader over a built rsid index
///
/// The block index is loaded once; each lookup opens its own file handle, so
/// a reader can be shared between threads.
#[derive(Debug, Clone)]
pub struct RsidIndexReader {
    data_path: PathBuf,
    index: Arc<BlockIndex>,
}

impl RsidIndexReader {
    /// Open a data file and its `.rsi` sidecar
    ///
    /// # Errors
    ///
    /// Returns an error if the sidecar is missing or invalid, or
    /// `io::ErrorKind::InvalidData` if it was written for a different data file.
    pub fn open(data_path: impl Into<PathBuf>) -> io::Result<Self> {
        let data_path = data_path.into();
        let sidecar = index_path(&data_path);
        let file = File::open(&sidecar).map_err(|e| {
            io::Error::new(
                e.kind(),
                format!("cannot open rsid block index {}: {e}", sidecar.display()),
            )
        })?;
        let index = read_block_index(BufReader::new(file))?;

        let data_length = std::fs::metadata(&data_path)?.len();
        if data_length != index.data_length {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "rsid block index {} does not match its data file ({} bytes, expected {})",
                    sidecar.display(),
                    data_length,
                    index.data_length
                ),
            ));
        }

        debug!(
            path = %data_path.display(),
            entries = index.entry_count,
            samples = index.samples.len(),
            "Loaded rsid block index"
        );

        Ok(Self {
            data_path,
            index: Arc::new(index),
        })
    }

    pub fn data_path(&self) -> &Path {
        &self.data_path
    }

    pub fn block_index(&self) -> &BlockIndex {
        &self.index
    }

    /// All entries for `rsid`, in file order
    ///
    /// # Errors
    ///
    /// Returns an error if the data file cannot be read or holds a malformed line.
    pub fn lookup(&self, rsid: u64) -> io::Result<Vec<RsidEntry>> {
        let file = File::open(&self.data_path)?;
        lookup_in(file, &self.index, rsid)
    }
}

/// Look up `rsid` in BGZF data read from `inner`, starting at the block index sample
///
/// Reads at most one sample interval of non-matching lines plus the matches.
///
/// # Errors
///
/// Returns an error if reading fails or a line is not a valid entry.
pub fn lookup_in<R: Read + Seek>(
    inner: R,
    index: &BlockIndex,
    rsid: u64,
) -> io::Result<Vec<RsidEntry>> {
    let mut reader = bgzf::Reader::new(inner);
    if let Some(position) = index.seek_position(rsid) {
        reader.seek(bgzf::VirtualPosition::from(position))?;
    }

    let mut matches = Vec::new();
    let mut line = String::new();
    loop {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            break;
        }

        let entry = RsidEntry::from_line(&line)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        if entry.rsid > rsid {
            break;
        }
        if entry.rsid == rsid {
            matches.push(entry);
        }
    }

    Ok(matches)
}
