use std::io::{self, Read, Write};

use noodles::bgzf;

use super::format::{BlockIndex, BlockSample, RsidEntry, INDEX_MAGIC, INDEX_VERSION};

/// Default number of lines between block index samples
pub const DEFAULT_SAMPLE_INTERVAL: u64 = 1024;

/// Writes sorted entries as BGZF text and samples their virtual positions
pub struct RsidIndexWriter<W: Write> {
    inner: bgzf::Writer<W>,
    index: BlockIndex,
    last_rsid: Option<u64>,
}

impl<W: Write> RsidIndexWriter<W> {
    pub fn new(inner: W, source: impl Into<String>, sample_interval: u64) -> Self {
        Self {
            inner: bgzf::Writer::new(inner),
            index: BlockIndex::new(source, sample_interval.max(1)),
            last_rsid: None,
        }
    }

    /// Append one entry
    ///
    /// # Errors
    ///
    /// Returns `io::ErrorKind::InvalidInput` if entries arrive out of rsid order,
    /// or any error from the underlying writer.
    pub fn write_entry(&mut self, entry: &RsidEntry) -> io::Result<()> {
        if let Some(last) = self.last_rsid {
            if entry.rsid < last {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("rsid index entries out of order: rs{} after rs{last}", entry.rsid),
                ));
            }
        }

        if self.index.entry_count % self.index.sample_interval == 0 {
            self.index.samples.push(BlockSample {
                rsid: entry.rsid,
                virtual_position: u64::from(self.inner.virtual_position()),
            });
        }

        self.inner.write_all(entry.to_line().as_bytes())?;
        self.index.entry_count += 1;
        self.last_rsid = Some(entry.rsid);
        Ok(())
    }

    pub fn entry_count(&self) -> u64 {
        self.index.entry_count
    }

    /// Flush the final block plus the BGZF EOF marker and return the block index
    ///
    /// # Errors
    ///
    /// Returns any error from the underlying writer.
    pub fn finish(self) -> io::Result<BlockIndex> {
        let mut inner = self.inner.finish()?;
        inner.flush()?;
        Ok(self.index)
    }
}

/// Serialize a block index (magic bytes followed by bincode)
///
/// # Errors
///
/// Returns an error if writing or serialization fails.
pub fn write_block_index<W: Write>(mut writer: W, index: &BlockIndex) -> io::Result<()> {
    writer.write_all(&INDEX_MAGIC)?;
    bincode::serialize_into(&mut writer, index)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;
    writer.flush()
}

/// Deserialize a block index written by [`write_block_index`]
///
/// # Errors
///
/// Returns `io::ErrorKind::InvalidData` for a bad magic number, an unknown
/// version or undecodable content.
pub fn read_block_index<R: Read>(mut reader: R) -> io::Result<BlockIndex> {
    let mut magic = [0; 4];
    reader.read_exact(&mut magic)?;
    if magic != INDEX_MAGIC {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "not an rsid block index (bad magic number)",
        ));
    }

    let index: BlockIndex = bincode::deserialize_from(reader)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))?;

    if index.version != INDEX_VERSION {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!(
                "unsupported rsid block index version {} (expected {INDEX_VERSION})",
                index.version
            ),
        ));
    }

    Ok(index)
}
