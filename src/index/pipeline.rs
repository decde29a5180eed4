//! Concurrent index-building pipeline.
//!
//! ```text
//! VCF bytes -> [decompress] -> lines -> [transform] -> entries -> [sort] -> sorted entries -> [compress] -> BGZF
//! ```
//!
//! Each stage runs on its own scoped thread. Stages exchange batches over
//! bounded channels, so a slow consumer blocks its producer. The sort stage
//! must see every entry before it emits the first one; its memory use is
//! capped by spilling sorted runs to the temp directory.
//!
//! The first failing stage sets a shared abort flag. The other stages notice
//! it between batches and stop with `ErrorKind::Interrupted`, which is never
//! reported as the cause.

use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use crossbeam_channel::{bounded, Receiver, Sender};
use flate2::bufread::MultiGzDecoder;
use tracing::{debug, info};

use super::builder::BuildError;
use super::format::{BlockIndex, RsidEntry};
use super::sort::{ExternalSorter, DEFAULT_SORT_BUFFER_ENTRIES};
use super::writer::{RsidIndexWriter, DEFAULT_SAMPLE_INTERVAL};
use crate::core::record::{parse_position, RecordError};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Pipeline stage, reported with failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Decompress,
    Transform,
    Sort,
    Compress,
    Index,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Decompress => "decompress",
            Self::Transform => "transform",
            Self::Sort => "sort",
            Self::Compress => "compress",
            Self::Index => "index",
        };
        write!(f, "{name}")
    }
}

/// Tuning knobs for one pipeline run
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Directory for sort spill runs
    pub temp_dir: PathBuf,
    /// Entries held in memory before the sorter spills a run
    pub sort_buffer_entries: usize,
    /// Batches buffered between two stages
    pub channel_capacity: usize,
    /// Lines or entries per batch
    pub batch_size: usize,
    /// Lines between block index samples
    pub sample_interval: u64,
}

impl PipelineOptions {
    pub fn new(temp_dir: impl Into<PathBuf>) -> Self {
        Self {
            temp_dir: temp_dir.into(),
            sort_buffer_entries: DEFAULT_SORT_BUFFER_ENTRIES,
            channel_capacity: 16,
            batch_size: 4096,
            sample_interval: DEFAULT_SAMPLE_INTERVAL,
        }
    }
}

/// Counters collected by the transform stage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransformStats {
    pub header_lines: u64,
    pub records: u64,
    pub entries: u64,
    /// IDs that are not rsids (`.` excluded)
    pub skipped_ids: u64,
}

/// Result of a successful pipeline run
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub lines: u64,
    pub stats: TransformStats,
    pub spilled_runs: usize,
    pub index: BlockIndex,
}

/// Extract one index entry per rsid in a VCF data line
///
/// Returns the entries and the number of non-rsid identifiers skipped.
///
/// # Errors
///
/// Returns `RecordError` if the line has fewer than three columns or an
/// invalid position.
pub fn extract_entries(line: &str) -> Result<(Vec<RsidEntry>, u64), RecordError> {
    let mut fields = line.splitn(4, '\t');
    let (Some(chrom), Some(pos), Some(ids)) = (fields.next(), fields.next(), fields.next()) else {
        return Err(RecordError::TooFewFields {
            found: line.split('\t').count(),
            expected: 3,
        });
    };
    let position = parse_position(pos)?;
    let ids = ids.trim_end_matches(['\n', '\r']);

    let mut entries = Vec::new();
    let mut skipped = 0;
    for id in ids.split(';').filter(|id| !id.is_empty() && *id != ".") {
        match numeric_rsid(id) {
            Some(rsid) => entries.push(RsidEntry::new(rsid, chrom, position)),
            None => {
                debug!(id, chrom, position, "Skipping non-rsid identifier");
                skipped += 1;
            }
        }
    }

    Ok((entries, skipped))
}

fn numeric_rsid(id: &str) -> Option<u64> {
    let digits = id.strip_prefix("rs")?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok().filter(|&n| n > 0)
}

/// Shared stop flags: the caller's cancel flag and the pipeline's abort flag
#[derive(Clone, Copy)]
struct Stop<'a> {
    cancel: &'a AtomicBool,
    abort: &'a AtomicBool,
}

impl Stop<'_> {
    fn check(self) -> io::Result<()> {
        if self.cancel.load(Ordering::Relaxed) || self.abort.load(Ordering::Relaxed) {
            Err(interrupted())
        } else {
            Ok(())
        }
    }
}

fn interrupted() -> io::Error {
    io::Error::new(io::ErrorKind::Interrupted, "pipeline stopped")
}

fn send<T>(tx: &Sender<T>, batch: T) -> io::Result<()> {
    tx.send(batch).map_err(|_| interrupted())
}

/// Run the full pipeline from compressed (or plain) VCF bytes to BGZF output
///
/// # Errors
///
/// Returns `BuildError::StageFailed` naming the first stage that failed, or
/// `BuildError::Cancelled` if `cancel` was set.
pub fn run<R, W>(
    input: R,
    output: W,
    source: &str,
    options: &PipelineOptions,
    cancel: &AtomicBool,
) -> Result<PipelineOutput, BuildError>
where
    R: Read + Send,
    W: Write + Send,
{
    let abort = AtomicBool::new(false);
    let stop = Stop {
        cancel,
        abort: &abort,
    };
    let capacity = options.channel_capacity.max(1);
    let batch_size = options.batch_size.max(1);

    let (line_tx, line_rx) = bounded::<Vec<String>>(capacity);
    let (entry_tx, entry_rx) = bounded::<Vec<RsidEntry>>(capacity);
    let (sorted_tx, sorted_rx) = bounded::<Vec<RsidEntry>>(capacity);

    let (lines, stats, runs, index) = thread::scope(|s| {
        let decompress = s.spawn(move || {
            guarded(stop, decompress_stage(input, &line_tx, batch_size, stop))
        });
        let transform = s.spawn(move || {
            guarded(stop, transform_stage(&line_rx, &entry_tx, stop))
        });
        let sort = s.spawn(move || {
            guarded(stop, sort_stage(&entry_rx, &sorted_tx, options, batch_size, stop))
        });
        let compress = s.spawn(move || {
            guarded(stop, compress_stage(&sorted_rx, output, source, options.sample_interval, stop))
        });

        (
            join(decompress),
            join(transform),
            join(sort),
            join(compress),
        )
    });

    let failures = [
        (Stage::Decompress, lines.as_ref().err()),
        (Stage::Transform, stats.as_ref().err()),
        (Stage::Sort, runs.as_ref().err()),
        (Stage::Compress, index.as_ref().err()),
    ];
    if let Some((stage, error)) = failures
        .into_iter()
        .find_map(|(stage, e)| e.filter(|e| e.kind() != io::ErrorKind::Interrupted).map(|e| (stage, e)))
    {
        return Err(BuildError::StageFailed {
            stage,
            input: source.to_string(),
            source: io::Error::new(error.kind(), error.to_string()),
        });
    }

    match (lines, stats, runs, index) {
        (Ok(lines), Ok(stats), Ok(spilled_runs), Ok(index)) => Ok(PipelineOutput {
            lines,
            stats,
            spilled_runs,
            index,
        }),
        _ => Err(BuildError::Cancelled),
    }
}

/// Record a real failure in the abort flag so sibling stages wind down
fn guarded<T>(stop: Stop<'_>, result: io::Result<T>) -> io::Result<T> {
    if let Err(e) = &result {
        if e.kind() != io::ErrorKind::Interrupted {
            stop.abort.store(true, Ordering::Relaxed);
        }
    }
    result
}

fn join<T>(handle: thread::ScopedJoinHandle<'_, io::Result<T>>) -> io::Result<T> {
    handle
        .join()
        .unwrap_or_else(|_| Err(io::Error::other("pipeline stage panicked")))
}

fn open_decoder<'a, R: Read + 'a>(input: R) -> io::Result<Box<dyn BufRead + 'a>> {
    let mut reader = BufReader::new(input);
    let is_gzip = reader.fill_buf()?.starts_with(&GZIP_MAGIC);
    if is_gzip {
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(reader))))
    } else {
        Ok(Box::new(reader))
    }
}

fn decompress_stage<R: Read>(
    input: R,
    tx: &Sender<Vec<String>>,
    batch_size: usize,
    stop: Stop<'_>,
) -> io::Result<u64> {
    let reader = open_decoder(input)?;
    let mut batch = Vec::with_capacity(batch_size);
    let mut lines = 0;

    for line in reader.lines() {
        batch.push(line?);
        lines += 1;
        if batch.len() >= batch_size {
            stop.check()?;
            send(tx, std::mem::replace(&mut batch, Vec::with_capacity(batch_size)))?;
        }
    }
    if !batch.is_empty() {
        send(tx, batch)?;
    }

    debug!(lines, "Decompress stage finished");
    Ok(lines)
}

fn transform_stage(
    rx: &Receiver<Vec<String>>,
    tx: &Sender<Vec<RsidEntry>>,
    stop: Stop<'_>,
) -> io::Result<TransformStats> {
    let mut stats = TransformStats::default();
    let mut line_number = 0u64;

    for lines in rx {
        stop.check()?;
        let mut batch = Vec::with_capacity(lines.len());
        for line in &lines {
            line_number += 1;
            if line.is_empty() || line.starts_with('#') {
                stats.header_lines += 1;
                continue;
            }

            let (entries, skipped) = extract_entries(line).map_err(|e| {
                io::Error::new(io::ErrorKind::InvalidData, format!("line {line_number}: {e}"))
            })?;
            stats.records += 1;
            stats.skipped_ids += skipped;
            batch.extend(entries);
        }

        stats.entries += batch.len() as u64;
        if !batch.is_empty() {
            send(tx, batch)?;
        }
    }

    debug!(
        records = stats.records,
        entries = stats.entries,
        skipped_ids = stats.skipped_ids,
        "Transform stage finished"
    );
    Ok(stats)
}

fn sort_stage(
    rx: &Receiver<Vec<RsidEntry>>,
    tx: &Sender<Vec<RsidEntry>>,
    options: &PipelineOptions,
    batch_size: usize,
    stop: Stop<'_>,
) -> io::Result<usize> {
    let mut sorter = ExternalSorter::new(&options.temp_dir, options.sort_buffer_entries);
    for batch in rx {
        stop.check()?;
        for entry in batch {
            sorter.push(entry)?;
        }
    }
    stop.check()?;

    let total = sorter.len();
    let spilled = sorter.run_count();
    info!(entries = total, spilled_runs = spilled, "Merging sorted entries");

    let mut batch = Vec::with_capacity(batch_size);
    for entry in sorter.finish()? {
        batch.push(entry?);
        if batch.len() >= batch_size {
            stop.check()?;
            send(tx, std::mem::replace(&mut batch, Vec::with_capacity(batch_size)))?;
        }
    }
    if !batch.is_empty() {
        send(tx, batch)?;
    }

    Ok(spilled)
}

fn compress_stage<W: Write>(
    rx: &Receiver<Vec<RsidEntry>>,
    output: W,
    source: &str,
    sample_interval: u64,
    stop: Stop<'_>,
) -> io::Result<BlockIndex> {
    let mut writer = RsidIndexWriter::new(output, source, sample_interval);
    for batch in rx {
        stop.check()?;
        for entry in &batch {
            writer.write_entry(entry)?;
        }
    }
    stop.check()?;

    debug!(entries = writer.entry_count(), "Compress stage finished");
    writer.finish()
}
