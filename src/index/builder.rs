//! Build the rsid index for one or more primary stores.
//!
//! Output is written to temporary files next to the destination and only
//! renamed into place once the pipeline and the sidecar have both succeeded,
//! so a failed or cancelled build never leaves a partial index behind.

use std::fs::{self, File};
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use signal_hook::consts::{SIGINT, SIGTERM};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{info, warn};

use super::format::index_path;
use super::pipeline::{self, PipelineOptions, Stage, TransformStats};
use super::writer::write_block_index;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("Output file '{}' already exists. Use --force to overwrite.", .0.display())]
    OutputExists(PathBuf),

    #[error("Primary store not found: {}", .0.display())]
    MissingInput(PathBuf),

    #[error("Index build of {input} failed in {stage} stage: {source}")]
    StageFailed {
        stage: Stage,
        input: String,
        #[source]
        source: io::Error,
    },

    #[error("Index build cancelled")]
    Cancelled,

    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid thread pool size: {0}")]
    ThreadPool(String),
}

impl BuildError {
    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Settings shared by every build
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Directory for sort spill runs; defaults to the output directory
    pub temp_dir: Option<PathBuf>,
    /// Overwrite existing outputs
    pub force: bool,
    pub sort_buffer_entries: usize,
    pub channel_capacity: usize,
    pub sample_interval: u64,
}

impl Default for BuildConfig {
    fn default() -> Self {
        let defaults = PipelineOptions::new(".");
        Self {
            temp_dir: None,
            force: false,
            sort_buffer_entries: defaults.sort_buffer_entries,
            channel_capacity: defaults.channel_capacity,
            sample_interval: defaults.sample_interval,
        }
    }
}

impl BuildConfig {
    #[must_use]
    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    #[must_use]
    pub fn with_temp_dir(mut self, temp_dir: Option<PathBuf>) -> Self {
        self.temp_dir = temp_dir;
        self
    }

    #[must_use]
    pub fn with_sort_buffer_entries(mut self, entries: usize) -> Self {
        self.sort_buffer_entries = entries;
        self
    }

    #[must_use]
    pub fn with_sample_interval(mut self, interval: u64) -> Self {
        self.sample_interval = interval;
        self
    }
}

/// What a finished build produced
#[derive(Debug, Clone, serde::Serialize)]
pub struct BuildSummary {
    pub input: PathBuf,
    pub output: PathBuf,
    pub sidecar: PathBuf,
    pub lines: u64,
    pub records: u64,
    pub entries: u64,
    pub skipped_ids: u64,
    pub spilled_runs: usize,
    pub elapsed_secs: f64,
}

/// One (primary store, output path) pair
#[derive(Debug, Clone)]
pub struct BuildJob {
    pub input: PathBuf,
    pub output: PathBuf,
}

impl BuildJob {
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct IndexBuilder {
    config: BuildConfig,
    cancel: Arc<AtomicBool>,
}

impl IndexBuilder {
    pub fn new(config: BuildConfig) -> Self {
        Self {
            config,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Flag that stops in-flight builds when set
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    /// Cancel in-flight builds on SIGINT or SIGTERM
    ///
    /// The first signal lets the pipeline stop and drop its temporary files;
    /// a second one exits immediately.
    ///
    /// # Errors
    ///
    /// Returns an error if a handler cannot be registered.
    pub fn cancel_on_signals(&self) -> io::Result<()> {
        for signal in [SIGINT, SIGTERM] {
            signal_hook::flag::register_conditional_shutdown(signal, 130, self.cancel_flag())?;
            signal_hook::flag::register(signal, self.cancel_flag())?;
        }
        Ok(())
    }

    /// Build the rsid index of `input` at `output` (plus its `.rsi` sidecar)
    ///
    /// # Errors
    ///
    /// Returns `BuildError::OutputExists` if `output` exists and `force` is
    /// off, `BuildError::MissingInput` if `input` does not exist, or the
    /// first stage failure. Existing outputs are untouched on failure.
    pub fn build(&self, input: &Path, output: &Path) -> Result<BuildSummary, BuildError> {
        let sidecar = index_path(output);
        if !self.config.force {
            for path in [output, sidecar.as_path()] {
                if path.exists() {
                    return Err(BuildError::OutputExists(path.to_path_buf()));
                }
            }
        }
        if !input.is_file() {
            return Err(BuildError::MissingInput(input.to_path_buf()));
        }

        let started = Instant::now();
        let out_dir = match output.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let temp_dir = self.config.temp_dir.clone().unwrap_or_else(|| out_dir.clone());
        let options = PipelineOptions {
            temp_dir,
            sort_buffer_entries: self.config.sort_buffer_entries,
            channel_capacity: self.config.channel_capacity,
            sample_interval: self.config.sample_interval,
            ..PipelineOptions::new(".")
        };

        info!(
            input = %input.display(),
            output = %output.display(),
            "Building rsid index"
        );

        let source = input
            .file_name()
            .map_or_else(|| input.display().to_string(), |n| n.to_string_lossy().into_owned());
        let reader = File::open(input).map_err(|e| BuildError::io(input, e))?;
        let data = NamedTempFile::new_in(&out_dir).map_err(|e| BuildError::io(&out_dir, e))?;

        let mut result = pipeline::run(
            reader,
            BufWriter::new(data.as_file()),
            &source,
            &options,
            &self.cancel,
        )?;
        result.index.data_length = data
            .as_file()
            .metadata()
            .map_err(|e| BuildError::io(data.path(), e))?
            .len();

        let index_tmp =
            NamedTempFile::new_in(&out_dir).map_err(|e| BuildError::io(&out_dir, e))?;
        write_block_index(BufWriter::new(index_tmp.as_file()), &result.index).map_err(|e| {
            BuildError::StageFailed {
                stage: Stage::Index,
                input: source.clone(),
                source: e,
            }
        })?;

        if self.cancel.load(Ordering::Relaxed) {
            return Err(BuildError::Cancelled);
        }

        // An old sidecar must never sit next to the new data file
        match fs::remove_file(&sidecar) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => {
                return Err(BuildError::io(&sidecar, e));
            }
            _ => {}
        }
        data.persist(output)
            .map_err(|e| BuildError::io(output, e.error))?;
        index_tmp
            .persist(&sidecar)
            .map_err(|e| BuildError::io(&sidecar, e.error))?;

        let TransformStats {
            records,
            entries,
            skipped_ids,
            ..
        } = result.stats;
        let summary = BuildSummary {
            input: input.to_path_buf(),
            output: output.to_path_buf(),
            sidecar,
            lines: result.lines,
            records,
            entries,
            skipped_ids,
            spilled_runs: result.spilled_runs,
            elapsed_secs: started.elapsed().as_secs_f64(),
        };

        if skipped_ids > 0 {
            warn!(
                input = %input.display(),
                skipped_ids,
                "Some identifiers were not rsids and were left out of the index"
            );
        }
        info!(
            output = %summary.output.display(),
            entries,
            elapsed_secs = summary.elapsed_secs,
            "Finished rsid index"
        );

        Ok(summary)
    }

    /// Run several builds on a pool of `processes` threads
    ///
    /// Results are returned in job order. A failure in one build does not
    /// stop the others.
    ///
    /// # Errors
    ///
    /// Returns `BuildError::ThreadPool` if the pool cannot be created.
    pub fn build_all(
        &self,
        jobs: &[BuildJob],
        processes: usize,
    ) -> Result<Vec<Result<BuildSummary, BuildError>>, BuildError> {
        use rayon::prelude::*;

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(processes.max(1))
            .build()
            .map_err(|e| BuildError::ThreadPool(e.to_string()))?;

        Ok(pool.install(|| {
            jobs.par_iter()
                .map(|job| self.build(&job.input, &job.output))
                .collect()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::reader::RsidIndexReader;

    const VCF: &str = "##fileformat=VCFv4.2
#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO
NC_000008.10\t118184783\trs231361\tC\tT\t.\t.\tRS=231361
NC_000001.10\t10019\trs775809821\tTA\tT\t.\t.\tRS=775809821
";

    fn write_input(dir: &Path) -> PathBuf {
        let path = dir.join("primary.vcf");
        fs::write(&path, VCF).unwrap();
        path
    }

    #[test]
    fn test_build_writes_data_and_sidecar() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_input(dir.path());
        let output = dir.path().join("primary.rsid.bgz");

        let summary = IndexBuilder::default().build(&input, &output).unwrap();
        assert_eq!(summary.entries, 2);
        assert_eq!(summary.records, 2);
        assert!(output.exists());
        assert!(summary.sidecar.exists());

        let reader = RsidIndexReader::open(&output).unwrap();
        assert_eq!(reader.block_index().source, "primary.vcf");
        let hits = reader.lookup(231_361).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].position, 118_184_783);
    }

    #[test]
    fn test_existing_output_requires_force() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_input(dir.path());
        let output = dir.path().join("primary.rsid.bgz");
        fs::write(&output, "keep me").unwrap();

        let err = IndexBuilder::default().build(&input, &output).unwrap_err();
        assert!(matches!(err, BuildError::OutputExists(_)));
        assert_eq!(fs::read_to_string(&output).unwrap(), "keep me");

        let forced = IndexBuilder::new(BuildConfig::default().with_force(true));
        forced.build(&input, &output).unwrap();
        assert!(RsidIndexReader::open(&output).is_ok());
    }

    #[test]
    fn test_sidecar_records_data_length() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_input(dir.path());
        let output = dir.path().join("primary.rsid.bgz");

        IndexBuilder::default().build(&input, &output).unwrap();
        let reader = RsidIndexReader::open(&output).unwrap();
        assert_eq!(
            reader.block_index().data_length,
            fs::metadata(&output).unwrap().len()
        );
    }

    #[test]
    fn test_sidecar_from_previous_build_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_input(dir.path());
        let output = dir.path().join("primary.rsid.bgz");
        let sidecar = index_path(&output);
        IndexBuilder::default().build(&input, &output).unwrap();
        let old_sidecar = fs::read(&sidecar).unwrap();

        // Rebuild from a larger store, then put the old sidecar back
        let bigger = dir.path().join("bigger.vcf");
        let mut text = VCF.to_string();
        for rsid in 1..200 {
            text.push_str(&format!("NC_000012.11\t{rsid}\trs{rsid}\tA\tG\t.\t.\t.\n"));
        }
        fs::write(&bigger, text).unwrap();
        let forced = IndexBuilder::new(BuildConfig::default().with_force(true));
        forced.build(&bigger, &output).unwrap();
        assert!(RsidIndexReader::open(&output).is_ok());

        fs::write(&sidecar, old_sidecar).unwrap();
        let err = RsidIndexReader::open(&output).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        assert!(err.to_string().contains("does not match"));
    }

    #[test]
    fn test_cancel_flag_stops_build_and_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_input(dir.path());
        let output = dir.path().join("primary.rsid.bgz");

        let builder = IndexBuilder::default();
        builder.cancel_flag().store(true, Ordering::Relaxed);
        let results = builder
            .build_all(&[BuildJob::new(&input, &output)], 1)
            .unwrap();
        assert!(matches!(results[0], Err(BuildError::Cancelled)));

        // Only the input remains; every temporary file was removed
        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("primary.vcf")]);
    }

    #[cfg(unix)]
    #[test]
    fn test_signal_sets_cancel_flag() {
        let builder = IndexBuilder::default();
        builder.cancel_on_signals().unwrap();
        assert!(!builder.cancel_flag().load(Ordering::Relaxed));

        signal_hook::low_level::raise(SIGTERM).unwrap();
        assert!(builder.cancel_flag().load(Ordering::Relaxed));
    }

    #[test]
    fn test_failed_build_leaves_no_output() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("bad.vcf");
        fs::write(&input, "NC_000001.10\tzero\trs1\tA\tG\t.\t.\t.\n").unwrap();
        let output = dir.path().join("bad.rsid.bgz");

        let err = IndexBuilder::default().build(&input, &output).unwrap_err();
        assert!(matches!(
            err,
            BuildError::StageFailed {
                stage: Stage::Transform,
                ..
            }
        ));
        assert!(!output.exists());
        assert!(!index_path(&output).exists());
    }

    #[test]
    fn test_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let err = IndexBuilder::default()
            .build(&dir.path().join("absent.vcf.gz"), &dir.path().join("out.bgz"))
            .unwrap_err();
        assert!(matches!(err, BuildError::MissingInput(_)));
    }

    #[test]
    fn test_cancelled_build_publishes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_input(dir.path());
        let output = dir.path().join("primary.rsid.bgz");

        let builder = IndexBuilder::default();
        builder.cancel();
        let err = builder.build(&input, &output).unwrap_err();
        assert!(matches!(err, BuildError::Cancelled));
        assert!(!output.exists());
    }

    #[test]
    fn test_build_all_runs_independent_jobs() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_input(dir.path());
        let jobs = vec![
            BuildJob::new(&input, dir.path().join("a.rsid.bgz")),
            BuildJob::new(dir.path().join("missing.vcf"), dir.path().join("b.rsid.bgz")),
        ];

        let results = IndexBuilder::default().build_all(&jobs, 2).unwrap();
        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(BuildError::MissingInput(_))));
    }
}
