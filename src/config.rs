//! Where the data files for each build live.
//!
//! Sources are layered, later wins:
//!
//! 1. NCBI file names under the data directory
//!    (`GCF_000001405.25.gz`, `GCF_000001405.25.rsid.bgz`, ...)
//! 2. A JSON config file
//! 3. `DBSNP_LOOKUP_VCF_<BUILD>` / `DBSNP_LOOKUP_RSID_<BUILD>` environment variables
//!
//! ```json
//! {
//!   "data_dir": "/data/dbsnp",
//!   "grch38": { "vcf": "dbsnp156.grch38.vcf.gz", "rsid_index": "dbsnp156.grch38.rsid.bgz" }
//! }
//! ```
//!
//! Relative paths are resolved against the data directory.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::core::error::LookupError;
use crate::core::types::ReferenceBuild;

pub const VCF_ENV_PREFIX: &str = "DBSNP_LOOKUP_VCF_";
pub const RSID_ENV_PREFIX: &str = "DBSNP_LOOKUP_RSID_";

/// Extension of the rsid index data file, replacing the VCF's `.gz`/`.bgz`
pub const RSID_INDEX_SUFFIX: &str = "rsid.bgz";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Primary store and secondary index for one build
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildPaths {
    pub vcf: PathBuf,
    pub rsid_index: PathBuf,
}

impl BuildPaths {
    /// NCBI-named files for `build` under `data_dir`
    #[must_use]
    pub fn default_for(build: ReferenceBuild, data_dir: &Path) -> Self {
        let vcf = data_dir.join(format!("{}.gz", build.assembly_accession()));
        let rsid_index = default_rsid_index_path(&vcf);
        Self { vcf, rsid_index }
    }
}

/// Default secondary index path next to a VCF (`x.vcf.gz` -> `x.vcf.rsid.bgz`)
#[must_use]
pub fn default_rsid_index_path(vcf: &Path) -> PathBuf {
    let stem = match vcf.extension().and_then(|e| e.to_str()) {
        Some("gz" | "bgz") => vcf.with_extension(""),
        _ => vcf.to_path_buf(),
    };
    let mut name = stem.into_os_string();
    name.push(".");
    name.push(RSID_INDEX_SUFFIX);
    PathBuf::from(name)
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    data_dir: Option<PathBuf>,
    grch37: Option<PartialPaths>,
    grch38: Option<PartialPaths>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct PartialPaths {
    vcf: Option<PathBuf>,
    rsid_index: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LookupConfig {
    pub data_dir: PathBuf,
    pub builds: BTreeMap<ReferenceBuild, BuildPaths>,
}

impl LookupConfig {
    /// NCBI file names for every build under `data_dir`
    #[must_use]
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        let builds = ReferenceBuild::ALL
            .into_iter()
            .map(|build| (build, BuildPaths::default_for(build, &data_dir)))
            .collect();
        Self { data_dir, builds }
    }

    /// Layer defaults, the optional config file and the process environment
    ///
    /// `data_dir` from the command line overrides the config file's.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the config file cannot be read or parsed.
    pub fn load(data_dir: Option<&Path>, config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match config_file {
            Some(path) => {
                let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;
                serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
                    path: path.to_path_buf(),
                    source,
                })?
            }
            None => ConfigFile::default(),
        };

        let data_dir = data_dir
            .map(Path::to_path_buf)
            .or_else(|| file.data_dir.clone())
            .unwrap_or_else(|| PathBuf::from("."));

        let mut config = Self::with_data_dir(data_dir);
        config.apply_file(&file);
        config.apply_env(|key| std::env::var(key).ok());

        debug!(?config, "Resolved configuration");
        Ok(config)
    }

    fn apply_file(&mut self, file: &ConfigFile) {
        for (build, partial) in [
            (ReferenceBuild::Grch37, &file.grch37),
            (ReferenceBuild::Grch38, &file.grch38),
        ] {
            let Some(partial) = partial else { continue };
            if let Some(vcf) = &partial.vcf {
                self.set_vcf(build, vcf);
            }
            if let Some(rsid_index) = &partial.rsid_index {
                let path = self.data_dir.join(rsid_index);
                self.entry(build).rsid_index = path;
            }
        }
    }

    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        for build in ReferenceBuild::ALL {
            if let Some(vcf) = var(&format!("{VCF_ENV_PREFIX}{}", build.env_suffix())) {
                self.set_vcf(build, Path::new(&vcf));
            }
            if let Some(rsid) = var(&format!("{RSID_ENV_PREFIX}{}", build.env_suffix())) {
                let path = self.data_dir.join(rsid);
                self.entry(build).rsid_index = path;
            }
        }
    }

    /// Point `build` at another VCF; an index still at its default follows it
    fn set_vcf(&mut self, build: ReferenceBuild, vcf: &Path) {
        let vcf = self.data_dir.join(vcf);
        let paths = self.entry(build);
        if paths.rsid_index == default_rsid_index_path(&paths.vcf) {
            paths.rsid_index = default_rsid_index_path(&vcf);
        }
        paths.vcf = vcf;
    }

    fn entry(&mut self, build: ReferenceBuild) -> &mut BuildPaths {
        let data_dir = self.data_dir.clone();
        self.builds
            .entry(build)
            .or_insert_with(|| BuildPaths::default_for(build, &data_dir))
    }

    /// # Errors
    ///
    /// Returns `LookupError::UnconfiguredBuild` if `build` has no paths.
    pub fn paths(&self, build: ReferenceBuild) -> Result<&BuildPaths, LookupError> {
        self.builds
            .get(&build)
            .ok_or(LookupError::UnconfiguredBuild(build))
    }
}
