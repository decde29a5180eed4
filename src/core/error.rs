use std::path::PathBuf;
use thiserror::Error;

use crate::core::types::{Locus, ReferenceBuild};

/// Errors raised while parsing or resolving a variant query
#[derive(Error, Debug)]
pub enum LookupError {
    #[error("Invalid chromosome '{input}' for {build}")]
    InvalidChromosome {
        input: String,
        build: ReferenceBuild,
    },

    #[error("Invalid rsid '{0}': expected 'rs' followed by digits with a nonzero leading digit")]
    InvalidIdentifier(String),

    #[error("Improperly formatted query '{0}': expected an rsid (rs123) or chr:pos")]
    MalformedQuery(String),

    #[error("No variant found for '{0}'")]
    NoMatch(String),

    #[error("Corrupt or mismatched rsid index: rs{rsid} points to {locus}, which is absent from the VCF")]
    IndexCorrupt { rsid: u64, locus: Locus },

    #[error("No data files configured for {0}")]
    UnconfiguredBuild(ReferenceBuild),

    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read VCF {}: {message}", path.display())]
    Noodles { path: PathBuf, message: String },

    #[error("Invalid rsid index {}: {message}", path.display())]
    Index { path: PathBuf, message: String },
}

impl LookupError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
