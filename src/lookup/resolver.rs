//! Dual-index resolution.
//!
//! A coordinate query costs one lookup in the primary store. An rsid query
//! costs one lookup in the secondary index plus one primary lookup per locus
//! it returns. Every secondary hit must land on at least one primary record;
//! a miss means the two files do not belong together.

use std::collections::BTreeMap;

use tracing::{debug, info};

use super::store::{open_rsid_index, PrimaryStore, SecondaryIndex, TabixVcfStore};
use crate::config::LookupConfig;
use crate::core::chromosome;
use crate::core::error::LookupError;
use crate::core::query::Query;
use crate::core::record::VariantRecord;
use crate::core::types::ReferenceBuild;

/// The pair of indexed files for one build
pub struct BuildSources {
    primary: Box<dyn PrimaryStore>,
    secondary: Box<dyn SecondaryIndex>,
}

impl BuildSources {
    pub fn new(
        primary: impl PrimaryStore + 'static,
        secondary: impl SecondaryIndex + 'static,
    ) -> Self {
        Self {
            primary: Box::new(primary),
            secondary: Box::new(secondary),
        }
    }
}

/// Resolves queries against per-build sources
///
/// Holds no mutable state, so one resolver can serve many threads.
#[derive(Default)]
pub struct Resolver {
    builds: BTreeMap<ReferenceBuild, BuildSources>,
}

impl Resolver {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_build(
        mut self,
        build: ReferenceBuild,
        primary: impl PrimaryStore + 'static,
        secondary: impl SecondaryIndex + 'static,
    ) -> Self {
        self.builds
            .insert(build, BuildSources::new(primary, secondary));
        self
    }

    /// Open the configured files for each of `builds`
    ///
    /// # Errors
    ///
    /// Returns `LookupError::UnconfiguredBuild` for a build without paths,
    /// `LookupError::Io` for a missing file, or `LookupError::Index` for an
    /// unreadable block index.
    pub fn from_config(
        config: &LookupConfig,
        builds: &[ReferenceBuild],
    ) -> Result<Self, LookupError> {
        let mut resolver = Self::new();
        for &build in builds {
            let paths = config.paths(build)?;
            let primary = TabixVcfStore::open(&paths.vcf)?;
            let secondary = open_rsid_index(&paths.rsid_index)?;
            info!(
                %build,
                vcf = %paths.vcf.display(),
                rsid_index = %paths.rsid_index.display(),
                "Opened data files"
            );
            resolver = resolver.with_build(build, primary, secondary);
        }
        Ok(resolver)
    }

    pub fn builds(&self) -> impl Iterator<Item = ReferenceBuild> + '_ {
        self.builds.keys().copied()
    }

    fn sources(&self, build: ReferenceBuild) -> Result<&BuildSources, LookupError> {
        self.builds
            .get(&build)
            .ok_or(LookupError::UnconfiguredBuild(build))
    }

    /// Parse and resolve a query string
    ///
    /// # Errors
    ///
    /// Returns `LookupError::MalformedQuery` before any I/O if `query` is
    /// neither an rsid nor a coordinate, or any error from [`Resolver::resolve`].
    pub fn resolve_str(
        &self,
        query: &str,
        build: ReferenceBuild,
    ) -> Result<Vec<VariantRecord>, LookupError> {
        let query = Query::parse(query)?;
        self.resolve(&query, build)
    }

    /// Records matching `query`, in primary-store order per locus
    ///
    /// # Errors
    ///
    /// - `InvalidChromosome` if a coordinate names no chromosome of `build`
    /// - `IndexCorrupt` if an rsid points at a locus with no primary record
    /// - `UnconfiguredBuild` if no sources were registered for `build`
    /// - I/O and format errors from either file
    pub fn resolve(
        &self,
        query: &Query,
        build: ReferenceBuild,
    ) -> Result<Vec<VariantRecord>, LookupError> {
        match query {
            Query::Coordinate {
                chromosome,
                position,
            } => {
                let canonical = chromosome::normalize(chromosome, build)?;
                let sources = self.sources(build)?;
                sources.primary.fetch(&canonical, *position)
            }
            Query::Identifier(rsid) => {
                let sources = self.sources(build)?;
                let loci = sources.secondary.lookup(*rsid)?;
                debug!(rsid, hits = loci.len(), "Secondary lookup");

                let mut records = Vec::new();
                for locus in loci {
                    let found = sources.primary.fetch(&locus.chromosome, locus.position)?;
                    if found.is_empty() {
                        return Err(LookupError::IndexCorrupt { rsid: *rsid, locus });
                    }
                    records.extend(found);
                }
                Ok(records)
            }
        }
    }
}
