//! # dbsnp-lookup
//!
//! Random-access lookup of dbSNP variant records by genomic coordinate or rsid.
//!
//! dbSNP ships its variants as a coordinate-sorted, BGZF-compressed VCF with a
//! tabix index, so coordinate queries are cheap but rsid queries would need a
//! full scan. This crate builds a secondary index, sorted by numeric rsid and
//! block indexed, that maps each rsid to its coordinates. A query then costs
//! at most two range lookups.
//!
//! ## Features
//!
//! - **Chromosome normalization**: `8`, `chr8`, `CHR8` and `NC_000008.10` all
//!   name the same sequence on GRCh37
//! - **Concurrent index build**: decompress, transform, sort and compress
//!   stages over bounded channels, with an external sort for bounded memory
//! - **Atomic output**: a failed or cancelled build never leaves a partial index
//! - **Two result views**: every match ([`GeneralizedVariant`]) or the last one
//!   ([`Variant`])
//!
//! ## Example
//!
//! ```rust,no_run
//! use dbsnp_lookup::{LookupConfig, ReferenceBuild, Resolver, Variant};
//!
//! let config = LookupConfig::with_data_dir("/data/dbsnp");
//! let resolver = Resolver::from_config(&config, &[ReferenceBuild::Grch37]).unwrap();
//!
//! let variant = Variant::resolve(&resolver, "rs231361", ReferenceBuild::Grch37).unwrap();
//! println!("{}:{} {}>{}", variant.chrom, variant.pos, variant.ref_allele, variant.alt.join(","));
//! ```
//!
//! ## Modules
//!
//! - [`core`]: Builds, chromosome aliases, query grammar and VCF records
//! - [`index`]: Secondary rsid index construction and lookup
//! - [`lookup`]: Dual-index resolver and result aggregates
//! - [`config`]: Per-build data file locations
//! - [`download`]: Fetching dbSNP files from NCBI
//! - [`cli`]: Command-line interface implementation

pub mod cli;
pub mod config;
pub mod core;
pub mod download;
pub mod index;
pub mod lookup;

// Re-export commonly used types for convenience
pub use config::{BuildPaths, LookupConfig};
pub use core::error::LookupError;
pub use core::query::Query;
pub use core::record::VariantRecord;
pub use core::types::*;
pub use index::{BuildConfig, BuildError, IndexBuilder};
pub use lookup::{GeneralizedVariant, Resolver, Variant};
