//! Command-line interface for dbsnp-lookup.
//!
//! - **query**: Look up variants by rsid or chromosome:position
//! - **index**: Build the rsid index for each configured build
//! - **download**: Fetch the dbSNP VCF and tabix index from NCBI
//!
//! ## Usage
//!
//! ```text
//! # Fetch GRCh38 data into the current directory and index it
//! dbsnp-lookup download -r GRCh38
//! dbsnp-lookup index --build GRCh38
//!
//! # Query by rsid or coordinate
//! dbsnp-lookup query rs231361 chr8:118184783 -r hg19
//!
//! # JSON output for scripting
//! dbsnp-lookup query rs231361 --format json
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub mod download;
pub mod index;
pub mod query;

#[derive(Parser)]
#[command(name = "dbsnp-lookup")]
#[command(author = "Fulcrum Genomics")]
#[command(version)]
#[command(about = "Look up dbSNP variants by genomic coordinate or rsid")]
#[command(
    long_about = "dbsnp-lookup answers point queries against the dbSNP VCF without scanning it.\n\nCoordinate queries use the VCF's tabix index directly. rsid queries go through a secondary index, built once with `dbsnp-lookup index`, that maps each rsid to its coordinates."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(short, long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// JSON config file with per-build data paths
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding the dbSNP files [default: .]
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Look up variants by rsid or chromosome:position
    Query(query::QueryArgs),

    /// Build rsid indexes from the dbSNP VCFs
    Index(index::IndexArgs),

    /// Download dbSNP VCFs and tabix indexes from NCBI
    Download(download::DownloadArgs),
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Tsv,
}
