//! Core data types for dbSNP lookups.
//!
//! - [`ReferenceBuild`](types::ReferenceBuild): `GRCh37` or `GRCh38`, with `hg19`/`hg38` aliases
//! - [`VariantRecord`](record::VariantRecord): one VCF data line, INFO kept verbatim
//! - [`Query`](query::Query): an rsid or `chrom:pos` query string
//! - [`AliasTable`](chromosome::AliasTable): chromosome name -> RefSeq accession
//! - [`LookupError`](error::LookupError): everything a lookup can fail with
//!
//! ## Chromosome Naming
//!
//! dbSNP keys its VCFs by RefSeq accession, which differs per build:
//!
//! | Input  | GRCh37         | GRCh38         |
//! |--------|----------------|----------------|
//! | chr1   | NC_000001.10   | NC_000001.11   |
//! | MT     | NC_012920.1    | NC_012920.1    |

pub mod chromosome;
pub mod error;
pub mod query;
pub mod record;
pub mod types;
