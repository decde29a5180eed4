//! Chromosome name normalization.
//!
//! dbSNP VCFs key their records by RefSeq accession (`NC_000008.10`), while
//! callers usually say `8` or `chr8`. The alias table maps every accepted
//! spelling to the accession for one build:
//!
//! | Spelling        | GRCh37         | GRCh38         |
//! |-----------------|----------------|----------------|
//! | `8`, `chr8`     | `NC_000008.10` | `NC_000008.11` |
//! | `X`, `chrX`     | `NC_000023.10` | `NC_000023.11` |
//! | `M`, `MT`, `chrM` | `NC_012920.1` | `NC_012920.1` |
//!
//! Accessions that already look canonical pass through unchanged. Anything
//! else is rejected so a coordinate query can fail before touching a file.

use regex::Regex;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::LazyLock;

use crate::core::error::LookupError;
use crate::core::types::ReferenceBuild;

const EMBEDDED_ALIASES: &str = include_str!("../../aliases/chromosome_aliases.json");

/// RefSeq chromosome, contig and scaffold accessions (`NC_`, `NT_`, `NW_`)
static ACCESSION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^N[CTW]_[0-9]{6,9}\.[0-9]+$").expect("accession pattern is valid")
});

static ALIAS_TABLE: LazyLock<AliasTable> = LazyLock::new(|| {
    // build.rs validates the embedded file, so parsing cannot fail here
    AliasTable::from_json(EMBEDDED_ALIASES).expect("embedded alias table is valid")
});

#[derive(Debug, Deserialize)]
struct AliasData {
    mitochondrial_synonyms: Vec<String>,
    builds: Vec<BuildAliases>,
}

#[derive(Debug, Deserialize)]
struct BuildAliases {
    build: ReferenceBuild,
    chromosomes: HashMap<String, String>,
}

/// Per-build mapping from chromosome names to canonical accessions
#[derive(Debug)]
pub struct AliasTable {
    /// Index: (build, upper-cased bare name) -> accession
    to_accession: HashMap<(ReferenceBuild, String), String>,

    /// Index: accession -> bare name, for display
    to_bare_name: HashMap<String, String>,
}

impl AliasTable {
    /// The alias table compiled into the binary
    #[must_use]
    pub fn embedded() -> &'static AliasTable {
        &ALIAS_TABLE
    }

    /// Parse an alias table from JSON
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let data: AliasData = serde_json::from_str(json)?;

        let mut to_accession = HashMap::new();
        let mut to_bare_name = HashMap::new();

        for build in data.builds {
            let mito = build
                .chromosomes
                .get("MT")
                .or_else(|| build.chromosomes.get("M"))
                .cloned();

            for (name, accession) in build.chromosomes {
                to_bare_name.insert(accession.clone(), name.clone());
                to_accession.insert((build.build, name.to_uppercase()), accession);
            }

            if let Some(mito) = mito {
                for synonym in &data.mitochondrial_synonyms {
                    to_accession.insert((build.build, synonym.to_uppercase()), mito.clone());
                }
            }
        }

        Ok(Self {
            to_accession,
            to_bare_name,
        })
    }

    /// Map a chromosome name or accession to the canonical accession for `build`
    ///
    /// # Errors
    ///
    /// Returns `LookupError::InvalidChromosome` if `input` is neither a known
    /// alias for `build` nor an accession in canonical form.
    pub fn normalize(&self, input: &str, build: ReferenceBuild) -> Result<String, LookupError> {
        if ACCESSION_REGEX.is_match(input) {
            return Ok(input.to_string());
        }

        let bare = strip_chr_prefix(input).to_uppercase();
        self.to_accession
            .get(&(build, bare))
            .cloned()
            .ok_or_else(|| LookupError::InvalidChromosome {
                input: input.to_string(),
                build,
            })
    }

    /// UCSC-style name (`chr8`, `chrM`) for a canonical accession, if known
    #[must_use]
    pub fn ucsc_name(&self, accession: &str) -> Option<String> {
        self.to_bare_name.get(accession).map(|name| match name.as_str() {
            "MT" => "chrM".to_string(),
            other => format!("chr{other}"),
        })
    }
}

/// Normalize against the embedded alias table
///
/// # Errors
///
/// Returns `LookupError::InvalidChromosome` for unrecognized names.
pub fn normalize(input: &str, build: ReferenceBuild) -> Result<String, LookupError> {
    AliasTable::embedded().normalize(input, build)
}

/// Check whether `name` looks like a RefSeq accession
#[must_use]
pub fn is_canonical_accession(name: &str) -> bool {
    ACCESSION_REGEX.is_match(name)
}

fn strip_chr_prefix(name: &str) -> &str {
    match name.get(..3) {
        Some(prefix) if prefix.eq_ignore_ascii_case("chr") => &name[3..],
        _ => name,
    }
}
