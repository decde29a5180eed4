use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Reference genome build (e.g., `GRCh37`, `GRCh38`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ReferenceBuild {
    #[serde(rename = "GRCh37", alias = "hg19")]
    Grch37,
    #[serde(rename = "GRCh38", alias = "hg38")]
    Grch38,
}

impl ReferenceBuild {
    pub const ALL: [ReferenceBuild; 2] = [ReferenceBuild::Grch37, ReferenceBuild::Grch38];

    /// NCBI assembly accession that dbSNP names its VCF after
    #[must_use]
    pub fn assembly_accession(self) -> &'static str {
        match self {
            Self::Grch37 => "GCF_000001405.25",
            Self::Grch38 => "GCF_000001405.40",
        }
    }

    /// Suffix used for per-build environment variables
    #[must_use]
    pub fn env_suffix(self) -> &'static str {
        match self {
            Self::Grch37 => "GRCH37",
            Self::Grch38 => "GRCH38",
        }
    }
}

impl std::fmt::Display for ReferenceBuild {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Grch37 => write!(f, "GRCh37"),
            Self::Grch38 => write!(f, "GRCh38"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown reference build '{0}' (expected GRCh37, hg19, GRCh38 or hg38)")]
pub struct UnknownBuildError(pub String);

impl FromStr for ReferenceBuild {
    type Err = UnknownBuildError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "grch37" | "hg19" | "b37" | "37" => Ok(Self::Grch37),
            "grch38" | "hg38" | "38" => Ok(Self::Grch38),
            _ => Err(UnknownBuildError(s.to_string())),
        }
    }
}

/// A (chromosome, position) pair on the primary store's coordinate axis
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Locus {
    /// Canonical sequence identifier (e.g., `NC_000008.10`)
    pub chromosome: String,
    /// 1-based position
    pub position: u64,
}

impl Locus {
    pub fn new(chromosome: impl Into<String>, position: u64) -> Self {
        Self {
            chromosome: chromosome.into(),
            position,
        }
    }
}

impl std::fmt::Display for Locus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.chromosome, self.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_build_aliases() {
        assert_eq!("GRCh37".parse::<ReferenceBuild>().unwrap(), ReferenceBuild::Grch37);
        assert_eq!("hg19".parse::<ReferenceBuild>().unwrap(), ReferenceBuild::Grch37);
        assert_eq!("grch38".parse::<ReferenceBuild>().unwrap(), ReferenceBuild::Grch38);
        assert_eq!("HG38".parse::<ReferenceBuild>().unwrap(), ReferenceBuild::Grch38);
        assert!("hg18".parse::<ReferenceBuild>().is_err());
    }

    #[test]
    fn test_build_display_round_trip() {
        for build in ReferenceBuild::ALL {
            assert_eq!(build.to_string().parse::<ReferenceBuild>().unwrap(), build);
        }
    }

    #[test]
    fn test_build_serde_alias() {
        let build: ReferenceBuild = serde_json::from_str("\"hg19\"").unwrap();
        assert_eq!(build, ReferenceBuild::Grch37);
        assert_eq!(
            serde_json::to_string(&ReferenceBuild::Grch38).unwrap(),
            "\"GRCh38\""
        );
    }
}
