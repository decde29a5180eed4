use serde::{Deserialize, Serialize};

use crate::core::types::Locus;

/// Errors from reading a single VCF data line
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordError {
    #[error("VCF line has {found} fields, expected at least {expected}")]
    TooFewFields { found: usize, expected: usize },

    #[error("Invalid VCF position '{0}'")]
    InvalidPosition(String),
}

/// One data line of the primary store
///
/// The INFO column is carried verbatim and never parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantRecord {
    /// Canonical sequence identifier (CHROM)
    pub chrom: String,

    /// 1-based position (POS)
    pub pos: u64,

    /// Identifier column, e.g. `rs231361` (may hold several `;`-separated ids)
    pub id: String,

    /// Reference allele (REF)
    pub ref_allele: String,

    /// Alternate alleles (ALT, split on commas)
    pub alt: Vec<String>,

    /// Annotation blob (INFO)
    pub info: String,
}

impl VariantRecord {
    /// Parse a tab-separated VCF data line
    ///
    /// # Errors
    ///
    /// Returns `RecordError` if the line has fewer than 8 columns or a
    /// non-positive position.
    pub fn from_vcf_line(line: &str) -> Result<Self, RecordError> {
        let line = line.trim_end_matches(['\n', '\r']);
        let fields: Vec<&str> = line.splitn(9, '\t').collect();
        if fields.len() < 8 {
            return Err(RecordError::TooFewFields {
                found: fields.len(),
                expected: 8,
            });
        }

        let pos = parse_position(fields[1])?;

        Ok(Self {
            chrom: fields[0].to_string(),
            pos,
            id: fields[2].to_string(),
            ref_allele: fields[3].to_string(),
            alt: fields[4].split(',').map(str::to_string).collect(),
            info: fields[7].to_string(),
        })
    }

    #[must_use]
    pub fn locus(&self) -> Locus {
        Locus::new(self.chrom.clone(), self.pos)
    }

    /// Identifiers in the ID column, skipping the `.` placeholder
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.id.split(';').filter(|id| !id.is_empty() && *id != ".")
    }

    /// ALT alleles joined the way they appear in the VCF
    #[must_use]
    pub fn alt_string(&self) -> String {
        self.alt.join(",")
    }
}

/// Parse a 1-based VCF position
pub(crate) fn parse_position(field: &str) -> Result<u64, RecordError> {
    match field.parse::<u64>() {
        Ok(pos) if pos >= 1 => Ok(pos),
        _ => Err(RecordError::InvalidPosition(field.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LINE: &str = "NC_000008.10\t118184783\trs231361\tC\tT\t.\t.\tRS=231361;dbSNPBuildID=52;SSR=0;VC=SNV";

    #[test]
    fn test_parse_vcf_line() {
        let record = VariantRecord::from_vcf_line(LINE).unwrap();
        assert_eq!(record.chrom, "NC_000008.10");
        assert_eq!(record.pos, 118_184_783);
        assert_eq!(record.id, "rs231361");
        assert_eq!(record.ref_allele, "C");
        assert_eq!(record.alt, vec!["T".to_string()]);
        assert_eq!(record.info, "RS=231361;dbSNPBuildID=52;SSR=0;VC=SNV");
        assert_eq!(record.locus(), Locus::new("NC_000008.10", 118_184_783));
    }

    #[test]
    fn test_parse_multiallelic_with_samples() {
        let line = "NC_000001.11\t10019\trs775809821;rs1\tTA\tT,TAA\t.\t.\tVC=INDEL\tGT\t0/1\n";
        let record = VariantRecord::from_vcf_line(line).unwrap();
        assert_eq!(record.alt, vec!["T".to_string(), "TAA".to_string()]);
        assert_eq!(record.info, "VC=INDEL");
        assert_eq!(record.ids().collect::<Vec<_>>(), vec!["rs775809821", "rs1"]);
        assert_eq!(record.alt_string(), "T,TAA");
    }

    #[test]
    fn test_missing_id() {
        let line = "NC_000001.11\t10019\t.\tTA\tT\t.\t.\t.";
        let record = VariantRecord::from_vcf_line(line).unwrap();
        assert_eq!(record.ids().count(), 0);
    }

    #[test]
    fn test_rejects_short_line() {
        let err = VariantRecord::from_vcf_line("NC_000001.11\t10019\trs1").unwrap_err();
        assert_eq!(
            err,
            RecordError::TooFewFields {
                found: 3,
                expected: 8
            }
        );
    }

    #[test]
    fn test_rejects_zero_position() {
        let line = "NC_000001.11\t0\trs1\tA\tG\t.\t.\t.";
        assert_eq!(
            VariantRecord::from_vcf_line(line).unwrap_err(),
            RecordError::InvalidPosition("0".to_string())
        );
    }
}
