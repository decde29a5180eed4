use serde::Serialize;

use super::resolver::Resolver;
use crate::core::error::LookupError;
use crate::core::record::VariantRecord;
use crate::core::types::ReferenceBuild;

/// Every record matched by a query, as parallel field vectors
///
/// Index `i` of each vector describes the same record. An empty aggregate is
/// a valid "no match" result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GeneralizedVariant {
    pub chrom: Vec<String>,
    pub pos: Vec<u64>,
    pub id: Vec<String>,
    pub ref_allele: Vec<String>,
    pub alt: Vec<Vec<String>>,
    pub info: Vec<String>,
}

impl GeneralizedVariant {
    /// Resolve `query` and collect all matches
    ///
    /// # Errors
    ///
    /// Returns `LookupError` for malformed queries, unknown chromosomes,
    /// corrupt indices and I/O failures. No match is not an error.
    pub fn resolve(
        resolver: &Resolver,
        query: &str,
        build: ReferenceBuild,
    ) -> Result<Self, LookupError> {
        Ok(Self::from_records(resolver.resolve_str(query, build)?))
    }

    #[must_use]
    pub fn from_records(records: Vec<VariantRecord>) -> Self {
        let mut variant = Self::default();
        for record in records {
            variant.chrom.push(record.chrom);
            variant.pos.push(record.pos);
            variant.id.push(record.id);
            variant.ref_allele.push(record.ref_allele);
            variant.alt.push(record.alt);
            variant.info.push(record.info);
        }
        variant
    }

    pub fn len(&self) -> usize {
        self.pos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pos.is_empty()
    }
}

/// A single matched record
///
/// When a query matches several records, the last one in resolution order is
/// kept. In dbSNP files a later record at the same locus is usually the more
/// specific or more recently curated one, but the data does not guarantee
/// this, so the choice may not be the record a caller expects. Use
/// [`GeneralizedVariant`] to see every match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Variant {
    pub chrom: String,
    pub pos: u64,
    pub id: String,
    pub ref_allele: String,
    pub alt: Vec<String>,
    pub info: String,
}

impl Variant {
    /// Resolve `query` to a single record
    ///
    /// # Errors
    ///
    /// Returns `LookupError::NoMatch` if nothing matched, or any error from
    /// resolution.
    pub fn resolve(
        resolver: &Resolver,
        query: &str,
        build: ReferenceBuild,
    ) -> Result<Self, LookupError> {
        Self::from_records(query, resolver.resolve_str(query, build)?)
    }

    /// # Errors
    ///
    /// Returns `LookupError::NoMatch` naming `query` if `records` is empty.
    pub fn from_records(query: &str, records: Vec<VariantRecord>) -> Result<Self, LookupError> {
        let record = records
            .into_iter()
            .last()
            .ok_or_else(|| LookupError::NoMatch(query.to_string()))?;
        Ok(Self::from(record))
    }
}

impl From<VariantRecord> for Variant {
    fn from(record: VariantRecord) -> Self {
        Self {
            chrom: record.chrom,
            pos: record.pos,
            id: record.id,
            ref_allele: record.ref_allele,
            alt: record.alt,
            info: record.info,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, alt: &str) -> VariantRecord {
        VariantRecord::from_vcf_line(&format!(
            "NC_000008.10\t118184783\t{id}\tC\t{alt}\t.\t.\tRS=1"
        ))
        .unwrap()
    }

    #[test]
    fn test_generalized_keeps_order() {
        let variant = GeneralizedVariant::from_records(vec![record("rs1", "T"), record("rs2", "G,A")]);
        assert_eq!(variant.len(), 2);
        assert_eq!(variant.id, vec!["rs1".to_string(), "rs2".to_string()]);
        assert_eq!(variant.alt[1], vec!["G".to_string(), "A".to_string()]);
        assert_eq!(variant.pos, vec![118_184_783, 118_184_783]);
    }

    #[test]
    fn test_generalized_empty_is_valid() {
        let variant = GeneralizedVariant::from_records(Vec::new());
        assert!(variant.is_empty());
        assert_eq!(variant.len(), 0);
    }

    #[test]
    fn test_variant_takes_last_match() {
        let variant = Variant::from_records("rs2", vec![record("rs1", "T"), record("rs2", "G")]).unwrap();
        assert_eq!(variant.id, "rs2");
        assert_eq!(variant.alt, vec!["G".to_string()]);
    }

    #[test]
    fn test_variant_no_match() {
        let err = Variant::from_records("rs42", Vec::new()).unwrap_err();
        assert!(matches!(err, LookupError::NoMatch(q) if q == "rs42"));
    }
}
