//! End-to-end tests: build an rsid index from a gzip VCF, then resolve
//! queries through the file-backed secondary index.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use flate2::write::GzEncoder;
use flate2::Compression;

use dbsnp_lookup::index::{BuildConfig, IndexBuilder, RsidIndexReader};
use dbsnp_lookup::lookup::{InMemoryStore, Resolver};
use dbsnp_lookup::{GeneralizedVariant, LookupError, Query, ReferenceBuild, Variant};

const VCF: &str = "##fileformat=VCFv4.2
##dbSNP_BUILD_ID=156
##reference=GRCh37.p13
#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO
NC_000001.10\t10019\trs775809821\tTA\tT\t.\t.\tRS=775809821;dbSNPBuildID=144;SSR=0;VC=INDEL
NC_000001.10\t10039\trs978760828\tA\tC\t.\t.\tRS=978760828;dbSNPBuildID=150;SSR=0;VC=SNV
NC_000001.10\t10043\trs1008829651\tT\tA\t.\t.\tRS=1008829651;dbSNPBuildID=150;SSR=0;VC=SNV
NC_000008.10\t118184783\trs231361\tC\tT\t.\t.\tRS=231361;dbSNPBuildID=52;SSR=0;VC=SNV
NC_000008.10\t118184783\trs386571803\tC\tCT\t.\t.\tRS=386571803;dbSNPBuildID=138;SSR=0;VC=INS
NC_000012.11\t4000\trs42;rs43\tG\tA,T\t.\t.\tRS=42;dbSNPBuildID=100;SSR=0;VC=SNV
NC_000023.10\t2699520\trs42\tA\tG\t.\t.\tRS=42;dbSNPBuildID=100;SSR=0;VC=SNV
NC_012920.1\t73\trs3087742\tA\tG\t.\t.\tRS=3087742;dbSNPBuildID=108;SSR=0;VC=SNV
";

fn write_gzip(path: &Path, text: &str) {
    let mut encoder = GzEncoder::new(File::create(path).unwrap(), Compression::default());
    encoder.write_all(text.as_bytes()).unwrap();
    encoder.finish().unwrap();
}

/// Tiny buffers force spilled runs and many block samples
fn small_builder(force: bool) -> IndexBuilder {
    IndexBuilder::new(
        BuildConfig::default()
            .with_force(force)
            .with_sort_buffer_entries(3)
            .with_sample_interval(2),
    )
}

fn build_index(dir: &Path, text: &str) -> PathBuf {
    let vcf = dir.join("GCF_000001405.25.gz");
    write_gzip(&vcf, text);
    let output = dir.join("GCF_000001405.25.rsid.bgz");
    small_builder(false).build(&vcf, &output).unwrap();
    output
}

fn resolver(index: &Path, text: &str) -> Resolver {
    let store = InMemoryStore::from_vcf_text(text).unwrap();
    let secondary = RsidIndexReader::open(index).unwrap();
    Resolver::new().with_build(ReferenceBuild::Grch37, store, secondary)
}

#[test]
fn test_rsid_and_coordinate_agree() {
    let dir = tempfile::tempdir().unwrap();
    let index = build_index(dir.path(), VCF);
    let resolver = resolver(&index, VCF);

    let by_rsid = GeneralizedVariant::resolve(&resolver, "rs231361", ReferenceBuild::Grch37).unwrap();
    let by_coord =
        GeneralizedVariant::resolve(&resolver, "chr8:118184783", ReferenceBuild::Grch37).unwrap();

    assert_eq!(by_rsid, by_coord);
    assert_eq!(by_rsid.chrom, vec!["NC_000008.10"; 2]);
    assert_eq!(by_rsid.pos, vec![118_184_783; 2]);
    assert_eq!(by_rsid.id, vec!["rs231361", "rs386571803"]);

    let last = Variant::resolve(&resolver, "8:118184783", ReferenceBuild::Grch37).unwrap();
    assert_eq!(last.id, "rs386571803");
    assert_eq!(last.alt, vec!["CT".to_string()]);
}

#[test]
fn test_every_rsid_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let index = build_index(dir.path(), VCF);
    let resolver = resolver(&index, VCF);

    let store = InMemoryStore::from_vcf_text(VCF).unwrap();
    for entry in store.entries() {
        let records = resolver
            .resolve(&Query::Identifier(entry.rsid), ReferenceBuild::Grch37)
            .unwrap();
        assert!(
            records
                .iter()
                .any(|r| r.chrom == entry.chromosome && r.pos == entry.position),
            "rs{} did not resolve to {}",
            entry.rsid,
            entry.locus()
        );
    }
}

#[test]
fn test_multi_mapped_rsid_in_index_order() {
    let dir = tempfile::tempdir().unwrap();
    let index = build_index(dir.path(), VCF);
    let resolver = resolver(&index, VCF);

    let variant = GeneralizedVariant::resolve(&resolver, "rs42", ReferenceBuild::Grch37).unwrap();
    assert_eq!(variant.chrom, vec!["NC_000012.11", "NC_000023.10"]);
    assert_eq!(variant.alt[0], vec!["A".to_string(), "T".to_string()]);

    // rs43 shares a record with rs42
    let variant = GeneralizedVariant::resolve(&resolver, "rs43", ReferenceBuild::Grch37).unwrap();
    assert_eq!(variant.pos, vec![4000]);
}

#[test]
fn test_absent_rsid() {
    let dir = tempfile::tempdir().unwrap();
    let index = build_index(dir.path(), VCF);
    let resolver = resolver(&index, VCF);

    let variant = GeneralizedVariant::resolve(&resolver, "rs99999999", ReferenceBuild::Grch37).unwrap();
    assert!(variant.is_empty());
    let err = Variant::resolve(&resolver, "rs99999999", ReferenceBuild::Grch37).unwrap_err();
    assert!(matches!(err, LookupError::NoMatch(_)));
}

#[test]
fn test_rebuild_is_identical() {
    let dir = tempfile::tempdir().unwrap();
    let index = build_index(dir.path(), VCF);
    let first = fs::read(&index).unwrap();

    let vcf = dir.path().join("GCF_000001405.25.gz");
    small_builder(true).build(&vcf, &index).unwrap();
    assert_eq!(fs::read(&index).unwrap(), first);
}

#[test]
fn test_index_from_other_vcf_is_corrupt() {
    let dir = tempfile::tempdir().unwrap();
    let index = build_index(dir.path(), VCF);

    // Same rsid, different position in the primary store
    let moved = VCF.replace("NC_000001.10\t10039", "NC_000001.10\t10040");
    let resolver = resolver(&index, &moved);

    let err = resolver
        .resolve_str("rs978760828", ReferenceBuild::Grch37)
        .unwrap_err();
    assert!(
        matches!(err, LookupError::IndexCorrupt { rsid: 978_760_828, .. }),
        "{err:?}"
    );
}

#[test]
fn test_queries_fail_before_io() {
    let dir = tempfile::tempdir().unwrap();
    let index = build_index(dir.path(), VCF);
    let resolver = resolver(&index, VCF);

    for query in ["chr8", "rs", "8:", "rs01", ":5", "chr8:12a"] {
        assert!(
            matches!(
                resolver.resolve_str(query, ReferenceBuild::Grch37),
                Err(LookupError::MalformedQuery(_))
            ),
            "{query}"
        );
    }
    assert!(matches!(
        Query::rsid("rs0123"),
        Err(LookupError::InvalidIdentifier(_))
    ));
}

#[test]
fn test_resolver_shared_across_threads() {
    let dir = tempfile::tempdir().unwrap();
    let index = build_index(dir.path(), VCF);
    let resolver = resolver(&index, VCF);

    std::thread::scope(|s| {
        let handles: Vec<_> = ["rs231361", "rs42", "rs3087742", "rs775809821"]
            .into_iter()
            .map(|q| {
                let resolver = &resolver;
                s.spawn(move || resolver.resolve_str(q, ReferenceBuild::Grch37).unwrap().len())
            })
            .collect();
        let counts: Vec<usize> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(counts, vec![2, 2, 1, 1]);
    });
}
