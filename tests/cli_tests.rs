//! Command-line behaviour of the `dbsnp-lookup` binary.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use assert_cmd::Command;
use flate2::write::GzEncoder;
use flate2::Compression;
use predicates::prelude::*;

const VCF: &str = "##fileformat=VCFv4.2
#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO
NC_000001.10\t10019\trs775809821\tTA\tT\t.\t.\tRS=775809821
NC_000008.10\t118184783\trs231361\tC\tT\t.\t.\tRS=231361
";

fn cmd(data_dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("dbsnp-lookup").unwrap();
    cmd.arg("--data-dir").arg(data_dir);
    cmd
}

fn write_grch37_vcf(dir: &Path) {
    let file = File::create(dir.join("GCF_000001405.25.gz")).unwrap();
    let mut encoder = GzEncoder::new(file, Compression::default());
    encoder.write_all(VCF.as_bytes()).unwrap();
    encoder.finish().unwrap();
}

#[test]
fn test_malformed_query_fails_without_data() {
    let dir = tempfile::tempdir().unwrap();
    cmd(dir.path())
        .args(["query", "chr8"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Improperly formatted query 'chr8'"));
}

#[test]
fn test_query_reports_missing_vcf() {
    let dir = tempfile::tempdir().unwrap();
    cmd(dir.path())
        .args(["query", "rs231361", "-r", "hg38"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("GCF_000001405.40.gz"));
}

#[test]
fn test_unknown_build_rejected() {
    let dir = tempfile::tempdir().unwrap();
    cmd(dir.path())
        .args(["query", "rs231361", "-r", "hg18"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("hg18"));
}

#[test]
fn test_index_requires_force_to_overwrite() {
    let dir = tempfile::tempdir().unwrap();
    write_grch37_vcf(dir.path());

    cmd(dir.path())
        .args(["index", "--build", "GRCh37"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Indexed GRCh37"));
    assert!(dir.path().join("GCF_000001405.25.rsid.bgz").exists());
    assert!(dir.path().join("GCF_000001405.25.rsid.bgz.rsi").exists());

    cmd(dir.path())
        .args(["index", "--build", "GRCh37"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));

    cmd(dir.path())
        .args(["--format", "tsv", "index", "--build", "GRCh37", "--force"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("build\tinput\toutput"));
}

#[test]
fn test_index_finds_present_builds() {
    let dir = tempfile::tempdir().unwrap();
    write_grch37_vcf(dir.path());

    // Only the GRCh37 VCF exists, so only it is indexed
    cmd(dir.path())
        .args(["--format", "json", "index"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"build\": \"GRCh37\""))
        .stdout(predicate::str::contains("GRCh38").not());
}

#[test]
fn test_index_without_data() {
    let dir = tempfile::tempdir().unwrap();
    cmd(dir.path())
        .arg("index")
        .assert()
        .failure()
        .stderr(predicate::str::contains("No dbSNP VCF found"));
}

#[test]
fn test_processes_bounded() {
    let dir = tempfile::tempdir().unwrap();
    cmd(dir.path())
        .args(["index", "--processes", "3"])
        .assert()
        .failure();
}

#[test]
fn test_download_refuses_to_overwrite() {
    let dir = tempfile::tempdir().unwrap();
    write_grch37_vcf(dir.path());
    cmd(dir.path())
        .args(["download", "-r", "GRCh37"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Use --force"));
}
