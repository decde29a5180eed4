//! Fetch dbSNP VCFs and their tabix indexes from NCBI.
//!
//! Each file is streamed into a temporary file beside its destination and
//! renamed into place once the transfer completes.

use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::info;

use crate::core::types::ReferenceBuild;

/// NCBI directory holding the latest dbSNP release
pub const NCBI_BASE_URL: &str = "https://ftp.ncbi.nlm.nih.gov/snp/latest_release/VCF";

const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(6 * 3600);

#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("File '{}' already exists. Use --force to overwrite.", .0.display())]
    Exists(PathBuf),

    #[error("Failed to download {url}: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// One remote file and where it goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTarget {
    pub url: String,
    pub dest: PathBuf,
}

/// The VCF and `.tbi` for `build`, saved as `vcf` and `vcf.tbi`
#[must_use]
pub fn targets(base_url: &str, build: ReferenceBuild, vcf: &Path) -> Vec<DownloadTarget> {
    let remote = format!("{}/{}.gz", base_url.trim_end_matches('/'), build.assembly_accession());
    let mut tbi = vcf.as_os_str().to_owned();
    tbi.push(".tbi");

    vec![
        DownloadTarget {
            url: remote.clone(),
            dest: vcf.to_path_buf(),
        },
        DownloadTarget {
            url: format!("{remote}.tbi"),
            dest: PathBuf::from(tbi),
        },
    ]
}

/// Download every target, refusing to overwrite unless `force` is set
///
/// Existing destinations are checked before anything is fetched.
///
/// # Errors
///
/// Returns `DownloadError::Exists` for an existing destination without
/// `force`, or the first transfer failure.
pub fn download_all(targets: &[DownloadTarget], force: bool) -> Result<(), DownloadError> {
    if !force {
        if let Some(existing) = targets.iter().find(|t| t.dest.exists()) {
            return Err(DownloadError::Exists(existing.dest.clone()));
        }
    }

    let client = reqwest::blocking::Client::builder()
        .timeout(DOWNLOAD_TIMEOUT)
        .build()
        .map_err(|source| DownloadError::Http {
            url: NCBI_BASE_URL.to_string(),
            source,
        })?;

    for target in targets {
        download(&client, target)?;
    }
    Ok(())
}

fn download(client: &reqwest::blocking::Client, target: &DownloadTarget) -> Result<u64, DownloadError> {
    let http_error = |source| DownloadError::Http {
        url: target.url.clone(),
        source,
    };
    let io_error = |path: &Path, source| DownloadError::Io {
        path: path.to_path_buf(),
        source,
    };

    info!(url = %target.url, dest = %target.dest.display(), "Downloading");
    let mut response = client.get(&target.url).send().map_err(http_error)?;
    if !response.status().is_success() {
        return Err(DownloadError::Status {
            url: target.url.clone(),
            status: response.status().as_u16(),
        });
    }

    let dir = match target.dest.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir).map_err(|e| io_error(&dir, e))?;
    let tmp = NamedTempFile::new_in(&dir).map_err(|e| io_error(&dir, e))?;

    let mut writer = BufWriter::new(tmp.as_file());
    let bytes = response.copy_to(&mut writer).map_err(http_error)?;
    writer.flush().map_err(|e| io_error(tmp.path(), e))?;
    drop(writer);

    tmp.persist(&target.dest)
        .map_err(|e| io_error(&target.dest, e.error))?;
    info!(dest = %target.dest.display(), bytes, "Downloaded");
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_targets() {
        let targets = targets(NCBI_BASE_URL, ReferenceBuild::Grch37, Path::new("/data/GCF_000001405.25.gz"));
        assert_eq!(
            targets[0].url,
            "https://ftp.ncbi.nlm.nih.gov/snp/latest_release/VCF/GCF_000001405.25.gz"
        );
        assert_eq!(targets[0].dest, PathBuf::from("/data/GCF_000001405.25.gz"));
        assert_eq!(
            targets[1].url,
            "https://ftp.ncbi.nlm.nih.gov/snp/latest_release/VCF/GCF_000001405.25.gz.tbi"
        );
        assert_eq!(targets[1].dest, PathBuf::from("/data/GCF_000001405.25.gz.tbi"));
    }

    #[test]
    fn test_existing_file_requires_force() {
        let dir = tempfile::tempdir().unwrap();
        let vcf = dir.path().join("GCF_000001405.40.gz");
        std::fs::write(&vcf, b"old").unwrap();

        let targets = targets("http://127.0.0.1:9", ReferenceBuild::Grch38, &vcf);
        let err = download_all(&targets, false).unwrap_err();
        assert!(matches!(err, DownloadError::Exists(p) if p == vcf));
        assert_eq!(std::fs::read(&vcf).unwrap(), b"old");
    }
}
