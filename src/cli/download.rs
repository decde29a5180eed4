use clap::Args;

use crate::cli::OutputFormat;
use crate::config::LookupConfig;
use crate::core::types::ReferenceBuild;
use crate::download::{download_all, targets, DownloadTarget, NCBI_BASE_URL};

#[derive(Args)]
pub struct DownloadArgs {
    /// Build to download (defaults to both)
    #[arg(short = 'r', long = "reference-build")]
    pub build: Option<ReferenceBuild>,

    /// Overwrite existing files
    #[arg(long)]
    pub force: bool,
}

pub fn run(
    args: DownloadArgs,
    config: &LookupConfig,
    format: OutputFormat,
    _verbose: bool,
) -> anyhow::Result<()> {
    let builds = match args.build {
        Some(build) => vec![build],
        None => ReferenceBuild::ALL.to_vec(),
    };

    let mut all: Vec<DownloadTarget> = Vec::new();
    for build in builds {
        let paths = config.paths(build)?;
        all.extend(targets(NCBI_BASE_URL, build, &paths.vcf));
    }

    download_all(&all, args.force)?;

    match format {
        OutputFormat::Json => {
            let dests: Vec<_> = all.iter().map(|t| t.dest.display().to_string()).collect();
            println!("{}", serde_json::to_string_pretty(&dests)?);
        }
        OutputFormat::Text | OutputFormat::Tsv => {
            for target in &all {
                println!("{}\t{}", target.url, target.dest.display());
            }
        }
    }

    Ok(())
}
