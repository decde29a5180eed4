use std::path::PathBuf;

use clap::Args;
use tracing::warn;

use crate::cli::OutputFormat;
use crate::config::LookupConfig;
use crate::core::types::ReferenceBuild;
use crate::index::{BuildConfig, BuildJob, BuildSummary, IndexBuilder};

#[derive(Args)]
pub struct IndexArgs {
    /// Build to index; repeat for several. Defaults to every build whose VCF is present
    #[arg(short = 'r', long = "build")]
    pub builds: Vec<ReferenceBuild>,

    /// Number of builds to index concurrently
    #[arg(short, long, default_value = "1", value_parser = clap::value_parser!(u8).range(1..=2))]
    pub processes: u8,

    /// Directory for sort spill files (defaults to the output directory)
    #[arg(long)]
    pub tmp_dir: Option<PathBuf>,

    /// Entries held in memory before spilling a sorted run
    #[arg(long)]
    pub sort_buffer: Option<usize>,

    /// Overwrite existing indexes
    #[arg(long)]
    pub force: bool,
}

pub fn run(
    args: IndexArgs,
    config: &LookupConfig,
    format: OutputFormat,
    verbose: bool,
) -> anyhow::Result<()> {
    let builds: Vec<ReferenceBuild> = if args.builds.is_empty() {
        config
            .builds
            .iter()
            .filter(|(_, paths)| paths.vcf.is_file())
            .map(|(build, _)| *build)
            .collect()
    } else {
        args.builds.clone()
    };

    if builds.is_empty() {
        anyhow::bail!(
            "No dbSNP VCF found under {}. Run `dbsnp-lookup download` or pass --config.",
            config.data_dir.display()
        );
    }

    let jobs = builds
        .iter()
        .map(|&build| -> anyhow::Result<BuildJob> {
            let paths = config.paths(build)?;
            Ok(BuildJob::new(&paths.vcf, &paths.rsid_index))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    let mut build_config = BuildConfig::default()
        .with_force(args.force)
        .with_temp_dir(args.tmp_dir.clone());
    if let Some(entries) = args.sort_buffer {
        build_config = build_config.with_sort_buffer_entries(entries);
    }

    if verbose {
        for (build, job) in builds.iter().zip(&jobs) {
            eprintln!(
                "{build}: {} -> {}",
                job.input.display(),
                job.output.display()
            );
        }
    }

    let builder = IndexBuilder::new(build_config);
    if let Err(e) = builder.cancel_on_signals() {
        warn!(error = %e, "Cannot install signal handlers; interrupting will leave temporary files");
    }
    let results = builder.build_all(&jobs, usize::from(args.processes))?;

    let mut summaries = Vec::new();
    let mut failures = Vec::new();
    for (build, result) in builds.iter().zip(results) {
        match result {
            Ok(summary) => summaries.push((*build, summary)),
            Err(e) => failures.push(format!("{build}: {e}")),
        }
    }

    match format {
        OutputFormat::Text => print_text(&summaries),
        OutputFormat::Json => {
            let json: Vec<_> = summaries
                .iter()
                .map(|(build, summary)| serde_json::json!({ "build": build, "summary": summary }))
                .collect();
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        OutputFormat::Tsv => print_tsv(&summaries),
    }

    if !failures.is_empty() {
        for failure in &failures {
            eprintln!("{failure}");
        }
        anyhow::bail!("{} of {} index builds failed", failures.len(), jobs.len());
    }

    Ok(())
}

fn print_text(summaries: &[(ReferenceBuild, BuildSummary)]) {
    for (build, summary) in summaries {
        println!("Indexed {build}: {}", summary.output.display());
        println!(
            "   {} records, {} rsids, {} skipped ids, {:.1}s",
            summary.records, summary.entries, summary.skipped_ids, summary.elapsed_secs
        );
    }
}

fn print_tsv(summaries: &[(ReferenceBuild, BuildSummary)]) {
    println!("build\tinput\toutput\trecords\tentries\tskipped_ids\tspilled_runs");
    for (build, s) in summaries {
        println!(
            "{build}\t{}\t{}\t{}\t{}\t{}\t{}",
            s.input.display(),
            s.output.display(),
            s.records,
            s.entries,
            s.skipped_ids,
            s.spilled_runs
        );
    }
}
