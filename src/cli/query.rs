use clap::Args;
use serde::Serialize;

use crate::cli::OutputFormat;
use crate::config::LookupConfig;
use crate::core::chromosome::AliasTable;
use crate::core::error::LookupError;
use crate::core::query::Query;
use crate::core::types::ReferenceBuild;
use crate::lookup::{GeneralizedVariant, Resolver};

#[derive(Args)]
pub struct QueryArgs {
    /// Variants to look up: rsids (rs231361) or coordinates (chr8:118184783)
    #[arg(required = true, num_args = 1..)]
    pub variants: Vec<String>,

    /// Reference build (GRCh37, hg19, GRCh38, hg38)
    #[arg(short = 'r', long = "reference-build", default_value = "GRCh38")]
    pub build: ReferenceBuild,
}

#[derive(Serialize)]
struct QueryResult<'a> {
    query: &'a str,
    build: ReferenceBuild,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    matches: GeneralizedVariant,
}

pub fn run(
    args: QueryArgs,
    config: &LookupConfig,
    format: OutputFormat,
    verbose: bool,
) -> anyhow::Result<()> {
    // Malformed queries are reported without touching the data files
    let queries: Vec<Result<Query, LookupError>> =
        args.variants.iter().map(|v| Query::parse(v)).collect();
    let resolver = if queries.iter().any(Result::is_ok) {
        Some(Resolver::from_config(config, &[args.build])?)
    } else {
        None
    };

    let results: Vec<QueryResult> = args
        .variants
        .iter()
        .zip(queries)
        .map(|(query, parsed)| {
            let outcome = parsed.and_then(|q| match &resolver {
                Some(resolver) => resolver
                    .resolve(&q, args.build)
                    .map(GeneralizedVariant::from_records),
                None => Err(LookupError::UnconfiguredBuild(args.build)),
            });
            match outcome {
                Ok(matches) => QueryResult {
                    query,
                    build: args.build,
                    error: None,
                    matches,
                },
                Err(e) => QueryResult {
                    query,
                    build: args.build,
                    error: Some(e.to_string()),
                    matches: GeneralizedVariant::default(),
                },
            }
        })
        .collect();

    match format {
        OutputFormat::Text => print_text(&results, verbose),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&results)?),
        OutputFormat::Tsv => print_tsv(&results),
    }

    let failed = results.iter().filter(|r| r.error.is_some()).count();
    if failed > 0 {
        if !matches!(format, OutputFormat::Text) {
            for result in &results {
                if let Some(error) = &result.error {
                    eprintln!("{error}");
                }
            }
        }
        anyhow::bail!("{failed} of {} queries failed", results.len());
    }

    Ok(())
}

fn print_text(results: &[QueryResult], verbose: bool) {
    let aliases = AliasTable::embedded();
    for result in results {
        if let Some(error) = &result.error {
            eprintln!("{}: {error}", result.query);
            continue;
        }

        let m = &result.matches;
        if m.is_empty() {
            println!("{}: no match in dbSNP {}", result.query, result.build);
            continue;
        }

        for i in 0..m.len() {
            let display_chrom = aliases
                .ucsc_name(&m.chrom[i])
                .unwrap_or_else(|| m.chrom[i].clone());
            println!(
                "{}\t{}:{}\t{}\t{}>{}",
                result.query,
                display_chrom,
                m.pos[i],
                m.id[i],
                m.ref_allele[i],
                m.alt[i].join(",")
            );
            if verbose {
                println!("   Sequence: {}", m.chrom[i]);
                println!("   INFO: {}", m.info[i]);
            }
        }
    }
}

fn print_tsv(results: &[QueryResult]) {
    println!("query\tbuild\tchrom\tpos\tid\tref\talt\tinfo");
    for result in results {
        let m = &result.matches;
        for i in 0..m.len() {
            println!(
                "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
                result.query,
                result.build,
                m.chrom[i],
                m.pos[i],
                m.id[i],
                m.ref_allele[i],
                m.alt[i].join(","),
                m.info[i]
            );
        }
    }
}
