use clap::Parser;
use tracing_subscriber::EnvFilter;

use dbsnp_lookup::cli;
use dbsnp_lookup::config::LookupConfig;

fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();

    // Initialize logging based on verbosity flag
    let filter = if cli.verbose {
        EnvFilter::new("dbsnp_lookup=debug,info")
    } else {
        EnvFilter::new("dbsnp_lookup=warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let config = LookupConfig::load(cli.data_dir.as_deref(), cli.config.as_deref())?;

    match cli.command {
        cli::Commands::Query(args) => {
            cli::query::run(args, &config, cli.format, cli.verbose)?;
        }
        cli::Commands::Index(args) => {
            cli::index::run(args, &config, cli.format, cli.verbose)?;
        }
        cli::Commands::Download(args) => {
            cli::download::run(args, &config, cli.format, cli.verbose)?;
        }
    }

    Ok(())
}
