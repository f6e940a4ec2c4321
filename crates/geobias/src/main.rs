//! GeoBias CLI - measure geographic and linguistic bias in image-tag datasets.
//!
//! Each `measure` run makes one pass over a dataset and writes a JSON snapshot
//! per mode under `{results_dir}/{run_id}/`.
//!
//! # Usage
//!
//! ```bash
//! # Samples per country
//! geobias measure ./openimages --mode count --run-id oi
//!
//! # Tag frequencies and features, switching to GPS regions if the dataset has boundaries
//! geobias measure ./yfcc --mode tag --follow-boundaries
//!
//! # View configuration
//! geobias config show
//! ```

use clap::{Parser, Subcommand};

mod cli;
mod logging;

/// GeoBias - geographic and linguistic bias measurement for image-tag datasets.
#[derive(Parser, Debug)]
#[command(name = "geobias")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run measurement modes over a dataset and save their snapshots
    Measure(cli::measure::MeasureArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging isn't up yet, so config warnings go straight to stderr.
    let config = match geobias_core::Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `geobias config path`."
            );
            geobias_core::Config::default()
        }
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("GeoBias v{}", geobias_core::VERSION);

    match cli.command {
        Commands::Measure(args) => cli::measure::execute(args, config).await,
        Commands::Config(args) => cli::config::execute(args).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_measure_command() {
        let cli = Cli::try_parse_from([
            "geobias",
            "-v",
            "measure",
            "./data",
            "--mode",
            "gps-count",
            "--mode",
            "tag",
            "--run-id",
            "r1",
        ])
        .unwrap();
        assert!(cli.verbose);
        let Commands::Measure(args) = cli.command else {
            panic!("expected measure command");
        };
        assert_eq!(args.run_id.as_deref(), Some("r1"));
        assert_eq!(args.modes.len(), 2);
    }

    #[test]
    fn test_measure_requires_dataset() {
        assert!(Cli::try_parse_from(["geobias", "measure"]).is_err());
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
