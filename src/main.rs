//! Trellis CLI entry point

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use trellis_core::AnalysisConfig;

mod commands;

#[derive(Parser)]
#[command(name = "trellis")]
#[command(about = "Code knowledge graph and dependency analysis", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Directory searched for trellis.toml (defaults to current directory)
    #[arg(short, long, default_value = ".")]
    root: PathBuf,

    /// Explicit config file, overrides discovery under --root
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the graph from parsed-file documents and print its statistics
    Graph {
        /// Parsed-file documents (.json, .yaml)
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Call-graph report, or details for a single function
    Calls {
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Function id to inspect, e.g. "Accounts.fetch/1"
        #[arg(short, long)]
        function: Option<String>,

        /// Module whose call statistics to include
        #[arg(short, long)]
        module: Option<String>,
    },
    /// Shortest path between two node ids
    Path {
        from: String,
        to: String,

        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Follow Calls edges only
        #[arg(long)]
        calls_only: bool,
    },
    /// Cross-repository dependency report for a portfolio manifest
    Repos {
        portfolio: PathBuf,

        /// Repository (or external dependency) to run impact analysis on
        #[arg(short, long)]
        impact: Option<String>,
    },
    /// Show version
    Version,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(format!(
            "trellis={level},trellis_core={level},trellis_indexer={level},trellis_analysis={level}",
            level = log_level
        )))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = match &cli.config {
        Some(path) => AnalysisConfig::load(path)?,
        None => AnalysisConfig::discover(&cli.root)?,
    };
    tracing::debug!("Analysis config: {:?}", config);

    match cli.command {
        Commands::Graph { files } => commands::graph(&files),
        Commands::Calls {
            files,
            function,
            module,
        } => commands::calls(&files, function.as_deref(), module.as_deref(), &config),
        Commands::Path {
            from,
            to,
            files,
            calls_only,
        } => commands::path(&files, &from, &to, calls_only, &config),
        Commands::Repos { portfolio, impact } => {
            commands::repos(&portfolio, impact.as_deref())
        }
        Commands::Version => {
            println!("Trellis v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
