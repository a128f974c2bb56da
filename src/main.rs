//! Ripple CLI entry point

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "ripple")]
#[command(about = "Symbol dependency graph and cascading impact analysis", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Graph snapshot produced by the AST extractor (JSON)
    #[arg(short, long, default_value = "graph.json")]
    snapshot: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest a snapshot and report graph statistics
    Ingest,
    /// Direct and transitive dependencies of a symbol
    Deps {
        /// Symbol id
        symbol: String,

        /// Traversal depth
        #[arg(short, long, default_value = "3")]
        depth: usize,
    },
    /// What breaks if this symbol changes
    Impact {
        /// Symbol id
        symbol: String,

        /// Change kind: added, modified, removed, moved, signature_changed
        #[arg(short, long, default_value = "modified")]
        change: String,
    },
    /// Shortest dependency path between two symbols
    Path { from: String, to: String },
    /// Cross-project cascading impact of a change
    Cascade {
        /// Symbol id
        symbol: String,

        /// Project the symbol lives in
        #[arg(short, long)]
        project: String,

        /// Change kind: added, modified, removed, moved, signature_changed
        #[arg(short, long, default_value = "modified")]
        change: String,

        /// Follow external/published boundaries too
        #[arg(long)]
        include_external: bool,
    },
    /// Engine counters after ingesting the snapshot
    Metrics,
    /// Show version
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(format!(
            "ripple={log_level}"
        )))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command {
        Commands::Ingest => commands::ingest(&cli.snapshot).await,
        Commands::Deps { symbol, depth } => commands::deps(&cli.snapshot, &symbol, depth).await,
        Commands::Impact { symbol, change } => {
            commands::impact(&cli.snapshot, &symbol, &change).await
        }
        Commands::Path { from, to } => commands::path(&cli.snapshot, &from, &to).await,
        Commands::Cascade {
            symbol,
            project,
            change,
            include_external,
        } => commands::cascade(&cli.snapshot, &symbol, &project, &change, include_external).await,
        Commands::Metrics => commands::metrics(&cli.snapshot).await,
        Commands::Version => {
            println!("ripple v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
