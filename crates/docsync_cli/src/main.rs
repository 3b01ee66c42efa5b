//! docsync - inspect and maintain the offline document queue
//!
//! Operates on the same file-backed data directory the application writes
//! its queue and document cache into.

mod commands;
mod state;

use clap::{Parser, Subcommand};
use state::AppState;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Inspect and maintain the offline document queue"
)]
struct Cli {
    /// Data directory holding settings.json and the storage files
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarize pending and failed operations.
    Status {
        /// Render the summary as if connectivity were available
        #[arg(long)]
        online: bool,
    },
    /// List every queued operation in order.
    List,
    /// Put a failed operation back in line for the next sync.
    Retry { id: String },
    /// Drop a queued operation without running it.
    Remove { id: String },
    /// Remove operations that already synced.
    #[command(name = "clear-succeeded")]
    ClearSucceeded,
    /// Show or clear the cached document listing.
    Cache {
        #[arg(long)]
        clear: bool,
    },
    /// Show or change settings.json. Changes apply the next time the queue is opened.
    Config(commands::ConfigArgs),
}

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let data_dir = cli.data_dir.unwrap_or_else(state::default_data_dir);
    tracing::debug!("Data directory: {:?}", data_dir);

    let mut state = AppState::open(&data_dir)?;
    let output = match cli.command {
        Commands::Status { online } => commands::status(&state, online, cli.json)?,
        Commands::List => commands::list(&state, cli.json)?,
        Commands::Retry { id } => commands::retry(&state, &id)?,
        Commands::Remove { id } => commands::remove(&state, &id)?,
        Commands::ClearSucceeded => commands::clear_succeeded(&state),
        Commands::Cache { clear: true } => commands::clear_cache(&state),
        Commands::Cache { clear: false } => commands::cache(&state, cli.json)?,
        Commands::Config(args) => commands::config(&mut state.settings, &args, cli.json)?,
    };
    println!("{output}");
    Ok(())
}
