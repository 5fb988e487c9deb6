use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use ragdex::Result;
use ragdex::commands::{ingest, init_config, search, show_config, show_status};
use ragdex::config::{Config, get_config_dir};

#[derive(Parser)]
#[command(name = "ragdex")]
#[command(about = "Local RAG indexing and search over a text corpus using Ollama embeddings")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Index a corpus directory into a store (full rebuild)
    Ingest {
        /// Directory with source files
        #[arg(long, default_value = "./corpus")]
        corpus: PathBuf,
        /// Store directory to (re)build
        #[arg(long, default_value = "./store")]
        store: PathBuf,
        /// Override the embedding model from the config
        #[arg(long)]
        model: Option<String>,
        /// Chunk window size in characters
        #[arg(long)]
        chunk_size: Option<usize>,
        /// Characters shared between adjacent chunks
        #[arg(long)]
        overlap: Option<usize>,
    },
    /// Search a store for the nearest chunks
    Search {
        /// Query text
        query: String,
        /// Store directory to search
        #[arg(long, default_value = "./store")]
        store: PathBuf,
        /// How many results to return
        #[arg(short, long, default_value_t = 5)]
        k: usize,
        /// Drop hits scoring below this value
        #[arg(long)]
        threshold: Option<f32>,
        /// Override the embedding model from the config
        #[arg(long)]
        model: Option<String>,
    },
    /// Show a summary of a persisted store
    Status {
        /// Store directory to inspect
        #[arg(long, default_value = "./store")]
        store: PathBuf,
    },
    /// Show the active configuration
    Config {
        /// Write a default config file if none exists yet
        #[arg(long)]
        init: bool,
    },
}

fn init_tracing(verbosity: u8) {
    let default_level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config_dir = get_config_dir().map_err(anyhow::Error::from)?;
    let mut config = Config::load(&config_dir)?;

    match cli.command {
        Commands::Ingest {
            corpus,
            store,
            model,
            chunk_size,
            overlap,
        } => {
            if let Some(chunk_size) = chunk_size {
                config.chunking.chunk_size = chunk_size;
            }
            if let Some(overlap) = overlap {
                config.chunking.overlap = overlap;
            }
            ingest(&config, &corpus, &store, model.as_deref())?;
        }
        Commands::Search {
            query,
            store,
            k,
            threshold,
            model,
        } => {
            search(&config, &store, &query, k, threshold, model.as_deref())?;
        }
        Commands::Status { store } => {
            show_status(&store)?;
        }
        Commands::Config { init } => {
            if init {
                init_config(&config)?;
            } else {
                show_config(&config)?;
            }
        }
    }

    Ok(())
}
