//! Perfume bot CLI - catalog import and operator diagnostics.
//!
//! # Usage
//!
//! ```bash
//! # Validate a catalog without writing anything
//! perfume-cli import data/catalog.json --dry-run
//!
//! # Import a catalog into Neo4j
//! perfume-cli import data/catalog.json
//!
//! # Show how a message would be understood
//! perfume-cli classify "อยากได้น้ำหอมกลิ่นสดชื่น"
//!
//! # Run a product search
//! perfume-cli search --intent product_bestseller
//! ```
//!
//! # Commands
//!
//! - `import` - Load a catalog JSON file into the graph
//! - `classify` - Print the resolver's view of a message
//! - `search` - Run a product search against the configured graph

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "perfume-cli")]
#[command(author, version, about = "Perfume bot operator tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import a catalog JSON file into Neo4j
    Import {
        /// Path to the catalog file
        file: PathBuf,

        /// Validate and report without writing
        #[arg(long)]
        dry_run: bool,
    },
    /// Show the normalized text, scores and reply for a message
    Classify {
        /// Message text as a customer would type it
        text: String,
    },
    /// List products for an intent
    Search {
        /// Intent label (e.g. `product_bestseller`, `scent_fresh`)
        #[arg(short, long)]
        intent: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Import { file, dry_run } => commands::import::catalog(&file, dry_run).await?,
        Commands::Classify { text } => commands::classify::message(&text).await?,
        Commands::Search { intent } => commands::search::products(intent.as_deref()).await?,
    }
    Ok(())
}
