//! Bazaar CLI - Database migrations and seed data.
//!
//! # Usage
//!
//! ```bash
//! # Apply storefront migrations and create the session table
//! bazaar-cli migrate
//!
//! # Load the demo catalog (idempotent)
//! bazaar-cli seed
//! bazaar-cli seed --file path/to/fixture.yaml
//! ```
//!
//! Both commands read `STOREFRONT_DATABASE_URL` (or `DATABASE_URL`), loading
//! `.env` if present.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "bazaar-cli")]
#[command(author, version, about = "Bazaar CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run storefront database migrations
    Migrate,
    /// Load shopkeepers and products from a YAML fixture
    Seed {
        /// Fixture to load
        #[arg(short, long, default_value = commands::seed::DEFAULT_FIXTURE)]
        file: PathBuf,
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
        Commands::Migrate => commands::migrate::storefront().await?,
        Commands::Seed { file } => commands::seed::run(&file).await?,
    }
    Ok(())
}
