//! Bazaar CLI - Database migrations and maintenance tools.
//!
//! # Usage
//!
//! ```bash
//! # Apply schema migrations and create the session table
//! bazaar-cli migrate
//!
//! # Point product images hosted on an old local server at the placeholder
//! bazaar-cli repair-images --prefix http://localhost
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `repair-images` - Replace stale product image URLs

#![cfg_attr(not(test), forbid(unsafe_code))]

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
    /// Run database migrations (schema and session store)
    Migrate,
    /// Replace product image URLs that start with a prefix
    RepairImages {
        /// URL prefix of the images to replace
        #[arg(long, default_value = "http://localhost")]
        prefix: String,

        /// Replacement URL (defaults to `PLACEHOLDER_IMAGE_URL` or the
        /// built-in placeholder)
        #[arg(long)]
        placeholder: Option<String>,
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
        Commands::Migrate => commands::migrate::run().await?,
        Commands::RepairImages {
            prefix,
            placeholder,
        } => {
            commands::repair_images::run(&prefix, placeholder).await?;
        }
    }
    Ok(())
}
