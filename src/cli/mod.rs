//! CLI module for stockdeck
//!
//! It uses clap for argument parsing and provides a structured command
//! pattern for all operations.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod commands;

use crate::data_paths::{DataPaths, DEFAULT_DATA_DIR};

use commands::favorites::{FavoritesArgs, FavoritesCommand};
use commands::quote::{QuoteArgs, QuoteCommand};
use commands::version::{VersionArgs, VersionCommand};
use commands::watch::{WatchArgs, WatchCommand};

#[derive(Parser)]
#[command(name = "stockdeck")]
#[command(version)]
#[command(about = "Terminal stock market tracker with simulated trading", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Data directory path (default: ./data)
    #[arg(long, global = true, default_value = DEFAULT_DATA_DIR)]
    pub data_dir: PathBuf,

    /// Verbose logging
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the live market feed and interactive trading session
    Watch(WatchArgs),

    /// Fetch one quote and print its detail card
    Quote(QuoteArgs),

    /// List or edit the persisted favorites
    Favorites(FavoritesArgs),

    /// Show version information
    Version(VersionArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        let data_paths = DataPaths::new(&self.data_dir);

        // Ensure all directories exist
        data_paths.ensure_directories()?;

        match self.command {
            Commands::Watch(args) => WatchCommand::new(args).execute(data_paths).await,
            Commands::Quote(args) => QuoteCommand::new(args).execute(data_paths).await,
            Commands::Favorites(args) => FavoritesCommand::new(args).execute(data_paths).await,
            Commands::Version(args) => VersionCommand::new(args).execute(data_paths).await,
        }
    }
}
