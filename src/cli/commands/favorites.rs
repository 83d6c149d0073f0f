//! Inspect or edit the persisted favorites file without starting the feed.

use anyhow::{anyhow, Result};
use clap::Args;
use owo_colors::OwoColorize;

use crate::data_paths::DataPaths;
use crate::logging::{init_logging, LogMode, LoggingConfig};
use crate::watchlist::FavoritesFile;

#[derive(Args, Clone)]
pub struct FavoritesArgs {
    /// Append a symbol to the favorites file
    #[arg(long)]
    pub add: Option<String>,

    /// Remove a symbol from the favorites file
    #[arg(long)]
    pub remove: Option<String>,
}

pub struct FavoritesCommand {
    args: FavoritesArgs,
}

impl FavoritesCommand {
    pub fn new(args: FavoritesArgs) -> Self {
        Self { args }
    }

    pub async fn execute(&self, data_paths: DataPaths) -> Result<()> {
        init_logging(LoggingConfig::new(
            LogMode::ConsoleAndFile,
            data_paths.clone(),
        ))?;

        let store = FavoritesFile::new(data_paths.favorites_file());

        if let Some(symbol) = &self.args.add {
            let symbol = symbol.trim().to_uppercase();
            let existing = store.load()?;
            if existing.contains(&symbol) {
                return Err(anyhow!("{} is already in the favorites list", symbol));
            }
            store.append(&symbol)?;
            println!("Added {}", symbol.bright_green());
            return Ok(());
        }

        if let Some(symbol) = &self.args.remove {
            let symbol = symbol.trim().to_uppercase();
            let mut symbols = store.load()?;
            let before = symbols.len();
            symbols.retain(|s| s != &symbol);
            if symbols.len() == before {
                return Err(anyhow!("{} is not a favorite", symbol));
            }
            store.rewrite(&symbols)?;
            println!("Removed {}", symbol.bright_red());
            return Ok(());
        }

        let symbols = store.load()?;
        if symbols.is_empty() {
            println!("{}", "No favorites saved".bright_black().italic());
        } else {
            println!("{}", "Favorites:".bright_yellow());
            for symbol in symbols {
                println!("  {}", symbol.bright_cyan());
            }
        }
        Ok(())
    }
}
