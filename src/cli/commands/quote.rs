//! One-shot quote lookup with the full detail card.

use anyhow::{Context, Result};
use clap::Args;

use crate::config::Settings;
use crate::data_paths::DataPaths;
use crate::display;
use crate::logging::{init_logging, LogMode, LoggingConfig};
use crate::market::{FmpProvider, QuoteProvider};

#[derive(Args, Clone)]
pub struct QuoteArgs {
    /// Ticker symbol to look up
    pub symbol: String,

    /// Quote provider API key (overrides STOCKDECK_API_KEY)
    #[arg(long)]
    pub api_key: Option<String>,
}

pub struct QuoteCommand {
    args: QuoteArgs,
}

impl QuoteCommand {
    pub fn new(args: QuoteArgs) -> Self {
        Self { args }
    }

    pub async fn execute(&self, data_paths: DataPaths) -> Result<()> {
        init_logging(LoggingConfig::new(LogMode::ConsoleAndFile, data_paths))?;

        let settings = Settings::from_env(self.args.api_key.clone())?;
        let provider = FmpProvider::new(&settings.base_url, &settings.api_key)?;

        let quote = provider
            .fetch_quote(&self.args.symbol)
            .await
            .with_context(|| format!("Failed to fetch quote for {}", self.args.symbol))?;

        display::print_quote_details(&quote);
        Ok(())
    }
}
