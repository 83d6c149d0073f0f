//! The interactive watch session: starts the acquisition worker and runs
//! a line-oriented console against the consumer API.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};
use clap::Args;
use owo_colors::OwoColorize;
use rust_decimal::Decimal;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tracing::info;

use crate::config::Settings;
use crate::data_paths::DataPaths;
use crate::display;
use crate::errors::DomainError;
use crate::logging::{init_logging, LogMode, LoggingConfig};
use crate::market::{FeedConfig, FmpProvider, QuoteFeed, QuoteProvider, SharedMarket};
use crate::watchlist::FavoritesFile;

/// How long a domain-error notice stays visible.
const NOTICE_TTL: Duration = Duration::from_secs(3);

#[derive(Args, Clone)]
pub struct WatchArgs {
    /// Quote provider API key (overrides STOCKDECK_API_KEY)
    #[arg(long)]
    pub api_key: Option<String>,

    /// Poll interval for the quote feed, in milliseconds
    #[arg(long, default_value = "800")]
    pub interval_ms: u64,

    /// Starting cash balance for the simulated account
    #[arg(long, default_value = "4000")]
    pub cash: f64,
}

pub struct WatchCommand {
    args: WatchArgs,
}

/// Auto-expiring user notices, the session's rendition of the error
/// banners: a failed operation pushes one, rendering drops it after the
/// TTL.
struct NoticeBoard {
    notices: Vec<(Instant, String)>,
}

impl NoticeBoard {
    fn new() -> Self {
        Self {
            notices: Vec::new(),
        }
    }

    fn push(&mut self, message: String) {
        self.notices.push((Instant::now(), message));
    }

    /// Active notice texts; expired ones are dropped on the way out.
    fn active(&mut self) -> Vec<String> {
        self.notices.retain(|(at, _)| at.elapsed() < NOTICE_TTL);
        self.notices.iter().map(|(_, msg)| msg.clone()).collect()
    }
}

impl WatchCommand {
    pub fn new(args: WatchArgs) -> Self {
        Self { args }
    }

    pub async fn execute(&self, data_paths: DataPaths) -> Result<()> {
        // File-only logging so feed chatter doesn't tear the tables.
        init_logging(LoggingConfig::new(LogMode::FileOnly, data_paths.clone()))?;

        let starting_cash = Decimal::try_from(self.args.cash)
            .map_err(|e| anyhow!("Invalid --cash value: {e}"))?;
        let settings = Settings::from_env(self.args.api_key.clone())?
            .with_poll_interval(Duration::from_millis(self.args.interval_ms))
            .with_starting_cash(starting_cash);

        let store = FavoritesFile::new(data_paths.favorites_file());
        let market = SharedMarket::new(settings.starting_cash, store.clone());
        let provider: Arc<dyn QuoteProvider> =
            Arc::new(FmpProvider::new(&settings.base_url, &settings.api_key)?);

        let mut feed = QuoteFeed::new(
            FeedConfig {
                universe: settings.universe.clone(),
                poll_interval: settings.poll_interval,
            },
            market.clone(),
            provider,
            store,
        );
        feed.start();

        println!(
            "{} {}",
            "stockdeck".bright_blue().bold(),
            "watch session".bright_white()
        );
        println!(
            "{}",
            "Type 'help' for commands, 'quit' to exit.".bright_black()
        );

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut notices = NoticeBoard::new();

        loop {
            tokio::select! {
                line = lines.next_line() => {
                    match line? {
                        Some(line) => {
                            if !self.handle_line(&market, &mut notices, line.trim()).await {
                                break;
                            }
                        }
                        // stdin closed
                        None => break,
                    }
                }
                _ = signal::ctrl_c() => {
                    println!();
                    break;
                }
            }
        }

        info!("watch session ending, stopping quote feed");
        feed.stop().await;
        Ok(())
    }

    /// Handle one console line. Returns false when the session should
    /// end.
    async fn handle_line(
        &self,
        market: &SharedMarket,
        notices: &mut NoticeBoard,
        line: &str,
    ) -> bool {
        let mut words = line.split_whitespace();
        let command = match words.next() {
            Some(word) => word.to_lowercase(),
            None => return true,
        };
        let arg = words.next();

        let result: Result<(), DomainError> = match (command.as_str(), arg) {
            ("quit", _) | ("exit", _) => return false,
            ("help", _) => {
                print_help();
                Ok(())
            }
            ("market", _) => {
                let view = market.view().await;
                if view.data_ready {
                    println!("{}", display::market_table(&view.quotes));
                } else {
                    println!("{}", "Waiting for first market data...".bright_black());
                }
                Ok(())
            }
            ("portfolio", _) => {
                display::print_portfolio(&market.valuation().await);
                Ok(())
            }
            ("favorites", _) => {
                let view = market.view().await;
                if view.watchlist.is_empty() {
                    println!("{}", "No favorites".bright_black().italic());
                } else {
                    println!("{}", display::watchlist_table(&view.watchlist));
                }
                Ok(())
            }
            ("balance", _) => {
                let view = market.view().await;
                println!(
                    "Cash balance: {}",
                    format!("${}", display::money(view.balance)).bright_green()
                );
                Ok(())
            }
            ("info", Some(symbol)) => {
                let symbol = symbol.to_uppercase();
                let view = market.view().await;
                let quote = view
                    .quotes
                    .iter()
                    .chain(view.watchlist.iter())
                    .find(|q| q.symbol == symbol);
                match quote {
                    Some(quote) => {
                        display::print_quote_details(quote);
                        Ok(())
                    }
                    None => Err(DomainError::UnknownSymbol(symbol)),
                }
            }
            ("search", Some(symbol)) => market.request_search(symbol).await.map(|()| {
                println!("Search queued for {}", symbol.to_uppercase().bright_cyan());
            }),
            ("refresh", _) => {
                market.request_refresh().await;
                println!("{}", "Refresh queued".bright_cyan());
                Ok(())
            }
            ("buy", Some(symbol)) => market.buy(symbol).await.map(|quote| {
                println!(
                    "Bought 1 {} at {}",
                    quote.symbol.bright_green(),
                    format!("${}", display::money(quote.price)).bright_white()
                );
            }),
            ("sell", Some(symbol)) => market.sell(symbol).await.map(|credited| {
                println!(
                    "Sold 1 {} for {}",
                    symbol.to_uppercase().bright_red(),
                    format!("${}", display::money(credited)).bright_white()
                );
            }),
            ("fav", Some(symbol)) => market.add_favorite(symbol).await.map(|()| {
                println!("{} added to favorites", symbol.to_uppercase().bright_cyan());
            }),
            ("unfav", Some(symbol)) => market.remove_favorite(symbol).await.map(|()| {
                println!(
                    "{} removed from favorites",
                    symbol.to_uppercase().bright_cyan()
                );
            }),
            ("info", None) | ("search", None) | ("buy", None) | ("sell", None)
            | ("fav", None) | ("unfav", None) => {
                println!("{} requires a symbol, e.g. '{command} AAPL'", command);
                Ok(())
            }
            _ => {
                println!("Unknown command '{line}'. Type 'help' for commands.");
                Ok(())
            }
        };

        if let Err(e) = result {
            notices.push(e.to_string());
        }
        for notice in notices.active() {
            println!("{}", notice.bright_yellow());
        }
        true
    }
}

fn print_help() {
    println!("{}", "Commands:".bright_yellow());
    println!("  market           show the market snapshot table");
    println!("  portfolio        show positions and valuation");
    println!("  favorites        show the watchlist table");
    println!("  balance          show the cash balance");
    println!("  info <sym>       show the detail card for a symbol");
    println!("  search <sym>     queue a symbol fetch for the next tick");
    println!("  refresh          rebuild snapshot and watchlist");
    println!("  buy <sym>        buy one share at the current price");
    println!("  sell <sym>       sell one share at the marked price");
    println!("  fav <sym>        add a snapshot symbol to favorites");
    println!("  unfav <sym>      remove a favorite");
    println!("  quit             exit (Ctrl-C also works)");
}
