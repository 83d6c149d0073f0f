//! Runtime settings: provider endpoint, API key, symbol universe, trading
//! defaults.
//!
//! The API key comes from the environment (`.env` files are honored by
//! `main`); everything else has a default that CLI flags can override.

use std::time::Duration;

use anyhow::{anyhow, Result};
use rust_decimal::Decimal;

/// Environment variable holding the quote provider API key.
pub const API_KEY_ENV: &str = "STOCKDECK_API_KEY";

/// Default quote provider base URL (Financial Modeling Prep).
pub const DEFAULT_BASE_URL: &str = "https://financialmodelingprep.com";

/// The default symbol universe shown in the market snapshot.
pub const DEFAULT_UNIVERSE: &[&str] = &[
    "AAPL", "MSFT", "GOOGL", "AMZN", "TSLA", "NFLX", "NVDA", "WMT", "BA",
];

/// Default poll interval for the acquisition worker.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 800;

/// Starting cash balance for the simulated account.
pub const DEFAULT_STARTING_CASH: u32 = 4000;

#[derive(Debug, Clone)]
pub struct Settings {
    pub base_url: String,
    pub api_key: String,
    pub universe: Vec<String>,
    pub poll_interval: Duration,
    pub starting_cash: Decimal,
}

impl Settings {
    /// Build settings from the environment, preferring an explicit key over
    /// `STOCKDECK_API_KEY`. A missing key is a startup error for every
    /// command that fetches quotes.
    pub fn from_env(api_key_override: Option<String>) -> Result<Self> {
        let api_key = resolve_api_key(api_key_override)?;
        Ok(Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key,
            universe: DEFAULT_UNIVERSE.iter().map(|s| s.to_string()).collect(),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            starting_cash: Decimal::from(DEFAULT_STARTING_CASH),
        })
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_starting_cash(mut self, cash: Decimal) -> Self {
        self.starting_cash = cash;
        self
    }
}

fn resolve_api_key(explicit: Option<String>) -> Result<String> {
    if let Some(key) = explicit {
        if !key.trim().is_empty() {
            return Ok(key);
        }
    }
    match std::env::var(API_KEY_ENV) {
        Ok(key) if !key.trim().is_empty() => Ok(key),
        _ => Err(anyhow!(
            "No API key configured. Set {} (a .env file works) or pass --api-key",
            API_KEY_ENV
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn explicit_key_wins_over_environment() {
        let key = resolve_api_key(Some("demo-key".to_string())).unwrap();
        assert_eq!(key, "demo-key");
    }

    #[test]
    fn blank_explicit_key_is_not_a_key() {
        // Falls through to the environment lookup and its error message.
        let result = resolve_api_key(Some("   ".to_string()));
        if let Err(e) = result {
            assert!(e.to_string().contains(API_KEY_ENV));
        }
    }

    #[test]
    fn defaults_match_the_documented_universe() {
        let settings = Settings::from_env(Some("k".to_string())).unwrap();
        assert_eq!(settings.universe.len(), 9);
        assert_eq!(settings.universe[0], "AAPL");
        assert_eq!(settings.poll_interval, Duration::from_millis(800));
        assert_eq!(settings.starting_cash, dec!(4000));
    }

    #[test]
    fn builders_override_defaults() {
        let settings = Settings::from_env(Some("k".to_string()))
            .unwrap()
            .with_poll_interval(Duration::from_millis(250))
            .with_starting_cash(dec!(10000));
        assert_eq!(settings.poll_interval, Duration::from_millis(250));
        assert_eq!(settings.starting_cash, dec!(10000));
    }
}
