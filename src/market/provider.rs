//! Quote provider trait and the Financial Modeling Prep implementation.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use thiserror::Error;
use tracing::debug;

use super::quote::{Quote, QuoteRow};

/// Why a single-symbol fetch failed. Fetch failures are never fatal: the
/// worker logs them and skips the symbol until the next cycle.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("provider returned HTTP {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("malformed quote payload: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("no quote data for {symbol}")]
    Empty { symbol: String },
}

/// A source of current quotes, one symbol per request.
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Get the name of the provider
    fn name(&self) -> &str;

    /// Fetch the current quote for one symbol. The returned quote's
    /// symbol is uppercase-normalized.
    async fn fetch_quote(&self, symbol: &str) -> Result<Quote, FetchError>;
}

/// Financial Modeling Prep quote API client.
pub struct FmpProvider {
    client: Client,
    base_url: String,
    api_key: String,
}

impl FmpProvider {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
        })
    }
}

#[async_trait]
impl QuoteProvider for FmpProvider {
    fn name(&self) -> &str {
        "Financial Modeling Prep"
    }

    async fn fetch_quote(&self, symbol: &str) -> Result<Quote, FetchError> {
        let symbol = symbol.to_uppercase();
        // The key stays out of the logs.
        let url = format!(
            "{}/api/v3/quote/{}?apikey={}",
            self.base_url, symbol, self.api_key
        );

        debug!(%symbol, "fetching quote");
        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status { status, body });
        }

        let body = response.text().await?;
        let rows: Vec<QuoteRow> = serde_json::from_str(&body)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or(FetchError::Empty { symbol })?;

        Ok(Quote::from(row))
    }
}
