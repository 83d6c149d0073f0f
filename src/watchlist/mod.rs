//! The user's curated set of favorite symbols, each with its cached quote.

pub mod store;

pub use store::{FavoritesFile, StoreError};

use crate::errors::DomainError;
use crate::market::Quote;

/// In-memory watchlist. Uniqueness invariant: no duplicate symbols.
///
/// Symbol matching is case-sensitive; symbols are already uppercased at
/// the API boundary and in the wire parser.
#[derive(Debug, Default, Clone)]
pub struct Watchlist {
    entries: Vec<Quote>,
}

impl Watchlist {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[Quote] {
        &self.entries
    }

    pub fn symbols(&self) -> Vec<String> {
        self.entries.iter().map(|q| q.symbol.clone()).collect()
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.entries.iter().any(|q| q.symbol == symbol)
    }

    pub fn get(&self, symbol: &str) -> Option<&Quote> {
        self.entries.iter().find(|q| q.symbol == symbol)
    }

    /// Insert a quote, rejecting duplicates.
    pub fn insert(&mut self, quote: Quote) -> Result<(), DomainError> {
        if self.contains(&quote.symbol) {
            return Err(DomainError::DuplicateFavorite(quote.symbol));
        }
        self.entries.push(quote);
        Ok(())
    }

    /// Remove the first entry matching the symbol.
    pub fn remove(&mut self, symbol: &str) -> Result<Quote, DomainError> {
        let idx = self
            .entries
            .iter()
            .position(|q| q.symbol == symbol)
            .ok_or_else(|| DomainError::NotAFavorite(symbol.to_string()))?;
        Ok(self.entries.remove(idx))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
