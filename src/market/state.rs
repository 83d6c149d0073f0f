//! The shared market aggregate and the synchronization protocol around it.
//!
//! One coarse `RwLock` guards everything: market snapshot, watchlist,
//! portfolio, and the coordination signals. Every operation takes the lock
//! exactly once and never holds it across network I/O; the acquisition
//! worker fetches first and applies the result under the lock afterwards.
//!
//! The signals are level/edge flags, not queues. At most one search and
//! one refresh are outstanding at a time: a second search overwrites the
//! pending symbol (last-writer-wins), a second refresh request while one
//! is pending is a no-op.

use std::sync::Arc;

use rust_decimal::Decimal;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::errors::DomainError;
use crate::portfolio::{Portfolio, Position, ValuationReport};
use crate::watchlist::{FavoritesFile, Watchlist};

use super::Quote;

struct MarketState {
    /// Quotes for the active (non-favorite) universe, in display order.
    snapshot: Vec<Quote>,
    watchlist: Watchlist,
    portfolio: Portfolio,
    /// `Some` == a search is pending (consumer → worker).
    pending_search: Option<String>,
    /// Edge-triggered refresh signal (consumer → worker).
    refresh_requested: bool,
    /// Monotonic "first data has arrived" latch (worker → consumer).
    data_ready: bool,
    /// Set once the bootstrap phase has loaded the persisted favorites.
    favorites_loaded: bool,
}

/// Lock-scoped copy of everything the consumer renders.
#[derive(Debug, Clone)]
pub struct MarketView {
    pub quotes: Vec<Quote>,
    pub watchlist: Vec<Quote>,
    pub positions: Vec<Position>,
    pub balance: Decimal,
    pub data_ready: bool,
    pub favorites_loaded: bool,
}

/// Cloneable handle on the shared state. One instance is created at
/// startup and handed to both the acquisition worker and the consumer;
/// it lives for the whole process.
#[derive(Clone)]
pub struct SharedMarket {
    inner: Arc<RwLock<MarketState>>,
    store: FavoritesFile,
}

impl SharedMarket {
    pub fn new(starting_cash: Decimal, store: FavoritesFile) -> Self {
        Self {
            inner: Arc::new(RwLock::new(MarketState {
                snapshot: Vec::new(),
                watchlist: Watchlist::new(),
                portfolio: Portfolio::new(starting_cash),
                pending_search: None,
                refresh_requested: false,
                data_ready: false,
                favorites_loaded: false,
            })),
            store,
        }
    }

    // ---- consumer API -------------------------------------------------

    /// Read-only copy of the current state, taken under a single read
    /// scope.
    pub async fn view(&self) -> MarketView {
        let state = self.inner.read().await;
        MarketView {
            quotes: state.snapshot.clone(),
            watchlist: state.watchlist.entries().to_vec(),
            positions: state.portfolio.positions().to_vec(),
            balance: state.portfolio.cash(),
            data_ready: state.data_ready,
            favorites_loaded: state.favorites_loaded,
        }
    }

    /// Value every open position at its latest marked price.
    pub async fn valuation(&self) -> ValuationReport {
        self.inner.read().await.portfolio.valuation()
    }

    /// Queue a symbol for the worker to fetch on its next tick. A symbol
    /// already in the snapshot is rejected instead of fetched twice.
    pub async fn request_search(&self, symbol: &str) -> Result<(), DomainError> {
        let symbol = symbol.to_uppercase();
        let mut state = self.inner.write().await;
        if state.snapshot.iter().any(|q| q.symbol == symbol) {
            return Err(DomainError::AlreadyListed(symbol));
        }
        // Last-writer-wins: a still-pending symbol is simply replaced.
        state.pending_search = Some(symbol);
        Ok(())
    }

    /// Ask the worker to rebuild snapshot and watchlist from scratch.
    /// Idempotent while a refresh is already pending.
    pub async fn request_refresh(&self) {
        self.inner.write().await.refresh_requested = true;
    }

    /// Buy one share of a snapshot symbol at its current price.
    pub async fn buy(&self, symbol: &str) -> Result<Quote, DomainError> {
        let symbol = symbol.to_uppercase();
        let mut state = self.inner.write().await;
        let quote = state
            .snapshot
            .iter()
            .find(|q| q.symbol == symbol)
            .cloned()
            .ok_or_else(|| DomainError::UnknownSymbol(symbol.clone()))?;
        state.portfolio.buy(&quote)?;
        Ok(quote)
    }

    /// Sell one share, crediting the latest marked price. Returns the
    /// credited amount.
    pub async fn sell(&self, symbol: &str) -> Result<Decimal, DomainError> {
        let symbol = symbol.to_uppercase();
        self.inner.write().await.portfolio.sell(&symbol)
    }

    /// Add a snapshot symbol to the favorites, persisting it. A storage
    /// failure keeps the in-memory entry and is only logged.
    pub async fn add_favorite(&self, symbol: &str) -> Result<(), DomainError> {
        let symbol = symbol.to_uppercase();
        let mut state = self.inner.write().await;
        let quote = state
            .snapshot
            .iter()
            .find(|q| q.symbol == symbol)
            .cloned()
            .ok_or_else(|| DomainError::UnknownSymbol(symbol.clone()))?;
        state.watchlist.insert(quote)?;

        if let Err(e) = self.store.append(&symbol) {
            warn!(%symbol, error = %e, "failed to persist favorite, keeping it in memory");
        }
        Ok(())
    }

    /// Remove a favorite and rewrite the persisted list from what remains.
    pub async fn remove_favorite(&self, symbol: &str) -> Result<(), DomainError> {
        let symbol = symbol.to_uppercase();
        let mut state = self.inner.write().await;
        state.watchlist.remove(&symbol)?;

        if let Err(e) = self.store.rewrite(&state.watchlist.symbols()) {
            warn!(%symbol, error = %e, "failed to rewrite favorites file");
        }
        Ok(())
    }

    // ---- worker API ---------------------------------------------------

    /// Insert a bootstrap-fetched quote into the watchlist (bootstrap
    /// entries do not appear in the snapshot) and mark any held position
    /// to the fetched price.
    pub async fn apply_watchlist_quote(&self, quote: Quote) {
        let mut state = self.inner.write().await;
        let symbol = quote.symbol.clone();
        let price = quote.price;
        if state.watchlist.insert(quote).is_err() {
            debug!(%symbol, "bootstrap symbol already in watchlist, skipping insert");
        }
        state.portfolio.mark_to_market(&symbol, price);
    }

    /// Insert a fetched quote into the market snapshot. If the symbol is
    /// already a favorite, the watchlist's cached quote is copied in
    /// instead (no stale/fresh duplicate of the same symbol); the freshly
    /// fetched price still marks any held position.
    pub async fn apply_market_quote(&self, quote: Quote) {
        let mut state = self.inner.write().await;
        let symbol = quote.symbol.clone();
        let fetched_price = quote.price;

        let row = state.watchlist.get(&symbol).cloned().unwrap_or(quote);
        match state.snapshot.iter_mut().find(|q| q.symbol == symbol) {
            Some(existing) => *existing = row,
            None => {
                state.snapshot.push(row);
                state.data_ready = true;
            }
        }
        state.portfolio.mark_to_market(&symbol, fetched_price);
    }

    /// Bootstrap completion marker.
    pub async fn mark_favorites_loaded(&self) {
        self.inner.write().await.favorites_loaded = true;
    }

    /// Peek at a pending search without consuming it. The worker clears
    /// the signal only after it has attempted the fetch, so a search
    /// submitted mid-fetch can be absorbed by that clear
    /// (last-writer-wins, by design of the single-slot signal).
    pub async fn pending_search(&self) -> Option<String> {
        self.inner.read().await.pending_search.clone()
    }

    pub async fn clear_search_request(&self) {
        self.inner.write().await.pending_search = None;
    }

    /// Consume a pending refresh request. Clearing the flag, the
    /// snapshot, the watchlist, and the favorites-loaded marker happens
    /// in one lock scope; the caller re-runs bootstrap and the universe
    /// fetch outside the lock. `data_ready` stays latched.
    pub async fn take_refresh_request(&self) -> bool {
        let mut state = self.inner.write().await;
        if !state.refresh_requested {
            return false;
        }
        state.refresh_requested = false;
        state.snapshot.clear();
        state.watchlist.clear();
        state.favorites_loaded = false;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tempfile::TempDir;

    fn quote(symbol: &str, price: Decimal) -> Quote {
        Quote {
            symbol: symbol.to_string(),
            name: format!("{symbol} Inc."),
            price,
            open: price,
            close: price,
            day_high: price,
            day_low: price,
            year_high: price,
            year_low: price,
            change: Decimal::ZERO,
            change_pct: Decimal::ZERO,
            volume: 1_000,
            exchange: "NASDAQ".to_string(),
        }
    }

    fn market_in(dir: &TempDir) -> SharedMarket {
        SharedMarket::new(
            dec!(4000.0),
            FavoritesFile::new(dir.path().join("favorites.txt")),
        )
    }

    #[tokio::test]
    async fn data_ready_latches_when_the_snapshot_gains_an_entry() {
        let dir = TempDir::new().unwrap();
        let market = market_in(&dir);
        assert!(!market.view().await.data_ready);

        market.apply_market_quote(quote("AAPL", dec!(150.0))).await;
        assert!(market.view().await.data_ready);

        // Re-applying the same symbol replaces the row, no duplicate.
        market.apply_market_quote(quote("AAPL", dec!(151.0))).await;
        let view = market.view().await;
        assert_eq!(view.quotes.len(), 1);
        assert_eq!(view.quotes[0].price, dec!(151.0));
    }

    #[tokio::test]
    async fn market_quote_for_a_favorite_copies_the_cached_entry() {
        let dir = TempDir::new().unwrap();
        let market = market_in(&dir);

        market
            .apply_watchlist_quote(quote("AAPL", dec!(150.0)))
            .await;
        market.apply_market_quote(quote("AAPL", dec!(155.0))).await;

        let view = market.view().await;
        // The snapshot shows the watchlist's cached quote, not the fresh
        // fetch.
        assert_eq!(view.quotes[0].price, dec!(150.0));
        assert_eq!(view.watchlist[0].price, dec!(150.0));
    }

    #[tokio::test]
    async fn fresh_price_marks_positions_even_on_the_copy_path() {
        let dir = TempDir::new().unwrap();
        let market = market_in(&dir);

        market.apply_market_quote(quote("AAPL", dec!(150.0))).await;
        market.buy("AAPL").await.unwrap();
        market.add_favorite("AAPL").await.unwrap();

        market.apply_market_quote(quote("AAPL", dec!(160.0))).await;
        let positions = market.view().await.positions;
        assert_eq!(positions[0].market_price, dec!(160.0));
    }

    #[tokio::test]
    async fn search_requests_are_last_writer_wins() {
        let dir = TempDir::new().unwrap();
        let market = market_in(&dir);

        market.request_search("ibm").await.unwrap();
        market.request_search("orcl").await.unwrap();

        assert_eq!(market.pending_search().await.as_deref(), Some("ORCL"));
        market.clear_search_request().await;
        assert!(market.pending_search().await.is_none());
    }

    #[tokio::test]
    async fn searching_a_listed_symbol_is_rejected() {
        let dir = TempDir::new().unwrap();
        let market = market_in(&dir);
        market.apply_market_quote(quote("AAPL", dec!(150.0))).await;

        let err = market.request_search("aapl").await.unwrap_err();
        assert!(matches!(err, DomainError::AlreadyListed(_)));
        assert!(market.pending_search().await.is_none());
    }

    #[tokio::test]
    async fn refresh_clears_snapshot_watchlist_and_bootstrap_marker() {
        let dir = TempDir::new().unwrap();
        let market = market_in(&dir);

        market.apply_market_quote(quote("AAPL", dec!(150.0))).await;
        market
            .apply_watchlist_quote(quote("TSLA", dec!(200.0)))
            .await;
        market.mark_favorites_loaded().await;

        assert!(!market.take_refresh_request().await);
        market.request_refresh().await;
        assert!(market.take_refresh_request().await);

        let view = market.view().await;
        assert!(view.quotes.is_empty());
        assert!(view.watchlist.is_empty());
        assert!(!view.favorites_loaded);
        // data_ready is a monotonic latch.
        assert!(view.data_ready);

        // Edge-triggered: consumed by the take.
        assert!(!market.take_refresh_request().await);
    }

    #[tokio::test]
    async fn buy_and_sell_follow_the_documented_scenario() {
        let dir = TempDir::new().unwrap();
        let market = market_in(&dir);

        market.apply_market_quote(quote("AAPL", dec!(150.0))).await;
        market.buy("AAPL").await.unwrap();
        assert_eq!(market.view().await.balance, dec!(3850.0));

        market.apply_market_quote(quote("AAPL", dec!(155.0))).await;
        market.buy("AAPL").await.unwrap();

        let view = market.view().await;
        assert_eq!(view.positions[0].quantity, 2);
        assert_eq!(view.positions[0].total_cost, dec!(305.0));
        assert_eq!(view.positions[0].last_purchase_price, dec!(155.0));

        let credited = market.sell("AAPL").await.unwrap();
        assert_eq!(credited, dec!(155.0));
        let view = market.view().await;
        assert_eq!(view.positions[0].quantity, 1);
        assert_eq!(view.positions[0].total_cost, dec!(150.0));
    }

    #[tokio::test]
    async fn buying_an_unlisted_symbol_is_unknown() {
        let dir = TempDir::new().unwrap();
        let market = market_in(&dir);
        let err = market.buy("ZZZZ").await.unwrap_err();
        assert!(matches!(err, DomainError::UnknownSymbol(_)));
    }

    #[tokio::test]
    async fn add_favorite_persists_exactly_one_line() {
        let dir = TempDir::new().unwrap();
        let store = FavoritesFile::new(dir.path().join("favorites.txt"));
        let market = SharedMarket::new(dec!(4000.0), store.clone());

        market.apply_market_quote(quote("AAPL", dec!(150.0))).await;
        market.add_favorite("AAPL").await.unwrap();

        let err = market.add_favorite("AAPL").await.unwrap_err();
        assert!(matches!(err, DomainError::DuplicateFavorite(_)));

        assert_eq!(market.view().await.watchlist.len(), 1);
        assert_eq!(store.load().unwrap(), vec!["AAPL"]);
    }

    #[tokio::test]
    async fn favorite_mutations_survive_a_failed_persist() {
        // A store pointing into a directory that does not exist cannot
        // append or rewrite; the in-memory watchlist must commit anyway.
        let store = FavoritesFile::new("/nonexistent-dir/favorites.txt");
        assert!(store.append("AAPL").is_err());

        let market = SharedMarket::new(dec!(4000.0), store);
        market.apply_market_quote(quote("AAPL", dec!(150.0))).await;
        market.apply_market_quote(quote("TSLA", dec!(200.0))).await;

        market.add_favorite("AAPL").await.unwrap();
        market.add_favorite("TSLA").await.unwrap();
        assert_eq!(market.view().await.watchlist.len(), 2);

        market.remove_favorite("AAPL").await.unwrap();
        let view = market.view().await;
        assert_eq!(view.watchlist.len(), 1);
        assert_eq!(view.watchlist[0].symbol, "TSLA");
    }

    #[tokio::test]
    async fn remove_favorite_rewrites_the_remaining_list() {
        let dir = TempDir::new().unwrap();
        let store = FavoritesFile::new(dir.path().join("favorites.txt"));
        let market = SharedMarket::new(dec!(4000.0), store.clone());

        market.apply_market_quote(quote("AAPL", dec!(150.0))).await;
        market.apply_market_quote(quote("TSLA", dec!(200.0))).await;
        market.add_favorite("AAPL").await.unwrap();
        market.add_favorite("TSLA").await.unwrap();

        market.remove_favorite("AAPL").await.unwrap();
        assert_eq!(store.load().unwrap(), vec!["TSLA"]);

        let err = market.remove_favorite("AAPL").await.unwrap_err();
        assert!(matches!(err, DomainError::NotAFavorite(_)));
    }
}
