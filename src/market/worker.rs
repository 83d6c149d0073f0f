//! Background quote acquisition: bootstrap, universe fetch, poll loop.
//!
//! The feed runs as one spawned task for the whole process. Fetches
//! happen outside the shared lock; each result is applied to the shared
//! state in its own lock scope. A failed symbol is logged and skipped,
//! never retried within the same tick.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::watchlist::FavoritesFile;

use super::provider::{FetchError, QuoteProvider};
use super::{Quote, SharedMarket};

#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// Symbols fetched into the market snapshot each cycle. Successful
    /// and failed searches both extend this set.
    pub universe: Vec<String>,
    /// Steady-state poll interval.
    pub poll_interval: Duration,
}

/// The acquisition worker handle. `start()` spawns the loop, `stop()`
/// signals it and waits for it to finish.
pub struct QuoteFeed {
    core: Arc<FeedCore>,
    poll_interval: Duration,
    shutdown_tx: Option<watch::Sender<bool>>,
    task: Option<JoinHandle<()>>,
}

struct FeedCore {
    state: SharedMarket,
    provider: Arc<dyn QuoteProvider>,
    store: FavoritesFile,
    universe: Mutex<Vec<String>>,
}

impl QuoteFeed {
    pub fn new(
        config: FeedConfig,
        state: SharedMarket,
        provider: Arc<dyn QuoteProvider>,
        store: FavoritesFile,
    ) -> Self {
        Self {
            core: Arc::new(FeedCore {
                state,
                provider,
                store,
                universe: Mutex::new(config.universe),
            }),
            poll_interval: config.poll_interval,
            shutdown_tx: None,
            task: None,
        }
    }

    /// Spawn the feed loop. The loop runs bootstrap and a full universe
    /// fetch once, then polls until `stop()` is called.
    pub fn start(&mut self) {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let core = Arc::clone(&self.core);
        let poll_interval = self.poll_interval;

        let task = tokio::spawn(async move {
            info!(provider = core.provider.name(), "quote feed starting");
            core.bootstrap().await;
            core.universe_fetch().await;

            let mut ticker = tokio::time::interval(poll_interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        core.poll_tick().await;
                    }
                    _ = shutdown_rx.changed() => {
                        break;
                    }
                }
            }
            info!("quote feed stopped");
        });

        self.shutdown_tx = Some(shutdown_tx);
        self.task = Some(task);
    }

    /// Signal the loop to stop and wait for it to finish. An in-flight
    /// fetch completes; its result is still applied.
    pub async fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(true);
        }
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }

    /// Symbols currently in the tracked universe.
    pub async fn universe(&self) -> Vec<String> {
        self.core.universe.lock().await.clone()
    }

    // Phase entry points, usable directly (tests drive these without the
    // spawned loop).

    pub async fn bootstrap(&self) {
        self.core.bootstrap().await;
    }

    pub async fn universe_fetch(&self) {
        self.core.universe_fetch().await;
    }

    pub async fn poll_tick(&self) {
        self.core.poll_tick().await;
    }
}

impl Drop for QuoteFeed {
    fn drop(&mut self) {
        if self.task.is_some() {
            warn!("QuoteFeed dropped without calling stop()");
        }
    }
}

impl FeedCore {
    /// Fetch one symbol, logging and swallowing failures.
    async fn fetch(&self, symbol: &str) -> Option<Quote> {
        match self.provider.fetch_quote(symbol).await {
            Ok(quote) => Some(quote),
            Err(FetchError::Status { status, body }) => {
                warn!(%symbol, %status, body, "quote fetch rejected, skipping symbol");
                None
            }
            Err(e) => {
                warn!(%symbol, error = %e, "quote fetch failed, skipping symbol");
                None
            }
        }
    }

    /// Load the persisted favorites and fetch a cached quote for each.
    /// Bootstrap entries go to the watchlist only, never the snapshot.
    async fn bootstrap(&self) {
        let symbols = match self.store.load() {
            Ok(symbols) => symbols,
            Err(e) => {
                warn!(error = %e, "cannot read favorites, starting with an empty watchlist");
                Vec::new()
            }
        };

        info!(count = symbols.len(), "bootstrapping watchlist");
        for symbol in &symbols {
            if let Some(quote) = self.fetch(symbol).await {
                self.state.apply_watchlist_quote(quote).await;
            }
        }
        self.state.mark_favorites_loaded().await;
    }

    /// Fetch every universe symbol into the market snapshot.
    async fn universe_fetch(&self) {
        let universe = self.universe.lock().await.clone();
        for symbol in &universe {
            if let Some(quote) = self.fetch(symbol).await {
                self.state.apply_market_quote(quote).await;
            }
        }
    }

    /// One steady-state tick: service a pending search, then a pending
    /// refresh.
    async fn poll_tick(&self) {
        if let Some(symbol) = self.state.pending_search().await {
            if let Some(quote) = self.fetch(&symbol).await {
                self.state.apply_market_quote(quote).await;
            }
            // The symbol joins the universe even when this first fetch
            // failed; the next refresh cycle retries it.
            let mut universe = self.universe.lock().await;
            if !universe.contains(&symbol) {
                universe.push(symbol.clone());
            }
            drop(universe);
            self.state.clear_search_request().await;
        }

        if self.state.take_refresh_request().await {
            info!("refresh requested, rebuilding snapshot and watchlist");
            self.bootstrap().await;
            self.universe_fetch().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::market::provider::FmpProvider;

    fn quote_body(symbol: &str, price: f64) -> serde_json::Value {
        serde_json::json!([{
            "symbol": symbol,
            "name": format!("{symbol} Corp"),
            "price": price,
            "open": price,
            "previousClose": price,
            "dayHigh": price,
            "dayLow": price,
            "yearHigh": price,
            "yearLow": price,
            "change": 0.0,
            "changesPercentage": 0.0,
            "volume": 1000,
            "exchange": "NASDAQ"
        }])
    }

    async fn mount_quote(server: &MockServer, symbol: &str, price: f64) {
        Mock::given(method("GET"))
            .and(path(format!("/api/v3/quote/{symbol}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(quote_body(symbol, price)))
            .mount(server)
            .await;
    }

    struct Fixture {
        _dir: TempDir,
        store: FavoritesFile,
        market: SharedMarket,
    }

    fn fixture() -> Fixture {
        let dir = TempDir::new().unwrap();
        let store = FavoritesFile::new(dir.path().join("favorites.txt"));
        let market = SharedMarket::new(dec!(4000.0), store.clone());
        Fixture {
            _dir: dir,
            store,
            market,
        }
    }

    fn feed(
        server: &MockServer,
        fx: &Fixture,
        universe: &[&str],
    ) -> QuoteFeed {
        let provider: Arc<dyn QuoteProvider> =
            Arc::new(FmpProvider::new(server.uri(), "test-key").unwrap());
        QuoteFeed::new(
            FeedConfig {
                universe: universe.iter().map(|s| s.to_string()).collect(),
                poll_interval: Duration::from_millis(800),
            },
            fx.market.clone(),
            provider,
            fx.store.clone(),
        )
    }

    #[tokio::test]
    async fn bootstrap_fills_the_watchlist_not_the_snapshot() {
        let server = MockServer::start().await;
        mount_quote(&server, "AAPL", 150.0).await;
        mount_quote(&server, "TSLA", 200.0).await;

        let fx = fixture();
        fx.store.append("AAPL").unwrap();
        fx.store.append("TSLA").unwrap();

        let feed = feed(&server, &fx, &[]);
        feed.bootstrap().await;

        let view = fx.market.view().await;
        assert_eq!(view.watchlist.len(), 2);
        assert!(view.quotes.is_empty());
        assert!(view.favorites_loaded);
        assert!(!view.data_ready);
    }

    #[tokio::test]
    async fn universe_fetch_skips_failing_symbols() {
        let server = MockServer::start().await;
        mount_quote(&server, "AAPL", 150.0).await;
        Mock::given(method("GET"))
            .and(path("/api/v3/quote/BAD"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;
        // MSFT: empty array response, also skipped.
        Mock::given(method("GET"))
            .and(path("/api/v3/quote/MSFT"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .mount(&server)
            .await;

        let fx = fixture();
        let feed = feed(&server, &fx, &["AAPL", "BAD", "MSFT"]);
        feed.universe_fetch().await;

        let view = fx.market.view().await;
        assert_eq!(view.quotes.len(), 1);
        assert_eq!(view.quotes[0].symbol, "AAPL");
        assert!(view.data_ready);
    }

    #[tokio::test]
    async fn favorite_symbols_reuse_the_cached_watchlist_quote() {
        let server = MockServer::start().await;
        mount_quote(&server, "AAPL", 150.0).await;

        let fx = fixture();
        fx.store.append("AAPL").unwrap();

        let feed = feed(&server, &fx, &["AAPL"]);
        feed.bootstrap().await;

        // The price moves between bootstrap and the universe pass.
        server.reset().await;
        mount_quote(&server, "AAPL", 175.0).await;
        feed.universe_fetch().await;

        let view = fx.market.view().await;
        assert_eq!(view.quotes.len(), 1);
        // Snapshot shows the cached bootstrap quote, no duplicate entry.
        assert_eq!(view.quotes[0].price, dec!(150.0));
        assert_eq!(view.watchlist.len(), 1);
    }

    #[tokio::test]
    async fn search_tick_appends_to_universe_and_clears_the_flag() {
        let server = MockServer::start().await;
        mount_quote(&server, "IBM", 140.0).await;

        let fx = fixture();
        let feed = feed(&server, &fx, &["IBM"]);

        fx.market.request_search("ibm").await.unwrap();
        feed.poll_tick().await;

        let view = fx.market.view().await;
        assert_eq!(view.quotes.len(), 1);
        assert_eq!(view.quotes[0].symbol, "IBM");
        assert!(fx.market.pending_search().await.is_none());
        // Already tracked, not appended twice.
        assert_eq!(feed.universe().await, vec!["IBM"]);
    }

    #[tokio::test]
    async fn failed_search_still_extends_the_universe() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v3/quote/ZZZZ"))
            .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
            .mount(&server)
            .await;

        let fx = fixture();
        let feed = feed(&server, &fx, &[]);

        fx.market.request_search("zzzz").await.unwrap();
        feed.poll_tick().await;

        assert!(fx.market.view().await.quotes.is_empty());
        assert!(fx.market.pending_search().await.is_none());
        assert_eq!(feed.universe().await, vec!["ZZZZ"]);
    }

    #[tokio::test]
    async fn refresh_tick_rebuilds_both_tables() {
        let server = MockServer::start().await;
        mount_quote(&server, "AAPL", 150.0).await;
        mount_quote(&server, "TSLA", 200.0).await;

        let fx = fixture();
        fx.store.append("TSLA").unwrap();

        let feed = feed(&server, &fx, &["AAPL"]);
        feed.bootstrap().await;
        feed.universe_fetch().await;

        // Drop the favorite from storage, then refresh: the rebuilt
        // watchlist must not resurrect it.
        fx.store.rewrite(&[]).unwrap();
        fx.market.request_refresh().await;
        feed.poll_tick().await;

        let view = fx.market.view().await;
        assert_eq!(view.quotes.len(), 1);
        assert_eq!(view.quotes[0].symbol, "AAPL");
        assert!(view.watchlist.is_empty());
        assert!(view.favorites_loaded);
    }

    #[tokio::test]
    async fn refresh_marks_positions_to_the_new_price() {
        let server = MockServer::start().await;
        mount_quote(&server, "AAPL", 150.0).await;

        let fx = fixture();
        let feed = feed(&server, &fx, &["AAPL"]);
        feed.universe_fetch().await;
        fx.market.buy("AAPL").await.unwrap();

        server.reset().await;
        mount_quote(&server, "AAPL", 90.0).await;
        fx.market.request_refresh().await;
        feed.poll_tick().await;

        let view = fx.market.view().await;
        assert_eq!(view.positions[0].market_price, dec!(90.0));
        // Cost basis is untouched by the feed.
        assert_eq!(view.positions[0].total_cost, dec!(150.0));
    }

    #[tokio::test]
    async fn start_and_stop_are_cooperative() {
        let server = MockServer::start().await;
        mount_quote(&server, "AAPL", 150.0).await;

        let fx = fixture();
        let mut feed = feed(&server, &fx, &["AAPL"]);
        feed.start();

        // The spawned loop runs bootstrap + universe fetch before the
        // first tick; wait for the snapshot to appear.
        for _ in 0..50 {
            if fx.market.view().await.data_ready {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(fx.market.view().await.data_ready);

        feed.stop().await;
    }

    #[tokio::test]
    async fn fetched_quote_symbol_matches_the_request() {
        let server = MockServer::start().await;
        mount_quote(&server, "NVDA", 480.0).await;

        let fx = fixture();
        let feed = feed(&server, &fx, &["NVDA"]);
        feed.universe_fetch().await;

        let view = fx.market.view().await;
        assert_eq!(view.quotes[0].symbol, "NVDA");
        assert_eq!(view.quotes[0].price, Decimal::from(480));
    }
}
