//! Market data: the quote type, the HTTP provider, the shared state the
//! worker and consumer meet on, and the acquisition worker itself.

pub mod provider;
pub mod quote;
pub mod state;
pub mod worker;

pub use provider::{FetchError, FmpProvider, QuoteProvider};
pub use quote::Quote;
pub use state::{MarketView, SharedMarket};
pub use worker::{FeedConfig, QuoteFeed};
