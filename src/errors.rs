//! User-visible operation failures.
//!
//! Every variant maps to a notice shown by the consumer and expires there;
//! none of these abort anything beyond the single operation that failed.

use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum DomainError {
    #[error("insufficient funds: {symbol} costs ${price:.2}, balance is ${balance:.2}")]
    InsufficientFunds {
        symbol: String,
        price: Decimal,
        balance: Decimal,
    },

    #[error("{0} is already in the favorites list")]
    DuplicateFavorite(String),

    #[error("{0} is not a favorite")]
    NotAFavorite(String),

    #[error("no shares of {0} held")]
    NoPosition(String),

    #[error("{0} is already in the market list")]
    AlreadyListed(String),

    #[error("{0} is not in the market list")]
    UnknownSymbol(String),
}
