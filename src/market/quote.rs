//! Quote value type and the provider wire format it is parsed from.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single point-in-time price record for one ticker symbol.
///
/// Immutable once fetched; the feed replaces whole quotes rather than
/// patching fields. Money fields stay `Decimal` internally and are rounded
/// to two places only at presentation time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quote {
    /// Uppercase ticker symbol, the unique key everywhere in the system.
    pub symbol: String,
    pub name: String,
    pub price: Decimal,
    pub open: Decimal,
    /// Previous session close (the provider calls this `previousClose`).
    pub close: Decimal,
    pub day_high: Decimal,
    pub day_low: Decimal,
    pub year_high: Decimal,
    pub year_low: Decimal,
    /// Absolute change versus the previous close.
    pub change: Decimal,
    pub change_pct: Decimal,
    pub volume: u64,
    pub exchange: String,
}

/// One element of the provider's quote response array.
///
/// The endpoint returns more fields than these (market cap, PE, moving
/// averages); serde ignores the rest.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRow {
    pub symbol: String,
    pub name: String,
    pub price: Decimal,
    pub open: Decimal,
    pub previous_close: Decimal,
    pub day_high: Decimal,
    pub day_low: Decimal,
    pub year_high: Decimal,
    pub year_low: Decimal,
    pub change: Decimal,
    pub changes_percentage: Decimal,
    pub volume: u64,
    pub exchange: String,
}

impl From<QuoteRow> for Quote {
    fn from(row: QuoteRow) -> Self {
        Self {
            symbol: row.symbol.to_uppercase(),
            name: row.name,
            price: row.price,
            open: row.open,
            close: row.previous_close,
            day_high: row.day_high,
            day_low: row.day_low,
            year_high: row.year_high,
            year_low: row.year_low,
            change: row.change,
            change_pct: row.changes_percentage,
            volume: row.volume,
            exchange: row.exchange,
        }
    }
}
