//! Position and valuation types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A held quantity of one symbol plus its cost-basis bookkeeping.
///
/// Invariant: `quantity >= 1`. A position whose last share is sold is
/// removed from the portfolio, never kept at zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    pub quantity: u32,
    /// Price paid on the most recent buy of this symbol.
    pub last_purchase_price: Decimal,
    /// Cumulative cost basis. Updated by +/- `last_purchase_price` on buys
    /// and sells, NOT a weighted average (see Sell in the engine).
    pub total_cost: Decimal,
    /// Latest feed price for the symbol (mark-to-market); does not affect
    /// the cost basis.
    pub market_price: Decimal,
}

impl Position {
    /// Current value of the held shares at the marked price.
    pub fn current_value(&self) -> Decimal {
        self.market_price * Decimal::from(self.quantity)
    }

    pub fn gain_loss(&self) -> Decimal {
        self.current_value() - self.total_cost
    }

    /// Gain/loss relative to cost basis, as a percentage. `None` when the
    /// cost basis is zero.
    pub fn gain_loss_pct(&self) -> Option<Decimal> {
        if self.total_cost.is_zero() {
            None
        } else {
            Some(self.gain_loss() / self.total_cost * Decimal::from(100))
        }
    }
}

/// One valued position line inside a [`ValuationReport`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionValuation {
    pub symbol: String,
    pub quantity: u32,
    pub market_price: Decimal,
    pub total_cost: Decimal,
    pub current_value: Decimal,
    pub gain_loss: Decimal,
    pub gain_loss_pct: Option<Decimal>,
}

/// Portfolio-wide valuation: every open position marked at its latest feed
/// price, plus aggregate totals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValuationReport {
    pub lines: Vec<PositionValuation>,
    pub cash: Decimal,
    pub total_invested: Decimal,
    pub total_value: Decimal,
    pub total_gain_loss: Decimal,
    /// `None` when nothing is invested.
    pub total_gain_loss_pct: Option<Decimal>,
}
