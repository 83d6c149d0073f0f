//! Cash and position bookkeeping for simulated trading.
//!
//! Pure in-memory logic, no I/O and no locking; the shared-state layer
//! calls into this under its own lock. The cost-basis arithmetic mirrors
//! the one documented on [`Position`]: buys add the paid price, sells
//! subtract the last purchase price. It is deliberately not a weighted
//! average.

use rust_decimal::Decimal;

use crate::errors::DomainError;
use crate::market::Quote;

use super::types::{Position, PositionValuation, ValuationReport};

/// Simulated trading account: a cash balance plus open positions.
///
/// The balance is non-negative by construction; every buy is gated on
/// `price <= cash`.
#[derive(Debug, Clone)]
pub struct Portfolio {
    cash: Decimal,
    positions: Vec<Position>,
}

impl Portfolio {
    pub fn new(starting_cash: Decimal) -> Self {
        Self {
            cash: starting_cash,
            positions: Vec::new(),
        }
    }

    pub fn cash(&self) -> Decimal {
        self.cash
    }

    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    pub fn position(&self, symbol: &str) -> Option<&Position> {
        self.positions.iter().find(|p| p.symbol == symbol)
    }

    /// Buy one share at the quote's current price.
    pub fn buy(&mut self, quote: &Quote) -> Result<(), DomainError> {
        let price = quote.price;
        if price > self.cash {
            return Err(DomainError::InsufficientFunds {
                symbol: quote.symbol.clone(),
                price,
                balance: self.cash,
            });
        }

        self.cash -= price;
        match self.positions.iter_mut().find(|p| p.symbol == quote.symbol) {
            Some(pos) => {
                pos.quantity += 1;
                pos.last_purchase_price = price;
                pos.total_cost += price;
            }
            None => self.positions.push(Position {
                symbol: quote.symbol.clone(),
                quantity: 1,
                last_purchase_price: price,
                total_cost: price,
                market_price: price,
            }),
        }
        Ok(())
    }

    /// Sell one share, crediting the current marked price (not the price
    /// originally paid). Returns the credited amount. Selling the last
    /// share removes the position entirely.
    pub fn sell(&mut self, symbol: &str) -> Result<Decimal, DomainError> {
        let idx = self
            .positions
            .iter()
            .position(|p| p.symbol == symbol)
            .ok_or_else(|| DomainError::NoPosition(symbol.to_string()))?;

        let credited = self.positions[idx].market_price;
        self.cash += credited;

        if self.positions[idx].quantity > 1 {
            let pos = &mut self.positions[idx];
            pos.quantity -= 1;
            pos.total_cost -= pos.last_purchase_price;
        } else {
            self.positions.remove(idx);
        }
        Ok(credited)
    }

    /// Propagate a freshly fetched price into the matching position, if
    /// any. Leaves the cost basis untouched.
    pub fn mark_to_market(&mut self, symbol: &str, price: Decimal) {
        if let Some(pos) = self.positions.iter_mut().find(|p| p.symbol == symbol) {
            pos.market_price = price;
        }
    }

    /// Value every open position at its latest marked price.
    pub fn valuation(&self) -> ValuationReport {
        let lines: Vec<PositionValuation> = self
            .positions
            .iter()
            .map(|pos| PositionValuation {
                symbol: pos.symbol.clone(),
                quantity: pos.quantity,
                market_price: pos.market_price,
                total_cost: pos.total_cost,
                current_value: pos.current_value(),
                gain_loss: pos.gain_loss(),
                gain_loss_pct: pos.gain_loss_pct(),
            })
            .collect();

        let total_invested: Decimal = lines.iter().map(|l| l.total_cost).sum();
        let total_value: Decimal = lines.iter().map(|l| l.current_value).sum();
        let total_gain_loss = total_value - total_invested;
        let total_gain_loss_pct = if total_invested.is_zero() {
            None
        } else {
            Some(total_gain_loss / total_invested * Decimal::from(100))
        };

        ValuationReport {
            lines,
            cash: self.cash,
            total_invested,
            total_value,
            total_gain_loss,
            total_gain_loss_pct,
        }
    }
}
