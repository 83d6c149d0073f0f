//! Simulated trading account: cash, positions, and valuation.

pub mod engine;
pub mod types;

pub use engine::Portfolio;
pub use types::{Position, PositionValuation, ValuationReport};
