//! Trade result type.
//!
//! Summarizes the outcome of a single trade execution against one symbol's
//! book: how much was requested, how much actually filled, and the
//! volume-weighted price paid for the filled part.

use rust_decimal::Decimal;
use serde_derive::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Outcome of one `execute_trade` call. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeResult {
    /// Unique identifier for this execution
    pub id: Uuid,
    /// Symbol the trade ran against
    pub symbol: String,
    /// Volume the caller asked for
    pub volume_requested: u64,
    /// Volume actually filled; zero and partial fills are valid outcomes
    pub volume_executed: u64,
    /// Notional divided by executed volume; exactly zero when nothing filled
    pub volume_weighted_average_price: Decimal,
}

impl TradeResult {
    pub fn new(
        id: Uuid,
        symbol: String,
        volume_requested: u64,
        volume_executed: u64,
        volume_weighted_average_price: Decimal,
    ) -> Self {
        Self {
            id,
            symbol,
            volume_requested,
            volume_executed,
            volume_weighted_average_price,
        }
    }
}

impl fmt::Display for TradeResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "id: {}, symbol: {}, requested: {}, executed: {}, vwap: {}",
            self.id,
            self.symbol,
            self.volume_requested,
            self.volume_executed,
            self.volume_weighted_average_price
        )
    }
}
