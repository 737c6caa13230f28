//! Trade domain: fills recorded against a margin account.

mod convert;
pub mod state;
pub mod wire;

use crate::shared::Side;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

pub use state::TradeHistory;

/// Whether the account provided or took liquidity on a fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LiquidityRole {
    Maker,
    Taker,
}

impl fmt::Display for LiquidityRole {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LiquidityRole::Maker => write!(f, "Maker"),
            LiquidityRole::Taker => write!(f, "Taker"),
        }
    }
}

/// A single fill in an account's trade history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TradeHistoryEntry {
    pub market_name: String,
    pub side: Side,
    pub size: Decimal,
    pub price: Decimal,
    pub liquidity: LiquidityRole,
    pub fee_cost: Decimal,
    /// `None` for fills too recent to have been indexed yet.
    pub timestamp: Option<DateTime<Utc>>,
    pub order_id: String,
}

impl TradeHistoryEntry {
    /// Notional value of the fill in quote units.
    pub fn value(&self) -> Decimal {
        self.size * self.price
    }
}
