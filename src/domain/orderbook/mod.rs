//! Orderbook domain: the selected market's book as ordered price levels.

pub mod state;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub use state::OrderbookSnapshot;

/// One `[price, size]` level.
pub type BookLevel = [Decimal; 2];

/// Order book rendered for display: bids by price descending, asks ascending.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderBook {
    pub bids: Vec<BookLevel>,
    pub asks: Vec<BookLevel>,
}

impl OrderBook {
    pub fn best_bid(&self) -> Option<Decimal> {
        self.bids.first().map(|level| level[0])
    }

    pub fn best_ask(&self) -> Option<Decimal> {
        self.asks.first().map(|level| level[0])
    }

    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }
}
