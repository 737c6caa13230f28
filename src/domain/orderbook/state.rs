//! Orderbook state container: merges side snapshots from the push channel.

use super::{BookLevel, OrderBook};
use crate::shared::Side;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

/// Live book for one market that can apply per-side snapshots.
///
/// Each side of the book lives in its own ledger account, so updates arrive
/// one side at a time. A side snapshot replaces that side wholesale.
#[derive(Debug, Clone, Default)]
pub struct OrderbookSnapshot {
    pub market: String,
    bids: BTreeMap<Decimal, Decimal>,
    asks: BTreeMap<Decimal, Decimal>,
}

impl OrderbookSnapshot {
    pub fn new(market: impl Into<String>) -> Self {
        Self {
            market: market.into(),
            bids: BTreeMap::new(),
            asks: BTreeMap::new(),
        }
    }

    /// Replace one side. Zero-size levels are dropped; duplicate prices sum.
    pub fn apply_side(&mut self, side: Side, levels: &[(Decimal, Decimal)]) {
        let book = match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        };
        book.clear();
        for (price, size) in levels {
            if size.is_zero() {
                continue;
            }
            *book.entry(*price).or_insert(Decimal::ZERO) += *size;
        }
    }

    pub fn best_bid(&self) -> Option<Decimal> {
        self.bids.keys().next_back().copied()
    }

    pub fn best_ask(&self) -> Option<Decimal> {
        self.asks.keys().next().copied()
    }

    /// Mid price (average of best bid and best ask).
    pub fn mid_price(&self) -> Option<Decimal> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some((bid + ask) / Decimal::from(2)),
            _ => None,
        }
    }

    pub fn spread(&self) -> Option<Decimal> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some(ask - bid),
            _ => None,
        }
    }

    /// Top `depth` levels per side in display order.
    pub fn to_book(&self, depth: usize) -> OrderBook {
        let bids: Vec<BookLevel> = self
            .bids
            .iter()
            .rev()
            .take(depth)
            .map(|(p, s)| [*p, *s])
            .collect();
        let asks: Vec<BookLevel> = self
            .asks
            .iter()
            .take(depth)
            .map(|(p, s)| [*p, *s])
            .collect();
        OrderBook { bids, asks }
    }

    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }

    pub fn clear(&mut self) {
        self.bids.clear();
        self.asks.clear();
    }
}
