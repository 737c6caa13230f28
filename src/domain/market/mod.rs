//! Market domain: market configuration and route-token parsing.

use crate::error::InputError;
use crate::shared::{MarketKind, PubkeyStr};
use serde::{Deserialize, Serialize};
use std::fmt;

// ─── MarketConfig ────────────────────────────────────────────────────────────

/// A market listed by the group configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketConfig {
    pub name: String,
    pub public_key: PubkeyStr,
    pub base_symbol: String,
    pub kind: MarketKind,
    /// Index into the group's price cache.
    pub market_index: usize,
    pub bids_key: PubkeyStr,
    pub asks_key: PubkeyStr,
}

// ─── MarketToken ─────────────────────────────────────────────────────────────

/// A market reference taken from a route, e.g. `BTC-PERP` or `BTC/USDC`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketToken {
    pub base_symbol: String,
    pub kind: MarketKind,
}

impl MarketToken {
    /// Split on the first `-` or `/`; the base is upper-cased and the kind is
    /// perpetual when the remainder contains `PERP`.
    pub fn parse(raw: &str) -> Result<Self, InputError> {
        let raw = raw.trim();
        let mut parts = raw.splitn(2, ['-', '/']);
        let base = parts.next().unwrap_or_default().trim();
        let suffix = parts.next().map(str::trim).unwrap_or_default();

        if base.is_empty() || suffix.is_empty() {
            return Err(InputError::MalformedMarket(raw.to_string()));
        }

        Ok(Self {
            base_symbol: base.to_ascii_uppercase(),
            kind: MarketKind::from_token_suffix(suffix),
        })
    }
}

impl fmt::Display for MarketToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            MarketKind::Perpetual => write!(f, "{}-PERP", self.base_symbol),
            MarketKind::Spot => write!(f, "{}/spot", self.base_symbol),
        }
    }
}
