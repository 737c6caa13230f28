//! Shared newtypes and utilities used across all domain modules.
//!
//! These types are serialization-transparent: they serialize/deserialize identically
//! to the raw format the remote sends, so they can be used directly in wire types
//! without conversion overhead.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::{InputError, RemoteError};

// ─── PubkeyStr ───────────────────────────────────────────────────────────────

/// A ledger address stored as a base58 string.
///
/// Ordering is lexicographic on the base58 text, which is what account lists
/// are sorted by. Use [`PubkeyStr::parse`] for untrusted input.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PubkeyStr(String);

impl PubkeyStr {
    pub fn new(s: &str) -> Self {
        Self(s.to_string())
    }

    /// Validate `s` as a well-formed 32-byte base58 address.
    pub fn parse(s: &str) -> Result<Self, InputError> {
        let trimmed = s.trim();
        solana_pubkey::Pubkey::from_str(trimmed)
            .map(Self::from_pubkey)
            .map_err(|_| InputError::InvalidAddress(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn to_pubkey(&self) -> Result<solana_pubkey::Pubkey, String> {
        solana_pubkey::Pubkey::from_str(&self.0).map_err(|e| e.to_string())
    }

    pub fn from_pubkey(pk: solana_pubkey::Pubkey) -> Self {
        Self(pk.to_string())
    }

    /// First `n` characters, for compact display.
    pub fn short(&self, n: usize) -> &str {
        let end = self
            .0
            .char_indices()
            .nth(n)
            .map(|(i, _)| i)
            .unwrap_or(self.0.len());
        &self.0[..end]
    }
}

impl Default for PubkeyStr {
    fn default() -> Self {
        Self(solana_pubkey::Pubkey::default().to_string())
    }
}

impl fmt::Display for PubkeyStr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for PubkeyStr {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for PubkeyStr {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<solana_pubkey::Pubkey> for PubkeyStr {
    fn from(pk: solana_pubkey::Pubkey) -> Self {
        Self(pk.to_string())
    }
}

impl Serialize for PubkeyStr {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for PubkeyStr {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(PubkeyStr(s))
    }
}

// ─── Side ────────────────────────────────────────────────────────────────────

/// Trade side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    #[default]
    Buy,
    Sell,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "Buy"),
            Side::Sell => write!(f, "Sell"),
        }
    }
}

// ─── MarketKind ──────────────────────────────────────────────────────────────

/// Spot order book market or perpetual futures market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MarketKind {
    #[default]
    Spot,
    #[serde(alias = "perp")]
    Perpetual,
}

impl MarketKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MarketKind::Spot => "spot",
            MarketKind::Perpetual => "perp",
        }
    }

    /// Classify the kind segment of a market token (`PERP` suffix ⇒ perpetual).
    pub fn from_token_suffix(suffix: &str) -> Self {
        if suffix.to_ascii_uppercase().contains("PERP") {
            MarketKind::Perpetual
        } else {
            MarketKind::Spot
        }
    }
}

impl fmt::Display for MarketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Utilities ───────────────────────────────────────────────────────────────

/// Parse a decimal string from a remote payload.
pub fn parse_decimal(field: &str, raw: &str) -> Result<Decimal, RemoteError> {
    Decimal::from_str(raw.trim())
        .map_err(|e| RemoteError::Decode(format!("{}: {} ({})", field, raw, e)))
}

/// Convert a raw integer token amount into UI units.
pub fn native_to_ui(raw: u64, decimals: u8) -> Decimal {
    let mut value = Decimal::from(raw);
    // Decimal supports up to 28 fractional digits.
    if value.set_scale(u32::from(decimals).min(28)).is_err() {
        return Decimal::ZERO;
    }
    value.normalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADDR: &str = "7BgBvyjrZX1YKz4oh9mjb8ZScatkkwb8DzFx7LoiVkM3";

    #[test]
    fn test_pubkey_str_serde() {
        let pk = PubkeyStr::new(ADDR);
        let json = serde_json::to_string(&pk).unwrap();
        assert_eq!(json, format!("\"{}\"", ADDR));
    }

    #[test]
    fn test_pubkey_parse_rejects_garbage() {
        assert!(PubkeyStr::parse(ADDR).is_ok());
        assert_eq!(
            PubkeyStr::parse("not-an-address"),
            Err(InputError::InvalidAddress("not-an-address".into()))
        );
        assert!(PubkeyStr::parse("").is_err());
        // Valid base58 but wrong length.
        assert!(PubkeyStr::parse("abc").is_err());
    }

    #[test]
    fn test_pubkey_ordering_is_lexicographic() {
        let a = PubkeyStr::new("AAA");
        let b = PubkeyStr::new("BBB");
        assert!(a < b);
    }

    #[test]
    fn test_short() {
        assert_eq!(PubkeyStr::new(ADDR).short(6), "7BgBvy");
        assert_eq!(PubkeyStr::new("abc").short(6), "abc");
    }

    #[test]
    fn test_side_serde() {
        let buy: Side = serde_json::from_str("\"buy\"").unwrap();
        assert_eq!(buy, Side::Buy);
        let sell: Side = serde_json::from_str("\"sell\"").unwrap();
        assert_eq!(sell, Side::Sell);
    }

    #[test]
    fn test_market_kind_from_suffix() {
        assert_eq!(MarketKind::from_token_suffix("PERP"), MarketKind::Perpetual);
        assert_eq!(MarketKind::from_token_suffix("perp"), MarketKind::Perpetual);
        assert_eq!(MarketKind::from_token_suffix("USDC"), MarketKind::Spot);
        let kind: MarketKind = serde_json::from_str("\"perp\"").unwrap();
        assert_eq!(kind, MarketKind::Perpetual);
    }

    #[test]
    fn test_parse_decimal() {
        assert_eq!(parse_decimal("price", " 1.25 ").unwrap(), Decimal::new(125, 2));
        assert!(matches!(
            parse_decimal("price", "abc"),
            Err(RemoteError::Decode(_))
        ));
    }

    #[test]
    fn test_native_to_ui() {
        assert_eq!(native_to_ui(1_500_000, 6), Decimal::new(15, 1));
        assert_eq!(native_to_ui(42, 0), Decimal::from(42));
        assert_eq!(native_to_ui(0, 9), Decimal::ZERO);
    }
}
