//! Wire types for group configuration (ids file) and group reads (REST).

use crate::connection::Cluster;
use crate::shared::PubkeyStr;
use serde::{Deserialize, Serialize};

// ─── Ids file ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupConfigJson {
    pub cluster: Cluster,
    pub name: String,
    pub public_key: PubkeyStr,
    pub quote_symbol: String,
    pub mango_program_id: PubkeyStr,
    #[serde(default)]
    pub tokens: Vec<TokenConfigJson>,
    #[serde(default)]
    pub perp_markets: Vec<MarketConfigJson>,
    #[serde(default)]
    pub spot_markets: Vec<MarketConfigJson>,
}

/// A full ids file listing every known group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdsFileJson {
    pub groups: Vec<GroupConfigJson>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenConfigJson {
    pub symbol: String,
    pub mint_key: PubkeyStr,
    pub decimals: u8,
    pub root_key: PubkeyStr,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketConfigJson {
    pub name: String,
    pub public_key: PubkeyStr,
    pub base_symbol: String,
    pub market_index: usize,
    pub bids_key: PubkeyStr,
    pub asks_key: PubkeyStr,
}

// ─── REST responses ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupTokenResponse {
    pub mint: String,
    pub root_bank: String,
    pub decimals: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupResponse {
    pub public_key: String,
    pub tokens: Vec<GroupTokenResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeBankResponse {
    pub public_key: String,
    pub vault: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RootBankResponse {
    pub public_key: String,
    pub node_banks: Vec<NodeBankResponse>,
    pub deposit_index: String,
    pub borrow_index: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheResponse {
    /// Prices as decimal strings, indexed by market index.
    pub prices: Vec<String>,
    /// Unix millis.
    pub updated_at: i64,
}
