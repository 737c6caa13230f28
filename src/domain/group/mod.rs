//! Group domain: group configuration, on-chain group record, root banks, cache.

mod convert;
pub mod wire;

use crate::connection::Cluster;
use crate::domain::market::MarketConfig;
use crate::error::SyncError;
use crate::network::DEFAULT_GROUP_NAME;
use crate::shared::{MarketKind, PubkeyStr};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ─── Configuration ───────────────────────────────────────────────────────────

/// A token known to the group configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenConfig {
    pub symbol: String,
    pub mint_key: PubkeyStr,
    pub decimals: u8,
    pub root_key: PubkeyStr,
}

/// Static configuration of a group: its tokens and the markets it lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupConfig {
    pub cluster: Cluster,
    pub name: String,
    pub public_key: PubkeyStr,
    pub quote_symbol: String,
    pub program_id: PubkeyStr,
    pub tokens: Vec<TokenConfig>,
    pub markets: Vec<MarketConfig>,
}

impl GroupConfig {
    /// Parse the ids-file representation of a group.
    pub fn from_json(json: &str) -> Result<Self, SyncError> {
        let raw: wire::GroupConfigJson = serde_json::from_str(json)?;
        Ok(raw.into())
    }

    /// Pick one group out of a full ids file by cluster and name. `name`
    /// defaults to [`DEFAULT_GROUP_NAME`].
    pub fn from_ids_file(json: &str, cluster: Cluster, name: Option<&str>) -> Result<Self, SyncError> {
        let name = name.unwrap_or(DEFAULT_GROUP_NAME);
        let ids: wire::IdsFileJson = serde_json::from_str(json)?;
        ids.groups
            .into_iter()
            .find(|g| g.cluster == cluster && g.name == name)
            .map(Self::from)
            .ok_or_else(|| SyncError::Other(format!("no group {} on {}", name, cluster)))
    }

    /// Market whose base symbol and kind both match (symbol is case-insensitive).
    pub fn market_by_base_symbol_and_kind(
        &self,
        base_symbol: &str,
        kind: MarketKind,
    ) -> Option<&MarketConfig> {
        self.markets
            .iter()
            .find(|m| m.kind == kind && m.base_symbol.eq_ignore_ascii_case(base_symbol))
    }

    pub fn market_by_name(&self, name: &str) -> Option<&MarketConfig> {
        self.markets.iter().find(|m| m.name == name)
    }

    /// Price-cache index for a base symbol.
    pub fn market_index_by_symbol(&self, base_symbol: &str) -> Option<usize> {
        self.markets
            .iter()
            .find(|m| m.base_symbol.eq_ignore_ascii_case(base_symbol))
            .map(|m| m.market_index)
    }

    pub fn token_by_mint(&self, mint: &PubkeyStr) -> Option<&TokenConfig> {
        self.tokens.iter().find(|t| &t.mint_key == mint)
    }

    /// Position of the reward token in the group's token list.
    pub fn reward_token_index(&self, symbol: &str) -> Option<usize> {
        self.tokens
            .iter()
            .position(|t| t.symbol.eq_ignore_ascii_case(symbol))
    }
}

// ─── On-chain records ────────────────────────────────────────────────────────

/// One token slot of the loaded group record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupToken {
    pub mint: PubkeyStr,
    pub root_bank: PubkeyStr,
    pub decimals: u8,
}

/// The loaded group record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub public_key: PubkeyStr,
    pub tokens: Vec<GroupToken>,
}

/// A node bank under a root bank; holds the vault the rewards are paid from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeBank {
    pub public_key: PubkeyStr,
    pub vault: PubkeyStr,
}

/// Rate/bank record for one token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RootBank {
    pub public_key: PubkeyStr,
    pub node_banks: Vec<NodeBank>,
    pub deposit_index: Decimal,
    pub borrow_index: Decimal,
}

/// Price/index snapshot indexed by market index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cache {
    pub prices: Vec<Decimal>,
    pub updated_at: DateTime<Utc>,
}

impl Cache {
    pub fn price(&self, market_index: usize) -> Option<Decimal> {
        self.prices.get(market_index).copied()
    }
}

/// The three group records that are only ever published together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadedGroup {
    pub group: Group,
    pub cache: Cache,
    pub root_banks: Vec<RootBank>,
}

/// Bank references needed to redeem accrued rewards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedeemBanks {
    pub root_bank: PubkeyStr,
    pub node_bank: PubkeyStr,
    pub vault: PubkeyStr,
}

impl LoadedGroup {
    /// Banks for the token at `token_index`: its root bank and first node bank.
    pub fn redeem_banks(&self, token_index: usize) -> Option<RedeemBanks> {
        let token = self.group.tokens.get(token_index)?;
        let root = self
            .root_banks
            .iter()
            .find(|rb| rb.public_key == token.root_bank)?;
        let node = root.node_banks.first()?;
        Some(RedeemBanks {
            root_bank: root.public_key.clone(),
            node_bank: node.public_key.clone(),
            vault: node.vault.clone(),
        })
    }
}
