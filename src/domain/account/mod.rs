//! Account domain: margin accounts, perp positions, externally computed health.

mod convert;
pub mod wire;

use crate::shared::PubkeyStr;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Risk figures computed by the remote client library. Consumed, never derived here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountHealth {
    pub equity: Decimal,
    pub leverage: Decimal,
    pub assets_value: Decimal,
    /// Maintenance health ratio, 0–100.
    pub maint_health_ratio: Decimal,
    /// Initial health ratio, 0–100.
    pub init_health_ratio: Decimal,
}

/// Per-market perpetual position record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerpAccount {
    pub market_index: usize,
    pub base_position: i64,
    pub quote_position: Decimal,
    /// Reward tokens accrued and not yet redeemed, in native units.
    pub rewards_accrued: u64,
}

/// A user's position/collateral record within a group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarginAccount {
    pub address: PubkeyStr,
    pub owner: PubkeyStr,
    pub group: PubkeyStr,
    pub perp_accounts: Vec<PerpAccount>,
    pub open_orders_accounts: Vec<PubkeyStr>,
    pub health: Option<AccountHealth>,
}

impl MarginAccount {
    /// Sum of unredeemed rewards over every perp position.
    pub fn accrued_rewards(&self) -> u64 {
        self.perp_accounts
            .iter()
            .fold(0u64, |acc, perp| acc.saturating_add(perp.rewards_accrued))
    }
}

/// Sort accounts by address; equal addresses keep a deterministic order by owner.
pub fn sort_accounts(accounts: &mut [MarginAccount]) {
    accounts.sort_by(|a, b| a.address.cmp(&b.address).then_with(|| a.owner.cmp(&b.owner)));
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn account(address: &str, owner: &str, rewards: &[u64]) -> MarginAccount {
        MarginAccount {
            address: PubkeyStr::new(address),
            owner: PubkeyStr::new(owner),
            group: PubkeyStr::new(crate::domain::group::fixtures::GROUP_KEY),
            perp_accounts: rewards
                .iter()
                .enumerate()
                .map(|(i, r)| PerpAccount {
                    market_index: i,
                    base_position: 0,
                    quote_position: Decimal::ZERO,
                    rewards_accrued: *r,
                })
                .collect(),
            open_orders_accounts: Vec::new(),
            health: None,
        }
    }
}
