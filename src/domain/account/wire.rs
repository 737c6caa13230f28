//! Wire types for margin account reads (REST).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub equity: String,
    pub leverage: String,
    pub assets_value: String,
    pub maint_health_ratio: String,
    pub init_health_ratio: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerpAccountResponse {
    pub market_index: usize,
    pub base_position: i64,
    pub quote_position: String,
    pub mngo_accrued: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarginAccountResponse {
    pub public_key: String,
    pub owner: String,
    pub group: String,
    #[serde(default)]
    pub perp_accounts: Vec<PerpAccountResponse>,
    #[serde(default)]
    pub open_orders: Vec<String>,
    #[serde(default)]
    pub health: Option<HealthResponse>,
}

/// Body of a reward redemption submission.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RedeemRewardsRequest {
    pub group: String,
    pub owner: String,
    pub root_bank: String,
    pub node_bank: String,
    pub vault: String,
    /// Signed message, base64.
    pub message: String,
    /// Signature over `message`, base58.
    pub signature: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedeemRewardsResponse {
    pub txid: String,
}

/// Error body of a rejected redemption. `txid` is set when the transaction
/// was sent but failed to confirm.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedeemRewardsFailure {
    pub message: String,
    #[serde(default)]
    pub txid: Option<String>,
}
