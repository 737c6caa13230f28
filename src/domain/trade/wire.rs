//! Wire types for trade history responses (REST).

use crate::shared::Side;
use serde::{Deserialize, Serialize};

/// REST response for a single fill.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TradeHistoryResponse {
    pub market_name: String,
    pub side: Side,
    pub size: String,
    pub price: String,
    /// `"maker"` or `"taker"`.
    pub liquidity: String,
    pub fee_cost: String,
    /// Unix millis; missing while the fill is being indexed.
    #[serde(default)]
    pub load_timestamp: Option<i64>,
    pub order_id: String,
}

/// REST response for an account's trade history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeHistoryListResponse {
    pub trades: Vec<TradeHistoryResponse>,
}
