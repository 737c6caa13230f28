//! Wire types for open order responses (REST).

use crate::shared::Side;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OpenOrderResponse {
    pub order_id: String,
    pub market_name: String,
    pub market: String,
    pub side: Side,
    pub price: String,
    pub size: String,
    #[serde(default)]
    pub client_id: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenOrdersResponse {
    pub orders: Vec<OpenOrderResponse>,
}
