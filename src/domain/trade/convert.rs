//! Conversions from wire types to domain types for trade history.

use super::wire::TradeHistoryResponse;
use super::{LiquidityRole, TradeHistoryEntry};
use crate::error::RemoteError;
use crate::shared::parse_decimal;
use chrono::TimeZone;

impl TryFrom<TradeHistoryResponse> for TradeHistoryEntry {
    type Error = RemoteError;

    fn try_from(t: TradeHistoryResponse) -> Result<Self, Self::Error> {
        let liquidity = match t.liquidity.to_ascii_lowercase().as_str() {
            "maker" => LiquidityRole::Maker,
            "taker" => LiquidityRole::Taker,
            other => return Err(RemoteError::Decode(format!("liquidity: {}", other))),
        };
        let timestamp = match t.load_timestamp {
            Some(ms) => Some(
                chrono::Utc
                    .timestamp_millis_opt(ms)
                    .single()
                    .ok_or_else(|| RemoteError::Decode(format!("load_timestamp: {}", ms)))?,
            ),
            None => None,
        };

        Ok(Self {
            market_name: t.market_name,
            side: t.side,
            size: parse_decimal("size", &t.size)?,
            price: parse_decimal("price", &t.price)?,
            liquidity,
            fee_cost: parse_decimal("fee_cost", &t.fee_cost)?,
            timestamp,
            order_id: t.order_id,
        })
    }
}
