//! Conversions: REST wire types → open order domain types.

use super::wire::OpenOrderResponse;
use super::OpenOrder;
use crate::error::RemoteError;
use crate::shared::{parse_decimal, PubkeyStr};

impl TryFrom<OpenOrderResponse> for OpenOrder {
    type Error = RemoteError;

    fn try_from(o: OpenOrderResponse) -> Result<Self, Self::Error> {
        Ok(Self {
            order_id: o.order_id,
            market_name: o.market_name,
            market: PubkeyStr::from(o.market),
            side: o.side,
            price: parse_decimal("price", &o.price)?,
            size: parse_decimal("size", &o.size)?,
            client_id: o.client_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::wire::OpenOrdersResponse;
    use crate::shared::Side;
    use rust_decimal::Decimal;

    #[test]
    fn test_open_orders_from_json() {
        let json = r#"{"orders": [
            {"order_id": "7", "market_name": "BTC-PERP", "market": "mkt", "side": "buy", "price": "49000.5", "size": "0.01", "client_id": 12}
        ]}"#;
        let resp: OpenOrdersResponse = serde_json::from_str(json).unwrap();
        let order = OpenOrder::try_from(resp.orders[0].clone()).unwrap();
        assert_eq!(order.side, Side::Buy);
        assert_eq!(order.price, Decimal::new(490005, 1));
        assert_eq!(order.client_id, Some(12));
    }
}
