//! Open order container for the selected account.

use super::OpenOrder;
use crate::shared::PubkeyStr;

/// The selected account's open orders, replaced wholesale on every reload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OpenOrders {
    orders: Vec<OpenOrder>,
}

impl OpenOrders {
    pub fn new(orders: Vec<OpenOrder>) -> Self {
        Self { orders }
    }

    pub fn all(&self) -> &[OpenOrder] {
        &self.orders
    }

    pub fn for_market<'a>(&'a self, market: &'a PubkeyStr) -> impl Iterator<Item = &'a OpenOrder> + 'a {
        self.orders.iter().filter(move |o| &o.market == market)
    }

    pub fn find(&self, order_id: &str) -> Option<&OpenOrder> {
        self.orders.iter().find(|o| o.order_id == order_id)
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::Side;
    use rust_decimal::Decimal;

    fn order(id: &str, market: &str) -> OpenOrder {
        OpenOrder {
            order_id: id.to_string(),
            market_name: "BTC-PERP".into(),
            market: PubkeyStr::new(market),
            side: Side::Sell,
            price: Decimal::from(51_000),
            size: Decimal::new(1, 1),
            client_id: None,
        }
    }

    #[test]
    fn test_for_market_and_find() {
        let orders = OpenOrders::new(vec![order("1", "m1"), order("2", "m2"), order("3", "m1")]);
        assert_eq!(orders.for_market(&PubkeyStr::new("m1")).count(), 2);
        assert_eq!(orders.find("2").unwrap().market.as_str(), "m2");
        assert!(orders.find("9").is_none());
        assert_eq!(orders.len(), 3);
    }

    #[test]
    fn test_default_is_empty() {
        assert!(OpenOrders::default().is_empty());
    }
}
