//! Order domain: resting orders on the selected account.

mod convert;
pub mod state;
pub mod wire;

use crate::shared::{PubkeyStr, Side};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub use state::OpenOrders;

/// An order resting on a book.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OpenOrder {
    pub order_id: String,
    pub market_name: String,
    pub market: PubkeyStr,
    pub side: Side,
    pub price: Decimal,
    pub size: Decimal,
    pub client_id: Option<u64>,
}
