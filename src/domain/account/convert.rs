//! Conversions from wire types to domain types for margin accounts.

use super::wire::{HealthResponse, MarginAccountResponse, PerpAccountResponse};
use super::{AccountHealth, MarginAccount, PerpAccount};
use crate::error::RemoteError;
use crate::shared::{parse_decimal, PubkeyStr};

impl TryFrom<HealthResponse> for AccountHealth {
    type Error = RemoteError;

    fn try_from(h: HealthResponse) -> Result<Self, Self::Error> {
        Ok(Self {
            equity: parse_decimal("equity", &h.equity)?,
            leverage: parse_decimal("leverage", &h.leverage)?,
            assets_value: parse_decimal("assets_value", &h.assets_value)?,
            maint_health_ratio: parse_decimal("maint_health_ratio", &h.maint_health_ratio)?,
            init_health_ratio: parse_decimal("init_health_ratio", &h.init_health_ratio)?,
        })
    }
}

impl TryFrom<PerpAccountResponse> for PerpAccount {
    type Error = RemoteError;

    fn try_from(p: PerpAccountResponse) -> Result<Self, Self::Error> {
        Ok(Self {
            market_index: p.market_index,
            base_position: p.base_position,
            quote_position: parse_decimal("quote_position", &p.quote_position)?,
            rewards_accrued: p.mngo_accrued,
        })
    }
}

impl TryFrom<MarginAccountResponse> for MarginAccount {
    type Error = RemoteError;

    fn try_from(a: MarginAccountResponse) -> Result<Self, Self::Error> {
        let perp_accounts = a
            .perp_accounts
            .into_iter()
            .map(PerpAccount::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        let health = a.health.map(AccountHealth::try_from).transpose()?;

        Ok(Self {
            address: PubkeyStr::from(a.public_key),
            owner: PubkeyStr::from(a.owner),
            group: PubkeyStr::from(a.group),
            perp_accounts,
            open_orders_accounts: a.open_orders.into_iter().map(PubkeyStr::from).collect(),
            health,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn test_account_conversion() {
        let json = r#"{
            "public_key": "acct1",
            "owner": "owner1",
            "group": "group1",
            "perp_accounts": [
                {"market_index": 0, "base_position": 3, "quote_position": "-150.5", "mngo_accrued": 700},
                {"market_index": 1, "base_position": 0, "quote_position": "0", "mngo_accrued": 300}
            ],
            "health": {
                "equity": "1000", "leverage": "1.5", "assets_value": "2500",
                "maint_health_ratio": "87.5", "init_health_ratio": "60"
            }
        }"#;
        let wire: MarginAccountResponse = serde_json::from_str(json).unwrap();
        let account = MarginAccount::try_from(wire).unwrap();
        assert_eq!(account.address.as_str(), "acct1");
        assert_eq!(account.accrued_rewards(), 1000);
        assert_eq!(account.perp_accounts[0].quote_position, Decimal::new(-1505, 1));
        let health = account.health.unwrap();
        assert_eq!(health.maint_health_ratio, Decimal::new(875, 1));
        assert!(account.open_orders_accounts.is_empty());
    }

    #[test]
    fn test_account_conversion_rejects_bad_decimal() {
        let wire = MarginAccountResponse {
            public_key: "acct1".into(),
            owner: "owner1".into(),
            group: "group1".into(),
            perp_accounts: vec![PerpAccountResponse {
                market_index: 0,
                base_position: 0,
                quote_position: "n/a".into(),
                mngo_accrued: 0,
            }],
            open_orders: vec![],
            health: None,
        };
        assert!(matches!(
            MarginAccount::try_from(wire),
            Err(RemoteError::Decode(_))
        ));
    }
}
