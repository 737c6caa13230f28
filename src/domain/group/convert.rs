//! Conversions from wire types to domain types for groups.

use super::wire::{
    CacheResponse, GroupConfigJson, GroupResponse, MarketConfigJson, RootBankResponse,
    TokenConfigJson,
};
use super::{Cache, Group, GroupConfig, GroupToken, NodeBank, RootBank, TokenConfig};
use crate::domain::market::MarketConfig;
use crate::error::RemoteError;
use crate::shared::{parse_decimal, MarketKind, PubkeyStr};
use chrono::TimeZone;

impl From<GroupConfigJson> for GroupConfig {
    fn from(raw: GroupConfigJson) -> Self {
        let perps = raw
            .perp_markets
            .into_iter()
            .map(|m| market_config(m, MarketKind::Perpetual));
        let spots = raw
            .spot_markets
            .into_iter()
            .map(|m| market_config(m, MarketKind::Spot));

        Self {
            cluster: raw.cluster,
            name: raw.name,
            public_key: raw.public_key,
            quote_symbol: raw.quote_symbol,
            program_id: raw.mango_program_id,
            tokens: raw.tokens.into_iter().map(TokenConfig::from).collect(),
            markets: spots.chain(perps).collect(),
        }
    }
}

impl From<TokenConfigJson> for TokenConfig {
    fn from(t: TokenConfigJson) -> Self {
        Self {
            symbol: t.symbol,
            mint_key: t.mint_key,
            decimals: t.decimals,
            root_key: t.root_key,
        }
    }
}

fn market_config(m: MarketConfigJson, kind: MarketKind) -> MarketConfig {
    MarketConfig {
        name: m.name,
        public_key: m.public_key,
        base_symbol: m.base_symbol,
        kind,
        market_index: m.market_index,
        bids_key: m.bids_key,
        asks_key: m.asks_key,
    }
}

impl From<GroupResponse> for Group {
    fn from(g: GroupResponse) -> Self {
        Self {
            public_key: PubkeyStr::from(g.public_key),
            tokens: g
                .tokens
                .into_iter()
                .map(|t| GroupToken {
                    mint: PubkeyStr::from(t.mint),
                    root_bank: PubkeyStr::from(t.root_bank),
                    decimals: t.decimals,
                })
                .collect(),
        }
    }
}

impl TryFrom<RootBankResponse> for RootBank {
    type Error = RemoteError;

    fn try_from(rb: RootBankResponse) -> Result<Self, Self::Error> {
        Ok(Self {
            public_key: PubkeyStr::from(rb.public_key),
            node_banks: rb
                .node_banks
                .into_iter()
                .map(|nb| NodeBank {
                    public_key: PubkeyStr::from(nb.public_key),
                    vault: PubkeyStr::from(nb.vault),
                })
                .collect(),
            deposit_index: parse_decimal("deposit_index", &rb.deposit_index)?,
            borrow_index: parse_decimal("borrow_index", &rb.borrow_index)?,
        })
    }
}

impl TryFrom<CacheResponse> for Cache {
    type Error = RemoteError;

    fn try_from(c: CacheResponse) -> Result<Self, Self::Error> {
        let prices = c
            .prices
            .iter()
            .map(|p| parse_decimal("price", p))
            .collect::<Result<Vec<_>, _>>()?;
        let updated_at = chrono::Utc
            .timestamp_millis_opt(c.updated_at)
            .single()
            .ok_or_else(|| RemoteError::Decode(format!("updated_at: {}", c.updated_at)))?;
        Ok(Self { prices, updated_at })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    const IDS: &str = r#"{
        "cluster": "devnet",
        "name": "merps_test_v1",
        "publicKey": "4yJ2Vx3kZnmHTNCrHzdoj5nCwriF2kVhfKNvqC6gU8tr",
        "quoteSymbol": "USDC",
        "mangoProgramId": "viQTKtBmaGvx3nugHcvijedy9ApbDowqiGYq35qAJqq",
        "tokens": [
            {"symbol": "BTC", "mintKey": "3UNBZ6o52WTWwjac2kPUb4FyodhU1vFkRJheu1Sh2TvU", "decimals": 6, "rootKey": "BTCroot"}
        ],
        "perpMarkets": [
            {"name": "BTC-PERP", "publicKey": "perpBTC", "baseSymbol": "BTC", "marketIndex": 0, "bidsKey": "pb", "asksKey": "pa"}
        ],
        "spotMarkets": [
            {"name": "BTC/USDC", "publicKey": "spotBTC", "baseSymbol": "BTC", "marketIndex": 0, "bidsKey": "sb", "asksKey": "sa"}
        ]
    }"#;

    #[test]
    fn test_group_config_from_ids_json() {
        let config = GroupConfig::from_json(IDS).unwrap();
        assert_eq!(config.name, "merps_test_v1");
        assert_eq!(config.tokens.len(), 1);
        assert_eq!(config.markets.len(), 2);
        let perp = config
            .market_by_base_symbol_and_kind("BTC", MarketKind::Perpetual)
            .unwrap();
        assert_eq!(perp.public_key.as_str(), "perpBTC");
        let spot = config
            .market_by_base_symbol_and_kind("BTC", MarketKind::Spot)
            .unwrap();
        assert_eq!(spot.bids_key.as_str(), "sb");
    }

    #[test]
    fn test_group_config_rejects_bad_json() {
        assert!(GroupConfig::from_json("{\"name\": 1}").is_err());
    }

    #[test]
    fn test_cache_conversion() {
        let cache = Cache::try_from(CacheResponse {
            prices: vec!["50000.5".into(), "0.25".into()],
            updated_at: 1740076800000,
        })
        .unwrap();
        assert_eq!(cache.price(0), Some(Decimal::new(500005, 1)));
        assert_eq!(cache.price(1), Some(Decimal::new(25, 2)));
    }

    #[test]
    fn test_cache_conversion_rejects_bad_price() {
        let err = Cache::try_from(CacheResponse {
            prices: vec!["abc".into()],
            updated_at: 0,
        })
        .unwrap_err();
        assert!(matches!(err, RemoteError::Decode(_)));
    }

    #[test]
    fn test_root_bank_conversion() {
        let rb = RootBank::try_from(RootBankResponse {
            public_key: "root".into(),
            node_banks: vec![super::super::wire::NodeBankResponse {
                public_key: "node".into(),
                vault: "vault".into(),
            }],
            deposit_index: "1.0001".into(),
            borrow_index: "1.02".into(),
        })
        .unwrap();
        assert_eq!(rb.node_banks[0].vault.as_str(), "vault");
        assert_eq!(rb.borrow_index, Decimal::new(102, 2));
    }
}
