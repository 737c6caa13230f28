//! Wallet domain: the connected wallet session and its token balances.

mod convert;
pub mod wire;

use crate::domain::group::GroupConfig;
use crate::shared::{native_to_ui, PubkeyStr};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// An SPL token account owned by the wallet, as returned by the remote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenAccount {
    pub address: PubkeyStr,
    pub mint: PubkeyStr,
    pub owner: PubkeyStr,
    /// Raw integer amount.
    pub amount: u64,
}

/// A wallet balance for a token the group knows about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletToken {
    pub mint: PubkeyStr,
    pub symbol: String,
    pub decimals: u8,
    pub raw_amount: u64,
    pub ui_amount: Decimal,
}

/// Keep the token accounts whose mint is listed in `config` and convert their
/// amounts into UI units. Order follows `accounts`.
pub fn wallet_tokens(config: &GroupConfig, accounts: &[TokenAccount]) -> Vec<WalletToken> {
    accounts
        .iter()
        .filter_map(|acct| {
            let token = config.token_by_mint(&acct.mint)?;
            Some(WalletToken {
                mint: acct.mint.clone(),
                symbol: token.symbol.clone(),
                decimals: token.decimals,
                raw_amount: acct.amount,
                ui_amount: native_to_ui(acct.amount, token.decimals),
            })
        })
        .collect()
}

/// The wallet as seen by the store.
///
/// `token_balances` is always empty while `connected` is false.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WalletSession {
    pub provider_id: String,
    pub connected: bool,
    pub public_key: Option<PubkeyStr>,
    pub can_sign: bool,
    pub token_balances: Vec<WalletToken>,
}

impl WalletSession {
    /// Connected with a known key; enough for read-only owner queries.
    pub fn is_authenticated(&self) -> bool {
        self.connected && self.public_key.is_some()
    }

    /// Connected and able to sign.
    pub fn is_signing_capable(&self) -> bool {
        self.is_authenticated() && self.can_sign
    }

    pub fn balance(&self, symbol: &str) -> Option<&WalletToken> {
        self.token_balances
            .iter()
            .find(|t| t.symbol.eq_ignore_ascii_case(symbol))
    }
}
