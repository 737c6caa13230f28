//! Conversions from wire types to domain types for wallet token accounts.

use super::wire::TokenAccountResponse;
use super::TokenAccount;
use crate::error::RemoteError;
use crate::shared::PubkeyStr;

impl TryFrom<TokenAccountResponse> for TokenAccount {
    type Error = RemoteError;

    fn try_from(t: TokenAccountResponse) -> Result<Self, Self::Error> {
        let amount = t
            .amount
            .trim()
            .parse::<u64>()
            .map_err(|e| RemoteError::Decode(format!("amount: {} ({})", t.amount, e)))?;
        Ok(Self {
            address: PubkeyStr::from(t.pubkey),
            mint: PubkeyStr::from(t.mint),
            owner: PubkeyStr::from(t.owner),
            amount,
        })
    }
}
