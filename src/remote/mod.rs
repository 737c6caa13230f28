//! Remote client facade: the seam to the ledger and the user's wallet.
//!
//! [`RemoteClient`] performs every read and submission against the remote
//! ledger; the sync layer never talks to the network directly. [`WalletSigner`]
//! is the connected wallet's signing capability.
//!
//! The crate ships one network implementation, [`crate::http::LedgerHttp`],
//! and a keypair-backed signer in [`signer`]. Tests substitute in-memory fakes.

pub mod signer;

use crate::domain::account::MarginAccount;
use crate::domain::group::{Cache, Group, RedeemBanks, RootBank};
use crate::domain::order::OpenOrder;
use crate::domain::trade::TradeHistoryEntry;
use crate::domain::wallet::TokenAccount;
use crate::error::{RemoteError, SyncError};
use crate::shared::PubkeyStr;
use async_trait::async_trait;
use solana_signature::Signature;

pub use signer::KeypairSigner;

/// Reads and submissions against the remote ledger.
#[async_trait]
pub trait RemoteClient: Send + Sync {
    async fn get_group(&self, group: &PubkeyStr) -> Result<Group, RemoteError>;

    async fn load_root_banks(&self, group: &Group) -> Result<Vec<RootBank>, RemoteError>;

    async fn load_cache(&self, group: &Group) -> Result<Cache, RemoteError>;

    /// Every margin account `owner` holds in `group`, in remote order.
    async fn get_accounts_for_owner(
        &self,
        group: &Group,
        owner: &PubkeyStr,
    ) -> Result<Vec<MarginAccount>, RemoteError>;

    /// Fails with [`RemoteError::NotFound`] when no account lives at `address`.
    async fn get_account_by_address(&self, address: &PubkeyStr)
        -> Result<MarginAccount, RemoteError>;

    async fn get_token_accounts_by_owner(
        &self,
        owner: &PubkeyStr,
    ) -> Result<Vec<TokenAccount>, RemoteError>;

    async fn load_trade_history(
        &self,
        account: &PubkeyStr,
    ) -> Result<Vec<TradeHistoryEntry>, RemoteError>;

    async fn load_open_orders(&self, account: &MarginAccount)
        -> Result<Vec<OpenOrder>, RemoteError>;

    /// Redeem accrued rewards of `account` from the bank in `banks`.
    /// Returns the transaction id.
    async fn submit_redeem(
        &self,
        group: &Group,
        account: &MarginAccount,
        signer: &dyn WalletSigner,
        banks: &RedeemBanks,
    ) -> Result<String, SyncError>;
}

/// The connected wallet's ability to sign.
#[async_trait]
pub trait WalletSigner: Send + Sync {
    fn public_key(&self) -> PubkeyStr;

    /// Fails with [`SyncError::SigningRejected`] when the user declines.
    async fn sign_message(&self, message: &[u8]) -> Result<Signature, SyncError>;
}

/// Message signed to authorize a reward redemption.
pub fn redeem_message(group: &Group, account: &MarginAccount, banks: &RedeemBanks) -> Vec<u8> {
    format!(
        "Redeem rewards\ngroup: {}\naccount: {}\nroot bank: {}\nnode bank: {}\nvault: {}",
        group.public_key, account.address, banks.root_bank, banks.node_bank, banks.vault
    )
    .into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::account::fixtures::account;
    use crate::domain::group::fixtures::loaded_group;

    #[test]
    fn test_redeem_message_names_every_reference() {
        let loaded = loaded_group(vec![]);
        let banks = loaded.redeem_banks(1).unwrap();
        let msg = String::from_utf8(redeem_message(&loaded.group, &account("acct", "o", &[]), &banks))
            .unwrap();
        assert!(msg.starts_with("Redeem rewards\n"));
        assert!(msg.contains("account: acct"));
        assert!(msg.contains("vault: MNGOroot-vault"));
    }
}
