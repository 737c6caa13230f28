//! Refresh orchestrator: named async actions that read from the remote facade
//! and write into the selection store.
//!
//! Every action follows the same shape: remote call, one store transition,
//! and a notification on terminal failure (or success, for redemptions).
//! Remote errors never escape an action. Actions that target "the current
//! selection" capture the target when invoked; the store discards the result
//! as stale if the selection moved while the call was in flight.

use crate::client::SyncClient;
use crate::domain::account::MarginAccount;
use crate::domain::group::LoadedGroup;
use crate::domain::orderbook::OrderbookSnapshot;
use crate::domain::wallet::wallet_tokens;
use crate::error::{RemoteError, SyncError};
use crate::notifications::NotificationEvent;
use crate::remote::WalletSigner;
use crate::shared::{PubkeyStr, Side};
use crate::store::{TradeType, Transition, UpdateOutcome};

use rust_decimal::Decimal;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

/// How a refresh action ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// A new snapshot was published.
    Published,
    /// The result matched what the store already held.
    Unchanged,
    /// The selection moved while the call was in flight; the result was dropped.
    Stale,
    /// Preconditions not met; nothing was fetched.
    Skipped,
    /// The remote call failed or the store rejected the result.
    Failed,
}

impl From<Option<UpdateOutcome>> for RefreshOutcome {
    fn from(outcome: Option<UpdateOutcome>) -> Self {
        match outcome {
            Some(UpdateOutcome::Changed) => RefreshOutcome::Published,
            Some(UpdateOutcome::Unchanged) => RefreshOutcome::Unchanged,
            Some(UpdateOutcome::Stale) => RefreshOutcome::Stale,
            None => RefreshOutcome::Failed,
        }
    }
}

/// Result of [`Actions::redeem_rewards`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedeemOutcome {
    /// No account selected, or nothing accrued.
    NothingToRedeem,
    /// A redemption for this account is already in flight.
    AlreadyPending,
    Submitted { txid: String },
    Failed {
        message: String,
        txid: Option<String>,
    },
}

/// Marks an account as redeeming until dropped.
struct RedeemGuard<'a> {
    pending: &'a Mutex<HashSet<PubkeyStr>>,
    account: PubkeyStr,
}

impl<'a> RedeemGuard<'a> {
    fn acquire(pending: &'a Mutex<HashSet<PubkeyStr>>, account: &PubkeyStr) -> Option<Self> {
        let mut set = pending.lock().unwrap_or_else(|p| p.into_inner());
        if !set.insert(account.clone()) {
            return None;
        }
        Some(Self {
            pending,
            account: account.clone(),
        })
    }
}

impl Drop for RedeemGuard<'_> {
    fn drop(&mut self) {
        let mut set = self.pending.lock().unwrap_or_else(|p| p.into_inner());
        set.remove(&self.account);
    }
}

pub struct Actions<'a> {
    pub(crate) client: &'a SyncClient,
}

impl<'a> Actions<'a> {
    // ── Wallet session ───────────────────────────────────────────────────

    /// Record a connected wallet. A wallet without a signer is read-only.
    pub async fn connect_wallet(
        &self,
        provider_id: &str,
        public_key: PubkeyStr,
        signer: Option<Arc<dyn WalletSigner>>,
    ) -> RefreshOutcome {
        let can_sign = signer.is_some();
        *self.client.signer.write().await = signer;
        tracing::info!(wallet = %public_key, provider = provider_id, can_sign, "wallet connected");
        self.client
            .commit(Transition::WalletConnected {
                provider_id: provider_id.to_string(),
                public_key,
                can_sign,
            })
            .await
            .into()
    }

    pub async fn disconnect_wallet(&self) -> RefreshOutcome {
        *self.client.signer.write().await = None;
        tracing::info!("wallet disconnected");
        self.client
            .commit(Transition::WalletDisconnected)
            .await
            .into()
    }

    /// Replace the wallet's token balances. Clears them when no wallet is
    /// authenticated.
    pub async fn fetch_wallet_tokens(&self) -> RefreshOutcome {
        let snapshot = self.client.snapshot().await;
        let owner = match &snapshot.wallet.public_key {
            Some(owner) if snapshot.wallet.is_authenticated() => owner.clone(),
            _ => {
                self.client.commit(Transition::ClearWalletTokens).await;
                return RefreshOutcome::Skipped;
            }
        };

        match self.client.remote.get_token_accounts_by_owner(&owner).await {
            Ok(accounts) => {
                let tokens = wallet_tokens(&snapshot.group.config, &accounts);
                tracing::debug!(wallet = %owner, count = tokens.len(), "wallet tokens loaded");
                self.client
                    .commit(Transition::SetWalletTokens { owner, tokens })
                    .await
                    .into()
            }
            Err(e) => {
                self.client.report("Could not load wallet balances", &e).await;
                RefreshOutcome::Failed
            }
        }
    }

    // ── Group ────────────────────────────────────────────────────────────

    /// Load the group record, its root banks and its cache, and publish all
    /// three together. Nothing is published unless every read succeeds.
    pub async fn fetch_group(&self) -> RefreshOutcome {
        let snapshot = self.client.snapshot().await;
        let key = snapshot.group.config.public_key.clone();
        let remote = &self.client.remote;

        let loaded = async {
            let group = remote.get_group(&key).await?;
            let (root_banks, cache) = futures_util::future::try_join(
                remote.load_root_banks(&group),
                remote.load_cache(&group),
            )
            .await?;
            Ok::<_, RemoteError>(LoadedGroup {
                group,
                cache,
                root_banks,
            })
        }
        .await;

        match loaded {
            Ok(loaded) => {
                tracing::debug!(group = %key, banks = loaded.root_banks.len(), "group loaded");
                self.client
                    .commit(Transition::PublishGroup(loaded))
                    .await
                    .into()
            }
            Err(e) => {
                self.client.report("Could not get mango group", &e).await;
                RefreshOutcome::Failed
            }
        }
    }

    // ── Accounts ─────────────────────────────────────────────────────────

    /// Load every margin account the connected wallet owns.
    ///
    /// Requires a signing-capable wallet and a loaded group. The previously
    /// selected account is kept if it is still listed.
    pub async fn fetch_accounts_for_owner(&self) -> RefreshOutcome {
        let snapshot = self.client.snapshot().await;
        if !snapshot.wallet.is_signing_capable() {
            tracing::debug!("account fetch skipped: wallet cannot sign");
            return RefreshOutcome::Skipped;
        }
        let (Some(owner), Some(loaded)) = (&snapshot.wallet.public_key, &snapshot.group.loaded)
        else {
            tracing::debug!("account fetch skipped: group not loaded");
            return RefreshOutcome::Skipped;
        };

        self.client.commit(Transition::BeginAccountLoad).await;
        match self
            .client
            .remote
            .get_accounts_for_owner(&loaded.group, owner)
            .await
        {
            Ok(accounts) => {
                tracing::debug!(wallet = %owner, count = accounts.len(), "margin accounts loaded");
                let outcome = self
                    .client
                    .commit(Transition::SetAccounts {
                        owner: owner.clone(),
                        accounts,
                    })
                    .await;
                // A dropped result must not leave the loading flag behind.
                if !matches!(
                    outcome,
                    Some(UpdateOutcome::Changed | UpdateOutcome::Unchanged)
                ) {
                    self.client.commit(Transition::EndAccountLoad).await;
                }
                outcome.into()
            }
            Err(e) => {
                self.client.commit(Transition::EndAccountLoad).await;
                self.client.report("Could not load margin accounts", &e).await;
                RefreshOutcome::Failed
            }
        }
    }

    /// Select one of the owner's listed accounts and refresh its history and
    /// orders.
    pub async fn select_account(&self, address: &PubkeyStr) -> RefreshOutcome {
        self.client.store.begin_account_selection();
        let outcome: RefreshOutcome = self
            .client
            .commit(Transition::SelectAccount(address.clone()))
            .await
            .into();
        if outcome == RefreshOutcome::Published {
            self.fetch_trade_history().await;
            self.reload_orders().await;
        }
        outcome
    }

    /// Fetch an account by address and select it read-only.
    ///
    /// Unlike the other actions the remote error is returned, not reported:
    /// callers decide whether a missing account is an input error.
    /// Any account selection made while the fetch is in flight wins; the
    /// fetched account is then dropped as `Stale`.
    pub async fn load_observed_account(
        &self,
        address: &PubkeyStr,
    ) -> Result<RefreshOutcome, RemoteError> {
        let ticket = self.client.store.begin_account_selection();
        self.observe_account(address, ticket).await
    }

    pub(crate) async fn observe_account(
        &self,
        address: &PubkeyStr,
        ticket: u64,
    ) -> Result<RefreshOutcome, RemoteError> {
        let account = self.client.remote.get_account_by_address(address).await?;
        tracing::debug!(account = %address, ticket, "observing account");
        Ok(self
            .client
            .commit(Transition::ObserveAccount { account, ticket })
            .await
            .into())
    }

    /// Re-read the current account in place.
    pub async fn refresh_current_account(&self) -> RefreshOutcome {
        let snapshot = self.client.snapshot().await;
        let Some(address) = snapshot.accounts.current_address().cloned() else {
            return RefreshOutcome::Skipped;
        };
        match self.client.remote.get_account_by_address(&address).await {
            Ok(account) => self
                .client
                .commit(Transition::RefreshCurrentAccount(account))
                .await
                .into(),
            Err(e) => {
                tracing::warn!(account = %address, error = %e, "account refresh failed");
                RefreshOutcome::Failed
            }
        }
    }

    // ── Derived sequences ────────────────────────────────────────────────

    /// Replace the trade history of the current account. Failures are logged.
    pub async fn fetch_trade_history(&self) -> RefreshOutcome {
        let snapshot = self.client.snapshot().await;
        let Some(account) = snapshot.accounts.current_address().cloned() else {
            return RefreshOutcome::Skipped;
        };
        match self.client.remote.load_trade_history(&account).await {
            Ok(entries) => self
                .client
                .commit(Transition::SetTradeHistory { account, entries })
                .await
                .into(),
            Err(e) => {
                tracing::warn!(account = %account, error = %e, "trade history refresh failed");
                RefreshOutcome::Failed
            }
        }
    }

    /// Replace the open orders of the current account. Failures are logged.
    pub async fn reload_orders(&self) -> RefreshOutcome {
        let snapshot = self.client.snapshot().await;
        let Some(account) = snapshot.accounts.current.clone() else {
            return RefreshOutcome::Skipped;
        };
        match self.client.remote.load_open_orders(&account).await {
            Ok(orders) => self
                .client
                .commit(Transition::SetOpenOrders {
                    account: account.address,
                    orders,
                })
                .await
                .into(),
            Err(e) => {
                tracing::warn!(account = %account.address, error = %e, "open orders refresh failed");
                RefreshOutcome::Failed
            }
        }
    }

    /// Publish the top `depth` levels of a live book for `market`.
    pub async fn apply_order_book(
        &self,
        market: &PubkeyStr,
        book: &OrderbookSnapshot,
        depth: usize,
    ) -> RefreshOutcome {
        self.client
            .commit(Transition::SetOrderBook {
                market: market.clone(),
                book: book.to_book(depth),
            })
            .await
            .into()
    }

    // ── Rewards ──────────────────────────────────────────────────────────

    /// Redeem the current account's accrued rewards.
    ///
    /// A no-op when nothing has accrued. At most one redemption per account
    /// is in flight; a second call while one is pending returns
    /// [`RedeemOutcome::AlreadyPending`] without submitting.
    pub async fn redeem_rewards(&self) -> RedeemOutcome {
        let snapshot = self.client.snapshot().await;
        let Some(account) = snapshot.accounts.current.clone() else {
            return RedeemOutcome::NothingToRedeem;
        };
        if snapshot.accounts.accrued_rewards == 0 {
            tracing::debug!(account = %account.address, "nothing to redeem");
            return RedeemOutcome::NothingToRedeem;
        }
        let Some(_guard) = RedeemGuard::acquire(&self.client.redeeming, &account.address) else {
            tracing::debug!(account = %account.address, "redemption already pending");
            return RedeemOutcome::AlreadyPending;
        };

        let symbol = self.client.reward_symbol.clone();
        match self.submit_redeem(&account, &symbol).await {
            Ok(txid) => {
                tracing::info!(account = %account.address, txid = %txid, "rewards redeemed");
                self.fetch_accounts_for_owner().await;
                self.client
                    .notifications
                    .push(
                        NotificationEvent::success(format!("Successfully redeemed {}", symbol))
                            .with_correlation_id(Some(txid.clone())),
                    )
                    .await;
                RedeemOutcome::Submitted { txid }
            }
            Err(e) => {
                let (message, txid) = match &e {
                    SyncError::Remote(RemoteError::Transaction { message, txid }) => {
                        (message.clone(), txid.clone())
                    }
                    other => (other.to_string(), None),
                };
                tracing::error!(account = %account.address, error = %e, "redemption failed");
                self.client
                    .notifications
                    .push(
                        NotificationEvent::error(format!("Error redeeming {}", symbol))
                            .with_description(message.clone())
                            .with_correlation_id(txid.clone()),
                    )
                    .await;
                RedeemOutcome::Failed { message, txid }
            }
        }
    }

    async fn submit_redeem(&self, account: &MarginAccount, symbol: &str) -> Result<String, SyncError> {
        let snapshot = self.client.snapshot().await;
        let signer = self
            .client
            .signer()
            .await
            .ok_or_else(|| SyncError::SigningRejected("wallet cannot sign".to_string()))?;
        let loaded = snapshot
            .group
            .loaded
            .as_ref()
            .ok_or_else(|| SyncError::Other("group not loaded".to_string()))?;
        let banks = snapshot
            .group
            .config
            .reward_token_index(symbol)
            .and_then(|index| loaded.redeem_banks(index))
            .ok_or_else(|| SyncError::Other(format!("no bank for reward token {}", symbol)))?;

        self.client
            .remote
            .submit_redeem(&loaded.group, account, signer.as_ref(), &banks)
            .await
    }

    // ── Trade form and settings ──────────────────────────────────────────

    pub async fn set_trade_side(&self, side: Side) -> RefreshOutcome {
        self.client.commit(Transition::SetTradeSide(side)).await.into()
    }

    pub async fn set_trade_type(&self, trade_type: TradeType) -> RefreshOutcome {
        self.client
            .commit(Transition::SetTradeType(trade_type))
            .await
            .into()
    }

    pub async fn set_trade_price(&self, price: Option<Decimal>) -> RefreshOutcome {
        self.client
            .commit(Transition::SetTradePrice(price))
            .await
            .into()
    }

    pub async fn set_ui_locked(&self, locked: bool) -> RefreshOutcome {
        self.client
            .commit(Transition::SetUiLocked(locked))
            .await
            .into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redeem_guard_is_exclusive_per_account() {
        let pending = Mutex::new(HashSet::new());
        let a = PubkeyStr::new("A");
        let b = PubkeyStr::new("B");

        let first = RedeemGuard::acquire(&pending, &a);
        assert!(first.is_some());
        assert!(RedeemGuard::acquire(&pending, &a).is_none());
        assert!(RedeemGuard::acquire(&pending, &b).is_some());

        drop(first);
        assert!(RedeemGuard::acquire(&pending, &a).is_some());
    }

    #[test]
    fn test_refresh_outcome_from_update() {
        assert_eq!(
            RefreshOutcome::from(Some(UpdateOutcome::Changed)),
            RefreshOutcome::Published
        );
        assert_eq!(
            RefreshOutcome::from(Some(UpdateOutcome::Stale)),
            RefreshOutcome::Stale
        );
        assert_eq!(RefreshOutcome::from(None), RefreshOutcome::Failed);
    }
}
