//! The closed set of named state transitions.
//!
//! Every write to the store is one of these. Transitions that carry the
//! identity they were computed for (an owner, an account, a market) compare it
//! against the snapshot they are applied to and report [`UpdateOutcome::Stale`]
//! instead of writing when the selection has moved on.

use super::state::{AccountMode, MarketSelection, SyncState, TradeType};
use crate::domain::account::{sort_accounts, MarginAccount};
use crate::domain::group::LoadedGroup;
use crate::domain::market::MarketConfig;
use crate::domain::order::{OpenOrder, OpenOrders};
use crate::domain::orderbook::OrderBook;
use crate::domain::trade::{TradeHistory, TradeHistoryEntry};
use crate::domain::wallet::WalletToken;
use crate::shared::{PubkeyStr, Side};
use rust_decimal::Decimal;

/// Result of applying a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// A new snapshot was published.
    Changed,
    /// The transition was valid but produced an identical snapshot.
    Unchanged,
    /// The transition targeted a selection that is no longer current.
    Stale,
}

#[derive(Debug, Clone)]
pub enum Transition {
    WalletConnected {
        provider_id: String,
        public_key: PubkeyStr,
        can_sign: bool,
    },
    /// Clears balances along with the session.
    WalletDisconnected,
    /// Replace balances fetched for `owner`.
    SetWalletTokens {
        owner: PubkeyStr,
        tokens: Vec<WalletToken>,
    },
    ClearWalletTokens,
    /// Marks the initial load only when nothing is selected.
    BeginAccountLoad,
    /// Replace the owner's account list, reconciling the selection by address.
    SetAccounts {
        owner: PubkeyStr,
        accounts: Vec<MarginAccount>,
    },
    EndAccountLoad,
    /// Select an account opened by address, read-only. `ticket` comes from
    /// [`SelectionStore::begin_account_selection`](super::SelectionStore::begin_account_selection).
    ObserveAccount { account: MarginAccount, ticket: u64 },
    /// Select one of the listed accounts.
    SelectAccount(PubkeyStr),
    /// Replace the account record if it is still current.
    RefreshCurrentAccount(MarginAccount),
    PublishGroup(LoadedGroup),
    /// Select a market. Seeds a limit price from the cache when none is entered.
    SelectMarket(MarketConfig),
    SetOrderBook {
        market: PubkeyStr,
        book: OrderBook,
    },
    SetTradeHistory {
        account: PubkeyStr,
        entries: Vec<TradeHistoryEntry>,
    },
    SetOpenOrders {
        account: PubkeyStr,
        orders: Vec<OpenOrder>,
    },
    SetTradeSide(Side),
    SetTradeType(TradeType),
    SetTradePrice(Option<Decimal>),
    SetUiLocked(bool),
}

impl Transition {
    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Transition::WalletConnected { .. } => "wallet_connected",
            Transition::WalletDisconnected => "wallet_disconnected",
            Transition::SetWalletTokens { .. } => "set_wallet_tokens",
            Transition::ClearWalletTokens => "clear_wallet_tokens",
            Transition::BeginAccountLoad => "begin_account_load",
            Transition::SetAccounts { .. } => "set_accounts",
            Transition::EndAccountLoad => "end_account_load",
            Transition::ObserveAccount { .. } => "observe_account",
            Transition::SelectAccount(_) => "select_account",
            Transition::RefreshCurrentAccount(_) => "refresh_current_account",
            Transition::PublishGroup(_) => "publish_group",
            Transition::SelectMarket(_) => "select_market",
            Transition::SetOrderBook { .. } => "set_order_book",
            Transition::SetTradeHistory { .. } => "set_trade_history",
            Transition::SetOpenOrders { .. } => "set_open_orders",
            Transition::SetTradeSide(_) => "set_trade_side",
            Transition::SetTradeType(_) => "set_trade_type",
            Transition::SetTradePrice(_) => "set_trade_price",
            Transition::SetUiLocked(_) => "set_ui_locked",
        }
    }

    /// Selection ticket the transition was issued under, if any.
    pub(crate) fn selection_ticket(&self) -> Option<u64> {
        match self {
            Transition::ObserveAccount { ticket, .. } => Some(*ticket),
            _ => None,
        }
    }

    /// Apply to `state` in place. Returns `Stale` without touching `state`
    /// when the transition's target no longer matches.
    pub(crate) fn apply(self, state: &mut SyncState) -> UpdateOutcome {
        match self {
            Transition::WalletConnected {
                provider_id,
                public_key,
                can_sign,
            } => {
                if state.wallet.public_key.as_ref() != Some(&public_key) {
                    state.wallet.token_balances.clear();
                    drop_owned_accounts(state);
                }
                state.wallet.provider_id = provider_id;
                state.wallet.connected = true;
                state.wallet.public_key = Some(public_key);
                state.wallet.can_sign = can_sign;
            }
            Transition::WalletDisconnected => {
                state.wallet.connected = false;
                state.wallet.public_key = None;
                state.wallet.can_sign = false;
                state.wallet.token_balances.clear();
                drop_owned_accounts(state);
            }
            Transition::SetWalletTokens { owner, tokens } => {
                if !state.wallet.connected || state.wallet.public_key.as_ref() != Some(&owner) {
                    return UpdateOutcome::Stale;
                }
                state.wallet.token_balances = tokens;
            }
            Transition::ClearWalletTokens => state.wallet.token_balances.clear(),
            Transition::BeginAccountLoad => {
                if state.accounts.current.is_none() {
                    state.accounts.initial_loading = true;
                }
            }
            Transition::SetAccounts {
                owner,
                mut accounts,
            } => {
                if state.wallet.public_key.as_ref() != Some(&owner) {
                    return UpdateOutcome::Stale;
                }
                sort_accounts(&mut accounts);
                let sel = &mut state.accounts;
                let previous = sel.current.take();
                let previous_address = previous.as_ref().map(|a| a.address.clone());
                sel.current = match previous {
                    Some(prev) => match accounts.iter().find(|a| a.address == prev.address) {
                        Some(fresh) => Some(fresh.clone()),
                        None if sel.mode == AccountMode::Observer => Some(prev),
                        None => accounts.first().cloned(),
                    },
                    None => accounts.first().cloned(),
                };
                if let Some(current) = &sel.current {
                    if accounts.iter().any(|a| a.address == current.address) {
                        sel.mode = AccountMode::Owned;
                    }
                }
                sel.accounts = accounts;
                sel.initial_loading = false;
                if sel.current_address() != previous_address.as_ref() {
                    state.trade_history = TradeHistory::default();
                    state.open_orders = OpenOrders::default();
                }
            }
            Transition::EndAccountLoad => state.accounts.initial_loading = false,
            Transition::ObserveAccount { account, .. } => {
                let sel = &mut state.accounts;
                if sel.current.as_ref().map(|c| &c.address) != Some(&account.address) {
                    state.trade_history = TradeHistory::default();
                    state.open_orders = OpenOrders::default();
                }
                sel.current = Some(account);
                sel.mode = AccountMode::Observer;
                sel.initial_loading = false;
            }
            Transition::SelectAccount(address) => {
                let sel = &mut state.accounts;
                let Some(account) = sel.accounts.iter().find(|a| a.address == address).cloned()
                else {
                    return UpdateOutcome::Stale;
                };
                if sel.current.as_ref().map(|c| &c.address) != Some(&address) {
                    state.trade_history = TradeHistory::default();
                    state.open_orders = OpenOrders::default();
                }
                sel.current = Some(account);
                sel.mode = AccountMode::Owned;
                sel.initial_loading = false;
            }
            Transition::RefreshCurrentAccount(account) => {
                let sel = &mut state.accounts;
                if sel.current_address() != Some(&account.address) {
                    return UpdateOutcome::Stale;
                }
                if let Some(listed) = sel.accounts.iter_mut().find(|a| a.address == account.address) {
                    *listed = account.clone();
                }
                sel.current = Some(account);
            }
            Transition::PublishGroup(loaded) => state.group.loaded = Some(loaded),
            Transition::SelectMarket(config) => {
                if state.market.name == config.name {
                    return UpdateOutcome::Unchanged;
                }
                let seed = state.group.cache().and_then(|c| c.price(config.market_index));
                state.market = MarketSelection::new(config);
                if state.trade_form.trade_type == TradeType::Limit
                    && state.trade_form.price.is_none()
                {
                    if let Some(price) = seed {
                        state.trade_form.price = Some(price.round_dp(2));
                    }
                }
            }
            Transition::SetOrderBook { market, book } => {
                if state.market.address != market {
                    return UpdateOutcome::Stale;
                }
                state.market.order_book = book;
            }
            Transition::SetTradeHistory { account, entries } => {
                if state.accounts.current_address() != Some(&account) {
                    return UpdateOutcome::Stale;
                }
                state.trade_history = TradeHistory::new(entries);
            }
            Transition::SetOpenOrders { account, orders } => {
                if state.accounts.current_address() != Some(&account) {
                    return UpdateOutcome::Stale;
                }
                state.open_orders = OpenOrders::new(orders);
            }
            Transition::SetTradeSide(side) => state.trade_form.side = side,
            Transition::SetTradeType(trade_type) => state.trade_form.trade_type = trade_type,
            Transition::SetTradePrice(price) => state.trade_form.price = price,
            Transition::SetUiLocked(locked) => state.settings.ui_locked = locked,
        }
        UpdateOutcome::Changed
    }
}

/// Forget the previous owner's accounts. An observed selection stays.
fn drop_owned_accounts(state: &mut SyncState) {
    let sel = &mut state.accounts;
    sel.accounts.clear();
    sel.initial_loading = false;
    if sel.mode == AccountMode::Owned && sel.current.take().is_some() {
        state.trade_history = TradeHistory::default();
        state.open_orders = OpenOrders::default();
    }
}
