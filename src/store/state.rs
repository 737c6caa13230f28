//! Snapshot types held by the selection store.

use crate::domain::account::MarginAccount;
use crate::domain::group::{Cache, GroupConfig, LoadedGroup, RootBank};
use crate::domain::market::MarketConfig;
use crate::domain::order::OpenOrders;
use crate::domain::orderbook::OrderBook;
use crate::domain::trade::TradeHistory;
use crate::domain::wallet::WalletSession;
use crate::error::{InputError, InvariantViolation};
use crate::shared::{MarketKind, PubkeyStr, Side};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

// ─── Group ───────────────────────────────────────────────────────────────────

/// The selected group: its static config and, once fetched, the loaded triple.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupSelection {
    pub config: Arc<GroupConfig>,
    /// `None` until the first complete fetch. Treat as loading.
    pub loaded: Option<LoadedGroup>,
}

impl GroupSelection {
    pub fn is_loaded(&self) -> bool {
        self.loaded.is_some()
    }

    pub fn cache(&self) -> Option<&Cache> {
        self.loaded.as_ref().map(|l| &l.cache)
    }

    pub fn root_banks(&self) -> &[RootBank] {
        self.loaded
            .as_ref()
            .map(|l| l.root_banks.as_slice())
            .unwrap_or_default()
    }
}

// ─── Market ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct MarketSelection {
    pub config: MarketConfig,
    pub kind: MarketKind,
    pub name: String,
    pub address: PubkeyStr,
    /// Derived from the group cache; `None` until a cache is loaded.
    pub mark_price: Option<Decimal>,
    pub order_book: OrderBook,
}

impl MarketSelection {
    pub fn new(config: MarketConfig) -> Self {
        Self {
            kind: config.kind,
            name: config.name.clone(),
            address: config.public_key.clone(),
            config,
            mark_price: None,
            order_book: OrderBook::default(),
        }
    }
}

// ─── Accounts ────────────────────────────────────────────────────────────────

/// How the current account was selected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountMode {
    /// Owned by the connected wallet.
    #[default]
    Owned,
    /// Opened read-only by address.
    Observer,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccountSelection {
    /// Sorted by address.
    pub accounts: Vec<MarginAccount>,
    pub current: Option<MarginAccount>,
    pub mode: AccountMode,
    /// Only ever true while `current` is `None`.
    pub initial_loading: bool,
    /// Unredeemed rewards of `current`, recomputed per snapshot.
    pub accrued_rewards: u64,
}

impl AccountSelection {
    pub fn current_address(&self) -> Option<&PubkeyStr> {
        self.current.as_ref().map(|a| &a.address)
    }
}

// ─── Trade form / settings ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeType {
    #[default]
    Limit,
    Market,
}

/// The order-entry form. Empty fields are `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TradeForm {
    pub side: Side,
    pub price: Option<Decimal>,
    pub base_size: Option<Decimal>,
    pub quote_size: Option<Decimal>,
    pub trade_type: TradeType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub ui_locked: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self { ui_locked: true }
    }
}

// ─── SyncState ───────────────────────────────────────────────────────────────

/// One consistent snapshot of everything the store owns.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncState {
    pub group: GroupSelection,
    pub market: MarketSelection,
    pub accounts: AccountSelection,
    pub wallet: WalletSession,
    pub trade_history: TradeHistory,
    pub open_orders: OpenOrders,
    pub trade_form: TradeForm,
    pub settings: Settings,
}

impl SyncState {
    /// Initial state for a group. The BTC spot market is selected when the
    /// group lists one, otherwise the first configured market.
    pub fn new(config: GroupConfig) -> Result<Self, InputError> {
        let market = config
            .market_by_base_symbol_and_kind("BTC", MarketKind::Spot)
            .or_else(|| config.markets.first())
            .cloned()
            .ok_or_else(|| InputError::UnknownMarket {
                base: "BTC".to_string(),
                kind: MarketKind::Spot.to_string(),
            })?;

        Ok(Self {
            group: GroupSelection {
                config: Arc::new(config),
                loaded: None,
            },
            market: MarketSelection::new(market),
            accounts: AccountSelection::default(),
            wallet: WalletSession::default(),
            trade_history: TradeHistory::default(),
            open_orders: OpenOrders::default(),
            trade_form: TradeForm::default(),
            settings: Settings::default(),
        })
    }

    /// Check every cross-field invariant of the snapshot.
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        if self.accounts.initial_loading && self.accounts.current.is_some() {
            return Err(InvariantViolation::LoadingWithSelection);
        }
        if !self.wallet.connected && !self.wallet.token_balances.is_empty() {
            return Err(InvariantViolation::TokensWhileDisconnected);
        }
        if self
            .accounts
            .accounts
            .windows(2)
            .any(|w| w[0].address > w[1].address)
        {
            return Err(InvariantViolation::UnsortedAccounts);
        }
        if self.market.kind != self.market.config.kind {
            return Err(InvariantViolation::MarketKindMismatch {
                name: self.market.name.clone(),
                recorded: self.market.kind.to_string(),
                configured: self.market.config.kind.to_string(),
            });
        }
        Ok(())
    }

    /// Recompute values derived from other fields.
    pub(crate) fn refresh_derived(&mut self) {
        self.market.mark_price = self
            .group
            .cache()
            .and_then(|c| c.price(self.market.config.market_index));
        self.accounts.accrued_rewards = self
            .accounts
            .current
            .as_ref()
            .map(MarginAccount::accrued_rewards)
            .unwrap_or(0);
    }
}
