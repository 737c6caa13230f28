//! End-to-end flows through `SyncClient` against an in-memory ledger.
//!
//! The fake ledger implements `RemoteClient` with scripted failures and
//! gates, so ordering and staleness behavior can be driven deterministically.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use futures_util::StreamExt;
use rust_decimal::Decimal;
use tokio::sync::Notify;

use mango_sync::chat::{ChatChannel, ChatIdentity, OpenedChannel};
use mango_sync::domain::group::{GroupToken, NodeBank, RedeemBanks};
use mango_sync::error::ChatError;
use mango_sync::network::{ACCOUNT_ROUTE, DEFAULT_ROUTE};
use mango_sync::prelude::*;

// ─── Fixtures ────────────────────────────────────────────────────────────────

struct Keys {
    group: PubkeyStr,
    btc_mint: PubkeyStr,
    mngo_mint: PubkeyStr,
    usdc_mint: PubkeyStr,
}

fn unique() -> PubkeyStr {
    PubkeyStr::from(solana_pubkey::Pubkey::new_unique())
}

fn keys() -> Keys {
    Keys {
        group: unique(),
        btc_mint: unique(),
        mngo_mint: unique(),
        usdc_mint: unique(),
    }
}

fn ids_json(k: &Keys) -> String {
    format!(
        r#"{{
            "cluster": "devnet",
            "name": "merps_test_v1",
            "publicKey": "{group}",
            "quoteSymbol": "USDC",
            "mangoProgramId": "{program}",
            "tokens": [
                {{"symbol": "BTC", "mintKey": "{btc}", "decimals": 6, "rootKey": "BTCroot"}},
                {{"symbol": "MNGO", "mintKey": "{mngo}", "decimals": 6, "rootKey": "MNGOroot"}},
                {{"symbol": "USDC", "mintKey": "{usdc}", "decimals": 6, "rootKey": "USDCroot"}}
            ],
            "perpMarkets": [
                {{"name": "BTC-PERP", "publicKey": "{p1}", "baseSymbol": "BTC", "marketIndex": 0, "bidsKey": "{p2}", "asksKey": "{p3}"}}
            ],
            "spotMarkets": [
                {{"name": "BTC/USDC", "publicKey": "{s1}", "baseSymbol": "BTC", "marketIndex": 0, "bidsKey": "{s2}", "asksKey": "{s3}"}},
                {{"name": "MNGO/USDC", "publicKey": "{m1}", "baseSymbol": "MNGO", "marketIndex": 1, "bidsKey": "{m2}", "asksKey": "{m3}"}}
            ]
        }}"#,
        group = k.group,
        program = unique(),
        btc = k.btc_mint,
        mngo = k.mngo_mint,
        usdc = k.usdc_mint,
        p1 = unique(),
        p2 = unique(),
        p3 = unique(),
        s1 = unique(),
        s2 = unique(),
        s3 = unique(),
        m1 = unique(),
        m2 = unique(),
        m3 = unique(),
    )
}

fn margin_account(address: &PubkeyStr, owner: &PubkeyStr, group: &PubkeyStr, rewards: u64) -> MarginAccount {
    MarginAccount {
        address: address.clone(),
        owner: owner.clone(),
        group: group.clone(),
        perp_accounts: vec![PerpAccount {
            market_index: 0,
            base_position: 1,
            quote_position: Decimal::new(-100, 0),
            rewards_accrued: rewards,
        }],
        open_orders_accounts: vec![],
        health: None,
    }
}

/// Two addresses with `lo < hi` in base58 order.
fn ordered_pair() -> (PubkeyStr, PubkeyStr) {
    let (a, b) = (unique(), unique());
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

fn trade(market: &str) -> TradeHistoryEntry {
    TradeHistoryEntry {
        market_name: market.to_string(),
        side: Side::Buy,
        size: Decimal::ONE,
        price: Decimal::new(50_000, 0),
        liquidity: LiquidityRole::Taker,
        fee_cost: Decimal::new(2, 1),
        timestamp: Some(Utc::now()),
        order_id: "1".into(),
    }
}

// ─── Fake ledger ─────────────────────────────────────────────────────────────

#[derive(Default)]
struct FakeLedger {
    group_key: PubkeyStr,
    mints: Vec<PubkeyStr>,
    prices: Mutex<Vec<Decimal>>,
    fail_cache: AtomicBool,
    accounts: Mutex<HashMap<PubkeyStr, MarginAccount>>,
    token_accounts: Mutex<Vec<TokenAccount>>,
    history: Mutex<HashMap<PubkeyStr, Vec<TradeHistoryEntry>>>,
    /// History reads for this account wait for `release`.
    hold_history_for: Mutex<Option<PubkeyStr>>,
    release: Notify,
    /// Account reads for this address wait for `account_release`.
    hold_account_for: Mutex<Option<PubkeyStr>>,
    account_release: Notify,
    redeem_calls: AtomicUsize,
    redeem_failure: Mutex<Option<(String, Option<String>)>>,
    redeemed_banks: Mutex<Vec<RedeemBanks>>,
    unavailable: AtomicBool,
}

impl FakeLedger {
    fn new(k: &Keys) -> Self {
        Self {
            group_key: k.group.clone(),
            mints: vec![k.btc_mint.clone(), k.mngo_mint.clone(), k.usdc_mint.clone()],
            prices: Mutex::new(vec![Decimal::new(5_000_012_345, 5), Decimal::new(25, 2)]),
            ..Default::default()
        }
    }

    fn insert(&self, account: MarginAccount) {
        self.accounts
            .lock()
            .unwrap()
            .insert(account.address.clone(), account);
    }

    fn check_up(&self) -> Result<(), RemoteError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(RemoteError::Rejected("service unavailable".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteClient for FakeLedger {
    async fn get_group(&self, group: &PubkeyStr) -> Result<Group, RemoteError> {
        self.check_up()?;
        assert_eq!(group, &self.group_key);
        let roots = ["BTCroot", "MNGOroot", "USDCroot"];
        Ok(Group {
            public_key: self.group_key.clone(),
            tokens: self
                .mints
                .iter()
                .zip(roots)
                .map(|(mint, root)| GroupToken {
                    mint: mint.clone(),
                    root_bank: PubkeyStr::new(root),
                    decimals: 6,
                })
                .collect(),
        })
    }

    async fn load_root_banks(&self, group: &Group) -> Result<Vec<RootBank>, RemoteError> {
        Ok(group
            .tokens
            .iter()
            .map(|t| RootBank {
                public_key: t.root_bank.clone(),
                node_banks: vec![NodeBank {
                    public_key: PubkeyStr::new(&format!("{}-node", t.root_bank)),
                    vault: PubkeyStr::new(&format!("{}-vault", t.root_bank)),
                }],
                deposit_index: Decimal::ONE,
                borrow_index: Decimal::ONE,
            })
            .collect())
    }

    async fn load_cache(&self, _group: &Group) -> Result<Cache, RemoteError> {
        tokio::task::yield_now().await;
        if self.fail_cache.load(Ordering::SeqCst) {
            return Err(RemoteError::Rejected("cache account unavailable".into()));
        }
        Ok(Cache {
            prices: self.prices.lock().unwrap().clone(),
            updated_at: Utc::now(),
        })
    }

    async fn get_accounts_for_owner(
        &self,
        _group: &Group,
        owner: &PubkeyStr,
    ) -> Result<Vec<MarginAccount>, RemoteError> {
        self.check_up()?;
        // Remote order is deliberately reversed.
        let mut owned: Vec<_> = self
            .accounts
            .lock()
            .unwrap()
            .values()
            .filter(|a| &a.owner == owner)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.address.cmp(&a.address));
        Ok(owned)
    }

    async fn get_account_by_address(
        &self,
        address: &PubkeyStr,
    ) -> Result<MarginAccount, RemoteError> {
        self.check_up()?;
        let held = self.hold_account_for.lock().unwrap().as_ref() == Some(address);
        if held {
            self.account_release.notified().await;
        }
        self.accounts
            .lock()
            .unwrap()
            .get(address)
            .cloned()
            .ok_or_else(|| RemoteError::NotFound(address.to_string()))
    }

    async fn get_token_accounts_by_owner(
        &self,
        owner: &PubkeyStr,
    ) -> Result<Vec<TokenAccount>, RemoteError> {
        Ok(self
            .token_accounts
            .lock()
            .unwrap()
            .iter()
            .filter(|t| &t.owner == owner)
            .cloned()
            .collect())
    }

    async fn load_trade_history(
        &self,
        account: &PubkeyStr,
    ) -> Result<Vec<TradeHistoryEntry>, RemoteError> {
        let held = self.hold_history_for.lock().unwrap().as_ref() == Some(account);
        if held {
            self.release.notified().await;
        }
        Ok(self
            .history
            .lock()
            .unwrap()
            .get(account)
            .cloned()
            .unwrap_or_default())
    }

    async fn load_open_orders(&self, _account: &MarginAccount) -> Result<Vec<OpenOrder>, RemoteError> {
        Ok(vec![])
    }

    async fn submit_redeem(
        &self,
        _group: &Group,
        account: &MarginAccount,
        signer: &dyn WalletSigner,
        banks: &RedeemBanks,
    ) -> Result<String, SyncError> {
        self.redeem_calls.fetch_add(1, Ordering::SeqCst);
        signer.sign_message(account.address.as_str().as_bytes()).await?;
        self.redeemed_banks.lock().unwrap().push(banks.clone());
        tokio::task::yield_now().await;

        if let Some((message, txid)) = self.redeem_failure.lock().unwrap().clone() {
            return Err(RemoteError::Transaction { message, txid }.into());
        }
        if let Some(stored) = self.accounts.lock().unwrap().get_mut(&account.address) {
            for perp in &mut stored.perp_accounts {
                perp.rewards_accrued = 0;
            }
        }
        Ok("5xRedeemTx".to_string())
    }
}

struct Harness {
    keys: Keys,
    ledger: Arc<FakeLedger>,
    client: SyncClient,
    signer: Arc<KeypairSigner>,
}

impl Harness {
    fn new() -> Self {
        let keys = keys();
        let ledger = Arc::new(FakeLedger::new(&keys));
        let config = GroupConfig::from_json(&ids_json(&keys)).unwrap();
        let client = SyncClient::builder()
            .connection(ConnectionContext::for_cluster(Cluster::Devnet))
            .group_config(config)
            .remote(ledger.clone())
            .chat_session(Arc::new(ChatSession::new()))
            .build()
            .unwrap();
        Self {
            keys,
            ledger,
            client,
            signer: Arc::new(KeypairSigner::from_seed([11u8; 32])),
        }
    }

    fn owner(&self) -> PubkeyStr {
        self.signer.public_key()
    }

    async fn connect(&self) {
        self.client
            .actions()
            .connect_wallet(
                "phantom",
                self.owner(),
                Some(self.signer.clone() as Arc<dyn WalletSigner>),
            )
            .await;
    }

    /// Connected wallet, loaded group, and two owned accounts.
    async fn with_accounts(&self, rewards: u64) -> (PubkeyStr, PubkeyStr) {
        let (lo, hi) = ordered_pair();
        self.ledger
            .insert(margin_account(&lo, &self.owner(), &self.keys.group, rewards));
        self.ledger
            .insert(margin_account(&hi, &self.owner(), &self.keys.group, rewards));
        self.connect().await;
        assert_eq!(self.client.actions().fetch_group().await, RefreshOutcome::Published);
        assert_eq!(
            self.client.actions().fetch_accounts_for_owner().await,
            RefreshOutcome::Published
        );
        (lo, hi)
    }
}

// ─── Route resolution ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_route_selects_perp_market_once() {
    let h = Harness::new();
    let before = h.client.store().version();

    let first = h.client.routes().resolve_path("/?name=BTC-PERP").await;
    assert_eq!(first.market, MarketResolution::Selected("BTC-PERP".into()));
    let state = h.client.snapshot().await;
    assert_eq!(state.market.name, "BTC-PERP");
    assert_eq!(state.market.kind, MarketKind::Perpetual);

    let second = h.client.routes().resolve_path("/?name=BTC-PERP").await;
    assert_eq!(second.market, MarketResolution::Unchanged);
    assert_eq!(h.client.store().version(), before + 1);
}

#[tokio::test]
async fn test_route_unknown_market_redirects_home() {
    let h = Harness::new();
    let before = h.client.snapshot().await;

    let outcome = h.client.routes().resolve_path("/?name=ZZZ-PERP").await;
    assert_eq!(outcome.redirect(), Some(DEFAULT_ROUTE));
    let after = h.client.snapshot().await;
    assert_eq!(after.market, before.market);

    // A token without a kind segment also redirects.
    let outcome = h.client.routes().resolve_path("/?name=BTC").await;
    assert_eq!(outcome.redirect(), Some(DEFAULT_ROUTE));
    assert!(h.client.notifications().is_empty().await);
}

#[tokio::test]
async fn test_route_seeds_limit_price_from_cache() {
    let h = Harness::new();
    h.client.actions().fetch_group().await;
    h.client.routes().resolve_path("/?name=MNGO%2FUSDC").await;

    let state = h.client.snapshot().await;
    assert_eq!(state.market.name, "MNGO/USDC");
    assert_eq!(state.market.mark_price, Some(Decimal::new(25, 2)));
    assert_eq!(state.trade_form.price, Some(Decimal::new(25, 2)));

    // A user-entered price is never overwritten.
    h.client
        .actions()
        .set_trade_price(Some(Decimal::new(3, 1)))
        .await;
    h.client.routes().resolve_path("/?name=BTC-PERP").await;
    assert_eq!(
        h.client.snapshot().await.trade_form.price,
        Some(Decimal::new(3, 1))
    );
}

#[tokio::test]
async fn test_route_invalid_address_redirects_without_touching_accounts() {
    let h = Harness::new();
    let (lo, _) = h.with_accounts(0).await;
    let before = h.client.snapshot().await.accounts.clone();

    let outcome = h.client.routes().resolve_path("/?pubkey=not-a-key").await;
    assert_eq!(outcome.account, AccountResolution::Redirect(ACCOUNT_ROUTE));
    assert_eq!(outcome.redirect(), Some(ACCOUNT_ROUTE));
    let after = h.client.snapshot().await;
    assert_eq!(after.accounts, before);
    assert_eq!(after.accounts.current_address(), Some(&lo));
}

#[tokio::test]
async fn test_route_observes_foreign_account() {
    let h = Harness::new();
    let foreign = unique();
    h.ledger
        .insert(margin_account(&foreign, &unique(), &h.keys.group, 7));
    h.ledger
        .history
        .lock()
        .unwrap()
        .insert(foreign.clone(), vec![trade("BTC-PERP")]);
    h.client.actions().fetch_group().await;

    let route = Route::default().with_market("BTC-PERP").with_account(foreign.as_str());
    let outcome = h.client.routes().resolve(&route).await;
    assert_eq!(outcome.market, MarketResolution::Selected("BTC-PERP".into()));
    assert_eq!(outcome.account, AccountResolution::Observed(foreign.clone()));

    let state = h.client.snapshot().await;
    assert_eq!(state.accounts.current_address(), Some(&foreign));
    assert_eq!(state.accounts.mode, AccountMode::Observer);
    assert_eq!(state.accounts.accrued_rewards, 7);
    assert_eq!(state.trade_history.len(), 1);

    // Same route again does nothing.
    let version = h.client.store().version();
    let again = h.client.routes().resolve(&route).await;
    assert_eq!(again.account, AccountResolution::Unchanged);
    assert_eq!(h.client.store().version(), version);
}

#[tokio::test]
async fn test_slow_observed_account_does_not_replace_newer_route() {
    let h = Harness::new();
    h.client.actions().fetch_group().await;
    let (older, newer) = (unique(), unique());
    h.ledger
        .insert(margin_account(&older, &unique(), &h.keys.group, 1));
    h.ledger
        .insert(margin_account(&newer, &unique(), &h.keys.group, 2));
    *h.ledger.hold_account_for.lock().unwrap() = Some(older.clone());

    let routes = h.client.routes();
    let older_path = format!("/?pubkey={}", older);
    let (first, second) = tokio::join!(
        routes.resolve_path(&older_path),
        async {
            let outcome = routes.resolve_path(&format!("/?pubkey={}", newer)).await;
            h.ledger.account_release.notify_one();
            outcome
        }
    );

    assert_eq!(second.account, AccountResolution::Observed(newer.clone()));
    assert_eq!(first.account, AccountResolution::Superseded);
    let state = h.client.snapshot().await;
    assert_eq!(state.accounts.current_address(), Some(&newer));
    assert_eq!(state.accounts.accrued_rewards, 2);
}

#[tokio::test]
async fn test_route_passes_commute() {
    async fn resolve(account_first: bool) -> (String, AccountMode, bool, Option<Decimal>, usize) {
        let h = Harness::new();
        let foreign = unique();
        h.ledger
            .insert(margin_account(&foreign, &unique(), &h.keys.group, 3));
        h.ledger
            .history
            .lock()
            .unwrap()
            .insert(foreign.clone(), vec![trade("MNGO/USDC")]);
        h.client.actions().fetch_group().await;

        let routes = h.client.routes();
        if account_first {
            routes.resolve_account(Some(foreign.as_str())).await;
            routes.resolve_market(Some("MNGO/USDC")).await;
        } else {
            routes.resolve_market(Some("MNGO/USDC")).await;
            routes.resolve_account(Some(foreign.as_str())).await;
        }

        let state = h.client.snapshot().await;
        (
            state.market.name.clone(),
            state.accounts.mode,
            state.accounts.current_address() == Some(&foreign),
            state.trade_form.price,
            state.trade_history.len(),
        )
    }

    let account_then_market = resolve(true).await;
    let market_then_account = resolve(false).await;
    assert_eq!(account_then_market, market_then_account);
    assert_eq!(
        account_then_market,
        ("MNGO/USDC".to_string(), AccountMode::Observer, true, Some(Decimal::new(25, 2)), 1)
    );
}

#[tokio::test]
async fn test_route_missing_account_redirects_and_remote_failure_notifies() {
    let h = Harness::new();
    h.client.actions().fetch_group().await;

    let missing = unique();
    let outcome = h
        .client
        .routes()
        .resolve_path(&format!("/?pubkey={}", missing))
        .await;
    assert_eq!(outcome.account, AccountResolution::Redirect(ACCOUNT_ROUTE));
    assert!(h.client.notifications().is_empty().await);

    h.ledger.unavailable.store(true, Ordering::SeqCst);
    let outcome = h
        .client
        .routes()
        .resolve_path(&format!("/?pubkey={}", missing))
        .await;
    assert_eq!(outcome.account, AccountResolution::Failed);
    let last = h.client.notifications().last().await.unwrap();
    assert_eq!(last.kind, NotificationKind::Error);
}

#[tokio::test]
async fn test_route_account_deferred_until_group_loads() {
    let h = Harness::new();
    let outcome = h
        .client
        .routes()
        .resolve_path(&format!("/?pubkey={}", unique()))
        .await;
    assert_eq!(outcome.account, AccountResolution::Deferred);
    assert!(outcome.redirect().is_none());
}

// ─── Group ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_failed_cache_keeps_previous_group_triple() {
    let h = Harness::new();
    assert_eq!(h.client.actions().fetch_group().await, RefreshOutcome::Published);
    let first = h.client.snapshot().await.group.loaded.clone().unwrap();

    *h.ledger.prices.lock().unwrap() = vec![Decimal::new(1, 0), Decimal::new(2, 0)];
    h.ledger.fail_cache.store(true, Ordering::SeqCst);
    assert_eq!(h.client.actions().fetch_group().await, RefreshOutcome::Failed);

    let state = h.client.snapshot().await;
    assert_eq!(state.group.loaded.as_ref(), Some(&first));
    let last = h.client.notifications().last().await.unwrap();
    assert_eq!(last.title, "Could not get mango group");
}

#[tokio::test]
async fn test_group_never_published_partially() {
    let h = Harness::new();
    h.ledger.fail_cache.store(true, Ordering::SeqCst);
    assert_eq!(h.client.actions().fetch_group().await, RefreshOutcome::Failed);
    let state = h.client.snapshot().await;
    assert!(state.group.loaded.is_none());
    assert!(state.market.mark_price.is_none());
}

// ─── Accounts ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_accounts_sorted_and_first_selected() {
    let h = Harness::new();
    let (lo, hi) = h.with_accounts(0).await;

    let state = h.client.snapshot().await;
    let listed: Vec<_> = state.accounts.accounts.iter().map(|a| a.address.clone()).collect();
    assert_eq!(listed, vec![lo.clone(), hi]);
    assert_eq!(state.accounts.current_address(), Some(&lo));
    assert!(!state.accounts.initial_loading);
}

#[tokio::test]
async fn test_selection_preserved_across_refresh() {
    let h = Harness::new();
    let (_, hi) = h.with_accounts(0).await;
    assert_eq!(
        h.client.actions().select_account(&hi).await,
        RefreshOutcome::Published
    );

    h.client.actions().fetch_accounts_for_owner().await;
    let state = h.client.snapshot().await;
    assert_eq!(state.accounts.current_address(), Some(&hi));
}

#[tokio::test]
async fn test_accounts_need_signing_wallet() {
    let h = Harness::new();
    h.client.actions().fetch_group().await;
    h.client
        .actions()
        .connect_wallet("ledger", h.owner(), None)
        .await;
    assert_eq!(
        h.client.actions().fetch_accounts_for_owner().await,
        RefreshOutcome::Skipped
    );
    assert!(!h.client.snapshot().await.accounts.initial_loading);
}

#[tokio::test]
async fn test_account_fetch_failure_clears_loading_and_notifies() {
    let h = Harness::new();
    h.connect().await;
    h.client.actions().fetch_group().await;
    h.ledger.unavailable.store(true, Ordering::SeqCst);

    assert_eq!(
        h.client.actions().fetch_accounts_for_owner().await,
        RefreshOutcome::Failed
    );
    let state = h.client.snapshot().await;
    assert!(!state.accounts.initial_loading);
    assert!(state.accounts.current.is_none());
    assert_eq!(
        h.client.notifications().last().await.unwrap().kind,
        NotificationKind::Error
    );
}

#[tokio::test]
async fn test_slow_history_for_previous_account_is_discarded() {
    let h = Harness::new();
    let (lo, hi) = h.with_accounts(0).await;
    h.ledger
        .history
        .lock()
        .unwrap()
        .insert(lo.clone(), vec![trade("BTC-PERP"), trade("BTC-PERP")]);
    h.ledger
        .history
        .lock()
        .unwrap()
        .insert(hi.clone(), vec![trade("MNGO/USDC")]);
    *h.ledger.hold_history_for.lock().unwrap() = Some(lo.clone());

    let actions = h.client.actions();
    let (slow, _) = tokio::join!(actions.fetch_trade_history(), async {
        actions.select_account(&hi).await;
        h.ledger.release.notify_one();
    });

    assert_eq!(slow, RefreshOutcome::Stale);
    let state = h.client.snapshot().await;
    assert_eq!(state.accounts.current_address(), Some(&hi));
    assert_eq!(state.trade_history.len(), 1);
    assert_eq!(state.trade_history.entries()[0].market_name, "MNGO/USDC");
}

// ─── Wallet tokens ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_wallet_tokens_follow_session() {
    let h = Harness::new();
    assert_eq!(
        h.client.actions().fetch_wallet_tokens().await,
        RefreshOutcome::Skipped
    );

    h.ledger.token_accounts.lock().unwrap().extend([
        TokenAccount {
            address: unique(),
            mint: h.keys.usdc_mint.clone(),
            owner: h.owner(),
            amount: 12_500_000,
        },
        TokenAccount {
            address: unique(),
            mint: unique(),
            owner: h.owner(),
            amount: 99,
        },
    ]);
    h.connect().await;
    assert_eq!(
        h.client.actions().fetch_wallet_tokens().await,
        RefreshOutcome::Published
    );
    let state = h.client.snapshot().await;
    let usdc = state.wallet.balance("USDC").unwrap();
    assert_eq!(usdc.ui_amount, Decimal::new(125, 1));
    assert_eq!(state.wallet.token_balances.len(), 1);

    h.client.actions().disconnect_wallet().await;
    assert!(h.client.snapshot().await.wallet.token_balances.is_empty());
}

// ─── Rewards ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_redeem_is_noop_without_rewards() {
    let h = Harness::new();
    h.with_accounts(0).await;
    assert_eq!(
        h.client.actions().redeem_rewards().await,
        RedeemOutcome::NothingToRedeem
    );
    assert_eq!(h.ledger.redeem_calls.load(Ordering::SeqCst), 0);
    assert!(h.client.notifications().is_empty().await);
}

#[tokio::test]
async fn test_redeem_is_single_flight() {
    let h = Harness::new();
    h.with_accounts(500).await;

    let actions = h.client.actions();
    let (a, b) = tokio::join!(actions.redeem_rewards(), actions.redeem_rewards());
    let outcomes = [a, b];
    assert_eq!(h.ledger.redeem_calls.load(Ordering::SeqCst), 1);
    assert!(outcomes.contains(&RedeemOutcome::AlreadyPending));
    assert!(outcomes.contains(&RedeemOutcome::Submitted {
        txid: "5xRedeemTx".into()
    }));

    let banks = h.ledger.redeemed_banks.lock().unwrap()[0].clone();
    assert_eq!(banks.root_bank.as_str(), "MNGOroot");
    assert_eq!(banks.node_bank.as_str(), "MNGOroot-node");
    assert_eq!(banks.vault.as_str(), "MNGOroot-vault");

    let success = h.client.notifications().last().await.unwrap();
    assert_eq!(success.kind, NotificationKind::Success);
    assert_eq!(success.title, "Successfully redeemed MNGO");
    assert_eq!(success.correlation_id.as_deref(), Some("5xRedeemTx"));

    // The account refresh picked up the zeroed rewards.
    assert_eq!(h.client.snapshot().await.accounts.accrued_rewards, 0);

    // The guard is released afterwards.
    assert_eq!(
        h.client.actions().redeem_rewards().await,
        RedeemOutcome::NothingToRedeem
    );
}

#[tokio::test]
async fn test_redeem_failure_carries_txid() {
    let h = Harness::new();
    h.with_accounts(500).await;
    *h.ledger.redeem_failure.lock().unwrap() =
        Some(("Transaction timed out".into(), Some("3yPartial".into())));

    let outcome = h.client.actions().redeem_rewards().await;
    assert_eq!(
        outcome,
        RedeemOutcome::Failed {
            message: "Transaction timed out".into(),
            txid: Some("3yPartial".into()),
        }
    );
    let event = h.client.notifications().last().await.unwrap();
    assert_eq!(event.kind, NotificationKind::Error);
    assert_eq!(event.title, "Error redeeming MNGO");
    assert_eq!(event.description.as_deref(), Some("Transaction timed out"));
    assert_eq!(event.correlation_id.as_deref(), Some("3yPartial"));
    assert_eq!(h.client.snapshot().await.accounts.accrued_rewards, 500);
}

// ─── Chat ────────────────────────────────────────────────────────────────────

struct NullChannel;

#[async_trait]
impl ChatChannel for NullChannel {
    async fn send(&self, _text: &str) -> Result<(), ChatError> {
        Ok(())
    }
}

struct OneMessageTransport;

#[async_trait]
impl ChatTransport for OneMessageTransport {
    async fn open(
        &self,
        identity: &ChatIdentity,
        _peer: &str,
        _topic: &str,
    ) -> Result<OpenedChannel, ChatError> {
        let message = ChatMessage {
            time: Utc::now(),
            sender: identity.public_key(),
            text: "gm".into(),
        };
        Ok(OpenedChannel {
            channel: Box::new(NullChannel),
            incoming: futures_util::stream::iter(vec![message]).boxed(),
        })
    }
}

#[tokio::test]
async fn test_chat_starts_once_wallet_can_sign() {
    let h = Harness::new();
    let transport = OneMessageTransport;

    let state = h.client.chat().ensure_started(&transport).await;
    assert!(matches!(state, ChatSessionState::Unstarted));

    h.connect().await;
    let chat = h.client.chat();
    let (a, b) = tokio::join!(chat.ensure_started(&transport), chat.ensure_started(&transport));
    assert!(a.is_ready() || b.is_ready());
    assert!(h.client.chat().state().is_ready());

    let handle = h.client.chat().handle().unwrap();
    handle.send("hello").await.unwrap();
    let received: Vec<_> = handle.listen().unwrap().collect().await;
    assert_eq!(received.len(), 1);
    assert_eq!(h.client.chat().log().len().await, 1);
    assert_eq!(received[0].short_sender().len(), 6);
}

struct DecliningSigner(PubkeyStr);

#[async_trait]
impl WalletSigner for DecliningSigner {
    fn public_key(&self) -> PubkeyStr {
        self.0.clone()
    }

    async fn sign_message(
        &self,
        _message: &[u8],
    ) -> Result<solana_signature::Signature, SyncError> {
        Err(SyncError::SigningRejected("user declined".into()))
    }
}

#[tokio::test]
async fn test_declined_chat_signature_notifies_once() {
    let h = Harness::new();
    let owner = unique();
    h.client
        .actions()
        .connect_wallet(
            "phantom",
            owner.clone(),
            Some(Arc::new(DecliningSigner(owner)) as Arc<dyn WalletSigner>),
        )
        .await;

    let transport = OneMessageTransport;
    let state = h.client.chat().ensure_started(&transport).await;
    assert_eq!(state.name(), "failed");
    let again = h.client.chat().ensure_started(&transport).await;
    assert_eq!(again.name(), "failed");

    let failures: Vec<_> = h
        .client
        .notifications()
        .snapshot()
        .await
        .into_iter()
        .filter(|e| e.title == "Could not start chat")
        .collect();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].kind, NotificationKind::Error);
    assert!(failures[0].description.as_deref().unwrap().contains("declined"));
}

#[tokio::test]
async fn test_owner_change_drops_previous_accounts() {
    let h = Harness::new();
    h.with_accounts(500).await;

    let other = KeypairSigner::from_seed([12u8; 32]);
    h.client
        .actions()
        .connect_wallet(
            "phantom",
            other.public_key(),
            Some(Arc::new(other) as Arc<dyn WalletSigner>),
        )
        .await;

    let state = h.client.snapshot().await;
    assert!(state.accounts.accounts.is_empty());
    assert!(state.accounts.current.is_none());
    assert_eq!(
        h.client.actions().redeem_rewards().await,
        RedeemOutcome::NothingToRedeem
    );
    assert_eq!(h.ledger.redeem_calls.load(Ordering::SeqCst), 0);
}
