//! Ledger REST client: `LedgerHttp`.
//!
//! Low-level methods return wire types, one per endpoint. The
//! [`RemoteClient`] impl at the bottom converts them into domain types.

use crate::domain::account::wire::{
    MarginAccountResponse, RedeemRewardsFailure, RedeemRewardsRequest, RedeemRewardsResponse,
};
use crate::domain::account::MarginAccount;
use crate::domain::group::wire::{CacheResponse, GroupResponse, RootBankResponse};
use crate::domain::group::{Cache, Group, RedeemBanks, RootBank};
use crate::domain::order::wire::OpenOrdersResponse;
use crate::domain::order::OpenOrder;
use crate::domain::trade::wire::TradeHistoryListResponse;
use crate::domain::trade::TradeHistoryEntry;
use crate::domain::wallet::wire::TokenAccountResponse;
use crate::domain::wallet::TokenAccount;
use crate::error::{HttpError, RemoteError, SyncError};
use crate::http::retry::RetryPolicy;
use crate::remote::{redeem_message, RemoteClient, WalletSigner};
use crate::shared::PubkeyStr;

use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

/// REST client for the ledger's read/submit API.
#[derive(Clone)]
pub struct LedgerHttp {
    base_url: String,
    client: Client,
}

impl LedgerHttp {
    pub fn new(base_url: &str) -> Result<Self, HttpError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .pool_max_idle_per_host(10)
            .build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // ── Group ────────────────────────────────────────────────────────────

    pub async fn fetch_group(&self, group: &str) -> Result<GroupResponse, HttpError> {
        let url = format!("{}/groups/{}", self.base_url, group);
        self.get(&url, RetryPolicy::Read).await
    }

    pub async fn fetch_root_banks(&self, group: &str) -> Result<Vec<RootBankResponse>, HttpError> {
        let url = format!("{}/groups/{}/root-banks", self.base_url, group);
        self.get(&url, RetryPolicy::Read).await
    }

    pub async fn fetch_cache(&self, group: &str) -> Result<CacheResponse, HttpError> {
        let url = format!("{}/groups/{}/cache", self.base_url, group);
        self.get(&url, RetryPolicy::Read).await
    }

    // ── Accounts ─────────────────────────────────────────────────────────

    pub async fn fetch_accounts_for_owner(
        &self,
        group: &str,
        owner: &str,
    ) -> Result<Vec<MarginAccountResponse>, HttpError> {
        let url = format!(
            "{}/groups/{}/accounts?owner={}",
            self.base_url,
            group,
            urlencoding::encode(owner)
        );
        self.get(&url, RetryPolicy::Read).await
    }

    pub async fn fetch_account(&self, address: &str) -> Result<MarginAccountResponse, HttpError> {
        let url = format!("{}/accounts/{}", self.base_url, address);
        self.get(&url, RetryPolicy::Read).await
    }

    pub async fn fetch_open_orders(&self, address: &str) -> Result<OpenOrdersResponse, HttpError> {
        let url = format!("{}/accounts/{}/open-orders", self.base_url, address);
        self.get(&url, RetryPolicy::Read).await
    }

    pub async fn fetch_trade_history(
        &self,
        address: &str,
    ) -> Result<TradeHistoryListResponse, HttpError> {
        let url = format!("{}/accounts/{}/trades", self.base_url, address);
        self.get(&url, RetryPolicy::Read).await
    }

    pub async fn redeem_rewards(
        &self,
        address: &str,
        body: &RedeemRewardsRequest,
    ) -> Result<RedeemRewardsResponse, HttpError> {
        let url = format!("{}/accounts/{}/redeem-rewards", self.base_url, address);
        self.post(&url, body, RetryPolicy::None).await
    }

    // ── Wallet ───────────────────────────────────────────────────────────

    pub async fn fetch_token_accounts(
        &self,
        owner: &str,
    ) -> Result<Vec<TokenAccountResponse>, HttpError> {
        let url = format!("{}/owners/{}/token-accounts", self.base_url, owner);
        self.get(&url, RetryPolicy::Read).await
    }

    // ── Internal HTTP methods ────────────────────────────────────────────

    async fn get<T: DeserializeOwned>(&self, url: &str, retry: RetryPolicy) -> Result<T, HttpError> {
        self.request_with_retry(reqwest::Method::GET, url, None::<&()>, retry)
            .await
    }

    async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        url: &str,
        body: &B,
        retry: RetryPolicy,
    ) -> Result<T, HttpError> {
        self.request_with_retry(reqwest::Method::POST, url, Some(body), retry)
            .await
    }

    async fn request_with_retry<T: DeserializeOwned, B: Serialize>(
        &self,
        method: reqwest::Method,
        url: &str,
        body: Option<&B>,
        retry: RetryPolicy,
    ) -> Result<T, HttpError> {
        let Some(config) = retry.config() else {
            return self.do_request(&method, url, body).await;
        };

        let mut attempt = 0;
        loop {
            let err = match self.do_request::<T, B>(&method, url, body).await {
                Ok(resp) => return Ok(resp),
                Err(e) => e,
            };

            if !config.should_retry(&err) {
                return Err(err);
            }
            if attempt >= config.max_retries {
                return Err(HttpError::MaxRetriesExceeded {
                    attempts: attempt + 1,
                    last_error: err.to_string(),
                });
            }

            let delay = match &err {
                HttpError::RateLimited {
                    retry_after_ms: Some(ms),
                } => Duration::from_millis(*ms),
                _ => config.delay_for_attempt(attempt),
            };
            tracing::debug!(
                attempt = attempt + 1,
                max = config.max_retries,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "Retrying request to {}",
                url
            );
            futures_timer::Delay::new(delay).await;
            attempt += 1;
        }
    }

    async fn do_request<T: DeserializeOwned, B: Serialize>(
        &self,
        method: &reqwest::Method,
        url: &str,
        body: Option<&B>,
    ) -> Result<T, HttpError> {
        let mut req = self.client.request(method.clone(), url);
        if let Some(b) = body {
            req = req.json(b);
        }

        let resp = req.send().await?;
        let status = resp.status();

        if status.is_success() {
            return Ok(resp.json::<T>().await?);
        }

        let retry_after_ms = resp
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok())
            .map(|secs| secs * 1000);
        let status_code = status.as_u16();
        let body_text = resp.text().await.unwrap_or_default();

        match status_code {
            401 | 403 => Err(HttpError::Unauthorized),
            404 => Err(HttpError::NotFound(body_text)),
            408 => Err(HttpError::Timeout),
            429 => Err(HttpError::RateLimited { retry_after_ms }),
            400..=499 => Err(HttpError::BadRequest(body_text)),
            _ => Err(HttpError::ServerError {
                status: status_code,
                body: body_text,
            }),
        }
    }
}

/// Map a read failure, turning 404 into [`RemoteError::NotFound`].
fn read_error(what: &str, err: HttpError) -> RemoteError {
    match err {
        HttpError::NotFound(_) => RemoteError::NotFound(what.to_string()),
        other => RemoteError::Http(other),
    }
}

/// Map a redemption failure, keeping the transaction id when the body has one.
fn redeem_error(err: HttpError) -> RemoteError {
    match err {
        HttpError::BadRequest(body) | HttpError::ServerError { body, .. } => {
            match serde_json::from_str::<RedeemRewardsFailure>(&body) {
                Ok(failure) => RemoteError::Transaction {
                    message: failure.message,
                    txid: failure.txid,
                },
                Err(_) => RemoteError::Rejected(body),
            }
        }
        other => RemoteError::Http(other),
    }
}

#[async_trait]
impl RemoteClient for LedgerHttp {
    async fn get_group(&self, group: &PubkeyStr) -> Result<Group, RemoteError> {
        let raw = self
            .fetch_group(group.as_str())
            .await
            .map_err(|e| read_error(group.as_str(), e))?;
        Ok(raw.into())
    }

    async fn load_root_banks(&self, group: &Group) -> Result<Vec<RootBank>, RemoteError> {
        self.fetch_root_banks(group.public_key.as_str())
            .await?
            .into_iter()
            .map(RootBank::try_from)
            .collect()
    }

    async fn load_cache(&self, group: &Group) -> Result<Cache, RemoteError> {
        Cache::try_from(self.fetch_cache(group.public_key.as_str()).await?)
    }

    async fn get_accounts_for_owner(
        &self,
        group: &Group,
        owner: &PubkeyStr,
    ) -> Result<Vec<MarginAccount>, RemoteError> {
        self.fetch_accounts_for_owner(group.public_key.as_str(), owner.as_str())
            .await?
            .into_iter()
            .map(MarginAccount::try_from)
            .collect()
    }

    async fn get_account_by_address(
        &self,
        address: &PubkeyStr,
    ) -> Result<MarginAccount, RemoteError> {
        let raw = self
            .fetch_account(address.as_str())
            .await
            .map_err(|e| read_error(address.as_str(), e))?;
        MarginAccount::try_from(raw)
    }

    async fn get_token_accounts_by_owner(
        &self,
        owner: &PubkeyStr,
    ) -> Result<Vec<TokenAccount>, RemoteError> {
        self.fetch_token_accounts(owner.as_str())
            .await?
            .into_iter()
            .map(TokenAccount::try_from)
            .collect()
    }

    async fn load_trade_history(
        &self,
        account: &PubkeyStr,
    ) -> Result<Vec<TradeHistoryEntry>, RemoteError> {
        self.fetch_trade_history(account.as_str())
            .await?
            .trades
            .into_iter()
            .map(TradeHistoryEntry::try_from)
            .collect()
    }

    async fn load_open_orders(
        &self,
        account: &MarginAccount,
    ) -> Result<Vec<OpenOrder>, RemoteError> {
        self.fetch_open_orders(account.address.as_str())
            .await?
            .orders
            .into_iter()
            .map(OpenOrder::try_from)
            .collect()
    }

    async fn submit_redeem(
        &self,
        group: &Group,
        account: &MarginAccount,
        signer: &dyn WalletSigner,
        banks: &RedeemBanks,
    ) -> Result<String, SyncError> {
        let message = redeem_message(group, account, banks);
        let signature = signer.sign_message(&message).await?;

        let body = RedeemRewardsRequest {
            group: group.public_key.to_string(),
            owner: signer.public_key().to_string(),
            root_bank: banks.root_bank.to_string(),
            node_bank: banks.node_bank.to_string(),
            vault: banks.vault.to_string(),
            message: base64::engine::general_purpose::STANDARD.encode(&message),
            signature: signature.to_string(),
        };

        let resp = self
            .redeem_rewards(account.address.as_str(), &body)
            .await
            .map_err(redeem_error)?;
        Ok(resp.txid)
    }
}
