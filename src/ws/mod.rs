//! Push channel: JSON-RPC account subscriptions over WebSocket.
//!
//! [`subscriptions::WatchSet`] decides which addresses are watched and keeps
//! the last payload seen for each. The transport lives in `native.rs` behind
//! the `ws-native` feature. This module defines the shared message and event
//! types.

pub mod subscriptions;

#[cfg(feature = "ws-native")]
pub mod native;

use crate::connection::ConnectionContext;
use crate::shared::PubkeyStr;
use serde::{Deserialize, Serialize};

pub use subscriptions::{relevant_addresses, WatchSet};

// ─── Outbound messages ───────────────────────────────────────────────────────

/// A JSON-RPC request sent to the push endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessageOut {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: &'static str,
    pub params: serde_json::Value,
}

impl MessageOut {
    pub fn account_subscribe(id: u64, address: &PubkeyStr, commitment: &str) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            method: "accountSubscribe",
            params: serde_json::json!([
                address.as_str(),
                { "encoding": "base64", "commitment": commitment }
            ]),
        }
    }

    pub fn account_unsubscribe(id: u64, subscription: u64) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            method: "accountUnsubscribe",
            params: serde_json::json!([subscription]),
        }
    }
}

// ─── Inbound messages ────────────────────────────────────────────────────────

/// Raw inbound JSON-RPC message.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum MessageIn {
    Notification {
        method: String,
        params: NotificationParams,
    },
    Error {
        id: Option<u64>,
        error: RpcError,
    },
    Response {
        id: u64,
        result: serde_json::Value,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotificationParams {
    pub subscription: u64,
    pub result: AccountNotification,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AccountNotification {
    pub context: NotificationContext,
    pub value: AccountValue,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotificationContext {
    pub slot: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AccountValue {
    /// `[payload, encoding]`.
    pub data: (String, String),
    pub lamports: u64,
    pub owner: String,
}

// ─── PushEvent ───────────────────────────────────────────────────────────────

/// Events emitted by the push client to the consumer.
#[derive(Debug, Clone, PartialEq)]
pub enum PushEvent {
    Connected,
    Disconnected { code: Option<u16>, reason: String },
    /// A watched account changed.
    AccountUpdate {
        address: PubkeyStr,
        slot: u64,
        data: Vec<u8>,
    },
    Error(String),
    /// Reconnect attempts exhausted; the client has stopped.
    MaxReconnectReached,
}

// ─── ReadyState ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum ReadyState {
    Connecting = 0,
    Open = 1,
    Closing = 2,
    Closed = 3,
}

impl From<u16> for ReadyState {
    fn from(v: u16) -> Self {
        match v {
            0 => ReadyState::Connecting,
            1 => ReadyState::Open,
            2 => ReadyState::Closing,
            _ => ReadyState::Closed,
        }
    }
}

// ─── PushConfig ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct PushConfig {
    pub url: String,
    pub commitment: String,
    pub reconnect: bool,
    pub base_reconnect_delay_ms: u32,
    pub max_reconnect_attempts: u32,
    pub ping_interval_ms: u64,
    pub pong_timeout_ms: u64,
}

impl PushConfig {
    pub fn for_context(ctx: &ConnectionContext) -> Self {
        Self {
            url: ctx.push_endpoint().to_string(),
            ..Self::default()
        }
    }
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            url: ConnectionContext::global().push_endpoint().to_string(),
            commitment: "processed".to_string(),
            reconnect: true,
            base_reconnect_delay_ms: 1000,
            max_reconnect_attempts: 10,
            ping_interval_ms: 30_000,
            pong_timeout_ms: 10_000,
        }
    }
}
