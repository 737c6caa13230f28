//! # Mango sync
//!
//! Client-side state synchronization for the Mango trading dashboard: one
//! canonical in-memory snapshot of the selected group, market and margin
//! account, kept in step with the remote ledger.
//!
//! ## Architecture
//!
//! The crate is organized in layers:
//!
//! 1. **Core**: Connection context, errors, domain models (always available)
//! 2. **Store**: `SelectionStore`: immutable snapshots, named transitions, invariant checks
//! 3. **Remote**: `RemoteClient` facade trait, `LedgerHttp` adapter, push subscriptions
//! 4. **Orchestration**: refresh actions, route resolution, notifications, chat side-channel
//! 5. **High-Level Client**: `SyncClient` with nested sub-clients
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use mango_sync::prelude::*;
//!
//! let client = SyncClient::builder()
//!     .group_config(GroupConfig::from_json(IDS_JSON)?)
//!     .build()?;
//!
//! client.actions().fetch_group().await;
//! let outcome = client.routes().resolve_path("/?name=BTC-PERP").await;
//! let state = client.snapshot().await;
//! ```

// ── Layer 1: Core ────────────────────────────────────────────────────────────

/// Shared newtypes used across all domains.
pub mod shared;

/// Domain modules (vertical slices): types, wire types, conversions, state.
pub mod domain;

/// Error taxonomy.
pub mod error;

/// Cluster endpoints and well-known routes.
pub mod network;

/// Connection context for the request and push channels.
pub mod connection;

/// `tracing` subscriber setup.
pub mod logging;

// ── Layer 2: Store ───────────────────────────────────────────────────────────

/// Selection store: snapshots and transitions.
pub mod store;

// ── Layer 3: Remote ──────────────────────────────────────────────────────────

/// Remote facade and wallet signer traits.
pub mod remote;

/// HTTP implementation of the remote facade with retry policies.
#[cfg(feature = "http")]
pub mod http;

/// Push channel: account subscriptions and events.
pub mod ws;

// ── Layer 4: Orchestration ───────────────────────────────────────────────────

/// Refresh actions.
pub mod actions;

/// Route resolution.
pub mod route;

/// User-facing outcome events.
pub mod notifications;

/// Messaging side-channel with one-shot initialization.
pub mod chat;

// ── Layer 5: High-Level Client ───────────────────────────────────────────────

/// `SyncClient`: the primary entry point.
pub mod client;

// ── Prelude ──────────────────────────────────────────────────────────────────

pub mod prelude {
    // Shared newtypes
    pub use crate::shared::{MarketKind, PubkeyStr, Side};

    // Connection
    pub use crate::connection::{Cluster, ConnectionContext};

    // Domain types
    pub use crate::domain::account::{AccountHealth, MarginAccount, PerpAccount};
    pub use crate::domain::group::{Cache, Group, GroupConfig, LoadedGroup, RootBank};
    pub use crate::domain::market::{MarketConfig, MarketToken};
    pub use crate::domain::order::{OpenOrder, OpenOrders};
    pub use crate::domain::orderbook::{OrderBook, OrderbookSnapshot};
    pub use crate::domain::trade::{LiquidityRole, TradeHistory, TradeHistoryEntry};
    pub use crate::domain::wallet::{TokenAccount, WalletSession, WalletToken};

    // Store
    pub use crate::store::{
        AccountMode, SelectionStore, SyncState, TradeType, Transition, UpdateOutcome,
    };

    // Errors
    pub use crate::error::{InputError, InvariantViolation, RemoteError, SyncError};

    // Remote facade
    pub use crate::remote::{KeypairSigner, RemoteClient, WalletSigner};
    #[cfg(feature = "http")]
    pub use crate::http::{LedgerHttp, RetryConfig, RetryPolicy};

    // Orchestration
    pub use crate::actions::{RedeemOutcome, RefreshOutcome};
    pub use crate::chat::{ChatHandle, ChatMessage, ChatSession, ChatSessionState, ChatTransport};
    pub use crate::notifications::{NotificationEvent, NotificationKind, NotificationLog};
    pub use crate::route::{AccountResolution, MarketResolution, Route, RouteOutcome};

    // Push channel
    pub use crate::ws::{PushConfig, PushEvent, WatchSet};

    // Client + sub-clients
    pub use crate::client::{ActionsClient, ChatClient, RoutesClient, SyncClient, SyncClientBuilder};
}
