//! High-level client: `SyncClient` with nested sub-client accessors.
//!
//! The client owns the selection store, the notification log and the remote
//! facade. Refresh actions, route resolution and the chat side-channel are
//! reached through short-lived accessors borrowing the client.

use crate::actions::Actions;
use crate::chat::client::Chat;
use crate::chat::ChatSession;
use crate::connection::ConnectionContext;
use crate::domain::group::GroupConfig;
use crate::error::{RemoteError, SyncError};
use crate::notifications::{NotificationEvent, NotificationLog};
use crate::remote::{RemoteClient, WalletSigner};
use crate::route::Routes;
use crate::shared::PubkeyStr;
use crate::store::{SelectionStore, SyncState, Transition, UpdateOutcome};

use async_lock::RwLock;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

pub use crate::actions::Actions as ActionsClient;
pub use crate::chat::client::Chat as ChatClient;
pub use crate::route::Routes as RoutesClient;

/// Reward token redeemed by [`Actions::redeem_rewards`] unless configured otherwise.
pub const DEFAULT_REWARD_SYMBOL: &str = "MNGO";

/// The primary entry point.
///
/// Sub-client accessors: `client.actions()`, `client.routes()`, `client.chat()`.
#[derive(Clone)]
pub struct SyncClient {
    pub(crate) connection: ConnectionContext,
    pub(crate) store: Arc<SelectionStore>,
    pub(crate) notifications: Arc<NotificationLog>,
    pub(crate) remote: Arc<dyn RemoteClient>,
    /// Signer of the connected wallet, if it can sign.
    pub(crate) signer: Arc<RwLock<Option<Arc<dyn WalletSigner>>>>,
    /// Accounts with a redemption in flight.
    pub(crate) redeeming: Arc<Mutex<HashSet<PubkeyStr>>>,
    pub(crate) chat: Arc<ChatSession>,
    pub(crate) reward_symbol: String,
}

impl SyncClient {
    pub fn builder() -> SyncClientBuilder {
        SyncClientBuilder::default()
    }

    // ── Sub-client accessors ─────────────────────────────────────────────

    pub fn actions(&self) -> Actions<'_> {
        Actions { client: self }
    }

    pub fn routes(&self) -> Routes<'_> {
        Routes { client: self }
    }

    pub fn chat(&self) -> Chat<'_> {
        Chat { client: self }
    }

    // ── Read access ──────────────────────────────────────────────────────

    pub fn connection(&self) -> &ConnectionContext {
        &self.connection
    }

    pub fn store(&self) -> &SelectionStore {
        &self.store
    }

    /// Current store snapshot.
    pub async fn snapshot(&self) -> Arc<SyncState> {
        self.store.read().await
    }

    pub fn notifications(&self) -> &NotificationLog {
        &self.notifications
    }

    pub fn remote(&self) -> &dyn RemoteClient {
        self.remote.as_ref()
    }

    pub fn reward_symbol(&self) -> &str {
        &self.reward_symbol
    }

    /// Push client following the current selection's watched accounts.
    #[cfg(feature = "ws-native")]
    pub fn push_native(&self) -> crate::ws::native::PushClient {
        crate::ws::native::PushClient::new(crate::ws::PushConfig::for_context(&self.connection))
    }

    // ── Internal helpers ─────────────────────────────────────────────────

    pub(crate) async fn signer(&self) -> Option<Arc<dyn WalletSigner>> {
        self.signer.read().await.clone()
    }

    /// Apply a transition. `None` when the store rejected it; the store has
    /// already logged the violation.
    pub(crate) async fn commit(&self, transition: Transition) -> Option<UpdateOutcome> {
        self.store.update(transition).await.ok()
    }

    /// Log a remote failure and surface it as an error notification.
    pub(crate) async fn report(&self, title: &str, err: &RemoteError) {
        tracing::error!(error = %err, "{}", title);
        self.notifications
            .push(
                NotificationEvent::error(title)
                    .with_description(err.to_string())
                    .with_correlation_id(err.txid()),
            )
            .await;
    }
}

// ═════════════════════════════════════════════════════════════════════════════
// Builder
// ═════════════════════════════════════════════════════════════════════════════

pub struct SyncClientBuilder {
    connection: Option<ConnectionContext>,
    group_config: Option<GroupConfig>,
    remote: Option<Arc<dyn RemoteClient>>,
    reward_symbol: String,
    chat: Option<Arc<ChatSession>>,
    notifications: Option<Arc<NotificationLog>>,
}

impl Default for SyncClientBuilder {
    fn default() -> Self {
        Self {
            connection: None,
            group_config: None,
            remote: None,
            reward_symbol: DEFAULT_REWARD_SYMBOL.to_string(),
            chat: None,
            notifications: None,
        }
    }
}

impl SyncClientBuilder {
    /// Defaults to [`ConnectionContext::global`].
    pub fn connection(mut self, connection: ConnectionContext) -> Self {
        self.connection = Some(connection);
        self
    }

    pub fn group_config(mut self, config: GroupConfig) -> Self {
        self.group_config = Some(config);
        self
    }

    /// Remote facade. Without one, an HTTP facade against the connection's
    /// primary endpoint is used (feature `http`).
    pub fn remote(mut self, remote: Arc<dyn RemoteClient>) -> Self {
        self.remote = Some(remote);
        self
    }

    pub fn reward_symbol(mut self, symbol: &str) -> Self {
        self.reward_symbol = symbol.to_string();
        self
    }

    /// Chat session to drive. Defaults to the process-wide session.
    pub fn chat_session(mut self, session: Arc<ChatSession>) -> Self {
        self.chat = Some(session);
        self
    }

    pub fn notifications(mut self, log: Arc<NotificationLog>) -> Self {
        self.notifications = Some(log);
        self
    }

    pub fn build(self) -> Result<SyncClient, SyncError> {
        let connection = self
            .connection
            .unwrap_or_else(|| ConnectionContext::global().clone());
        let config = self
            .group_config
            .ok_or_else(|| SyncError::Other("group config is required".to_string()))?;
        let remote = match self.remote {
            Some(remote) => remote,
            None => default_remote(&connection)?,
        };
        let store = SelectionStore::new(config)?;

        tracing::info!(
            cluster = %connection.cluster(),
            endpoint = %connection.primary_endpoint(),
            "sync client built"
        );

        Ok(SyncClient {
            connection,
            store: Arc::new(store),
            notifications: self.notifications.unwrap_or_default(),
            remote,
            signer: Arc::new(RwLock::new(None)),
            redeeming: Arc::new(Mutex::new(HashSet::new())),
            chat: self.chat.unwrap_or_else(ChatSession::global),
            reward_symbol: self.reward_symbol,
        })
    }
}

#[cfg(feature = "http")]
fn default_remote(connection: &ConnectionContext) -> Result<Arc<dyn RemoteClient>, SyncError> {
    let http = crate::http::LedgerHttp::new(connection.primary_endpoint()).map_err(RemoteError::from)?;
    Ok(Arc::new(http))
}

#[cfg(not(feature = "http"))]
fn default_remote(_connection: &ConnectionContext) -> Result<Arc<dyn RemoteClient>, SyncError> {
    Err(SyncError::Other(
        "no remote facade configured and the `http` feature is disabled".to_string(),
    ))
}
