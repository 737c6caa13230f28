//! One-shot chat session state machine.

use super::{
    ChatChannel, ChatIdentity, ChatLog, ChatMessage, ChatTransport, CHAT_CHALLENGE, CHAT_PEER,
    CHAT_TOPIC,
};
use crate::domain::wallet::WalletSession;
use crate::error::{ChatError, SyncError};
use crate::remote::WalletSigner;
use crate::shared::PubkeyStr;
use futures_util::stream::{BoxStream, Stream};
use futures_util::StreamExt;
use std::sync::{Arc, Mutex, MutexGuard};

lazy_static::lazy_static! {
    static ref GLOBAL_SESSION: Arc<ChatSession> = Arc::new(ChatSession::new());
}

/// A ready chat channel.
#[derive(Clone)]
pub struct ChatHandle {
    inner: Arc<HandleInner>,
}

struct HandleInner {
    identity: PubkeyStr,
    channel: Box<dyn ChatChannel>,
    incoming: Mutex<Option<BoxStream<'static, ChatMessage>>>,
    log: Arc<ChatLog>,
}

impl std::fmt::Debug for ChatHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatHandle")
            .field("identity", &self.inner.identity)
            .finish()
    }
}

impl ChatHandle {
    pub fn identity(&self) -> &PubkeyStr {
        &self.inner.identity
    }

    pub async fn send(&self, text: &str) -> Result<(), ChatError> {
        self.inner.channel.send(text).await
    }

    /// Incoming messages, each appended to the session log as it is yielded.
    ///
    /// The underlying stream can be taken once; later calls fail with
    /// [`ChatError::AlreadyListening`].
    pub fn listen(&self) -> Result<impl Stream<Item = ChatMessage> + Send + 'static, ChatError> {
        let mut incoming = lock(&self.inner.incoming)
            .take()
            .ok_or(ChatError::AlreadyListening)?;
        let log = Arc::clone(&self.inner.log);

        Ok(async_stream::stream! {
            while let Some(message) = incoming.next().await {
                log.append(message.clone()).await;
                yield message;
            }
        })
    }
}

#[derive(Debug, Clone)]
pub enum ChatSessionState {
    Unstarted,
    Initializing,
    Ready(ChatHandle),
    /// Terminal. No retry within the process.
    Failed(String),
}

impl ChatSessionState {
    pub fn is_ready(&self) -> bool {
        matches!(self, ChatSessionState::Ready(_))
    }

    pub fn name(&self) -> &'static str {
        match self {
            ChatSessionState::Unstarted => "unstarted",
            ChatSessionState::Initializing => "initializing",
            ChatSessionState::Ready(_) => "ready",
            ChatSessionState::Failed(_) => "failed",
        }
    }
}

/// Owner of the chat state machine and its message log.
pub struct ChatSession {
    state: Mutex<ChatSessionState>,
    log: Arc<ChatLog>,
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Fails a claimed session whose initialization future was dropped.
struct InitGuard<'a> {
    session: &'a ChatSession,
    armed: bool,
}

impl Drop for InitGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut state = lock(&self.session.state);
        if matches!(*state, ChatSessionState::Initializing) {
            tracing::warn!("chat initialization cancelled");
            *state = ChatSessionState::Failed("initialization cancelled".to_string());
        }
    }
}

impl ChatSession {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ChatSessionState::Unstarted),
            log: Arc::new(ChatLog::new()),
        }
    }

    /// The process-wide session.
    pub fn global() -> Arc<ChatSession> {
        Arc::clone(&GLOBAL_SESSION)
    }

    pub fn state(&self) -> ChatSessionState {
        lock(&self.state).clone()
    }

    pub fn handle(&self) -> Option<ChatHandle> {
        match &*lock(&self.state) {
            ChatSessionState::Ready(handle) => Some(handle.clone()),
            _ => None,
        }
    }

    pub fn log(&self) -> &ChatLog {
        &self.log
    }

    /// Unstarted → Initializing. True for exactly one caller.
    fn claim(&self) -> bool {
        let mut state = lock(&self.state);
        if matches!(*state, ChatSessionState::Unstarted) {
            *state = ChatSessionState::Initializing;
            true
        } else {
            false
        }
    }

    fn finish(&self, next: ChatSessionState) -> ChatSessionState {
        let mut state = lock(&self.state);
        *state = next;
        state.clone()
    }

    /// Start the session if it has not been started and the wallet can sign.
    ///
    /// Returns the state as seen by this caller. Only the caller that claims
    /// the session requests a signature. Dropping the future mid-way leaves
    /// the session `Failed`.
    pub async fn ensure_started(
        &self,
        wallet: &WalletSession,
        signer: &dyn WalletSigner,
        transport: &dyn ChatTransport,
    ) -> ChatSessionState {
        self.start(wallet, signer, transport).await.0
    }

    /// Like [`ensure_started`](Self::ensure_started), also reporting whether
    /// this call ran the initialization.
    pub(crate) async fn start(
        &self,
        wallet: &WalletSession,
        signer: &dyn WalletSigner,
        transport: &dyn ChatTransport,
    ) -> (ChatSessionState, bool) {
        if !wallet.is_signing_capable() || !self.claim() {
            return (self.state(), false);
        }

        let mut guard = InitGuard {
            session: self,
            armed: true,
        };
        tracing::info!(wallet = %signer.public_key(), "initializing chat session");
        let next = match self.initialize(signer, transport).await {
            Ok(handle) => {
                tracing::info!(identity = %handle.identity(), "chat session ready");
                ChatSessionState::Ready(handle)
            }
            Err(e) => {
                tracing::warn!(error = %e, "chat session failed");
                ChatSessionState::Failed(e.to_string())
            }
        };
        guard.armed = false;
        (self.finish(next), true)
    }

    async fn initialize(
        &self,
        signer: &dyn WalletSigner,
        transport: &dyn ChatTransport,
    ) -> Result<ChatHandle, SyncError> {
        let signature = signer.sign_message(CHAT_CHALLENGE).await?;
        let identity = ChatIdentity::from_signature(&signature);
        let opened = transport.open(&identity, CHAT_PEER, CHAT_TOPIC).await?;

        Ok(ChatHandle {
            inner: Arc::new(HandleInner {
                identity: identity.public_key(),
                channel: opened.channel,
                incoming: Mutex::new(Some(opened.incoming)),
                log: Arc::clone(&self.log),
            }),
        })
    }
}
