//! Native push client: `tokio-tungstenite`.
//!
//! - Background tokio task owns the connection
//! - WS-level ping with pong deadline
//! - Exponential backoff reconnection with jitter
//! - Watched addresses are resubscribed after every reconnect
//! - Stream-based event delivery to the consumer

use std::collections::BTreeSet;
use std::pin::Pin;
use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_lock::Mutex;
use base64::Engine;
use futures_util::stream::{SplitSink, SplitStream, Stream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::error::WsError;
use crate::shared::PubkeyStr;
use crate::store::SyncState;
use crate::ws::{relevant_addresses, MessageIn, MessageOut, PushConfig, PushEvent, ReadyState, WatchSet};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;

// ─── Commands from public API to background task ─────────────────────────────

enum Command {
    Reconcile(BTreeSet<PubkeyStr>),
    Disconnect,
}

enum DisconnectReason {
    UserRequested,
    NormalClose,
    PongTimeout,
    Error(String),
}

// ─── Background task state ───────────────────────────────────────────────────

struct TaskState {
    config: PushConfig,
    event_tx: mpsc::Sender<PushEvent>,
    cmd_rx: mpsc::Receiver<Command>,
    watch: Arc<Mutex<WatchSet>>,
    reconnect_attempts: u32,
    ready_state: Arc<AtomicU16>,
}

impl TaskState {
    fn emit(&self, event: PushEvent) {
        let _ = self.event_tx.try_send(event);
    }

    fn should_reconnect(&self) -> bool {
        self.config.reconnect && self.reconnect_attempts < self.config.max_reconnect_attempts
    }
}

// ─── Public PushClient ───────────────────────────────────────────────────────

/// Account-subscription client for the push endpoint.
pub struct PushClient {
    config: PushConfig,
    cmd_tx: Option<mpsc::Sender<Command>>,
    event_rx: tokio::sync::Mutex<mpsc::Receiver<PushEvent>>,
    event_tx: mpsc::Sender<PushEvent>,
    task_handle: Option<JoinHandle<()>>,
    ready_state: Arc<AtomicU16>,
    watch: Arc<Mutex<WatchSet>>,
}

impl PushClient {
    /// Create a client. Does not connect yet.
    pub fn new(config: PushConfig) -> Self {
        let (event_tx, event_rx) = mpsc::channel(256);
        let watch = Arc::new(Mutex::new(WatchSet::new(&config.commitment)));
        Self {
            config,
            cmd_tx: None,
            event_rx: tokio::sync::Mutex::new(event_rx),
            event_tx,
            task_handle: None,
            ready_state: Arc::new(AtomicU16::new(ReadyState::Closed as u16)),
            watch,
        }
    }

    /// Spawn the background task that owns the connection.
    pub async fn connect(&mut self) -> Result<(), WsError> {
        if self.cmd_tx.is_some() {
            return Ok(());
        }

        let (cmd_tx, cmd_rx) = mpsc::channel(64);
        self.cmd_tx = Some(cmd_tx);
        self.ready_state
            .store(ReadyState::Connecting as u16, Ordering::SeqCst);

        let state = TaskState {
            config: self.config.clone(),
            event_tx: self.event_tx.clone(),
            cmd_rx,
            watch: Arc::clone(&self.watch),
            reconnect_attempts: 0,
            ready_state: Arc::clone(&self.ready_state),
        };

        self.task_handle = Some(tokio::spawn(run_task(state)));
        Ok(())
    }

    /// Close gracefully and wait for the background task to finish.
    pub async fn disconnect(&mut self) -> Result<(), WsError> {
        if let Some(tx) = self.cmd_tx.take() {
            let _ = tx.send(Command::Disconnect).await;
        }
        if let Some(handle) = self.task_handle.take() {
            let _ = tokio::time::timeout(Duration::from_secs(5), handle).await;
        }
        self.ready_state
            .store(ReadyState::Closed as u16, Ordering::SeqCst);
        Ok(())
    }

    /// Watch exactly `addresses`.
    pub fn watch_only(&self, addresses: BTreeSet<PubkeyStr>) -> Result<(), WsError> {
        match &self.cmd_tx {
            Some(tx) => tx
                .try_send(Command::Reconcile(addresses))
                .map_err(|e| match e {
                    mpsc::error::TrySendError::Full(_) => {
                        WsError::SendFailed("Command channel full".into())
                    }
                    mpsc::error::TrySendError::Closed(_) => WsError::NotConnected,
                }),
            None => Err(WsError::NotConnected),
        }
    }

    /// Watch what a snapshot makes relevant: the current account and the
    /// selected market's book accounts.
    pub fn follow(&self, state: &SyncState) -> Result<(), WsError> {
        self.watch_only(relevant_addresses(state))
    }

    /// Last payload received for `address`.
    pub async fn last_payload(&self, address: &PubkeyStr) -> Option<Vec<u8>> {
        self.watch.lock().await.last_payload(address).map(<[u8]>::to_vec)
    }

    pub async fn watched(&self) -> Vec<PubkeyStr> {
        self.watch.lock().await.addresses().cloned().collect()
    }

    pub fn is_connected(&self) -> bool {
        self.ready_state() == ReadyState::Open
    }

    pub fn ready_state(&self) -> ReadyState {
        ReadyState::from(self.ready_state.load(Ordering::SeqCst))
    }

    /// Stream of push events. Borrows `self`; drop before `disconnect()`.
    pub fn events(&self) -> Pin<Box<dyn Stream<Item = PushEvent> + Send + '_>> {
        Box::pin(futures_util::stream::unfold(&self.event_rx, |rx| async move {
            let mut guard = rx.lock().await;
            guard.recv().await.map(|event| (event, rx))
        }))
    }
}

impl Drop for PushClient {
    fn drop(&mut self) {
        if let Some(handle) = self.task_handle.take() {
            handle.abort();
        }
    }
}

// ─── Background task ─────────────────────────────────────────────────────────

async fn run_task(mut state: TaskState) {
    loop {
        let (mut sink, stream) = match attempt_connect(&state.config.url).await {
            Ok(parts) => parts,
            Err(e) => {
                tracing::error!("Push connection failed: {}", e);
                state.emit(PushEvent::Error(format!("Connection failed: {}", e)));
                if state.should_reconnect() {
                    backoff_sleep(&mut state).await;
                    if !drain_commands(&mut state).await {
                        return;
                    }
                    continue;
                }
                state.emit(PushEvent::MaxReconnectReached);
                return;
            }
        };

        state.reconnect_attempts = 0;
        state
            .ready_state
            .store(ReadyState::Open as u16, Ordering::SeqCst);
        state.emit(PushEvent::Connected);

        let resubscribe = state.watch.lock().await.resubscribe_all();
        if !resubscribe.is_empty() {
            tracing::info!("Resubscribing to {} watched account(s)", resubscribe.len());
        }
        send_all(&mut sink, &resubscribe).await;

        let reason = run_connected(&mut state, sink, stream).await;
        state
            .ready_state
            .store(ReadyState::Closed as u16, Ordering::SeqCst);

        match reason {
            DisconnectReason::UserRequested | DisconnectReason::NormalClose => return,
            DisconnectReason::PongTimeout | DisconnectReason::Error(_) => {
                if state.should_reconnect() {
                    state
                        .ready_state
                        .store(ReadyState::Connecting as u16, Ordering::SeqCst);
                    backoff_sleep(&mut state).await;
                    if !drain_commands(&mut state).await {
                        return;
                    }
                    continue;
                }
                state.emit(PushEvent::MaxReconnectReached);
                return;
            }
        }
    }
}

async fn run_connected(
    state: &mut TaskState,
    mut sink: WsSink,
    mut stream: SplitStream<WsStream>,
) -> DisconnectReason {
    let ping_dur = Duration::from_millis(state.config.ping_interval_ms);
    let pong_dur = Duration::from_millis(state.config.pong_timeout_ms);

    let mut ping_interval = tokio::time::interval(ping_dur);
    ping_interval.reset();

    let mut awaiting_pong = false;
    let far_future = tokio::time::Instant::now() + Duration::from_secs(86400);
    let pong_sleep = tokio::time::sleep_until(far_future);
    tokio::pin!(pong_sleep);

    loop {
        tokio::select! {
            msg = stream.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let replies = handle_text(state, text.as_ref()).await;
                        send_all(&mut sink, &replies).await;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        let _ = sink.send(Message::Pong(data)).await;
                    }
                    Some(Ok(Message::Pong(_))) => {
                        awaiting_pong = false;
                        pong_sleep.as_mut().reset(far_future);
                    }
                    Some(Ok(Message::Close(frame))) => {
                        let (code, reason) = extract_close(frame.as_ref());
                        state.emit(PushEvent::Disconnected { code: Some(code), reason: reason.clone() });
                        return match code {
                            1000 => DisconnectReason::NormalClose,
                            _ => DisconnectReason::Error(reason),
                        };
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        let reason = e.to_string();
                        tracing::error!("Push socket error: {}", reason);
                        state.emit(PushEvent::Disconnected { code: None, reason: reason.clone() });
                        return DisconnectReason::Error(reason);
                    }
                    None => {
                        state.emit(PushEvent::Disconnected { code: None, reason: "Stream ended".into() });
                        return DisconnectReason::Error("Stream ended".into());
                    }
                }
            }

            cmd = state.cmd_rx.recv() => {
                match cmd {
                    Some(Command::Reconcile(addresses)) => {
                        let out = state.watch.lock().await.reconcile(&addresses);
                        send_all(&mut sink, &out).await;
                    }
                    Some(Command::Disconnect) | None => {
                        let _ = sink.send(Message::Close(Some(CloseFrame {
                            code: CloseCode::Normal,
                            reason: "Client disconnect".into(),
                        }))).await;
                        return DisconnectReason::UserRequested;
                    }
                }
            }

            _ = ping_interval.tick() => {
                if let Err(e) = sink.send(Message::Ping(Vec::new().into())).await {
                    tracing::warn!("Failed to send ping: {}", e);
                } else if !awaiting_pong {
                    awaiting_pong = true;
                    pong_sleep.as_mut().reset(tokio::time::Instant::now() + pong_dur);
                }
            }

            () = &mut pong_sleep, if awaiting_pong => {
                tracing::warn!("Pong timeout after {}ms", state.config.pong_timeout_ms);
                state.emit(PushEvent::Disconnected { code: None, reason: "Pong timeout".into() });
                let _ = sink.close().await;
                return DisconnectReason::PongTimeout;
            }
        }
    }
}

/// Apply one inbound text frame to the watch set and emit events.
/// Returns follow-up messages to send.
async fn handle_text(state: &TaskState, text: &str) -> Vec<MessageOut> {
    let msg = match serde_json::from_str::<MessageIn>(text) {
        Ok(msg) => msg,
        Err(e) => {
            tracing::warn!("Push deserialization error: {} (raw: {})", e, text);
            state.emit(PushEvent::Error(format!("Deserialization error: {}", e)));
            return Vec::new();
        }
    };

    let mut watch = state.watch.lock().await;
    match msg {
        MessageIn::Response { id, result } => watch.on_response(id, &result).into_iter().collect(),
        MessageIn::Error { id, error } => {
            if let Some(address) = id.and_then(|id| watch.on_error(id)) {
                tracing::warn!(%address, code = error.code, "Subscribe failed: {}", error.message);
            }
            state.emit(PushEvent::Error(error.message));
            Vec::new()
        }
        MessageIn::Notification { method, params } => {
            if method != "accountNotification" {
                return Vec::new();
            }
            let data = match base64::engine::general_purpose::STANDARD.decode(&params.result.value.data.0) {
                Ok(data) => data,
                Err(e) => {
                    state.emit(PushEvent::Error(format!("Bad account payload: {}", e)));
                    return Vec::new();
                }
            };
            let slot = params.result.context.slot;
            if let Some(address) = watch.on_notification(params.subscription, slot, data.clone()) {
                state.emit(PushEvent::AccountUpdate { address, slot, data });
            }
            Vec::new()
        }
    }
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

async fn attempt_connect(url: &str) -> Result<(WsSink, SplitStream<WsStream>), String> {
    let (ws_stream, _) = tokio::time::timeout(Duration::from_secs(30), connect_async(url))
        .await
        .map_err(|_| "Connection timeout".to_string())?
        .map_err(|e| e.to_string())?;

    Ok(ws_stream.split())
}

async fn send_all(sink: &mut WsSink, messages: &[MessageOut]) {
    for msg in messages {
        let json = match serde_json::to_string(msg) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!("Failed to encode {}: {}", msg.method, e);
                continue;
            }
        };
        if let Err(e) = sink.send(Message::Text(json.into())).await {
            tracing::warn!("Failed to send {}: {}", msg.method, e);
        }
    }
}

fn extract_close(frame: Option<&CloseFrame>) -> (u16, String) {
    match frame {
        Some(f) => (f.code.into(), f.reason.to_string()),
        None => (1006, "No close frame".into()),
    }
}

/// Apply commands that arrived while disconnected. The resubscribe after the
/// next connect picks up the result. Returns false on a disconnect request.
async fn drain_commands(state: &mut TaskState) -> bool {
    while let Ok(cmd) = state.cmd_rx.try_recv() {
        match cmd {
            Command::Reconcile(addresses) => {
                // Messages are dropped; resubscribe_all reissues what remains.
                let _ = state.watch.lock().await.reconcile(&addresses);
            }
            Command::Disconnect => return false,
        }
    }
    true
}

async fn backoff_sleep(state: &mut TaskState) {
    state.reconnect_attempts += 1;

    let exp = (state.reconnect_attempts - 1).min(10);
    let base = state
        .config
        .base_reconnect_delay_ms
        .saturating_mul(1u32 << exp);
    let jitter = rand::random::<u32>() % 500;
    let delay = base.saturating_add(jitter).min(60_000);

    tracing::info!(
        "Reconnect attempt {}/{} in {}ms",
        state.reconnect_attempts,
        state.config.max_reconnect_attempts,
        delay
    );

    tokio::time::sleep(Duration::from_millis(delay as u64)).await;
}
