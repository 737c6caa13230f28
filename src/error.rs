//! Unified error types.
//!
//! The taxonomy mirrors how each failure is handled:
//! - [`InputError`]: malformed route or address, recovered by redirecting.
//! - [`RemoteError`]: facade / network failure, surfaced as a notification.
//! - [`SyncError::SigningRejected`]: the user declined a signature.
//! - [`InvariantViolation`]: a store transition would break a state invariant.

use thiserror::Error;

/// Top-level error.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Input error: {0}")]
    Input(#[from] InputError),

    #[error("Remote error: {0}")]
    Remote(#[from] RemoteError),

    #[error("Signing rejected: {0}")]
    SigningRejected(String),

    #[error("Invariant violation: {0}")]
    Invariant(#[from] InvariantViolation),

    #[error("WebSocket error: {0}")]
    Ws(#[from] WsError),

    #[error("Chat error: {0}")]
    Chat(#[from] ChatError),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

/// Malformed navigation input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Malformed market token: {0}")]
    MalformedMarket(String),

    #[error("No market configured for {base} ({kind})")]
    UnknownMarket { base: String, kind: String },

    #[error("Malformed route: {0}")]
    MalformedRoute(String),
}

/// Failures reported by the remote facade.
#[derive(Error, Debug)]
pub enum RemoteError {
    #[error("HTTP error: {0}")]
    Http(#[from] HttpError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Rejected: {0}")]
    Rejected(String),

    #[error("Transaction failed: {message}")]
    Transaction {
        message: String,
        txid: Option<String>,
    },

    #[error("Decode error: {0}")]
    Decode(String),
}

impl RemoteError {
    /// Transaction id attached to the failure, if the remote got that far.
    pub fn txid(&self) -> Option<&str> {
        match self {
            RemoteError::Transaction { txid, .. } => txid.as_deref(),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            RemoteError::NotFound(_) | RemoteError::Http(HttpError::NotFound(_))
        )
    }
}

/// HTTP-layer errors.
#[derive(Error, Debug)]
pub enum HttpError {
    #[cfg(feature = "http")]
    #[error("Request failed: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Server error {status}: {body}")]
    ServerError { status: u16, body: String },

    #[error("Rate limited (retry after {retry_after_ms:?}ms)")]
    RateLimited { retry_after_ms: Option<u64> },

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Timeout")]
    Timeout,

    #[error("Max retries exceeded after {attempts} attempts: {last_error}")]
    MaxRetriesExceeded { attempts: u32, last_error: String },
}

/// A store transition that would leave the snapshot in an illegal state.
///
/// These are programming defects; they are logged and never shown to users.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    #[error("initial_loading set while an account is selected")]
    LoadingWithSelection,

    #[error("wallet token balances present while disconnected")]
    TokensWhileDisconnected,

    #[error("account list is not sorted by address")]
    UnsortedAccounts,

    #[error("market {name} recorded with kind {recorded}, config says {configured}")]
    MarketKindMismatch {
        name: String,
        recorded: String,
        configured: String,
    },
}

/// Push-channel errors.
#[derive(Error, Debug)]
pub enum WsError {
    #[error("Not connected")]
    NotConnected,

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Send failed: {0}")]
    SendFailed(String),

    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    #[error("Connection closed: code={code:?} reason={reason}")]
    Closed { code: Option<u16>, reason: String },
}

/// Messaging side-channel errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChatError {
    #[error("Chat session is not ready")]
    NotReady,

    #[error("Chat channel failed: {0}")]
    Channel(String),

    #[error("Incoming messages are already being listened to")]
    AlreadyListening,
}
