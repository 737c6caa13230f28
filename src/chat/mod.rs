//! Messaging side-channel.
//!
//! A chat channel whose identity is derived from the wallet's signature over a
//! fixed challenge. Initialization runs at most once per process: the first
//! caller to observe [`ChatSessionState::Unstarted`] claims the session with a
//! compare-and-set, every other caller sees `Initializing` or the final state.
//! A failure is terminal for the process lifetime.

pub mod client;
mod log;
mod session;

pub use log::{ChatLog, ChatMessage};
pub use session::{ChatHandle, ChatSession, ChatSessionState};

use crate::error::ChatError;
use crate::shared::PubkeyStr;
use async_trait::async_trait;
use futures_util::stream::BoxStream;
use solana_keypair::Keypair;
use solana_signature::Signature;
use solana_signer::Signer;

/// Message the wallet signs to derive the chat identity.
pub const CHAT_CHALLENGE: &[u8] = b"KeyGeneratorForRoundTableXoXoXoXo";
/// Remote peer hosting the shared topic.
pub const CHAT_PEER: &str = "69GoySbK6vc9QyWsCYTMUjpQXCocbDJansszPTEaEtMp";
pub const CHAT_TOPIC: &str = "round-table";

/// Chat identity derived from a wallet signature.
///
/// The first 32 signature bytes seed an ed25519 keypair, so the same wallet
/// always gets the same identity.
pub struct ChatIdentity {
    keypair: Keypair,
}

impl ChatIdentity {
    pub fn from_signature(signature: &Signature) -> Self {
        let bytes: &[u8] = signature.as_ref();
        let mut seed = [0u8; 32];
        seed.copy_from_slice(&bytes[..32]);
        Self {
            keypair: Keypair::new_from_array(seed),
        }
    }

    pub fn public_key(&self) -> PubkeyStr {
        PubkeyStr::from_pubkey(self.keypair.pubkey())
    }

    pub fn keypair(&self) -> &Keypair {
        &self.keypair
    }
}

/// An open channel to the peer/topic.
#[async_trait]
pub trait ChatChannel: Send + Sync {
    async fn send(&self, text: &str) -> Result<(), ChatError>;
}

/// What a transport hands back on open.
pub struct OpenedChannel {
    pub channel: Box<dyn ChatChannel>,
    /// Incoming messages. Unbounded, not restartable.
    pub incoming: BoxStream<'static, ChatMessage>,
}

/// The external chat library.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn open(
        &self,
        identity: &ChatIdentity,
        peer: &str,
        topic: &str,
    ) -> Result<OpenedChannel, ChatError>;
}
