//! Process-wide chat message log.

use crate::shared::PubkeyStr;
use async_lock::RwLock;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub time: DateTime<Utc>,
    pub sender: PubkeyStr,
    pub text: String,
}

impl ChatMessage {
    /// First six characters of the sender id.
    pub fn short_sender(&self) -> &str {
        self.sender.short(6)
    }
}

#[derive(Debug, Default)]
pub struct ChatLog {
    messages: RwLock<Vec<ChatMessage>>,
}

impl ChatLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn append(&self, message: ChatMessage) {
        self.messages.write().await.push(message);
    }

    pub async fn messages(&self) -> Vec<ChatMessage> {
        self.messages.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.messages.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.messages.read().await.is_empty()
    }
}
