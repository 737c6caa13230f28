//! Notification log: append-only record of user-facing outcomes.
//!
//! Actions push events here on terminal success or failure; the presentation
//! layer reads snapshots and decides what to show. Past entries are never
//! mutated. Consumers prune by age with [`NotificationLog::recent`].

use async_lock::RwLock;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationEvent {
    pub id: Uuid,
    pub kind: NotificationKind,
    pub title: String,
    pub description: Option<String>,
    /// Transaction id the outcome refers to, when there is one.
    pub correlation_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl NotificationEvent {
    pub fn new(kind: NotificationKind, title: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            title: title.into(),
            description: None,
            correlation_id: None,
            created_at: Utc::now(),
        }
    }

    pub fn info(title: impl Into<String>) -> Self {
        Self::new(NotificationKind::Info, title)
    }

    pub fn success(title: impl Into<String>) -> Self {
        Self::new(NotificationKind::Success, title)
    }

    pub fn error(title: impl Into<String>) -> Self {
        Self::new(NotificationKind::Error, title)
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_correlation_id(mut self, id: Option<impl Into<String>>) -> Self {
        self.correlation_id = id.map(Into::into);
        self
    }
}

#[derive(Debug, Default)]
pub struct NotificationLog {
    events: RwLock<Vec<NotificationEvent>>,
}

impl NotificationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn push(&self, event: NotificationEvent) {
        match event.kind {
            NotificationKind::Error => tracing::warn!(
                title = %event.title,
                description = ?event.description,
                txid = ?event.correlation_id,
                "notification"
            ),
            _ => tracing::info!(title = %event.title, txid = ?event.correlation_id, "notification"),
        }
        self.events.write().await.push(event);
    }

    /// Every event in insertion order.
    pub async fn snapshot(&self) -> Vec<NotificationEvent> {
        self.events.read().await.clone()
    }

    /// Events created within `max_age` of now.
    pub async fn recent(&self, max_age: Duration) -> Vec<NotificationEvent> {
        let cutoff = Utc::now() - max_age;
        self.events
            .read()
            .await
            .iter()
            .filter(|e| e.created_at >= cutoff)
            .cloned()
            .collect()
    }

    pub async fn last(&self) -> Option<NotificationEvent> {
        self.events.read().await.last().cloned()
    }

    pub async fn len(&self) -> usize {
        self.events.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.events.read().await.is_empty()
    }
}
