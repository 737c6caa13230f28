//! Chat sub-client: starts the side-channel from the client's wallet session.

use super::{ChatHandle, ChatLog, ChatSessionState, ChatTransport};
use crate::client::SyncClient;
use crate::notifications::NotificationEvent;

pub struct Chat<'a> {
    pub(crate) client: &'a SyncClient,
}

impl<'a> Chat<'a> {
    /// Start the session with the connected wallet, if it can sign.
    ///
    /// Safe to call on every render or selection change: only the first call
    /// with a signing-capable wallet requests a signature.
    pub async fn ensure_started(&self, transport: &dyn ChatTransport) -> ChatSessionState {
        let snapshot = self.client.snapshot().await;
        let Some(signer) = self.client.signer().await else {
            return self.client.chat.state();
        };
        let (state, ran) = self
            .client
            .chat
            .start(&snapshot.wallet, signer.as_ref(), transport)
            .await;
        if ran {
            if let ChatSessionState::Failed(reason) = &state {
                self.client
                    .notifications
                    .push(NotificationEvent::error("Could not start chat").with_description(reason.clone()))
                    .await;
            }
        }
        state
    }

    pub fn state(&self) -> ChatSessionState {
        self.client.chat.state()
    }

    pub fn handle(&self) -> Option<ChatHandle> {
        self.client.chat.handle()
    }

    pub fn log(&self) -> &ChatLog {
        self.client.chat.log()
    }
}
