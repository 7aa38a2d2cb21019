//! Messaging transport seam.
//!
//! The bot core never talks to a chat platform directly; it drives these
//! traits. `try_delete` deliberately returns nothing: deleting a message
//! that is already gone is normal and must never abort the caller.

use crate::error::BotResult;
use crate::types::{ChatId, MessageId};
use async_trait::async_trait;
use std::sync::Arc;

/// One keyboard button. `callback` carries the payload delivered back by the
/// transport when pressed; plain reply buttons echo their label as text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub callback: Option<String>,
}

impl Button {
    /// A reply-keyboard button: pressing it sends its label as user text.
    pub fn reply(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            callback: None,
        }
    }

    /// An inline button delivering a callback payload.
    pub fn callback(label: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            callback: Some(data.into()),
        }
    }
}

/// Button rows attached to an outgoing message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Keyboard {
    pub rows: Vec<Vec<Button>>,
}

impl Keyboard {
    pub fn new(rows: Vec<Vec<Button>>) -> Self {
        Self { rows }
    }

    /// Single-row keyboard.
    pub fn row(buttons: Vec<Button>) -> Self {
        Self {
            rows: vec![buttons],
        }
    }
}

/// Outgoing side of the chat platform.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send_message(
        &self,
        chat: ChatId,
        text: &str,
        keyboard: Option<Keyboard>,
    ) -> BotResult<MessageId>;

    async fn send_photo(
        &self,
        chat: ChatId,
        photo_url: &str,
        caption: &str,
        keyboard: Option<Keyboard>,
    ) -> BotResult<MessageId>;

    /// Best-effort delete. Implementations swallow "message not found" and
    /// similar failures; the core relies on this never erroring.
    async fn try_delete(&self, chat: ChatId, message: MessageId);
}

/// Receives the finalized order text for the human operator.
#[async_trait]
pub trait OperatorNotifier: Send + Sync {
    async fn notify(&self, text: &str) -> BotResult<()>;
}

/// Operator channel backed by a plain chat: every notification is a message
/// into the configured operator chat.
pub struct OperatorChat {
    transport: Arc<dyn ChatTransport>,
    chat_id: ChatId,
}

impl OperatorChat {
    pub fn new(transport: Arc<dyn ChatTransport>, chat_id: ChatId) -> Self {
        Self { transport, chat_id }
    }
}

#[async_trait]
impl OperatorNotifier for OperatorChat {
    async fn notify(&self, text: &str) -> BotResult<()> {
        self.transport
            .send_message(self.chat_id, text, None)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Recorder {
        sent: Mutex<Vec<(ChatId, String)>>,
    }

    #[async_trait]
    impl ChatTransport for Recorder {
        async fn send_message(
            &self,
            chat: ChatId,
            text: &str,
            _keyboard: Option<Keyboard>,
        ) -> BotResult<MessageId> {
            self.sent.lock().push((chat, text.to_string()));
            Ok(1)
        }

        async fn send_photo(
            &self,
            chat: ChatId,
            _photo_url: &str,
            caption: &str,
            _keyboard: Option<Keyboard>,
        ) -> BotResult<MessageId> {
            self.sent.lock().push((chat, caption.to_string()));
            Ok(1)
        }

        async fn try_delete(&self, _chat: ChatId, _message: MessageId) {}
    }

    #[tokio::test]
    async fn test_operator_chat_targets_configured_chat() {
        let recorder = Arc::new(Recorder::default());
        let operator = OperatorChat::new(recorder.clone(), -1000);
        operator.notify("📦 Новый заказ").await.unwrap();

        let sent = recorder.sent.lock();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, -1000);
        assert!(sent[0].1.contains("Новый заказ"));
    }
}
