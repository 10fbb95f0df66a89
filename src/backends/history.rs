//! Backend that replays an explicit message list on every turn.

use async_trait::async_trait;

use super::BackendParts;
use crate::agent::{Backend, Conversation};
use crate::config::ParleyConfig;
use crate::error::ParleyError;

pub const ID: &str = "history_agent";
pub const DISPLAY_NAME: &str = "Message History Agent";

#[derive(Debug)]
pub struct HistoryBackend {
    parts: BackendParts,
}

impl HistoryBackend {
    pub fn new(parts: BackendParts) -> Self {
        Self { parts }
    }

    pub fn from_config(config: &ParleyConfig) -> Result<Self, ParleyError> {
        Ok(Self::new(BackendParts::from_config(config)?))
    }
}

#[async_trait]
impl Backend for HistoryBackend {
    type Conversation = Conversation;

    fn display_name(&self) -> &str {
        DISPLAY_NAME
    }

    async fn open(&self) -> Result<Conversation, ParleyError> {
        Ok(Conversation::new())
    }

    async fn respond(
        &self,
        conversation: &mut Conversation,
        message: &str,
    ) -> Result<String, ParleyError> {
        let messages = conversation.request_messages(&self.parts.instructions, message);
        let result = self.parts.generate(messages).await?;

        // Only completed turns enter the history.
        conversation.add_user_message(message);
        conversation.add_assistant_message(result.text.clone());
        Ok(result.text)
    }

    async fn reset(&self, conversation: &mut Conversation) -> Result<(), ParleyError> {
        conversation.clear();
        Ok(())
    }
}
