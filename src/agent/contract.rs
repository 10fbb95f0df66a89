//! The agent contract every selectable backend satisfies.

use async_trait::async_trait;

use crate::error::ParleyError;

/// A selectable agent: a name, a blocking chat turn, and a reset.
///
/// `chat` is total. Whatever goes wrong inside, the caller gets back a short
/// reply string and never an error, panic, or credential.
pub trait ChatAgent: Send {
    /// Stable, non-empty display name.
    fn identity(&self) -> &str;

    /// Run one conversational turn and return the reply text.
    fn chat(&mut self, message: &str) -> String;

    /// Clear conversation state. `false` means the backend could only reset
    /// on a best-effort basis. Calling it twice in a row is the same as once.
    fn reset_conversation(&mut self) -> bool;
}

/// An async integration with one native conversation-state model.
///
/// The conversation state is an associated type owned by the adapter that
/// drives the backend; nothing outside the backend looks inside it.
#[async_trait]
pub trait Backend: Send + Sync + 'static {
    type Conversation: Send;

    fn display_name(&self) -> &str;

    /// Start a fresh conversation.
    async fn open(&self) -> Result<Self::Conversation, ParleyError>;

    /// Answer `message` within `conversation`, updating it.
    async fn respond(
        &self,
        conversation: &mut Self::Conversation,
        message: &str,
    ) -> Result<String, ParleyError>;

    /// Make the next `respond` behave as if no turns had happened.
    async fn reset(&self, conversation: &mut Self::Conversation) -> Result<(), ParleyError>;
}
