//! Blocking, fault-containing adapter over an async [`Backend`].

use std::future::Future;
use std::panic::{self, AssertUnwindSafe};

use tracing::{debug, error, warn};

use super::contract::{Backend, ChatAgent};
use crate::error::{
    ErrorCategory, ParleyError, CHAT_FAILURE_MESSAGE, EMPTY_RESPONSE_MESSAGE,
    TOOL_FAILURE_MESSAGE,
};
use crate::runtime::Bridge;

/// Drives a [`Backend`] behind the blocking [`ChatAgent`] contract.
pub struct Adapter<B: Backend> {
    identity: String,
    backend: B,
    conversation: B::Conversation,
    bridge: Bridge,
}

impl<B: Backend> std::fmt::Debug for Adapter<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Adapter")
            .field("identity", &self.identity)
            .finish_non_exhaustive()
    }
}

impl<B: Backend> Adapter<B> {
    /// Wrap `backend` and open its first conversation.
    pub fn new(backend: B) -> Result<Self, ParleyError> {
        let bridge = Bridge::new();
        let conversation = bridge.block_on(backend.open())??;
        Ok(Self {
            identity: backend.display_name().to_string(),
            backend,
            conversation,
            bridge,
        })
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// The backend's native state, for inspection in tests and tooling.
    pub fn conversation(&self) -> &B::Conversation {
        &self.conversation
    }
}

/// Drive `fut` on the bridge, turning panics into errors.
fn contain<T, F>(bridge: &Bridge, fut: F) -> Result<T, ParleyError>
where
    T: Send,
    F: Future<Output = Result<T, ParleyError>> + Send,
{
    match panic::catch_unwind(AssertUnwindSafe(|| bridge.block_on(fut))) {
        Ok(result) => result?,
        Err(_) => Err(ParleyError::ChatFailure("backend panicked".into())),
    }
}

impl<B: Backend> ChatAgent for Adapter<B> {
    fn identity(&self) -> &str {
        &self.identity
    }

    fn chat(&mut self, message: &str) -> String {
        debug!(agent = %self.identity, chars = message.len(), "Chat turn");
        let outcome = contain(
            &self.bridge,
            self.backend.respond(&mut self.conversation, message),
        );
        match outcome {
            Ok(reply) if reply.trim().is_empty() => {
                warn!(agent = %self.identity, "Backend returned an empty reply");
                EMPTY_RESPONSE_MESSAGE.to_string()
            }
            Ok(reply) => reply,
            Err(e) => {
                error!(agent = %self.identity, error = %e, "Chat turn failed");
                match e.category() {
                    ErrorCategory::ToolExecution => TOOL_FAILURE_MESSAGE.to_string(),
                    _ => CHAT_FAILURE_MESSAGE.to_string(),
                }
            }
        }
    }

    fn reset_conversation(&mut self) -> bool {
        match contain(&self.bridge, self.backend.reset(&mut self.conversation)) {
            Ok(()) => true,
            Err(e) => {
                warn!(agent = %self.identity, error = %e, "Conversation reset failed");
                false
            }
        }
    }
}
