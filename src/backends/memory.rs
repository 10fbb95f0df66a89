//! Backend whose state is a token-bounded memory buffer.

use async_trait::async_trait;
use tracing::debug;

use super::BackendParts;
use crate::agent::Backend;
use crate::config::ParleyConfig;
use crate::error::ParleyError;
use crate::types::{ContentPart, ModelMessage, Role};

pub const ID: &str = "memory_agent";
pub const DISPLAY_NAME: &str = "Memory Buffer Agent";

pub fn estimate_text_tokens(text: &str) -> usize {
    if text.is_empty() {
        return 0;
    }
    text.chars().count().div_ceil(4)
}

pub fn estimate_message_tokens(message: &ModelMessage) -> usize {
    let mut tokens = 4usize;
    for part in &message.content {
        tokens += match part {
            ContentPart::Text { text } => estimate_text_tokens(text),
            ContentPart::ToolCall(tc) => {
                let args = serde_json::to_string(&tc.arguments).unwrap_or_default();
                estimate_text_tokens(&tc.name) + estimate_text_tokens(&args) + 8
            }
            ContentPart::ToolResult(result) => {
                estimate_text_tokens(&result.tool_call_id)
                    + estimate_text_tokens(&result.content)
                    + 8
            }
        };
    }
    tokens
}

/// Recent messages, trimmed from the front to stay under a token limit.
///
/// The buffer always starts at a user message, so a trimmed turn never
/// leaves an orphaned tool result or assistant reply at the front.
#[derive(Debug, Clone)]
pub struct MemoryBuffer {
    token_limit: usize,
    messages: Vec<ModelMessage>,
}

impl MemoryBuffer {
    pub fn new(token_limit: usize) -> Self {
        Self {
            token_limit,
            messages: Vec::new(),
        }
    }

    pub fn token_limit(&self) -> usize {
        self.token_limit
    }

    pub fn messages(&self) -> &[ModelMessage] {
        &self.messages
    }

    pub fn token_count(&self) -> usize {
        self.messages.iter().map(estimate_message_tokens).sum()
    }

    pub fn put(&mut self, message: ModelMessage) {
        self.messages.push(message);
        self.evict();
    }

    pub fn put_all(&mut self, messages: impl IntoIterator<Item = ModelMessage>) {
        self.messages.extend(messages);
        self.evict();
    }

    pub fn reset(&mut self) {
        self.messages.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    fn evict(&mut self) {
        let mut total = self.token_count();
        let mut cut = 0;
        while cut < self.messages.len() && total > self.token_limit {
            total -= estimate_message_tokens(&self.messages[cut]);
            cut += 1;
        }
        while cut < self.messages.len() && self.messages[cut].role != Role::User {
            cut += 1;
        }
        if cut > 0 {
            debug!(evicted = cut, "Memory buffer over limit");
            self.messages.drain(..cut);
        }
    }
}

#[derive(Debug)]
pub struct MemoryBackend {
    parts: BackendParts,
    token_limit: usize,
}

impl MemoryBackend {
    pub fn new(parts: BackendParts, token_limit: usize) -> Self {
        Self { parts, token_limit }
    }

    pub fn from_config(config: &ParleyConfig) -> Result<Self, ParleyError> {
        Ok(Self::new(
            BackendParts::from_config(config)?,
            config.memory_token_limit(),
        ))
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    type Conversation = MemoryBuffer;

    fn display_name(&self) -> &str {
        DISPLAY_NAME
    }

    async fn open(&self) -> Result<MemoryBuffer, ParleyError> {
        Ok(MemoryBuffer::new(self.token_limit))
    }

    async fn respond(
        &self,
        memory: &mut MemoryBuffer,
        message: &str,
    ) -> Result<String, ParleyError> {
        let mut messages = Vec::with_capacity(memory.messages().len() + 2);
        messages.push(ModelMessage::system(self.parts.instructions.clone()));
        messages.extend(memory.messages().iter().cloned());
        let prior = messages.len();
        messages.push(ModelMessage::user(message));

        let result = self.parts.generate(messages).await?;
        memory.put_all(result.messages.into_iter().skip(prior));
        Ok(result.text)
    }

    async fn reset(&self, memory: &mut MemoryBuffer) -> Result<(), ParleyError> {
        memory.reset();
        Ok(())
    }
}
