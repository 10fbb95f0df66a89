//! Backend whose state is a thread id into a checkpoint store.
//!
//! The store keeps each thread's full transcript, tool calls and tool
//! results included. Resetting moves the conversation to the next thread id.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use super::BackendParts;
use crate::agent::Backend;
use crate::config::ParleyConfig;
use crate::error::ParleyError;
use crate::types::{ModelMessage, Role};

pub const ID: &str = "checkpoint_agent";
pub const DISPLAY_NAME: &str = "Checkpoint Thread Agent";

const FIRST_THREAD_ID: u64 = 1;

/// Transcripts saved per thread id.
#[derive(Debug, Clone, Default)]
pub struct CheckpointStore {
    threads: Arc<RwLock<HashMap<u64, Vec<ModelMessage>>>>,
}

impl CheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The saved transcript for `thread_id`, empty when none exists.
    pub async fn load(&self, thread_id: u64) -> Vec<ModelMessage> {
        self.threads
            .read()
            .await
            .get(&thread_id)
            .cloned()
            .unwrap_or_default()
    }

    pub async fn save(&self, thread_id: u64, transcript: Vec<ModelMessage>) {
        self.threads.write().await.insert(thread_id, transcript);
    }

    pub async fn remove(&self, thread_id: u64) -> bool {
        self.threads.write().await.remove(&thread_id).is_some()
    }

    pub async fn thread_count(&self) -> usize {
        self.threads.read().await.len()
    }
}

/// Which thread the conversation is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThreadHandle {
    pub thread_id: u64,
}

#[derive(Debug)]
pub struct CheckpointBackend {
    parts: BackendParts,
    store: CheckpointStore,
}

impl CheckpointBackend {
    pub fn new(parts: BackendParts) -> Self {
        Self {
            parts,
            store: CheckpointStore::new(),
        }
    }

    pub fn from_config(config: &ParleyConfig) -> Result<Self, ParleyError> {
        Ok(Self::new(BackendParts::from_config(config)?))
    }

    pub fn store(&self) -> &CheckpointStore {
        &self.store
    }
}

#[async_trait]
impl Backend for CheckpointBackend {
    type Conversation = ThreadHandle;

    fn display_name(&self) -> &str {
        DISPLAY_NAME
    }

    async fn open(&self) -> Result<ThreadHandle, ParleyError> {
        Ok(ThreadHandle {
            thread_id: FIRST_THREAD_ID,
        })
    }

    async fn respond(
        &self,
        thread: &mut ThreadHandle,
        message: &str,
    ) -> Result<String, ParleyError> {
        let saved = self.store.load(thread.thread_id).await;

        let mut messages = Vec::with_capacity(saved.len() + 2);
        messages.push(ModelMessage::system(self.parts.instructions.clone()));
        messages.extend(saved);
        messages.push(ModelMessage::user(message));

        let result = self.parts.generate(messages).await?;
        let transcript: Vec<ModelMessage> = result
            .messages
            .into_iter()
            .filter(|m| m.role != Role::System)
            .collect();
        debug!(
            thread_id = thread.thread_id,
            messages = transcript.len(),
            "Saving checkpoint"
        );
        self.store.save(thread.thread_id, transcript).await;
        Ok(result.text)
    }

    async fn reset(&self, thread: &mut ThreadHandle) -> Result<(), ParleyError> {
        self.store.remove(thread.thread_id).await;
        thread.thread_id += 1;
        Ok(())
    }
}
