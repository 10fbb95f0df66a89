//! Backend whose state is a tool-calling agent's step memory.
//!
//! Every run appends one step: the task, the tool calls made while solving
//! it with their observations, and the final answer. Later runs see every
//! earlier step. Resetting empties the memory in place.

use async_trait::async_trait;
use tracing::debug;

use super::BackendParts;
use crate::agent::Backend;
use crate::config::ParleyConfig;
use crate::error::ParleyError;
use crate::types::{ModelMessage, Role};

pub const ID: &str = "steps_agent";
pub const DISPLAY_NAME: &str = "Step Memory Agent";

/// One completed run.
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryStep {
    pub task: String,
    /// Assistant tool calls, tool observations and the final answer.
    pub actions: Vec<ModelMessage>,
}

impl MemoryStep {
    /// Text of the closing assistant message, if the run ended with one.
    pub fn final_answer(&self) -> Option<String> {
        self.actions
            .last()
            .filter(|m| m.role == Role::Assistant)
            .map(ModelMessage::text)
    }

    pub fn tool_observations(&self) -> usize {
        self.actions.iter().filter(|m| m.role == Role::Tool).count()
    }
}

#[derive(Debug, Clone, Default)]
pub struct StepMemory {
    steps: Vec<MemoryStep>,
}

impl StepMemory {
    pub fn steps(&self) -> &[MemoryStep] {
        &self.steps
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn reset(&mut self) {
        self.steps.clear();
    }

    /// Replay of every step as model messages, oldest first.
    fn replay(&self) -> impl Iterator<Item = ModelMessage> + '_ {
        self.steps.iter().flat_map(|step| {
            std::iter::once(ModelMessage::user(step.task.clone()))
                .chain(step.actions.iter().cloned())
        })
    }
}

#[derive(Debug)]
pub struct StepsBackend {
    parts: BackendParts,
}

impl StepsBackend {
    pub fn new(parts: BackendParts) -> Self {
        Self { parts }
    }

    pub fn from_config(config: &ParleyConfig) -> Result<Self, ParleyError> {
        Ok(Self::new(BackendParts::from_config(config)?))
    }
}

#[async_trait]
impl Backend for StepsBackend {
    type Conversation = StepMemory;

    fn display_name(&self) -> &str {
        DISPLAY_NAME
    }

    async fn open(&self) -> Result<StepMemory, ParleyError> {
        Ok(StepMemory::default())
    }

    async fn respond(&self, memory: &mut StepMemory, task: &str) -> Result<String, ParleyError> {
        let mut messages = vec![ModelMessage::system(self.parts.instructions.clone())];
        messages.extend(memory.replay());
        messages.push(ModelMessage::user(task));
        let sent = messages.len();

        let result = self.parts.generate(messages).await?;
        let actions: Vec<ModelMessage> = result.messages.into_iter().skip(sent).collect();
        debug!(
            step = memory.steps.len() + 1,
            actions = actions.len(),
            "Recording step"
        );
        memory.steps.push(MemoryStep {
            task: task.to_string(),
            actions,
        });
        Ok(result.text)
    }

    async fn reset(&self, memory: &mut StepMemory) -> Result<(), ParleyError> {
        memory.reset();
        Ok(())
    }
}
