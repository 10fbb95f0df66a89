//! Built-in backends, one per native conversation-state model.
//!
//! | id | state |
//! |---|---|
//! | `checkpoint_agent` | thread id into a transcript checkpoint store |
//! | `crew_agent` | prior turns folded into a single task description |
//! | `history_agent` | explicit user/assistant message list |
//! | `memory_agent` | token-bounded memory buffer |
//! | `responses_agent` | server-side response chain |
//! | `session_agent` | session in an async session service |
//! | `steps_agent` | tool-calling agent step memory |

pub mod checkpoint;
pub mod crew;
pub mod history;
pub mod memory;
pub mod prompts;
pub mod responses;
pub mod session_service;
pub mod steps;

use std::sync::Arc;

use crate::agent::{Adapter, Backend, ChatAgent};
use crate::config::ParleyConfig;
use crate::error::ParleyError;
use crate::generation::generate_text;
use crate::provider::{create_provider, ModelProvider};
use crate::registry::{AgentFactory, FnAgentFactory};
use crate::tools::ToolSet;
use crate::types::{GenerateTextResult, GenerationSettings, ModelMessage};

pub use checkpoint::{CheckpointBackend, CheckpointStore, ThreadHandle};
pub use crew::CrewBackend;
pub use history::HistoryBackend;
pub use memory::{MemoryBackend, MemoryBuffer};
pub use responses::{ResponseChain, ResponsesBackend};
pub use session_service::{InMemorySessionService, SessionBackend, SessionHandle};
pub use steps::{MemoryStep, StepMemory, StepsBackend};

/// What a chat-completions backend is built from.
#[derive(Clone)]
pub struct BackendParts {
    pub provider: Arc<dyn ModelProvider>,
    pub tools: ToolSet,
    pub settings: GenerationSettings,
    pub instructions: String,
}

impl std::fmt::Debug for BackendParts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendParts")
            .field("provider", &self.provider.provider_name())
            .field("model", &self.provider.model_id())
            .field("tools", &self.tools)
            .finish_non_exhaustive()
    }
}

impl BackendParts {
    pub fn new(provider: Arc<dyn ModelProvider>, tools: ToolSet) -> Self {
        Self {
            provider,
            tools,
            settings: GenerationSettings::default(),
            instructions: prompts::system_instructions(),
        }
    }

    /// The configured model with the standard tools. Needs both API keys.
    pub fn from_config(config: &ParleyConfig) -> Result<Self, ParleyError> {
        let provider = create_provider(config)?;
        let tools = ToolSet::from_config(config)?;
        Ok(Self::new(provider, tools).with_settings(config.settings().clone()))
    }

    pub fn with_settings(mut self, settings: GenerationSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = instructions.into();
        self
    }

    pub(crate) async fn generate(
        &self,
        messages: Vec<ModelMessage>,
    ) -> Result<GenerateTextResult, ParleyError> {
        generate_text(
            self.provider.as_ref(),
            messages,
            self.settings.clone(),
            &self.tools,
        )
        .await
    }
}

/// Put `backend` behind the blocking agent contract.
pub fn into_agent<B: Backend>(backend: B) -> Result<Box<dyn ChatAgent>, ParleyError> {
    Ok(Box::new(Adapter::new(backend)?))
}

/// Factories for every built-in backend.
pub fn builtin_factories() -> Vec<Arc<dyn AgentFactory>> {
    vec![
        FnAgentFactory::shared(checkpoint::ID, |config: &ParleyConfig| {
            into_agent(CheckpointBackend::from_config(config)?)
        }),
        FnAgentFactory::shared(crew::ID, |config: &ParleyConfig| {
            into_agent(CrewBackend::from_config(config)?)
        }),
        FnAgentFactory::shared(history::ID, |config: &ParleyConfig| {
            into_agent(HistoryBackend::from_config(config)?)
        }),
        FnAgentFactory::shared(memory::ID, |config: &ParleyConfig| {
            into_agent(MemoryBackend::from_config(config)?)
        }),
        FnAgentFactory::shared(responses::ID, |config: &ParleyConfig| {
            into_agent(ResponsesBackend::from_config(config)?)
        }),
        FnAgentFactory::shared(session_service::ID, |config: &ParleyConfig| {
            into_agent(SessionBackend::from_config(config)?)
        }),
        FnAgentFactory::shared(steps::ID, |config: &ParleyConfig| {
            into_agent(StepsBackend::from_config(config)?)
        }),
    ]
}
