//! Model provider trait and the OpenAI transports backends are built on.

pub mod http;
pub mod openai;
pub mod openai_responses;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::ParleyConfig;
use crate::error::ParleyError;
use crate::types::{AgentToolCall, FinishReason, GenerationSettings, ModelMessage, Usage};

pub use openai::OpenAiProvider;
pub use openai_responses::{ResponsesClient, ResponsesInput, ResponsesOutput, ResponsesRequest};

/// A request sent to a model provider.
#[derive(Debug, Clone)]
pub struct ProviderRequest {
    pub messages: Vec<ModelMessage>,
    pub settings: GenerationSettings,
    pub tools: Option<Vec<ToolDefinition>>,
}

/// Tool definition sent to the provider API.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

/// Response from a provider.
#[derive(Debug, Clone, Default)]
pub struct ProviderResponse {
    pub text: String,
    pub usage: Usage,
    pub tool_calls: Vec<AgentToolCall>,
    pub finish_reason: Option<FinishReason>,
}

/// Core trait implemented by chat-style model providers.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Provider name (e.g., "openai").
    fn provider_name(&self) -> &str;

    /// The model ID this provider instance serves.
    fn model_id(&self) -> &str;

    /// Generate text (non-streaming).
    async fn generate_text(&self, request: &ProviderRequest)
        -> Result<ProviderResponse, ParleyError>;
}

/// Create the chat provider for the configured model.
pub fn create_provider(config: &ParleyConfig) -> Result<Arc<dyn ModelProvider>, ParleyError> {
    let api_key = config.require_api_key("openai", "OPENAI_API_KEY")?;
    Ok(Arc::new(OpenAiProvider::new(
        config.model().to_string(),
        api_key,
        config.get_base_url("openai"),
    )?))
}
