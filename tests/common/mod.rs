//! Shared test helpers: a scripted model provider and stub search providers.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use parley::agent::ChatAgent;
use parley::backends::BackendParts;
use parley::config::ParleyConfig;
use parley::error::ParleyError;
use parley::provider::{ModelProvider, ProviderRequest, ProviderResponse};
use parley::registry::{AgentFactory, FnAgentFactory};
use parley::tools::{SearchProvider, ToolSet};
use parley::types::*;

/// A provider that plays back queued responses and records every request.
///
/// With nothing queued it answers with the last tool result it was sent
/// (prefixed with `Result: `), or `Mock response` when there is none.
pub struct MockProvider {
    responses: Mutex<VecDeque<ProviderResponse>>,
    requests: Mutex<Vec<ProviderRequest>>,
    failing: bool,
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            failing: false,
        }
    }

    /// A provider whose every call fails like a server error.
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::new()
        }
    }

    /// Queue a text response.
    pub fn queue_response(&self, text: &str) -> &Self {
        self.responses.lock().unwrap().push_back(ProviderResponse {
            text: text.to_string(),
            usage: Usage {
                input_tokens: 10,
                output_tokens: 20,
                total_tokens: 30,
            },
            tool_calls: vec![],
            finish_reason: Some(FinishReason::Stop),
        });
        self
    }

    /// Queue a tool call response.
    pub fn queue_tool_call(&self, id: &str, name: &str, args: serde_json::Value) -> &Self {
        self.responses.lock().unwrap().push_back(ProviderResponse {
            text: String::new(),
            usage: Usage {
                input_tokens: 10,
                output_tokens: 5,
                total_tokens: 15,
            },
            tool_calls: vec![AgentToolCall {
                id: id.to_string(),
                name: name.to_string(),
                arguments: args,
            }],
            finish_reason: Some(FinishReason::ToolCalls),
        });
        self
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> ProviderRequest {
        self.requests
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("provider was never called")
    }
}

#[async_trait]
impl ModelProvider for MockProvider {
    fn provider_name(&self) -> &str {
        "mock"
    }

    fn model_id(&self) -> &str {
        "mock-model"
    }

    async fn generate_text(
        &self,
        request: &ProviderRequest,
    ) -> Result<ProviderResponse, ParleyError> {
        self.requests.lock().unwrap().push(request.clone());
        if self.failing {
            return Err(ParleyError::api(500, "upstream exploded: sk-secret"));
        }
        if let Some(response) = self.responses.lock().unwrap().pop_front() {
            return Ok(response);
        }

        let text = match request.messages.last().and_then(|m| m.tool_result_part()) {
            Some(result) => format!("Result: {}", result.content),
            None => "Mock response".to_string(),
        };
        Ok(ProviderResponse {
            text,
            finish_reason: Some(FinishReason::Stop),
            ..Default::default()
        })
    }
}

/// Search provider returning fixed records.
pub struct StaticSearch(pub Vec<serde_json::Value>);

#[async_trait]
impl SearchProvider for StaticSearch {
    async fn search(&self, _query: &str) -> Result<Vec<serde_json::Value>, ParleyError> {
        Ok(self.0.clone())
    }
}

/// Search provider that always errors.
pub struct FailingSearch;

#[async_trait]
impl SearchProvider for FailingSearch {
    async fn search(&self, _query: &str) -> Result<Vec<serde_json::Value>, ParleyError> {
        Err(ParleyError::api(503, "search service down"))
    }
}

/// Backend parts over `provider` with the standard tools and `search`.
pub fn parts(provider: Arc<MockProvider>, search: Arc<dyn SearchProvider>) -> BackendParts {
    BackendParts::new(provider, ToolSet::standard(search))
}

/// Parts whose search returns one fixed record.
pub fn static_parts(provider: Arc<MockProvider>) -> BackendParts {
    parts(
        provider,
        Arc::new(StaticSearch(vec![serde_json::json!({
            "title": "Rust",
            "url": "https://www.rust-lang.org",
            "content": "A language empowering everyone."
        })])),
    )
}

/// An agent that answers `"{identity}: {message}"`.
pub struct ScriptedAgent {
    identity: String,
    turns: usize,
}

impl ChatAgent for ScriptedAgent {
    fn identity(&self) -> &str {
        &self.identity
    }

    fn chat(&mut self, message: &str) -> String {
        self.turns += 1;
        format!("{}: {message}", self.identity)
    }

    fn reset_conversation(&mut self) -> bool {
        self.turns = 0;
        true
    }
}

/// A factory building [`ScriptedAgent`]s named `identity`.
pub fn scripted_factory(id: &str, identity: &str) -> Arc<dyn AgentFactory> {
    let identity = identity.to_string();
    FnAgentFactory::shared(id, move |_config: &ParleyConfig| {
        Ok(Box::new(ScriptedAgent {
            identity: identity.clone(),
            turns: 0,
        }) as Box<dyn ChatAgent>)
    })
}

/// A factory whose construction fails.
pub fn failing_factory(id: &str) -> Arc<dyn AgentFactory> {
    FnAgentFactory::shared(id, |_config: &ParleyConfig| {
        Err(ParleyError::Configuration("Missing OPENAI_API_KEY".into()))
    })
}

/// A factory whose construction panics.
pub fn panicking_factory(id: &str) -> Arc<dyn AgentFactory> {
    FnAgentFactory::shared(id, |_config: &ParleyConfig| -> Result<Box<dyn ChatAgent>, ParleyError> {
        panic!("constructor blew up")
    })
}
