//! Backend whose conversation lives on the server, chained by response id.

use async_trait::async_trait;
use tracing::debug;

use super::prompts;
use crate::agent::Backend;
use crate::config::ParleyConfig;
use crate::error::ParleyError;
use crate::generation::MAX_TOOL_ITERATIONS;
use crate::provider::{ResponsesClient, ResponsesInput, ResponsesRequest, ToolDefinition};
use crate::tools::ToolSet;
use crate::types::GenerationSettings;

pub const ID: &str = "responses_agent";
pub const DISPLAY_NAME: &str = "OpenAI Responses API Agent";

/// Local handle on the server-side chain: the id of the last response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseChain {
    previous_response_id: Option<String>,
}

impl ResponseChain {
    pub fn previous_response_id(&self) -> Option<&str> {
        self.previous_response_id.as_deref()
    }
}

#[derive(Debug)]
pub struct ResponsesBackend {
    client: ResponsesClient,
    tools: ToolSet,
    settings: GenerationSettings,
    instructions: String,
}

impl ResponsesBackend {
    pub fn new(client: ResponsesClient, tools: ToolSet) -> Self {
        Self {
            client,
            tools,
            settings: GenerationSettings::default(),
            instructions: prompts::system_instructions(),
        }
    }

    pub fn from_config(config: &ParleyConfig) -> Result<Self, ParleyError> {
        let client = ResponsesClient::from_config(config)?;
        let tools = ToolSet::from_config(config)?;
        Ok(Self::new(client, tools).with_settings(config.settings().clone()))
    }

    pub fn with_settings(mut self, settings: GenerationSettings) -> Self {
        self.settings = settings;
        self
    }

    fn request(
        &self,
        input: Vec<ResponsesInput>,
        previous_response_id: Option<String>,
        tools: &[ToolDefinition],
    ) -> ResponsesRequest {
        ResponsesRequest {
            instructions: Some(self.instructions.clone()),
            input,
            previous_response_id,
            tools: tools.to_vec(),
            settings: self.settings.clone(),
        }
    }
}

#[async_trait]
impl Backend for ResponsesBackend {
    type Conversation = ResponseChain;

    fn display_name(&self) -> &str {
        DISPLAY_NAME
    }

    async fn open(&self) -> Result<ResponseChain, ParleyError> {
        Ok(ResponseChain::default())
    }

    async fn respond(
        &self,
        chain: &mut ResponseChain,
        message: &str,
    ) -> Result<String, ParleyError> {
        let tools = self.tools.definitions();
        let mut input = vec![ResponsesInput::User(message.to_string())];
        let mut previous = chain.previous_response_id.clone();

        for round in 0..MAX_TOOL_ITERATIONS {
            let output = self
                .client
                .create(&self.request(input, previous, &tools))
                .await?;
            previous = Some(output.id);

            if output.function_calls.is_empty() {
                chain.previous_response_id = previous;
                return Ok(output.text);
            }

            debug!(round, calls = output.function_calls.len(), "Answering function calls");
            input = Vec::with_capacity(output.function_calls.len());
            for call in &output.function_calls {
                let outcome = self.tools.invoke(&call.name, &call.arguments).await;
                input.push(ResponsesInput::FunctionOutput {
                    call_id: call.id.clone(),
                    output: outcome.content,
                });
            }
        }

        // The last response still awaits function outputs and cannot be
        // chained from, so the chain stays where it was.
        Err(ParleyError::ChatFailure(
            "tool iteration limit reached".into(),
        ))
    }

    async fn reset(&self, chain: &mut ResponseChain) -> Result<(), ParleyError> {
        chain.previous_response_id = None;
        Ok(())
    }
}
