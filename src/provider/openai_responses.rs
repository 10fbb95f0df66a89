//! OpenAI Responses API client.
//!
//! Unlike chat completions, the Responses API can hold the conversation on
//! the server: each response has an id, and a follow-up request that names it
//! as `previous_response_id` continues from there. Only the new input items
//! are sent on each turn.

use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::config::ParleyConfig;
use crate::error::ParleyError;
use crate::types::{AgentToolCall, GenerationSettings, Usage};
use crate::util::retry::RetryPolicy;

use super::http::{bearer_headers, build_client, status_to_error};
use super::openai::DEFAULT_BASE_URL;
use super::ToolDefinition;

/// One item of a Responses API `input` array.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponsesInput {
    /// A user message.
    User(String),
    /// The output of a function call the model requested.
    FunctionOutput { call_id: String, output: String },
}

impl ResponsesInput {
    fn to_json(&self) -> Value {
        match self {
            Self::User(text) => json!({ "role": "user", "content": text }),
            Self::FunctionOutput { call_id, output } => json!({
                "type": "function_call_output",
                "call_id": call_id,
                "output": output,
            }),
        }
    }
}

/// A single Responses API call.
#[derive(Debug, Clone, Default)]
pub struct ResponsesRequest {
    pub instructions: Option<String>,
    pub input: Vec<ResponsesInput>,
    pub previous_response_id: Option<String>,
    pub tools: Vec<ToolDefinition>,
    pub settings: GenerationSettings,
}

/// What the server answered.
#[derive(Debug, Clone, Default)]
pub struct ResponsesOutput {
    /// Server-side id; pass it as `previous_response_id` to continue.
    pub id: String,
    pub text: String,
    pub function_calls: Vec<AgentToolCall>,
    pub usage: Usage,
}

pub struct ResponsesClient {
    model: String,
    api_key: String,
    base_url: String,
    client: reqwest::Client,
    retry: RetryPolicy,
}

impl std::fmt::Debug for ResponsesClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponsesClient")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl ResponsesClient {
    pub fn new(
        model: impl Into<String>,
        api_key: impl Into<String>,
        base_url: Option<String>,
    ) -> Result<Self, ParleyError> {
        Ok(Self {
            model: model.into(),
            api_key: api_key.into(),
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            client: build_client()?,
            retry: RetryPolicy::default(),
        })
    }

    /// Build from config; fails when `OPENAI_API_KEY` is absent.
    pub fn from_config(config: &ParleyConfig) -> Result<Self, ParleyError> {
        let api_key = config.require_api_key("openai", "OPENAI_API_KEY")?;
        Self::new(config.model(), api_key, config.get_base_url("openai"))
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn model_id(&self) -> &str {
        &self.model
    }

    fn build_request_body(&self, request: &ResponsesRequest) -> Value {
        let mut body = serde_json::Map::new();
        body.insert("model".into(), self.model.clone().into());
        body.insert(
            "input".into(),
            request
                .input
                .iter()
                .map(ResponsesInput::to_json)
                .collect::<Vec<_>>()
                .into(),
        );

        if let Some(ref instructions) = request.instructions {
            body.insert("instructions".into(), instructions.clone().into());
        }
        if let Some(ref previous) = request.previous_response_id {
            body.insert("previous_response_id".into(), previous.clone().into());
        }
        if let Some(max) = request.settings.max_tokens {
            body.insert("max_output_tokens".into(), max.into());
        }
        if let Some(temp) = request.settings.temperature {
            body.insert("temperature".into(), temp.into());
        }
        if let Some(top_p) = request.settings.top_p {
            body.insert("top_p".into(), top_p.into());
        }

        if !request.tools.is_empty() {
            let tool_defs: Vec<Value> = request
                .tools
                .iter()
                .map(|t| {
                    json!({
                        "type": "function",
                        "name": t.name,
                        "description": t.description,
                        "parameters": normalize_tool_parameters(&t.parameters),
                        "strict": false,
                    })
                })
                .collect();
            body.insert("tools".into(), tool_defs.into());
        }

        Value::Object(body)
    }

    async fn create_once(&self, body: &Value) -> Result<ResponsesOutput, ParleyError> {
        let url = format!("{}/responses", self.base_url);
        let resp = self
            .client
            .post(&url)
            .headers(bearer_headers(&self.api_key))
            .json(body)
            .send()
            .await?;

        let status = resp.status().as_u16();
        if status != 200 {
            let body_text = resp.text().await.unwrap_or_default();
            return Err(status_to_error(status, &body_text));
        }

        let data: ResponsesApiResponse = resp.json().await?;
        parse_response(data)
    }

    /// Create a response.
    pub async fn create(&self, request: &ResponsesRequest) -> Result<ResponsesOutput, ParleyError> {
        let body = self.build_request_body(request);
        debug!(
            model = %self.model,
            items = request.input.len(),
            chained = request.previous_response_id.is_some(),
            "OpenAI Responses create"
        );
        self.retry.execute(|| self.create_once(&body)).await
    }
}

fn parse_response(data: ResponsesApiResponse) -> Result<ResponsesOutput, ParleyError> {
    let id = data
        .id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ParleyError::api(200, "Responses API reply without an id"))?;

    let mut text = String::new();
    let mut function_calls = Vec::new();
    for output in data.output.unwrap_or_default() {
        match output.r#type.as_str() {
            "message" => {
                for chunk in output.content.unwrap_or_default() {
                    if chunk.r#type == "output_text" {
                        if let Some(segment) = chunk.text {
                            text.push_str(&segment);
                        }
                    }
                }
            }
            "function_call" => {
                if let (Some(call_id), Some(name), Some(args)) =
                    (output.call_id, output.name, output.arguments)
                {
                    function_calls.push(AgentToolCall {
                        id: call_id,
                        name,
                        arguments: serde_json::from_str(&args).unwrap_or(Value::String(args)),
                    });
                }
            }
            _ => {}
        }
    }
    if let Some(output_text) = data.output_text.filter(|t| !t.is_empty()) {
        text = output_text;
    }

    Ok(ResponsesOutput {
        id,
        text,
        function_calls,
        usage: data
            .usage
            .map(|u| Usage {
                input_tokens: u.input_tokens,
                output_tokens: u.output_tokens,
                total_tokens: u.total_tokens.unwrap_or(u.input_tokens + u.output_tokens),
            })
            .unwrap_or_default(),
    })
}

/// The Responses API wants `required` present on object schemas.
fn normalize_tool_parameters(schema: &Value) -> Value {
    match schema.as_object() {
        Some(obj) if obj.get("type").and_then(Value::as_str) == Some("object") => {
            let mut next = obj.clone();
            next.entry("required")
                .or_insert_with(|| Value::Array(Vec::new()));
            Value::Object(next)
        }
        _ => schema.clone(),
    }
}

// Internal response types for the Responses API

#[derive(Deserialize)]
struct ResponsesApiResponse {
    id: Option<String>,
    #[serde(default)]
    output: Option<Vec<ResponsesOutputItem>>,
    #[serde(default)]
    output_text: Option<String>,
    #[serde(default)]
    usage: Option<ResponsesUsage>,
}

#[derive(Deserialize)]
struct ResponsesOutputItem {
    r#type: String,
    #[serde(default)]
    content: Option<Vec<ResponsesOutputContent>>,
    #[serde(default)]
    call_id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    arguments: Option<String>,
}

#[derive(Deserialize)]
struct ResponsesOutputContent {
    r#type: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
struct ResponsesUsage {
    #[serde(default)]
    input_tokens: u32,
    #[serde(default)]
    output_tokens: u32,
    #[serde(default)]
    total_tokens: Option<u32>,
}
