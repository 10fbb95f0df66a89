//! Tool normalization: one tool registry shared by every backend.
//!
//! Backends describe tools to their model with [`ToolSet::definitions`] and run
//! whatever the model asks for through [`ToolSet::invoke`]. `invoke` never
//! fails: unknown tools, bad arguments, provider errors and panics all come
//! back as an ordinary [`ToolOutcome`] so the backend's loop keeps going.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tracing::{debug, warn};

use super::arguments::ToolArguments;
use super::builtin::{date_tool, web_search_tool};
use super::search::{SearchProvider, TavilySearch};
use super::tool::Tool;
use super::validation::validate_arguments;
use crate::config::ParleyConfig;
use crate::error::{ParleyError, TOOL_FAILURE_MESSAGE};
use crate::provider::ToolDefinition;

/// Tool result for a name no tool answers to.
pub const UNSUPPORTED_TOOL_MESSAGE: &str = "Unsupported tool.";

/// Names of the canonical tools, as exposed to every model.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ToolName {
    Date,
    WebSearch,
}

/// One requested tool call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocation {
    pub tool_name: ToolName,
    #[serde(default)]
    pub args: serde_json::Value,
}

impl ToolInvocation {
    pub fn new(tool_name: ToolName, args: serde_json::Value) -> Self {
        Self { tool_name, args }
    }
}

/// What a tool call produced, already in the form the model will read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutcome {
    pub content: String,
    pub is_error: bool,
}

impl ToolOutcome {
    fn ok(content: String) -> Self {
        Self {
            content,
            is_error: false,
        }
    }

    fn error(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_error: true,
        }
    }
}

/// The tools a backend exposes to its model.
#[derive(Clone, Default)]
pub struct ToolSet {
    tools: Vec<Arc<dyn Tool>>,
}

impl std::fmt::Debug for ToolSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolSet").field("tools", &self.names()).finish()
    }
}

impl ToolSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// `date` and `web_search` over the given search provider.
    pub fn standard(search: Arc<dyn SearchProvider>) -> Self {
        Self::new()
            .with_tool(date_tool())
            .with_tool(web_search_tool(search))
    }

    /// The standard set with Tavily search; fails when `TAVILY_API_KEY` is absent.
    pub fn from_config(config: &ParleyConfig) -> Result<Self, ParleyError> {
        let search = TavilySearch::from_config(config)?;
        Ok(Self::standard(Arc::new(search)))
    }

    /// Add a tool. A later tool with the same name replaces the earlier one.
    pub fn with_tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.retain(|t| t.name() != tool.name());
        self.tools.push(tool);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    /// Provider-facing descriptions of every tool.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools
            .iter()
            .map(|t| ToolDefinition {
                name: t.name().to_string(),
                description: t.description().to_string(),
                parameters: t.parameters().schema.clone(),
            })
            .collect()
    }

    /// Run a typed invocation.
    pub async fn run(&self, invocation: &ToolInvocation) -> ToolOutcome {
        self.invoke(&invocation.tool_name.to_string(), &invocation.args)
            .await
    }

    /// Run the tool called `name` with model-supplied arguments.
    pub async fn invoke(&self, name: &str, raw_args: &serde_json::Value) -> ToolOutcome {
        let Some(tool) = self.tools.iter().find(|t| t.name() == name) else {
            warn!(tool = name, "Tool not found");
            return ToolOutcome::error(UNSUPPORTED_TOOL_MESSAGE);
        };

        let args = ToolArguments::from_raw(raw_args);
        if let Err(e) = validate_arguments(args.raw(), &tool.parameters().schema) {
            warn!(tool = name, error = %e, "Rejected tool arguments");
            return ToolOutcome::error(format!("Invalid arguments for {name}: {e}"));
        }

        debug!(tool = name, "Executing tool");
        match AssertUnwindSafe(tool.execute(&args)).catch_unwind().await {
            Ok(Ok(content)) => ToolOutcome::ok(content),
            Ok(Err(e @ ParleyError::InvalidArgument(_))) => {
                warn!(tool = name, error = %e, "Tool rejected arguments");
                ToolOutcome::error(format!("Invalid arguments for {name}: {e}"))
            }
            Ok(Err(e)) => {
                warn!(tool = name, error = %e, "Tool execution failed");
                ToolOutcome::error(TOOL_FAILURE_MESSAGE)
            }
            Err(_) => {
                warn!(tool = name, "Tool panicked");
                ToolOutcome::error(TOOL_FAILURE_MESSAGE)
            }
        }
    }
}
