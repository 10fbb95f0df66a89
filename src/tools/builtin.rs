//! The tool library: current date and web search.
//!
//! These functions are the single source of tool output. Every backend reaches
//! them through [`ToolSet`](super::ToolSet), so the text a model receives for a
//! given call is the same no matter which backend issued it.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::info;

use super::search::SearchProvider;
use super::set::ToolName;
use super::tool::{AgentTool, Tool};
use super::types::AgentToolParameters;
use crate::error::ParleyError;
use crate::util::truncate_utf8;

/// `strftime` pattern producing e.g. `March 07, 2025`.
pub const DATE_FORMAT: &str = "%B %d, %Y";

const LOG_RESULT_MAX_BYTES: usize = 500;

/// Today's local date as `Month DD, YYYY`.
pub fn current_date() -> String {
    format_date(chrono::Local::now().date_naive())
}

/// Format a calendar date the way [`current_date`] does.
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Search the web and return the provider's raw results as a JSON array.
pub async fn web_search(provider: &dyn SearchProvider, query: &str) -> Result<String, ParleyError> {
    let tool_name = ToolName::WebSearch.to_string();
    let results = provider
        .search(query)
        .await
        .map_err(|e| ParleyError::tool(&tool_name, e.to_string()))?;
    let serialized =
        serde_json::to_string(&results).map_err(|e| ParleyError::tool(&tool_name, e.to_string()))?;

    info!(
        tool = %tool_name,
        query,
        results = truncate_utf8(&serialized, LOG_RESULT_MAX_BYTES),
        "Web search results"
    );
    Ok(serialized)
}

/// The `date` tool.
pub fn date_tool() -> Arc<dyn Tool> {
    Arc::new(AgentTool::new(
        ToolName::Date.to_string(),
        "Get the current date",
        AgentToolParameters::empty(),
        |_args| async move { Ok(current_date()) },
    ))
}

/// The `web_search` tool backed by `provider`.
pub fn web_search_tool(provider: Arc<dyn SearchProvider>) -> Arc<dyn Tool> {
    Arc::new(AgentTool::new(
        ToolName::WebSearch.to_string(),
        "Search the web for information",
        AgentToolParameters::object()
            .string("query", "Search query", true)
            .build(),
        move |args| {
            let provider = provider.clone();
            async move {
                let query = args.get_str("query")?;
                web_search(provider.as_ref(), query).await
            }
        },
    ))
}
