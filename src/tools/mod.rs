//! Tool library and the normalization layer backends call tools through.

pub mod arguments;
pub mod builtin;
pub mod search;
pub mod set;
pub mod tool;
pub mod types;
pub mod validation;

pub use arguments::ToolArguments;
pub use builtin::{current_date, format_date, web_search, DATE_FORMAT};
pub use search::{SearchProvider, TavilySearch};
pub use set::{ToolInvocation, ToolName, ToolOutcome, ToolSet, UNSUPPORTED_TOOL_MESSAGE};
pub use tool::{AgentTool, Tool};
pub use types::AgentToolParameters;
