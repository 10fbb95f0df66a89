//! Error types for Parley.
//!
//! Errors carry full detail for logs. Anything that crosses the adapter or
//! session boundary toward the host is reduced to one of the fixed strings in
//! this module via [`ParleyError::user_message`].

pub mod unified;

pub use unified::ErrorCategory;

use thiserror::Error;

/// Reply returned when a chat turn fails for any internal reason.
pub const CHAT_FAILURE_MESSAGE: &str = "Sorry, I encountered an error processing your request.";

/// Tool result substituted when a tool provider call fails.
pub const TOOL_FAILURE_MESSAGE: &str = "Sorry, I couldn't complete that search right now.";

/// Shown by the host when an agent cannot be selected.
pub const AGENT_UNAVAILABLE_MESSAGE: &str = "Error loading agent.";

/// Reply returned when a backend produced no text at all.
pub const EMPTY_RESPONSE_MESSAGE: &str = "Agent generated an empty response.";

/// Shown when a message is sent before any agent is selected.
pub const NO_AGENT_SELECTED_MESSAGE: &str = "Select an agent before sending a message.";

/// Primary error type for all Parley operations.
#[derive(Error, Debug)]
pub enum ParleyError {
    #[error("Discovery failed for candidate '{candidate}': {message}")]
    DiscoveryFailure { candidate: String, message: String },

    #[error("Agent unavailable: {0}")]
    AgentUnavailable(String),

    #[error("Tool execution error: {tool_name}: {message}")]
    ToolExecution { tool_name: String, message: String },

    #[error("Chat failure: {0}")]
    ChatFailure(String),

    #[error("No agent selected")]
    NoAgentSelected,

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Rate limited: retry after {retry_after_ms:?}ms")]
    RateLimited { retry_after_ms: Option<u64> },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl ParleyError {
    /// Create an API error.
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Wrap any failure raised by a search or date provider.
    pub fn tool(tool_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ToolExecution {
            tool_name: tool_name.into(),
            message: message.into(),
        }
    }

    /// Classify this error into a category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::DiscoveryFailure { .. } => ErrorCategory::Discovery,
            Self::AgentUnavailable(_) => ErrorCategory::AgentUnavailable,
            Self::ToolExecution { .. } => ErrorCategory::ToolExecution,
            Self::ChatFailure(_) => ErrorCategory::Chat,
            Self::NoAgentSelected => ErrorCategory::Usage,
            Self::Authentication(_) => ErrorCategory::Authentication,
            Self::RateLimited { .. } => ErrorCategory::RateLimit,
            Self::Network(_) => ErrorCategory::Network,
            Self::Configuration(_) => ErrorCategory::Configuration,
            Self::Serialization(_) => ErrorCategory::Serialization,
            Self::Api { status, .. } => match status {
                401 | 403 => ErrorCategory::Authentication,
                429 => ErrorCategory::RateLimit,
                500..=599 => ErrorCategory::Server,
                _ => ErrorCategory::Api,
            },
            Self::Io(_) | Self::InvalidArgument(_) => ErrorCategory::Unknown,
        }
    }

    /// Whether this error is potentially retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::RateLimit | ErrorCategory::Network | ErrorCategory::Server
        )
    }

    /// The fixed, non-technical string a host may show for this error.
    pub fn user_message(&self) -> &'static str {
        match self.category() {
            ErrorCategory::ToolExecution => TOOL_FAILURE_MESSAGE,
            ErrorCategory::Discovery | ErrorCategory::AgentUnavailable => {
                AGENT_UNAVAILABLE_MESSAGE
            }
            ErrorCategory::Usage => NO_AGENT_SELECTED_MESSAGE,
            _ => CHAT_FAILURE_MESSAGE,
        }
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, ParleyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_messages_never_echo_error_details() {
        let errors = vec![
            ParleyError::Authentication("sk-secret-key".into()),
            ParleyError::api(500, "stack trace at line 42"),
            ParleyError::ChatFailure("nested loop".into()),
            ParleyError::tool("web_search", "tvly-secret"),
            ParleyError::AgentUnavailable("crashed in ctor".into()),
        ];
        for err in errors {
            let shown = err.user_message();
            assert!(!shown.contains("secret"));
            assert!(!shown.contains("stack"));
            assert!(!shown.contains("ctor"));
            assert!(!shown.is_empty());
        }
    }

    #[test]
    fn status_codes_map_to_categories() {
        assert_eq!(
            ParleyError::api(401, "no").category(),
            ErrorCategory::Authentication
        );
        assert_eq!(ParleyError::api(429, "slow").category(), ErrorCategory::RateLimit);
        assert_eq!(ParleyError::api(503, "down").category(), ErrorCategory::Server);
        assert_eq!(ParleyError::api(400, "bad").category(), ErrorCategory::Api);
        assert!(ParleyError::api(503, "down").is_retryable());
        assert!(!ParleyError::api(400, "bad").is_retryable());
    }

    #[test]
    fn tool_failures_get_the_apology() {
        let err = ParleyError::tool("web_search", "connection reset");
        assert_eq!(err.user_message(), TOOL_FAILURE_MESSAGE);
        assert_eq!(
            err.to_string(),
            "Tool execution error: web_search: connection reset"
        );
    }
}
