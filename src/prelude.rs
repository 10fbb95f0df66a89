//! Convenience re-exports for common use.

pub use crate::agent::{Adapter, Backend, ChatAgent};
pub use crate::config::ParleyConfig;
pub use crate::error::{ParleyError, Result};
pub use crate::registry::{AgentDescriptor, AgentFactory, AgentRegistry, FnAgentFactory};
pub use crate::session::{Session, SessionState, Turn, TurnRole};
pub use crate::tools::{current_date, web_search, SearchProvider, ToolName, ToolSet};
pub use crate::types::{GenerationSettings, ModelMessage};
