//! The session: which agent is selected, and the host-visible turn history.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use strum::Display;
use tracing::{info, warn};

use crate::agent::ChatAgent;
use crate::error::ParleyError;
use crate::registry::AgentRegistry;

/// Who spoke a [`Turn`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

/// One message in the host's display history.
///
/// This is display state only. Each agent keeps its own conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: TurnRole,
    pub content: String,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Assistant,
            content: content.into(),
        }
    }
}

/// Selection state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Unselected,
    Active(String),
}

struct ActiveAgent {
    id: String,
    agent: Box<dyn ChatAgent>,
}

/// Owns at most one live agent plus the turn history shown to the user.
pub struct Session {
    registry: Arc<AgentRegistry>,
    active: Option<ActiveAgent>,
    history: Vec<Turn>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("state", &self.state())
            .field("turns", &self.history.len())
            .finish()
    }
}

impl Session {
    pub fn new(registry: Arc<AgentRegistry>) -> Self {
        Self {
            registry,
            active: None,
            history: Vec::new(),
        }
    }

    pub fn registry(&self) -> &AgentRegistry {
        &self.registry
    }

    pub fn state(&self) -> SessionState {
        match &self.active {
            Some(active) => SessionState::Active(active.id.clone()),
            None => SessionState::Unselected,
        }
    }

    pub fn active_agent_id(&self) -> Option<&str> {
        self.active.as_ref().map(|a| a.id.as_str())
    }

    pub fn active_identity(&self) -> Option<&str> {
        self.active.as_ref().map(|a| a.agent.identity())
    }

    pub fn history(&self) -> &[Turn] {
        &self.history
    }

    /// Select `id`, building a fresh agent for it.
    ///
    /// Selecting the active id again does nothing. Any other selection drops
    /// the current agent with its conversation and empties the history, even
    /// when construction of the new agent then fails; in that case the
    /// session is left unselected.
    pub fn select(&mut self, id: &str) -> Result<(), ParleyError> {
        if self.active_agent_id() == Some(id) {
            return Ok(());
        }

        self.active = None;
        self.history.clear();

        let agent = self.registry.instantiate(id)?;
        info!(agent = id, identity = agent.identity(), "Agent selected");
        self.active = Some(ActiveAgent {
            id: id.to_string(),
            agent,
        });
        Ok(())
    }

    /// Send one message to the active agent and record both turns.
    ///
    /// The reply is returned as-is, including the agent's own fixed error
    /// replies. Fails only with [`ParleyError::NoAgentSelected`].
    pub fn send_message(&mut self, text: &str) -> Result<String, ParleyError> {
        let active = self.active.as_mut().ok_or(ParleyError::NoAgentSelected)?;
        let reply = active.agent.chat(text);
        self.history.push(Turn::user(text));
        self.history.push(Turn::assistant(reply.clone()));
        Ok(reply)
    }

    /// Reset the active agent's conversation and empty the history.
    ///
    /// Returns the agent's own reset result; the history is cleared either way.
    pub fn clear(&mut self) -> bool {
        self.history.clear();
        match self.active.as_mut() {
            Some(active) => {
                let reset = active.agent.reset_conversation();
                if !reset {
                    warn!(agent = %active.id, "Agent could not fully reset its conversation");
                }
                reset
            }
            None => true,
        }
    }
}
