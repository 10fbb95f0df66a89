//! Backend that runs every turn as a one-shot task.
//!
//! Nothing is replayed as chat messages. The agent is given a persona, and the
//! prior turns are folded into the task description with the new query.

use async_trait::async_trait;

use super::{prompts, BackendParts};
use crate::agent::{Backend, Conversation};
use crate::config::ParleyConfig;
use crate::error::ParleyError;
use crate::types::ModelMessage;

pub const ID: &str = "crew_agent";
pub const DISPLAY_NAME: &str = "Task Crew Agent";

const EXPECTED_OUTPUT: &str =
    "A clear, well-structured response that directly answers the user's query.";

/// Persona prompt: role, goal (with instructions) and backstory.
pub fn persona() -> String {
    format!(
        "You are {role}\nYour personal goal is: {goal}\n{instructions}\nBackstory: {backstory}",
        role = prompts::ROLE.trim_start_matches("You are ").trim(),
        goal = prompts::GOAL,
        instructions = prompts::INSTRUCTIONS,
        backstory = prompts::KNOWLEDGE,
    )
}

/// The task text for one turn.
pub fn task_description(history: &str, query: &str) -> String {
    let history = if history.is_empty() { "(none)" } else { history };
    format!(
        "Answer the user's query using the provided tools when helpful.\n\n\
         Conversation history:\n{history}\n\n\
         User query:\n{query}\n\n\
         Expected output: {EXPECTED_OUTPUT}"
    )
}

#[derive(Debug)]
pub struct CrewBackend {
    parts: BackendParts,
}

impl CrewBackend {
    pub fn new(parts: BackendParts) -> Self {
        Self {
            parts: parts.with_instructions(persona()),
        }
    }

    pub fn from_config(config: &ParleyConfig) -> Result<Self, ParleyError> {
        Ok(Self::new(BackendParts::from_config(config)?))
    }
}

#[async_trait]
impl Backend for CrewBackend {
    type Conversation = Conversation;

    fn display_name(&self) -> &str {
        DISPLAY_NAME
    }

    async fn open(&self) -> Result<Conversation, ParleyError> {
        Ok(Conversation::new())
    }

    async fn respond(
        &self,
        conversation: &mut Conversation,
        message: &str,
    ) -> Result<String, ParleyError> {
        let messages = vec![
            ModelMessage::system(self.parts.instructions.clone()),
            ModelMessage::user(task_description(&conversation.transcript(), message)),
        ];
        let result = self.parts.generate(messages).await?;

        conversation.add_user_message(message);
        conversation.add_assistant_message(result.text.clone());
        Ok(result.text)
    }

    async fn reset(&self, conversation: &mut Conversation) -> Result<(), ParleyError> {
        conversation.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_carries_history_and_query() {
        let task = task_description("User: hi\nAssistant: hello", "and now?");
        assert!(task.contains("Conversation history:\nUser: hi\nAssistant: hello"));
        assert!(task.contains("User query:\nand now?"));
        assert!(task_description("", "q").contains("(none)"));
    }

    #[test]
    fn persona_uses_shared_prompts() {
        let p = persona();
        assert!(p.starts_with("You are a helpful research assistant."));
        assert!(p.contains(prompts::KNOWLEDGE));
    }
}
