//! Explicit message history kept by list-based backends.

use crate::types::{ModelMessage, Role};

/// A conversation's user/assistant message list.
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    messages: Vec<ModelMessage>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a user message.
    pub fn add_user_message(&mut self, text: impl Into<String>) {
        self.messages.push(ModelMessage::user(text));
    }

    /// Add an assistant message.
    pub fn add_assistant_message(&mut self, text: impl Into<String>) {
        self.messages.push(ModelMessage::assistant(text));
    }

    /// Get all messages.
    pub fn messages(&self) -> &[ModelMessage] {
        &self.messages
    }

    /// `system`, then the whole history, then `pending` as the new user turn.
    pub fn request_messages(&self, system: &str, pending: &str) -> Vec<ModelMessage> {
        let mut out = Vec::with_capacity(self.messages.len() + 2);
        out.push(ModelMessage::system(system));
        out.extend(self.messages.iter().cloned());
        out.push(ModelMessage::user(pending));
        out
    }

    /// Plain-text rendering, one `User:`/`Assistant:` line per message.
    pub fn transcript(&self) -> String {
        self.messages
            .iter()
            .filter_map(|m| {
                let label = match m.role {
                    Role::User => "User",
                    Role::Assistant => "Assistant",
                    _ => return None,
                };
                Some(format!("{label}: {}", m.text()))
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Clear all messages.
    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// Number of messages.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_messages_wrap_history() {
        let mut c = Conversation::new();
        c.add_user_message("hi");
        c.add_assistant_message("hello");
        let msgs = c.request_messages("sys", "again");
        assert_eq!(msgs.len(), 4);
        assert_eq!(msgs[0].role, Role::System);
        assert_eq!(msgs[3].text(), "again");
        assert_eq!(c.len(), 2);
    }

    #[test]
    fn transcript_labels_turns() {
        let mut c = Conversation::new();
        c.add_user_message("q");
        c.add_assistant_message("a");
        assert_eq!(c.transcript(), "User: q\nAssistant: a");
        c.clear();
        assert!(c.is_empty());
        assert_eq!(c.transcript(), "");
    }
}
