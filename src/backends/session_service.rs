//! Backend whose state is a session id in an async session service.
//!
//! The service stores every session's events (user message, tool traffic,
//! replies) keyed by app, user and session id. The backend only keeps the
//! id; each turn reads the history back from the service.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use super::BackendParts;
use crate::agent::Backend;
use crate::config::ParleyConfig;
use crate::error::ParleyError;
use crate::types::{ModelMessage, Role};

pub const ID: &str = "session_agent";
pub const DISPLAY_NAME: &str = "Session Service Agent";

const APP_NAME: &str = "parley";
const DEFAULT_USER_ID: &str = "default_user";

/// One recorded message in a session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionEvent {
    pub id: Uuid,
    pub author: String,
    pub message: ModelMessage,
    pub timestamp: DateTime<Utc>,
}

impl SessionEvent {
    fn new(message: ModelMessage) -> Self {
        let author = match message.role {
            Role::User => "user",
            _ => "model",
        };
        Self {
            id: Uuid::new_v4(),
            author: author.to_string(),
            message,
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct SessionKey {
    app_name: String,
    user_id: String,
    session_id: String,
}

impl SessionKey {
    fn new(app_name: &str, user_id: &str, session_id: &str) -> Self {
        Self {
            app_name: app_name.to_string(),
            user_id: user_id.to_string(),
            session_id: session_id.to_string(),
        }
    }
}

/// Sessions held in process memory.
#[derive(Debug, Clone, Default)]
pub struct InMemorySessionService {
    sessions: Arc<RwLock<HashMap<SessionKey, Vec<SessionEvent>>>>,
}

impl InMemorySessionService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty session. Fails if the id is already taken.
    pub async fn create_session(
        &self,
        app_name: &str,
        user_id: &str,
        session_id: &str,
    ) -> Result<(), ParleyError> {
        let key = SessionKey::new(app_name, user_id, session_id);
        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(&key) {
            return Err(ParleyError::InvalidArgument(format!(
                "session '{session_id}' already exists"
            )));
        }
        sessions.insert(key, Vec::new());
        Ok(())
    }

    /// All events of a session, oldest first.
    pub async fn events(
        &self,
        app_name: &str,
        user_id: &str,
        session_id: &str,
    ) -> Result<Vec<SessionEvent>, ParleyError> {
        self.sessions
            .read()
            .await
            .get(&SessionKey::new(app_name, user_id, session_id))
            .cloned()
            .ok_or_else(|| unknown_session(session_id))
    }

    pub async fn append_events(
        &self,
        app_name: &str,
        user_id: &str,
        session_id: &str,
        events: impl IntoIterator<Item = SessionEvent> + Send,
    ) -> Result<(), ParleyError> {
        let mut sessions = self.sessions.write().await;
        let stored = sessions
            .get_mut(&SessionKey::new(app_name, user_id, session_id))
            .ok_or_else(|| unknown_session(session_id))?;
        stored.extend(events);
        Ok(())
    }

    pub async fn delete_session(&self, app_name: &str, user_id: &str, session_id: &str) -> bool {
        self.sessions
            .write()
            .await
            .remove(&SessionKey::new(app_name, user_id, session_id))
            .is_some()
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

fn unknown_session(session_id: &str) -> ParleyError {
    ParleyError::InvalidArgument(format!("unknown session '{session_id}'"))
}

/// The session a conversation is bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionHandle {
    pub user_id: String,
    pub session_id: String,
}

#[derive(Debug)]
pub struct SessionBackend {
    parts: BackendParts,
    service: InMemorySessionService,
}

impl SessionBackend {
    pub fn new(parts: BackendParts) -> Self {
        Self {
            parts,
            service: InMemorySessionService::new(),
        }
    }

    pub fn from_config(config: &ParleyConfig) -> Result<Self, ParleyError> {
        Ok(Self::new(BackendParts::from_config(config)?))
    }

    pub fn service(&self) -> &InMemorySessionService {
        &self.service
    }

    async fn new_session(&self) -> Result<SessionHandle, ParleyError> {
        let handle = SessionHandle {
            user_id: DEFAULT_USER_ID.to_string(),
            session_id: Uuid::new_v4().to_string(),
        };
        self.service
            .create_session(APP_NAME, &handle.user_id, &handle.session_id)
            .await?;
        debug!(session_id = %handle.session_id, "Created session");
        Ok(handle)
    }
}

#[async_trait]
impl Backend for SessionBackend {
    type Conversation = SessionHandle;

    fn display_name(&self) -> &str {
        DISPLAY_NAME
    }

    async fn open(&self) -> Result<SessionHandle, ParleyError> {
        self.new_session().await
    }

    async fn respond(
        &self,
        session: &mut SessionHandle,
        message: &str,
    ) -> Result<String, ParleyError> {
        let events = self
            .service
            .events(APP_NAME, &session.user_id, &session.session_id)
            .await?;

        let mut messages = Vec::with_capacity(events.len() + 2);
        messages.push(ModelMessage::system(self.parts.instructions.clone()));
        messages.extend(events.into_iter().map(|e| e.message));
        let prior = messages.len();
        messages.push(ModelMessage::user(message));

        let result = self.parts.generate(messages).await?;
        let new_events: Vec<SessionEvent> = result
            .messages
            .into_iter()
            .skip(prior)
            .map(SessionEvent::new)
            .collect();
        self.service
            .append_events(APP_NAME, &session.user_id, &session.session_id, new_events)
            .await?;
        Ok(result.text)
    }

    async fn reset(&self, session: &mut SessionHandle) -> Result<(), ParleyError> {
        let fresh = self.new_session().await?;
        self.service
            .delete_session(APP_NAME, &session.user_id, &session.session_id)
            .await;
        *session = fresh;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sessions_are_keyed_by_app_user_and_id() {
        let service = InMemorySessionService::new();
        service.create_session("app", "u", "s1").await.unwrap();
        assert!(service.create_session("app", "u", "s1").await.is_err());
        service.create_session("app", "other", "s1").await.unwrap();

        service
            .append_events("app", "u", "s1", vec![SessionEvent::new(ModelMessage::user("hi"))])
            .await
            .unwrap();
        let events = service.events("app", "u", "s1").await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].author, "user");
        assert!(service.events("app", "other", "s1").await.unwrap().is_empty());

        assert!(service.delete_session("app", "u", "s1").await);
        assert!(service.events("app", "u", "s1").await.is_err());
        assert_eq!(service.session_count().await, 1);
    }
}
