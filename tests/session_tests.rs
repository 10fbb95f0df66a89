//! Session state machine over a registry of scripted agents.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use common::scripted_factory;
use parley::agent::ChatAgent;
use parley::config::ParleyConfig;
use parley::error::{ParleyError, NO_AGENT_SELECTED_MESSAGE};
use parley::registry::{AgentFactory, AgentRegistry, FnAgentFactory};
use parley::session::{Session, SessionState, Turn, TurnRole};
use pretty_assertions::assert_eq;

/// Agent whose conversation can never be fully reset.
struct StuckAgent;

impl ChatAgent for StuckAgent {
    fn identity(&self) -> &str {
        "Stuck Agent"
    }

    fn chat(&mut self, message: &str) -> String {
        format!("stuck: {message}")
    }

    fn reset_conversation(&mut self) -> bool {
        false
    }
}

/// Agent that works during discovery, then refuses every later construction.
fn flaky_factory(id: &str) -> Arc<dyn AgentFactory> {
    let built = Arc::new(AtomicUsize::new(0));
    FnAgentFactory::shared(id, move |config: &ParleyConfig| {
        if built.fetch_add(1, Ordering::SeqCst) > 0 {
            return Err(ParleyError::Configuration("credentials revoked".into()));
        }
        scripted_factory("flaky", "Flaky Agent").create(config)
    })
}

fn session() -> Session {
    let mut registry = AgentRegistry::new(ParleyConfig::new());
    registry.register(scripted_factory("alpha", "Alpha Agent"));
    registry.register(scripted_factory("beta", "Beta Agent"));
    registry.register(flaky_factory("flaky"));
    registry.discover();
    Session::new(Arc::new(registry))
}

#[test]
fn starts_unselected() {
    let session = session();
    assert_eq!(session.state(), SessionState::Unselected);
    assert_eq!(session.active_agent_id(), None);
    assert!(session.history().is_empty());
}

#[test]
fn sending_without_an_agent_is_a_usage_error() {
    let mut session = session();
    let err = session.send_message("hello").unwrap_err();
    assert!(matches!(err, ParleyError::NoAgentSelected));
    assert_eq!(err.user_message(), NO_AGENT_SELECTED_MESSAGE);
    assert!(session.history().is_empty());
}

#[test]
fn messages_are_recorded_in_order() {
    let mut session = session();
    session.select("alpha").unwrap();
    assert_eq!(session.state(), SessionState::Active("alpha".into()));
    assert_eq!(session.active_identity(), Some("Alpha Agent"));

    assert_eq!(session.send_message("one").unwrap(), "Alpha Agent: one");
    assert_eq!(session.send_message("two").unwrap(), "Alpha Agent: two");
    assert_eq!(
        session.history(),
        &[
            Turn::user("one"),
            Turn::assistant("Alpha Agent: one"),
            Turn::user("two"),
            Turn::assistant("Alpha Agent: two"),
        ]
    );
    assert_eq!(session.history()[1].role, TurnRole::Assistant);
}

#[test]
fn switching_agents_starts_a_new_conversation() {
    let mut session = session();
    session.select("alpha").unwrap();
    session.send_message("hi").unwrap();

    session.select("beta").unwrap();
    assert!(session.history().is_empty());
    assert_eq!(session.send_message("hi").unwrap(), "Beta Agent: hi");
}

#[test]
fn reselecting_the_active_agent_keeps_the_conversation() {
    let mut session = session();
    session.select("alpha").unwrap();
    session.send_message("hi").unwrap();

    session.select("alpha").unwrap();
    assert_eq!(session.history().len(), 2);
}

#[test]
fn unknown_agent_leaves_the_session_unselected() {
    let mut session = session();
    session.select("alpha").unwrap();
    session.send_message("hi").unwrap();

    let err = session.select("nope").unwrap_err();
    assert!(matches!(err, ParleyError::AgentUnavailable(_)));
    assert_eq!(session.state(), SessionState::Unselected);
    assert!(session.history().is_empty());
}

#[test]
fn failed_construction_leaves_the_session_unselected() {
    let mut session = session();
    assert!(session.registry().contains("flaky"));

    assert!(session.select("flaky").is_err());
    assert_eq!(session.state(), SessionState::Unselected);
    assert!(matches!(
        session.send_message("hi"),
        Err(ParleyError::NoAgentSelected)
    ));

    // The session stays usable with another agent.
    session.select("beta").unwrap();
    assert_eq!(session.send_message("hi").unwrap(), "Beta Agent: hi");
}

#[test]
fn clear_empties_history_and_keeps_the_agent() {
    let mut session = session();
    assert!(session.clear());

    session.select("alpha").unwrap();
    session.send_message("hi").unwrap();
    assert!(session.clear());
    assert!(session.history().is_empty());
    assert_eq!(session.active_agent_id(), Some("alpha"));
    assert_eq!(session.send_message("again").unwrap(), "Alpha Agent: again");
}

#[test]
fn clear_empties_history_even_when_reset_fails() {
    let mut registry = AgentRegistry::new(ParleyConfig::new());
    registry.register(FnAgentFactory::shared("stuck", |_config: &ParleyConfig| {
        Ok(Box::new(StuckAgent) as Box<dyn ChatAgent>)
    }));
    registry.discover();
    let mut session = Session::new(Arc::new(registry));

    session.select("stuck").unwrap();
    session.send_message("hi").unwrap();
    assert_eq!(session.history().len(), 2);

    assert!(!session.clear());
    assert!(session.history().is_empty());
    assert_eq!(session.active_agent_id(), Some("stuck"));
    assert_eq!(session.send_message("again").unwrap(), "stuck: again");
}

#[test]
fn sessions_share_one_registry() {
    let mut registry = AgentRegistry::new(ParleyConfig::new());
    registry.register(scripted_factory("alpha", "Alpha Agent"));
    registry.discover();
    let registry = Arc::new(registry);

    let mut first = Session::new(registry.clone());
    let mut second = Session::new(registry);
    first.select("alpha").unwrap();
    second.select("alpha").unwrap();
    first.send_message("only here").unwrap();

    assert_eq!(first.history().len(), 2);
    assert!(second.history().is_empty());
}

#[test]
fn agents_can_be_driven_directly() {
    let mut registry = AgentRegistry::new(ParleyConfig::new());
    registry.register(scripted_factory("alpha", "Alpha Agent"));
    registry.discover();
    let mut agent = registry.instantiate("alpha").unwrap();
    assert!(agent.reset_conversation());
    assert_eq!(agent.chat("x"), "Alpha Agent: x");
}
