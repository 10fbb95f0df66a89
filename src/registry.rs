//! Agent registry: discovers which candidate agents can actually be built.
//!
//! Candidates are factories registered up front (the built-in table, plus
//! anything a host adds). [`AgentRegistry::discover`] builds each one behind a
//! panic boundary, keeps the ones that produce a usable agent, and records an
//! `id -> display name` list. A failing candidate is logged and skipped; it
//! never stops the others from being discovered.

use std::collections::{BTreeMap, HashSet};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::agent::ChatAgent;
use crate::backends::builtin_factories;
use crate::config::ParleyConfig;
use crate::error::ParleyError;

/// Builds one kind of agent from configuration.
pub trait AgentFactory: Send + Sync {
    /// Stable registration key, e.g. `"history_agent"`.
    fn id(&self) -> &str;

    /// Construct a fresh agent.
    fn create(&self, config: &ParleyConfig) -> Result<Box<dyn ChatAgent>, ParleyError>;
}

/// An [`AgentFactory`] backed by a closure.
pub struct FnAgentFactory<F> {
    id: String,
    build: F,
}

impl<F> FnAgentFactory<F>
where
    F: Fn(&ParleyConfig) -> Result<Box<dyn ChatAgent>, ParleyError> + Send + Sync + 'static,
{
    pub fn new(id: impl Into<String>, build: F) -> Self {
        Self {
            id: id.into(),
            build,
        }
    }

    pub fn shared(id: impl Into<String>, build: F) -> Arc<dyn AgentFactory> {
        Arc::new(Self::new(id, build))
    }
}

impl<F> AgentFactory for FnAgentFactory<F>
where
    F: Fn(&ParleyConfig) -> Result<Box<dyn ChatAgent>, ParleyError> + Send + Sync + 'static,
{
    fn id(&self) -> &str {
        &self.id
    }

    fn create(&self, config: &ParleyConfig) -> Result<Box<dyn ChatAgent>, ParleyError> {
        (self.build)(config)
    }
}

/// A discovered agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentDescriptor {
    pub id: String,
    pub display_name: String,
}

/// Registered candidates and the result of the last discovery.
pub struct AgentRegistry {
    config: ParleyConfig,
    factories: Vec<Arc<dyn AgentFactory>>,
    discovered: Vec<AgentDescriptor>,
    sources: Vec<Arc<dyn AgentFactory>>,
}

impl std::fmt::Debug for AgentRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentRegistry")
            .field("candidates", &self.factories.len())
            .field("discovered", &self.discovered)
            .finish()
    }
}

impl AgentRegistry {
    pub fn new(config: ParleyConfig) -> Self {
        Self {
            config,
            factories: Vec::new(),
            discovered: Vec::new(),
            sources: Vec::new(),
        }
    }

    /// A registry with every built-in backend registered (not yet discovered).
    pub fn with_builtin_agents(config: ParleyConfig) -> Self {
        let mut registry = Self::new(config);
        for factory in builtin_factories() {
            registry.register(factory);
        }
        registry
    }

    /// Add a candidate. Takes effect at the next [`discover`](Self::discover).
    pub fn register(&mut self, factory: Arc<dyn AgentFactory>) {
        self.factories.push(factory);
    }

    pub fn config(&self) -> &ParleyConfig {
        &self.config
    }

    /// Build every candidate once and record the ones that work.
    ///
    /// Candidates are tried in id order; registration order breaks ties, and
    /// the first working candidate for an id wins. Probe instances are
    /// dropped as soon as their identity is read.
    pub fn discover(&mut self) -> &[AgentDescriptor] {
        let mut candidates = self.factories.clone();
        candidates.sort_by(|a, b| a.id().cmp(b.id()));

        let mut discovered = Vec::new();
        let mut sources = Vec::new();
        let mut seen = HashSet::new();

        for factory in candidates {
            let id = factory.id().to_string();
            if id.trim().is_empty() {
                warn!("Dropping agent candidate with an empty id");
                continue;
            }
            if seen.contains(&id) {
                warn!(candidate = %id, "Duplicate agent id, keeping the first");
                continue;
            }
            match self.build(factory.as_ref()) {
                Ok(agent) => {
                    let display_name = agent.identity().to_string();
                    debug!(candidate = %id, display_name = %display_name, "Discovered agent");
                    seen.insert(id.clone());
                    discovered.push(AgentDescriptor { id, display_name });
                    sources.push(factory);
                }
                Err(e) => warn!(candidate = %id, error = %e, "Dropping agent candidate"),
            }
        }

        info!(count = discovered.len(), "Agent discovery complete");
        self.discovered = discovered;
        self.sources = sources;
        &self.discovered
    }

    /// Agents found by the last discovery, in id order.
    pub fn agents(&self) -> &[AgentDescriptor] {
        &self.discovered
    }

    /// `id -> display name` for every discovered agent.
    pub fn agent_map(&self) -> BTreeMap<String, String> {
        self.discovered
            .iter()
            .map(|d| (d.id.clone(), d.display_name.clone()))
            .collect()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.position(id).is_some()
    }

    pub fn display_name(&self, id: &str) -> Option<&str> {
        self.position(id)
            .map(|i| self.discovered[i].display_name.as_str())
    }

    /// Construct a fresh instance of a discovered agent.
    pub fn instantiate(&self, id: &str) -> Result<Box<dyn ChatAgent>, ParleyError> {
        let index = self
            .position(id)
            .ok_or_else(|| ParleyError::AgentUnavailable(format!("'{id}' was not discovered")))?;
        self.build(self.sources[index].as_ref()).map_err(|e| {
            warn!(agent = id, error = %e, "Agent construction failed");
            ParleyError::AgentUnavailable(format!("'{id}' could not be constructed"))
        })
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.discovered.iter().position(|d| d.id == id)
    }

    fn build(&self, factory: &dyn AgentFactory) -> Result<Box<dyn ChatAgent>, ParleyError> {
        let failure = |message: &str| ParleyError::DiscoveryFailure {
            candidate: factory.id().to_string(),
            message: message.to_string(),
        };

        let agent = panic::catch_unwind(AssertUnwindSafe(|| factory.create(&self.config)))
            .map_err(|_| failure("constructor panicked"))?
            .map_err(|e| failure(&e.to_string()))?;

        if agent.identity().trim().is_empty() {
            return Err(failure("agent has an empty identity"));
        }
        Ok(agent)
    }
}
