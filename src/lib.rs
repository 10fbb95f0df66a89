//! Parley: one chat contract over many agent backends.
//!
//! Each backend keeps its conversation its own way (a message list, a
//! server-side response chain, a checkpointed thread, a memory buffer, a
//! session service, a task description). Parley puts all of them behind the
//! same blocking [`ChatAgent`](agent::ChatAgent) contract, discovers which
//! ones can be built with the [`AgentRegistry`](registry::AgentRegistry), and
//! manages the selected one through a [`Session`](session::Session).
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use parley::prelude::*;
//!
//! # fn example() -> parley::error::Result<()> {
//! let mut registry = AgentRegistry::with_builtin_agents(ParleyConfig::load()?);
//! registry.discover();
//!
//! let mut session = Session::new(Arc::new(registry));
//! session.select("history_agent")?;
//! println!("{}", session.send_message("What is today's date?")?);
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod backends;
pub mod config;
pub mod error;
pub mod generation;
pub mod prelude;
pub mod provider;
pub mod registry;
pub mod runtime;
pub mod session;
pub mod tools;
pub mod types;
pub mod util;

#[cfg(feature = "cli")]
pub mod cli;
