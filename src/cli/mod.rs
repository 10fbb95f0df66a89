//! CLI entry point for Parley.

pub mod repl;

use std::io::{self, Write};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{ArgAction, Args, Parser, Subcommand};
use tracing::debug;

use crate::config::ParleyConfig;
use crate::error::ParleyError;
use crate::registry::AgentRegistry;
use crate::session::Session;

/// Parley CLI
#[derive(Parser, Debug)]
#[command(name = "parley", version, about = "Parley: chat with pluggable agent backends")]
pub struct Cli {
    /// Model used by every backend (defaults to gpt-4o-mini)
    #[arg(short, long, global = true)]
    pub model: Option<String>,

    /// Temperature (0.0 - 2.0)
    #[arg(short, long, global = true)]
    pub temperature: Option<f64>,

    /// Max tokens per model call
    #[arg(long, global = true)]
    pub max_tokens: Option<u32>,

    /// More log output on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the agents that can be used
    Agents,
    /// Send one message to an agent and print the reply
    Ask(AskArgs),
    /// Interactive chat
    Chat(ChatArgs),
}

/// Arguments for `parley ask`.
#[derive(Args, Debug)]
pub struct AskArgs {
    /// Agent id (see `parley agents`)
    #[arg(short, long)]
    pub agent: String,

    /// The message; multiple words are joined with spaces
    #[arg(required = true, num_args = 1..)]
    pub prompt: Vec<String>,
}

/// Arguments for `parley chat`.
#[derive(Args, Debug)]
pub struct ChatArgs {
    /// Agent to start with (defaults to the first discovered)
    #[arg(short, long)]
    pub agent: Option<String>,
}

impl Cli {
    /// Parse CLI arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Default log filter for the verbosity flag; `RUST_LOG` overrides it.
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }

    /// Apply the command-line overrides to `config`.
    pub fn apply(&self, mut config: ParleyConfig) -> ParleyConfig {
        if let Some(ref model) = self.model {
            config.set_model(model.clone());
        }
        let mut settings = config.settings().clone();
        if let Some(t) = self.temperature {
            settings.temperature = Some(t);
        }
        if let Some(max) = self.max_tokens {
            settings.max_tokens = Some(max);
        }
        config.with_settings(settings)
    }
}

/// Run a parsed command against stdin/stdout.
pub fn run(cli: Cli) -> Result<ExitCode, ParleyError> {
    let config = cli.apply(ParleyConfig::load()?);
    debug!(model = config.model(), "Configuration loaded");

    let mut registry = AgentRegistry::with_builtin_agents(config);
    if registry.discover().is_empty() {
        eprintln!("No agents available. Check OPENAI_API_KEY and TAVILY_API_KEY.");
        return Ok(ExitCode::FAILURE);
    }
    let mut session = Session::new(Arc::new(registry));

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match cli.command {
        Commands::Agents => {
            repl::write_agents(&session, &mut out)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Ask(args) => {
            if let Err(e) = session.select(&args.agent) {
                eprintln!("{}", e.user_message());
                return Ok(ExitCode::FAILURE);
            }
            let reply = session.send_message(&args.prompt.join(" "))?;
            writeln!(out, "{reply}")?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Chat(args) => {
            let stdin = io::stdin();
            repl::run(&mut session, args.agent.as_deref(), stdin.lock(), &mut out)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_agents() {
        let cli = Cli::try_parse_from(["parley", "agents"]).unwrap();
        assert!(matches!(cli.command, Commands::Agents));
        assert_eq!(cli.log_filter(), "warn");
    }

    #[test]
    fn parse_ask_joins_words() {
        let cli = Cli::try_parse_from([
            "parley", "ask", "--agent", "history_agent", "what", "day", "is", "it",
        ])
        .unwrap();
        match cli.command {
            Commands::Ask(args) => {
                assert_eq!(args.agent, "history_agent");
                assert_eq!(args.prompt.join(" "), "what day is it");
            }
            other => panic!("expected Ask, got {other:?}"),
        }
    }

    #[test]
    fn parse_chat_with_global_options() {
        let cli = Cli::try_parse_from([
            "parley", "chat", "-a", "memory_agent", "--model", "gpt-4o", "-t", "0.5", "-vv",
        ])
        .unwrap();
        assert_eq!(cli.model.as_deref(), Some("gpt-4o"));
        assert_eq!(cli.log_filter(), "debug");
        match cli.command {
            Commands::Chat(ref args) => assert_eq!(args.agent.as_deref(), Some("memory_agent")),
            ref other => panic!("expected Chat, got {other:?}"),
        }

        let config = cli.apply(ParleyConfig::new());
        assert_eq!(config.model(), "gpt-4o");
        assert_eq!(config.settings().temperature, Some(0.5));
    }

    #[test]
    fn parse_missing_subcommand_is_error() {
        assert!(Cli::try_parse_from(["parley"]).is_err());
    }

    #[test]
    fn parse_ask_requires_agent_and_prompt() {
        assert!(Cli::try_parse_from(["parley", "ask", "hello"]).is_err());
        assert!(Cli::try_parse_from(["parley", "ask", "--agent", "x"]).is_err());
    }
}
