//! Line-oriented chat loop over any reader/writer pair.

use std::io::{self, BufRead, Write};

use tracing::info;

use crate::session::{Session, TurnRole};

const HELP: &str = "\
Commands:
  /agents      list available agents
  /use ID      switch to another agent (starts a new conversation)
  /clear       clear the conversation
  /history     show this conversation
  /help        show this help
  /quit        leave (also: exit, quit)
Anything else is sent to the current agent.";

/// One line of REPL input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Send(String),
    Agents,
    Use(String),
    Clear,
    History,
    Help,
    Quit,
    Empty,
    Unknown(String),
}

impl ReplCommand {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Self::Empty;
        }
        if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
            return Self::Quit;
        }
        let Some(rest) = line.strip_prefix('/') else {
            return Self::Send(line.to_string());
        };

        let (name, arg) = match rest.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (rest, ""),
        };
        match name {
            "agents" => Self::Agents,
            "use" if !arg.is_empty() => Self::Use(arg.to_string()),
            "clear" => Self::Clear,
            "history" => Self::History,
            "help" => Self::Help,
            "quit" | "exit" => Self::Quit,
            _ => Self::Unknown(line.to_string()),
        }
    }
}

/// Print discovered agents, marking the active one.
pub fn write_agents<W: Write>(session: &Session, out: &mut W) -> io::Result<()> {
    let active = session.active_agent_id();
    for agent in session.registry().agents() {
        let marker = if Some(agent.id.as_str()) == active { "*" } else { " " };
        writeln!(out, "{marker} {:<20} {}", agent.id, agent.display_name)?;
    }
    Ok(())
}

fn select<W: Write>(session: &mut Session, id: &str, out: &mut W) -> io::Result<()> {
    match session.select(id) {
        Ok(()) => writeln!(
            out,
            "Chat with {}",
            session.active_identity().unwrap_or(id)
        ),
        Err(e) => writeln!(out, "{}", e.user_message()),
    }
}

/// Run the loop until `/quit` or end of input.
///
/// Starts with `initial` selected, or the first discovered agent.
pub fn run<R: BufRead, W: Write>(
    session: &mut Session,
    initial: Option<&str>,
    input: R,
    out: &mut W,
) -> io::Result<()> {
    let first = initial
        .map(str::to_string)
        .or_else(|| session.registry().agents().first().map(|a| a.id.clone()));
    if let Some(id) = first {
        select(session, &id, out)?;
    }
    writeln!(out, "Type /help for commands.")?;

    let mut lines = input.lines();
    loop {
        write!(out, "You: ")?;
        out.flush()?;
        let Some(line) = lines.next().transpose()? else {
            writeln!(out)?;
            break;
        };

        match ReplCommand::parse(&line) {
            ReplCommand::Empty => {}
            ReplCommand::Quit => break,
            ReplCommand::Help => writeln!(out, "{HELP}")?,
            ReplCommand::Agents => write_agents(session, out)?,
            ReplCommand::Use(id) => select(session, &id, out)?,
            ReplCommand::Clear => {
                session.clear();
                writeln!(out, "Conversation cleared.")?;
            }
            ReplCommand::History => {
                for turn in session.history() {
                    let who = match turn.role {
                        TurnRole::User => "You",
                        TurnRole::Assistant => "Assistant",
                    };
                    writeln!(out, "{who}: {}", turn.content)?;
                }
            }
            ReplCommand::Unknown(cmd) => writeln!(out, "Unknown command: {cmd} (try /help)")?,
            ReplCommand::Send(text) => match session.send_message(&text) {
                Ok(reply) => writeln!(out, "Assistant: {reply}")?,
                Err(e) => writeln!(out, "{}", e.user_message())?,
            },
        }
    }

    info!(turns = session.history().len(), "Chat ended");
    Ok(())
}
