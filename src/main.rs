//! Parley CLI binary entry point.

use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

use parley::cli::Cli;

fn main() -> ExitCode {
    let cli = Cli::parse_args();

    // stdout is the chat channel, so logs go to stderr.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.log_filter()));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();

    match parley::cli::run(cli) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "Command failed");
            eprintln!("Error: {}", e.user_message());
            ExitCode::FAILURE
        }
    }
}
