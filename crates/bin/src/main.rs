use std::process::ExitCode;

use clap::Parser;
use gatehouse::ErrorKind;
use tracing_subscriber::EnvFilter;

mod backend;
mod cli;
mod commands;
mod output;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logs go to stderr so JSON output on stdout stays parseable
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("gatehouse=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let result = match &cli.command {
        Commands::User(command) => commands::user::run(&cli.global, command).await,
        Commands::Key(command) => commands::key::run(&cli.global, command).await,
        Commands::Repo(command) => commands::repo::run(&cli.global, command).await,
        Commands::Rebuild => commands::rebuild::run(&cli.global).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            exit_code(e.as_ref())
        }
    }
}

/// Exit status for a failed command, by error category.
fn exit_code(err: &(dyn std::error::Error + 'static)) -> ExitCode {
    match err.downcast_ref::<gatehouse::Error>().map(|e| e.kind()) {
        Some(ErrorKind::Validation) => ExitCode::from(2),
        Some(ErrorKind::NotFound) => ExitCode::from(3),
        Some(ErrorKind::Conflict) => ExitCode::from(4),
        Some(ErrorKind::Persistence) | None => ExitCode::FAILURE,
    }
}
