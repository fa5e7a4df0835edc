//! CLI argument definitions for the Gatehouse binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Storage backend type
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Backend {
    /// SQLite database (default)
    Sqlite,
    /// In-memory with JSON persistence (for development and small deployments)
    Inmemory,
}

/// Output format
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum Format {
    #[default]
    Human,
    Json,
}

/// Gatehouse SSH identity manager
#[derive(Parser, Debug)]
#[command(name = "gatehouse")]
#[command(about = "Gatehouse: manage git users, their SSH keys and repository access")]
#[command(version)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Settings shared by every command
#[derive(clap::Args, Debug)]
pub struct GlobalArgs {
    /// Path of the authorized_keys file to maintain
    /// [default: $HOME/.ssh/authorized_keys]
    #[arg(long, global = true, env = "GATEHOUSE_AUTHORIZED_KEYS")]
    pub authorized_keys: Option<PathBuf>,

    /// Command sshd runs for every managed key
    #[arg(
        long = "command",
        global = true,
        default_value = gatehouse::config::DEFAULT_COMMAND,
        env = "GATEHOUSE_COMMAND"
    )]
    pub forced_command: String,

    /// Storage backend to use
    #[arg(short, long, global = true, default_value = "sqlite", env = "GATEHOUSE_BACKEND")]
    pub backend: Backend,

    /// Data directory for storage files.
    /// For SQLite: stores gatehouse.db
    /// For InMemory: stores gatehouse.json
    #[arg(short = 'D', long, global = true, env = "GATEHOUSE_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = Format::Human)]
    pub format: Format,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage users
    #[command(subcommand)]
    User(UserCommand),
    /// Manage the keys of an existing user
    #[command(subcommand)]
    Key(KeyCommand),
    /// Manage repositories and their grantees
    #[command(subcommand)]
    Repo(RepoCommand),
    /// Regenerate the authorized_keys file from the store
    Rebuild,
}

#[derive(Subcommand, Debug)]
pub enum UserCommand {
    /// Create a user with optional initial keys
    Create {
        name: String,
        /// Initial key as NAME=CONTENT; may be repeated
        #[arg(short, long = "key", value_parser = parse_key_arg)]
        keys: Vec<(String, String)>,
    },
    /// Remove a user and revoke their repository access
    Remove { name: String },
    /// Show a user and their keys
    Show { name: String },
    /// List all users
    List,
}

#[derive(Subcommand, Debug)]
pub enum KeyCommand {
    /// Add a key to a user
    Add {
        user: String,
        name: String,
        content: String,
    },
    /// Remove a key from a user
    Remove { user: String, name: String },
}

#[derive(Subcommand, Debug)]
pub enum RepoCommand {
    /// Create a repository granted to the given users
    Create {
        name: String,
        #[arg(short, long = "user", required = true)]
        users: Vec<String>,
    },
    /// Grant an existing user access to a repository
    Grant { repository: String, user: String },
    /// List all repositories
    List,
}

fn parse_key_arg(value: &str) -> Result<(String, String), String> {
    match value.split_once('=') {
        Some((name, content)) if !name.is_empty() && !content.is_empty() => {
            Ok((name.to_string(), content.to_string()))
        }
        _ => Err(format!("expected NAME=CONTENT, got {value:?}")),
    }
}
