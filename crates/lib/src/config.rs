//! Runtime configuration shared by the library and the CLI.

use std::path::PathBuf;

/// Program sshd runs for every managed key unless configured otherwise.
pub const DEFAULT_COMMAND: &str = "gatehouse-serve";

/// Location of the `authorized_keys` file relative to the home directory.
pub const AUTHORIZED_KEYS_RELATIVE_PATH: &str = ".ssh/authorized_keys";

/// Settings for materializing keys.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// The `authorized_keys` file sshd reads for the git account
    pub authorized_keys_path: PathBuf,

    /// Command forced on every key; receives the user name as its argument
    pub command: String,
}

impl Config {
    pub fn new(authorized_keys_path: impl Into<PathBuf>) -> Self {
        Self {
            authorized_keys_path: authorized_keys_path.into(),
            command: DEFAULT_COMMAND.to_string(),
        }
    }

    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = command.into();
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(default_authorized_keys_path())
    }
}

/// `$HOME/.ssh/authorized_keys`, falling back to the working directory when
/// `HOME` is unset.
pub fn default_authorized_keys_path() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_default()
        .join(AUTHORIZED_KEYS_RELATIVE_PATH)
}
