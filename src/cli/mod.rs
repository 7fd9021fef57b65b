//! CLI module for Itumy Keys
//!
//! - `serve`: run the HTTP server (default)
//! - `migrate`: apply pending PostgreSQL migrations and exit

pub mod migrate;
pub mod serve;

use clap::{Parser, Subcommand};

/// Itumy Keys - API key issuance and validation service
#[derive(Parser)]
#[command(name = "itumy-keys")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Run the HTTP server (default)
    Serve,

    /// Apply pending database migrations and exit
    Migrate,
}

impl Cli {
    /// Selected command, defaulting to `serve`
    pub fn command(&self) -> &Command {
        self.command.as_ref().unwrap_or(&Command::Serve)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_command_is_serve() {
        let cli = Cli::try_parse_from(["itumy-keys"]).unwrap();
        assert_eq!(cli.command(), &Command::Serve);
    }

    #[test]
    fn test_parse_subcommands() {
        let cli = Cli::try_parse_from(["itumy-keys", "serve"]).unwrap();
        assert_eq!(cli.command(), &Command::Serve);

        let cli = Cli::try_parse_from(["itumy-keys", "migrate"]).unwrap();
        assert_eq!(cli.command(), &Command::Migrate);

        assert!(Cli::try_parse_from(["itumy-keys", "ui"]).is_err());
    }
}
