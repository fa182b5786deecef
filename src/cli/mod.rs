//! CLI module - Command-line interface for the license registry
//!
//! This module provides a structured CLI using clap for argument parsing.

mod commands;
pub mod view;

use crate::models::LicenseAction;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// license-admin - License Registry Administration
/// View, filter, create, activate, deactivate and delete license records
#[derive(Parser)]
#[command(name = "license-admin")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Registry base URL (overrides config and environment)
    #[arg(long, global = true)]
    pub url: Option<String>,

    /// Path to a config file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List license records
    #[command(alias = "ls", alias = "l")]
    List {
        /// Only show records whose email contains this text
        #[arg(long, short)]
        filter: Option<String>,
    },

    /// Create or update a license
    #[command(alias = "a")]
    Add {
        /// Email of the license holder
        email: String,
        /// Store the license as inactive
        #[arg(long)]
        inactive: bool,
    },

    /// Activate a license (creates it if missing)
    Activate {
        email: String,
    },

    /// Deactivate a license without deleting it
    Deactivate {
        email: String,
    },

    /// Delete a license
    #[command(alias = "rm")]
    Delete {
        email: String,
        /// Skip the confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },

    /// Run a row action by name
    Action {
        #[arg(value_enum)]
        action: LicenseAction,
        email: String,
        /// Skip the confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },

    /// Manage the stored API key
    Key {
        #[command(subcommand)]
        command: KeyCommands,
    },

    /// Check that the registry is reachable
    Health,

    /// Create default config file
    Init,
}

#[derive(Subcommand)]
pub enum KeyCommands {
    /// Save the API key
    Set {
        /// Key value
        value: String,
    },
    /// Show the stored API key (masked)
    Show,
    /// Remove the stored API key
    Clear,
}

pub use commands::*;

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_action_command() {
        let cli = Cli::try_parse_from(["license-admin", "action", "deactivate", "a@b.c"]).unwrap();
        match cli.command {
            Some(Commands::Action { action, email, yes }) => {
                assert_eq!(action, LicenseAction::Deactivate);
                assert_eq!(email, "a@b.c");
                assert!(!yes);
            }
            _ => panic!("expected action command"),
        }
    }

    #[test]
    fn test_parse_list_alias_with_global_url() {
        let cli = Cli::try_parse_from([
            "license-admin",
            "ls",
            "--filter",
            "example",
            "--url",
            "http://registry:5000",
        ])
        .unwrap();

        assert_eq!(cli.url.as_deref(), Some("http://registry:5000"));
        assert!(matches!(
            cli.command,
            Some(Commands::List { filter: Some(ref f) }) if f == "example"
        ));
    }

    #[test]
    fn test_unknown_action_is_rejected() {
        assert!(Cli::try_parse_from(["license-admin", "action", "purge", "a@b.c"]).is_err());
    }
}
