//! CLI interface for Matchday
//!
//! Defines the commands and global flags using clap's derive API.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Matchday stadium assistant
///
/// Serves the preorder and emergency-reporting chatbots over HTTP, and lets
/// you talk to the preorder assistant or inspect orders from the terminal.
#[derive(Parser, Debug)]
#[command(name = "matchday")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log: Option<String>,

    /// Specify alternate configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the HTTP API server
    Serve {
        /// Address to bind (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Talk to the preorder assistant
    ///
    /// With a query, sends it and exits. Without one, reads queries from
    /// stdin line by line in a single session until EOF.
    Chat {
        /// The query to send
        query: Option<String>,

        /// Id for the stdin session (sessions last only as long as the process)
        #[arg(short, long, conflicts_with = "query")]
        session: Option<String>,
    },

    /// List confirmed orders
    Orders,

    /// Show the effective configuration
    Config,

    /// Manage the OpenAI API key in the OS keychain
    Secret {
        #[command(subcommand)]
        action: SecretAction,
    },
}

/// Keychain operations
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretAction {
    /// Read the key from stdin and store it
    Set,

    /// Report whether a key is available
    Status,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_serve_overrides() {
        let cli = Cli::parse_from(["matchday", "serve", "--host", "0.0.0.0", "-p", "9000"]);
        match cli.command {
            Command::Serve { host, port } => {
                assert_eq!(host.as_deref(), Some("0.0.0.0"));
                assert_eq!(port, Some(9000));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_chat_with_global_flags() {
        let cli = Cli::parse_from([
            "matchday",
            "chat",
            "two burgers please",
            "--json",
            "--log",
            "debug",
        ]);
        assert!(cli.json);
        assert_eq!(cli.log.as_deref(), Some("debug"));
        match cli.command {
            Command::Chat { query, session } => {
                assert_eq!(query.as_deref(), Some("two burgers please"));
                assert!(session.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_session_only_for_stdin_chat() {
        let cli = Cli::parse_from(["matchday", "chat", "--session", "abc"]);
        match cli.command {
            Command::Chat { query, session } => {
                assert!(query.is_none());
                assert_eq!(session.as_deref(), Some("abc"));
            }
            other => panic!("unexpected command: {:?}", other),
        }

        let one_shot = Cli::try_parse_from(["matchday", "chat", "fries", "--session", "abc"]);
        assert!(one_shot.is_err());
    }

    #[test]
    fn test_parse_secret_actions() {
        let cli = Cli::parse_from(["matchday", "secret", "set"]);
        assert!(matches!(
            cli.command,
            Command::Secret {
                action: SecretAction::Set
            }
        ));

        let cli = Cli::parse_from(["matchday", "secret", "status"]);
        assert!(matches!(
            cli.command,
            Command::Secret {
                action: SecretAction::Status
            }
        ));
    }

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
