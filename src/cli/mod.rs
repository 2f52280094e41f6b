//! CLI module for vsrelay.

pub mod commands;
mod output;

pub use output::Output;

use clap::{Parser, Subcommand};

/// vsrelay - answer questions from a hosted vector store
///
/// Relays queries to the OpenAI Responses API with file search scoped to a
/// vector store, and returns the answer text as JSON.
#[derive(Parser, Debug)]
#[command(name = "vsrelay")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP relay server
    Serve {
        /// Host to bind to (overrides server.host)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (overrides server.port and PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Relay a single query and print the answer
    Ask {
        /// The query to send
        query: String,

        /// Vector store to search (defaults to relay.vector_store_id)
        #[arg(short = 's', long)]
        vector_store: Option<String>,

        /// Model to use (defaults to openai.model)
        #[arg(short, long)]
        model: Option<String>,

        /// Result-count hint for the file search tool
        #[arg(short = 'k', long)]
        top_k: Option<u32>,
    },

    /// Check configuration and report problems
    Doctor,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration (secrets masked)
    Show,

    /// Show configuration file path
    Path,

    /// Write a default configuration file if none exists
    Init,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_serve_overrides() {
        let cli = Cli::parse_from(["vsrelay", "serve", "--host", "127.0.0.1", "-p", "8080"]);
        match cli.command {
            Commands::Serve { host, port } => {
                assert_eq!(host.as_deref(), Some("127.0.0.1"));
                assert_eq!(port, Some(8080));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_ask() {
        let cli = Cli::parse_from([
            "vsrelay", "-vv", "ask", "refund policy?", "-s", "vs_1", "-k", "3",
        ]);
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Ask {
                query,
                vector_store,
                model,
                top_k,
            } => {
                assert_eq!(query, "refund policy?");
                assert_eq!(vector_store.as_deref(), Some("vs_1"));
                assert!(model.is_none());
                assert_eq!(top_k, Some(3));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
