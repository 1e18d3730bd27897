use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// `Pocket SRE` - incident helper that remembers your stack between turns.
#[derive(Parser, Debug)]
#[command(name = "pocket-sre")]
#[command(version)]
#[command(about = "A session-scoped incident response assistant.", long_about = None)]
pub struct Cli {
    /// Config file (default: ~/.pocket-sre/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP gateway
    Serve {
        /// Bind host (overrides [gateway] host)
        #[arg(long)]
        host: Option<String>,

        /// Bind port (overrides [gateway] port)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Run a single turn locally and print the reply
    Chat {
        /// Session identifier
        #[arg(short, long)]
        session: String,

        /// Message to send
        message: String,
    },

    /// Inspect stored sessions
    Session {
        #[command(subcommand)]
        session_command: SessionCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum SessionCommands {
    /// Print a session's stored state as JSON
    Show {
        /// Session identifier
        id: String,
    },
}
