//! CLI command definitions for the `loom` binary.
//!
//! Uses clap derive macros for argument parsing.

pub mod chat;
pub mod key;
pub mod project;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use uuid::Uuid;

/// Chat with an LLM to build small web projects.
#[derive(Parser)]
#[command(name = "loom", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Write logs to stderr as JSON lines.
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Export tracing spans through OpenTelemetry (stdout exporter).
    #[arg(long, global = true)]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the REST API server.
    Serve {
        /// Bind address (defaults to `[server] host` in config.toml).
        #[arg(long)]
        host: Option<String>,

        /// Port (defaults to `[server] port` in config.toml).
        #[arg(long, short)]
        port: Option<u16>,
    },

    /// Interactive chat session that generates project files.
    Chat {
        /// User whose project the session works on.
        #[arg(long, short, default_value = "local")]
        user: String,

        /// Also write generated files under this directory.
        #[arg(long, short)]
        out: Option<PathBuf>,
    },

    /// Inspect or change a user's project state.
    Project {
        #[command(subcommand)]
        action: ProjectCommand,
    },

    /// Manage API keys for the REST API.
    Key {
        #[command(subcommand)]
        action: KeyCommand,
    },

    /// Generate shell completions.
    Completions {
        /// Target shell.
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum ProjectCommand {
    /// Show files, technologies and libraries.
    Show {
        #[arg(long, short, default_value = "local")]
        user: String,
    },

    /// Reset to an empty project with the default stack.
    Reset {
        #[arg(long, short, default_value = "local")]
        user: String,
    },

    /// Write every project file under a directory.
    Export {
        /// Target directory (created if missing).
        dir: PathBuf,

        #[arg(long, short, default_value = "local")]
        user: String,
    },

    /// Remove one file from the project.
    #[command(alias = "rm")]
    Remove {
        /// File name as stored in the project.
        file: String,

        #[arg(long, short, default_value = "local")]
        user: String,
    },
}

#[derive(Subcommand)]
pub enum KeyCommand {
    /// Mint a new API key for a user (shown once).
    Create {
        /// User id the key authenticates as.
        user: String,

        /// Label for the key.
        #[arg(long, default_value = "default")]
        name: String,
    },

    /// List keys issued to a user.
    #[command(alias = "ls")]
    List { user: String },

    /// Revoke a key by id (see `loom key list`).
    Revoke { id: Uuid },
}
