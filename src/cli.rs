//! Command-line interface definition for DocChat
//!
//! This module defines the CLI structure using clap's derive API.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// DocChat - ask questions about your documents
///
/// Sign in, chat with the document assistant, and (for admins) manage
/// users and the document library of a DocChat server.
#[derive(Parser, Debug, Clone)]
#[command(name = "docchat")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Override the API base URL (e.g. http://localhost:8000/api)
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for DocChat
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Sign in and store the access token
    Login {
        /// Account email
        #[arg(short, long)]
        email: Option<String>,

        /// Account password (prompted when omitted)
        #[arg(long, env = "DOCCHAT_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Forget the stored token and profile
    Logout,

    /// Show the signed-in user
    Whoami,

    /// Start interactive chat
    Chat {
        /// Open this session instead of the last selected one
        #[arg(short, long)]
        session: Option<String>,

        /// Start with a fresh session
        #[arg(short, long, conflicts_with = "session")]
        new: bool,

        /// Vector store collection to query
        #[arg(long)]
        collection: Option<String>,
    },

    /// Ask a single question and print the answer
    Ask {
        /// The question
        #[arg(required = true, num_args = 1..)]
        question: Vec<String>,

        /// Session to ask in; a new session is created when omitted
        #[arg(short, long)]
        session: Option<String>,

        /// Vector store collection to query
        #[arg(long)]
        collection: Option<String>,

        /// Print the answer as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage chat sessions
    Sessions {
        #[command(subcommand)]
        command: SessionCommand,
    },

    /// Browse and manage documents (admin)
    Files {
        #[command(subcommand)]
        command: FileCommand,
    },

    /// Manage user accounts (admin)
    Users {
        #[command(subcommand)]
        command: UserCommand,
    },

    /// Show usage statistics (admin)
    Dashboard {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Chat session subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum SessionCommand {
    /// List sessions, most recently updated first
    List {
        /// Only show sessions whose title contains this text
        #[arg(short, long)]
        search: Option<String>,

        #[arg(long)]
        json: bool,
    },

    /// Print the transcript of a session
    Show {
        id: String,

        #[arg(long)]
        json: bool,
    },

    /// Rename a session
    Rename { id: String, title: String },

    /// Delete a session and its messages
    Delete { id: String },
}

/// Document library subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum FileCommand {
    /// List a folder (the root when no folder is given)
    Browse {
        #[arg(short, long)]
        folder: Option<i64>,

        #[arg(long)]
        json: bool,
    },

    /// Create a folder
    Mkdir {
        name: String,

        /// Parent folder id
        #[arg(short, long)]
        parent: Option<i64>,
    },

    /// Upload a document
    Upload {
        path: PathBuf,

        /// Destination folder id
        #[arg(short, long)]
        folder: Option<i64>,
    },

    /// Download a document
    Download {
        id: i64,

        /// Where to write it (defaults to the current directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Delete a document
    Rm { id: i64 },

    /// Delete a folder and everything in it
    Rmdir { id: i64 },
}

/// User management subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum UserCommand {
    /// List all users
    List {
        #[arg(long)]
        json: bool,
    },

    /// Show one user
    Show { id: i64 },

    /// Create a user
    Create {
        #[arg(short, long)]
        username: String,

        #[arg(short, long)]
        email: String,

        #[arg(long, env = "DOCCHAT_NEW_USER_PASSWORD", hide_env_values = true)]
        password: String,

        /// Grant admin rights
        #[arg(long)]
        admin: bool,

        /// Create the account disabled
        #[arg(long)]
        inactive: bool,
    },

    /// Update fields of a user
    Update {
        id: i64,

        #[arg(long)]
        username: Option<String>,

        #[arg(long)]
        email: Option<String>,

        #[arg(long)]
        password: Option<String>,

        /// Enable or disable the account
        #[arg(long)]
        active: Option<bool>,

        /// Grant or revoke admin rights
        #[arg(long)]
        admin: Option<bool>,
    },

    /// Delete a user
    Delete { id: i64 },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            config: Some("config/config.yaml".to_string()),
            verbose: false,
            base_url: None,
            command: Commands::Whoami,
        }
    }
}
