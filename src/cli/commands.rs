//! Command definitions and structures for the CLI

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "engage")]
#[command(about = "Command line client for the WhatsApp engagement backend")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Project path for project-level configuration
    #[arg(long, global = true)]
    pub project: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize configuration
    Init {
        /// Initialize global configuration (default is project-level)
        #[arg(short, long)]
        global: bool,

        /// Overwrite an existing configuration with defaults
        #[arg(short, long)]
        force: bool,
    },

    /// Configure settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Sign in and store the session
    Login {
        /// Account email
        #[arg(short, long)]
        email: String,

        /// Account password
        #[arg(short, long, env = "ENGAGE_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// End the session on the server and locally
    Logout,

    /// Show the signed-in user
    Whoami,

    /// List conversations
    Conversations {
        /// Print raw JSON
        #[arg(long)]
        json: bool,
    },

    /// List messages of a conversation
    Messages {
        conversation_id: String,

        /// Print raw JSON
        #[arg(long)]
        json: bool,
    },

    /// Send a text message
    Send {
        conversation_id: String,
        text: String,

        /// Message being replied to
        #[arg(long)]
        reply_to: Option<String>,
    },

    /// Set a custom name for a contact
    Rename { contact_id: String, name: String },

    /// Manage projects
    Projects {
        #[command(subcommand)]
        action: ProjectAction,
    },

    /// Push notification endpoints
    Notifications {
        #[command(subcommand)]
        action: NotificationAction,
    },

    /// Check that the backend and its push endpoints are reachable
    Check,
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Set configuration value
    Set {
        /// Configuration key (e.g., api.base_url)
        key: String,
        /// Value to set; empty clears optional settings
        value: String,
    },

    /// Get configuration value
    Get { key: String },
}

#[derive(Subcommand)]
pub enum ProjectAction {
    List {
        #[arg(long)]
        json: bool,
    },

    Get { id: i64 },

    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        api_url: Option<String>,
        #[arg(long)]
        user_numbers_api_url: Option<String>,
        #[arg(long)]
        api_key: Option<String>,
    },

    Update {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        api_url: Option<String>,
        #[arg(long)]
        user_numbers_api_url: Option<String>,
        #[arg(long)]
        api_key: Option<String>,
    },

    Delete { id: i64 },
}

#[derive(Subcommand)]
pub enum NotificationAction {
    /// Print the VAPID public key
    VapidKey,

    /// Ask the backend to send a test notification
    Test,
}
