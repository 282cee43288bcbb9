//! CLI command definitions for the `opsdesk` binary.
//!
//! Uses clap derive macros for argument parsing. Commands are grouped by the
//! service they talk to (`ask`, `listen`, `erp`, `ticket`, `settings`), plus
//! `serve` for the relay.

pub mod ask;
pub mod erp;
pub mod input;
pub mod listen;
pub mod settings;
pub mod ticket;

use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

/// Ask the support assistant, file tickets, and run the CORS relay.
#[derive(Parser)]
#[command(name = "opsdesk", version, about, long_about = None)]
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

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Ask the assistant one question.
    Ask {
        /// The question. Multiple words are joined with spaces.
        #[arg(required = true, num_args = 1..)]
        question: Vec<String>,

        /// Scope the question to an ERP integration (see `opsdesk erp list`).
        #[arg(long)]
        erp: Option<String>,

        /// Stream the answer as it is generated.
        #[arg(long)]
        stream: bool,

        /// How to print the answer.
        #[arg(long, value_enum, default_value_t = AnswerFormat::Markdown)]
        format: AnswerFormat,
    },

    /// Interactive spoken-style conversation.
    Listen {
        /// Scope every question to an ERP integration.
        #[arg(long)]
        erp: Option<String>,
    },

    /// Browse supported ERP integrations.
    Erp {
        #[command(subcommand)]
        action: ErpAction,
    },

    /// Create tickets in the issue tracker.
    Ticket {
        #[command(subcommand)]
        action: TicketAction,
    },

    /// Show or change settings.
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },

    /// Start the CORS relay for browser front ends.
    Serve {
        /// Port to listen on (defaults to relay.port).
        #[arg(long)]
        port: Option<u16>,

        /// Host to bind to (defaults to relay.host).
        #[arg(long)]
        host: Option<String>,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AnswerFormat {
    /// The answer as returned.
    Markdown,
    /// Rendered HTML fragment.
    Html,
    /// Plain text for speech.
    Speech,
}

#[derive(Subcommand)]
pub enum ErpAction {
    /// List supported ERP integrations.
    #[command(alias = "ls")]
    List,

    /// Show one ERP and its quick questions.
    Show {
        /// ERP name (case-insensitive, unique prefix or substring).
        name: String,
    },
}

#[derive(Subcommand)]
pub enum TicketAction {
    /// Create a ticket from a form.
    Create {
        /// Form to use (see `opsdesk ticket forms`).
        #[arg(long, default_value = opsdesk_core::ticket::schema::DEFAULT_FORM)]
        form: String,

        /// One-line summary.
        #[arg(long)]
        summary: String,

        /// Longer description.
        #[arg(long, default_value = "")]
        description: String,

        /// Override the form's issue type.
        #[arg(long)]
        issue_type: Option<String>,

        /// Form input as key=value. Repeatable.
        #[arg(long = "set", value_name = "KEY=VALUE")]
        values: Vec<String>,
    },

    /// Show create-screen fields for an issue type id.
    Fields {
        /// Issue type id, e.g. 10001.
        issue_type_id: String,
    },

    /// List available ticket forms.
    Forms,
}

#[derive(Subcommand)]
pub enum SettingsAction {
    /// Show current settings with masked tokens.
    Show,

    /// Configure the chat service.
    SetGlean {
        /// API token (prompted when omitted).
        #[arg(long)]
        token: Option<String>,

        /// Backend host, e.g. acme-be.glean.com.
        #[arg(long)]
        backend: Option<String>,

        /// Send requests on behalf of this user.
        #[arg(long)]
        email: Option<String>,

        /// Route requests through a relay at this URL.
        #[arg(long)]
        relay_url: Option<String>,
    },

    /// Configure the issue tracker.
    SetJira {
        /// Site, e.g. acme.atlassian.net.
        #[arg(long)]
        domain: Option<String>,

        #[arg(long)]
        email: Option<String>,

        /// API token (prompted when omitted).
        #[arg(long)]
        token: Option<String>,

        /// Project key.
        #[arg(long)]
        project: Option<String>,

        /// Route requests through a relay at this URL.
        #[arg(long)]
        relay_url: Option<String>,
    },
}
