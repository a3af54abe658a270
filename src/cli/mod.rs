//! CLI argument definitions for Recall.

use crate::storage::BackendType;
use clap::{Args, Parser, Subcommand};

/// Recall - personal reminders from the terminal.
///
/// Reminders live in a local JSONL log by default; `--backend apple` or
/// `--backend todoist` proxies them to Apple Reminders or Todoist instead.
#[derive(Parser, Debug)]
#[command(name = "rc")]
#[command(author, version, about = "Personal reminders from the command line", long_about = None)]
pub struct Cli {
    /// Output in human-readable format instead of JSON
    #[arg(short = 'H', long = "human", global = true)]
    pub human_readable: bool,

    /// Backend to use (local, apple, todoist).
    /// Can also be set via RECALL_BACKEND or `backend` in config.kdl.
    #[arg(short = 'b', long = "backend", global = true, value_parser = parse_backend)]
    pub backend: Option<BackendType>,

    #[command(subcommand)]
    pub command: Commands,
}

fn parse_backend(s: &str) -> Result<BackendType, String> {
    BackendType::parse(s).ok_or_else(|| format!("unknown backend '{}' (expected local, apple or todoist)", s))
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Add a new reminder
    ///
    /// Examples:
    ///   rc add "Buy groceries"
    ///   rc add "Call mom" --due tomorrow --note "Birthday next week"
    ///   rc add "Review PR" --link https://github.com/org/repo/pull/1 --tag work
    Add {
        /// Reminder title
        title: String,

        #[command(flatten)]
        fields: FieldArgs,
    },

    /// List reminders (open ones by default)
    List {
        /// Only reminders due today
        #[arg(long, group = "window")]
        today: bool,

        /// Only reminders due tomorrow
        #[arg(long, group = "window")]
        tomorrow: bool,

        /// Only reminders due within the next seven days
        #[arg(long, group = "window")]
        week: bool,

        /// Only reminders with this tag (repeatable, any match)
        #[arg(short = 't', long = "tag")]
        tags: Vec<String>,

        /// Include completed reminders
        #[arg(short = 'a', long)]
        all: bool,

        /// Show only completed reminders
        #[arg(long)]
        completed: bool,

        /// Only reminders whose title or notes contain this text
        #[arg(short = 's', long)]
        search: Option<String>,

        /// Print reminder IDs (human output)
        #[arg(long)]
        ids: bool,
    },

    /// Show a reminder by ID
    Show {
        /// Reminder ID
        id: String,
    },

    /// Change fields of an existing reminder
    Update {
        /// Reminder ID
        id: String,

        /// New title
        #[arg(long)]
        title: Option<String>,

        #[command(flatten)]
        fields: FieldArgs,
    },

    /// Mark a reminder as completed
    Complete {
        /// Reminder ID
        id: String,
    },

    /// Delete a reminder
    #[command(alias = "rm")]
    Delete {
        /// Reminder ID
        id: String,
    },

    /// Rewrite the local log down to live reminders
    Compact,

    /// Configuration management
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

/// Optional reminder fields shared by `add` and `update`.
#[derive(Args, Debug, Clone, Default)]
pub struct FieldArgs {
    /// Due date (today, tomorrow, monday, 2024-01-15, 01/15/2024, Jan 15)
    #[arg(short = 'd', long)]
    pub due: Option<String>,

    /// Notes
    #[arg(short = 'n', long = "note")]
    pub note: Option<String>,

    /// Related link (repeatable)
    #[arg(short = 'l', long = "link")]
    pub links: Vec<String>,

    /// Tag (repeatable)
    #[arg(short = 't', long = "tag")]
    pub tags: Vec<String>,

    /// Priority (none, low, medium, high or 0-3)
    #[arg(short = 'p', long)]
    pub priority: Option<String>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show the resolved configuration and where each value came from
    Show,
}
