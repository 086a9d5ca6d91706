//! Command-line interface definition.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// slotbook - Find a free slot and book the meeting
#[derive(Debug, Parser)]
#[command(name = "slotbook")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, env = "SLOTBOOK_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'v', global = true)]
    pub debug: bool,

    /// Log format: compact, pretty or json
    #[arg(long, env = "SLOTBOOK_LOG_FORMAT", global = true)]
    pub log_format: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Find the first free slot and book a meeting in it
    Schedule(ScheduleArgs),

    /// List free slots without booking anything
    Slots(SlotsArgs),

    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Arguments of `slotbook schedule`.
#[derive(Debug, Args)]
pub struct ScheduleArgs {
    /// Attendee email address (can be repeated)
    #[arg(long = "attendee", short, required = true, action = clap::ArgAction::Append)]
    pub attendees: Vec<String>,

    /// Meeting title
    #[arg(long, short)]
    pub title: String,

    /// Meeting length in minutes
    #[arg(long, short, default_value = "30")]
    pub duration: i64,

    /// Meeting description
    #[arg(long)]
    pub description: Option<String>,

    /// IANA timezone of the meeting (defaults to scheduling.default_timezone)
    #[arg(long)]
    pub timezone: Option<String>,

    /// Slot preference: earliest, latest or "after HH:MM"
    #[arg(long)]
    pub prefer: Option<String>,

    /// Deadline for the whole run in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Print the outcome as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments of `slotbook slots`.
#[derive(Debug, Args)]
pub struct SlotsArgs {
    /// Meeting length in minutes
    #[arg(long, short, default_value = "30")]
    pub duration: i64,

    /// Business days to search after today
    #[arg(long)]
    pub days: Option<u32>,

    /// IANA timezone (defaults to scheduling.default_timezone)
    #[arg(long)]
    pub timezone: Option<String>,

    /// Enumerate candidates every N minutes
    #[arg(long)]
    pub step: Option<u32>,

    /// Print the candidates as JSON
    #[arg(long)]
    pub json: bool,
}

/// Configuration actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Dump current configuration
    Dump,

    /// Validate configuration
    Validate,

    /// Show configuration file path
    Path,
}
