use chrono::{DateTime, Utc};
use clap::Parser;

/// Sends Discord notifications for Notion calendar entries that are due.
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "scheduleBot", version)]
pub struct Cli {
    /// KEY=VALUE settings file. Defaults to $CONFIG_FILE when set.
    #[arg(long)]
    pub settings: Option<String>,

    /// Projects JSON file. Overrides PROJECTS_FILE.
    #[arg(long)]
    pub projects: Option<String>,

    /// Only run these projects. Repeatable.
    #[arg(long = "project")]
    pub only: Vec<String>,

    /// Log payloads instead of sending them.
    #[arg(long)]
    pub dry_run: bool,

    /// Evaluate eligibility as of this RFC 3339 instant.
    #[arg(long)]
    pub now: Option<DateTime<Utc>>,
}
