use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "thuchi")]
#[command(about = "Chat-driven income/expense tracker", long_about = None)]
pub struct Cli {
    /// Override thuchi home directory (config/data subdirs will be created inside it).
    #[arg(long, env = "THUCHI_HOME", global = true)]
    pub home: Option<PathBuf>,

    /// Bot token, overriding the configured one for this run.
    #[arg(long, env = "THUCHI_BOT_TOKEN", global = true, hide_env_values = true)]
    pub token: Option<String>,

    /// Store identifier, overriding the configured one for this run.
    #[arg(long, env = "THUCHI_STORE_ID", global = true)]
    pub store_id: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Persist settings (including --token/--store-id) and print the effective configuration.
    Setup(SetupArgs),
    /// Listen for webhook POSTs from the chat platform.
    Serve(ServeArgs),
    /// Process a single webhook payload (stdin unless --payload is given).
    Handle(HandleArgs),
    /// Run a chat line locally and print the reply.
    Say(SayArgs),
}

#[derive(Debug, Args)]
pub struct SetupArgs {
    /// Bot API base URL (default https://api.telegram.org).
    #[arg(long)]
    pub api_base: Option<String>,

    /// Reporting time zone as ±HH:MM.
    #[arg(long, allow_hyphen_values = true)]
    pub utc_offset: Option<String>,
}

#[derive(Debug, Args)]
pub struct ServeArgs {
    #[arg(long, default_value = "127.0.0.1:8080")]
    pub bind: String,

    /// Exit after the first request.
    #[arg(long, hide = true)]
    pub once: bool,
}

#[derive(Debug, Args)]
pub struct HandleArgs {
    /// Path to a JSON update body.
    #[arg(long)]
    pub payload: Option<PathBuf>,

    /// Print the reply instead of posting it.
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Debug, Args)]
pub struct SayArgs {
    /// Timestamp to record with (RFC3339). Defaults to now.
    #[arg(long)]
    pub at: Option<String>,

    /// The chat line, e.g. `+500k Lương` or `/report 03/2024 za`.
    #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    pub text: Vec<String>,
}
