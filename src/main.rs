mod bot;
mod cli;
mod command;
mod config;
mod db;
mod domain;
mod locale;
mod report;
mod server;
mod telegram;
mod window;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Parser;
use std::io::Read;
use std::net::TcpListener;
use std::path::Path;

use crate::bot::Bot;
use crate::cli::{Cli, Command, HandleArgs, SetupArgs};
use crate::config::{
    AppConfig, AppPaths, app_paths, load_or_init_config, mask_token, now_utc, parse_utc_offset,
    write_config,
};
use crate::db::SqliteStore;
use crate::locale::Vietnamese;
use crate::telegram::{StdoutMessenger, TelegramMessenger, Update};

fn main() {
    init_tracing();
    if let Err(err) = run() {
        eprintln!("{err:#}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let paths = app_paths(cli.home.clone())?;
    let (mut cfg, cfg_path) = load_or_init_config(&paths)?;

    match cli.command {
        Command::Setup(args) => handle_setup(args, cli.token, cli.store_id, &mut cfg, &cfg_path),
        Command::Serve(args) => {
            let mut bot = open_bot(&paths, &mut cfg, cli.token, cli.store_id)?;
            let messenger = TelegramMessenger::new(cfg.bot_api_url()?)?;
            let listener = TcpListener::bind(&args.bind)
                .with_context(|| format!("Failed to bind webhook address {}", args.bind))?;
            tracing::info!(addr = %listener.local_addr()?, store = %cfg.store_id, "listening for webhook updates");
            server::serve(listener, &mut bot, &messenger, args.once)
        }
        Command::Handle(args) => {
            let mut bot = open_bot(&paths, &mut cfg, cli.token, cli.store_id)?;
            let update = read_update(&args)?;
            if args.dry_run {
                bot.handle_update(&update, &StdoutMessenger, now_utc());
            } else {
                let messenger = TelegramMessenger::new(cfg.bot_api_url()?)?;
                bot.handle_update(&update, &messenger, now_utc());
            }
            Ok(())
        }
        Command::Say(args) => {
            let mut bot = open_bot(&paths, &mut cfg, cli.token, cli.store_id)?;
            let now = parse_rfc3339_or_now(args.at.as_deref())?;
            let reply = bot.reply_to(&args.text.join(" "), now)?;
            println!("{reply}");
            Ok(())
        }
    }
}

/// Applies the per-run `--token`/`--store-id` overrides and opens the store.
fn open_bot(
    paths: &AppPaths,
    cfg: &mut AppConfig,
    token: Option<String>,
    store_id: Option<String>,
) -> Result<Bot<SqliteStore, Vietnamese>> {
    if let Some(token) = token {
        cfg.bot_token = Some(token);
    }
    if let Some(store_id) = store_id {
        cfg.store_id = store_id;
    }

    let locale = Vietnamese::new(cfg.offset()?);
    let (store, store_path) = SqliteStore::open(paths, &cfg.store_id)?;
    tracing::debug!(store = %store_path.display(), "opened store");
    Ok(Bot::new(store, locale))
}

fn handle_setup(
    args: SetupArgs,
    token: Option<String>,
    store_id: Option<String>,
    cfg: &mut AppConfig,
    cfg_path: &Path,
) -> Result<()> {
    let mut changed = false;
    if let Some(token) = token {
        cfg.bot_token = Some(token);
        changed = true;
    }
    if let Some(store_id) = store_id {
        cfg.store_id = store_id;
        changed = true;
    }
    if let Some(base) = args.api_base {
        cfg.api_base = base;
        changed = true;
    }
    if let Some(offset) = args.utc_offset {
        parse_utc_offset(&offset)?;
        cfg.utc_offset = offset;
        changed = true;
    }

    if changed {
        write_config(cfg_path, cfg)?;
    }

    println!(
        "bot_token\t{}",
        cfg.bot_token
            .as_deref()
            .map(mask_token)
            .unwrap_or_else(|| "<not set>".to_string())
    );
    println!("store_id\t{}", cfg.store_id);
    println!("api_base\t{}", cfg.api_base);
    println!("utc_offset\t{}", cfg.utc_offset);
    Ok(())
}

fn read_update(args: &HandleArgs) -> Result<Update> {
    let raw = match &args.payload {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read payload from stdin")?;
            buf
        }
    };
    serde_json::from_str(&raw).context("Invalid webhook payload")
}

fn parse_rfc3339_or_now(raw: Option<&str>) -> Result<DateTime<Utc>> {
    match raw {
        None => Ok(now_utc()),
        Some(s) => Ok(DateTime::parse_from_rfc3339(s)
            .with_context(|| format!("Invalid RFC3339 timestamp: {s}"))?
            .with_timezone(&Utc)),
    }
}
