use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, FixedOffset, Utc};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Chat platform bot token. Required by anything that posts replies.
    #[serde(default)]
    pub bot_token: Option<String>,

    /// Identifier of the tabular store transactions are written to.
    #[serde(default = "default_store_id")]
    pub store_id: String,

    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Reporting time zone as `±HH:MM`; windows and rendered timestamps use it.
    #[serde(default = "default_utc_offset")]
    pub utc_offset: String,
}

fn default_store_id() -> String {
    "default".to_string()
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_utc_offset() -> String {
    "+07:00".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            store_id: default_store_id(),
            api_base: default_api_base(),
            utc_offset: default_utc_offset(),
        }
    }
}

impl AppConfig {
    pub fn offset(&self) -> Result<FixedOffset> {
        parse_utc_offset(&self.utc_offset)
    }

    pub fn require_token(&self) -> Result<&str> {
        self.bot_token
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| {
                anyhow!("No bot token configured. Run: thuchi setup --token <token> (or set THUCHI_BOT_TOKEN).")
            })
    }

    /// `<api_base>/bot<token>`, the root all Bot API methods hang off.
    pub fn bot_api_url(&self) -> Result<String> {
        let token = self.require_token()?;
        Ok(format!("{}/bot{}", self.api_base.trim_end_matches('/'), token))
    }
}

pub fn parse_utc_offset(raw: &str) -> Result<FixedOffset> {
    let raw = raw.trim();
    let (sign, rest) = match raw.as_bytes().first() {
        Some(b'+') => (1, &raw[1..]),
        Some(b'-') => (-1, &raw[1..]),
        _ => return Err(anyhow!("Invalid UTC offset '{raw}'. Expected ±HH:MM")),
    };
    let (h, m) = rest.split_once(':').unwrap_or((rest, "0"));
    let hours: i32 = h
        .parse()
        .with_context(|| format!("Invalid UTC offset hours in '{raw}'"))?;
    let minutes: i32 = m
        .parse()
        .with_context(|| format!("Invalid UTC offset minutes in '{raw}'"))?;
    if !(0..60).contains(&minutes) {
        return Err(anyhow!("Invalid UTC offset minutes in '{raw}'"));
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
        .ok_or_else(|| anyhow!("UTC offset out of range: '{raw}'"))
}

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub config_dir: PathBuf,
    pub data_dir: PathBuf,
}

pub fn app_paths(override_home: Option<PathBuf>) -> Result<AppPaths> {
    if let Some(home) = override_home {
        return Ok(AppPaths {
            config_dir: home.join("config"),
            data_dir: home.join("data"),
        });
    }

    let proj = ProjectDirs::from("com", "thuchi", "thuchi")
        .context("Failed to resolve platform directories")?;

    Ok(AppPaths {
        config_dir: proj.config_dir().to_path_buf(),
        data_dir: proj.data_dir().to_path_buf(),
    })
}

pub fn load_or_init_config(paths: &AppPaths) -> Result<(AppConfig, PathBuf)> {
    fs::create_dir_all(&paths.config_dir)
        .with_context(|| format!("Failed to create config dir {}", paths.config_dir.display()))?;

    let cfg_path = paths.config_dir.join("config.json");
    if !cfg_path.exists() {
        let cfg = AppConfig::default();
        write_config(&cfg_path, &cfg)?;
        return Ok((cfg, cfg_path));
    }

    let raw = fs::read_to_string(&cfg_path)
        .with_context(|| format!("Failed to read {}", cfg_path.display()))?;
    let cfg: AppConfig = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse {}", cfg_path.display()))?;

    Ok((cfg, cfg_path))
}

pub fn write_config(path: &Path, cfg: &AppConfig) -> Result<()> {
    let json = serde_json::to_string_pretty(cfg)?;
    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// File-system safe name for a store identifier.
pub fn store_slug(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for ch in name.chars() {
        let mapped = match ch {
            'a'..='z' | '0'..='9' | '-' | '_' => Some(ch),
            'A'..='Z' => Some(ch.to_ascii_lowercase()),
            ' ' | ':' | '/' | '\\' => Some('-'),
            _ => None,
        };
        if let Some(c) = mapped {
            if !(c == '-' && out.ends_with('-')) {
                out.push(c);
            }
        }
    }

    let trimmed = out.trim_matches('-');
    if trimmed.is_empty() {
        "store".to_string()
    } else {
        trimmed.to_string()
    }
}

pub fn mask_token(token: &str) -> String {
    let visible: String = token.chars().take(4).collect();
    format!("{visible}…")
}

pub fn now_utc() -> DateTime<Utc> {
    Utc::now()
}
