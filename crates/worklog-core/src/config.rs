use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, anyhow};
use chrono_tz::Tz;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::datetime::parse_timezone;

pub const BASE_URL_ENV_VAR: &str = "WORKLOG_API_BASE_URL";
pub const TIMEZONE_ENV_VAR: &str = "WORKLOG_TIMEZONE";
pub const CONFIG_ENV_VAR: &str = "WORKLOG_CONFIG";
pub const CONFIG_FILE: &str = "worklog.toml";
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";
const DEFAULT_TIMEZONE: &str = "Asia/Jakarta";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_SEARCH_DEBOUNCE_MS: u64 = 500;
const DEFAULT_REDIRECT_DELAY_MS: u64 = 1500;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    base_url: Option<String>,
    timeout_secs: Option<u64>,
    search_debounce_ms: Option<u64>,
    redirect_delay_ms: Option<u64>,
    timezone: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub base_url: String,
    pub timeout: Duration,
    pub search_debounce: Duration,
    pub redirect_delay: Duration,
    /// Zone in which server timestamps are read as calendar dates.
    pub timezone: Tz,
    pub loaded_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            search_debounce: Duration::from_millis(DEFAULT_SEARCH_DEBOUNCE_MS),
            redirect_delay: Duration::from_millis(DEFAULT_REDIRECT_DELAY_MS),
            timezone: parse_timezone(DEFAULT_TIMEZONE, "DEFAULT_TIMEZONE").unwrap_or(Tz::UTC),
            loaded_file: None,
        }
    }
}

impl Config {
    /// Resolves configuration from the process environment: defaults, then
    /// the config file, then env vars.
    #[tracing::instrument]
    pub fn load() -> anyhow::Result<Self> {
        let file = resolve_config_path(|key| std::env::var(key).ok());
        Self::from_sources(file.as_deref(), |key| std::env::var(key).ok())
    }

    #[tracing::instrument(skip(env))]
    pub fn from_sources<F>(file: Option<&Path>, env: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Config::default();

        if let Some(path) = file {
            info!(file = %path.display(), "loading config file");
            cfg.apply_file(path)?;
        } else {
            debug!("no config file; using defaults");
        }

        if let Some(raw) = env(BASE_URL_ENV_VAR)
            && !raw.trim().is_empty()
        {
            debug!(base_url = %raw, "base url from environment");
            cfg.base_url = raw;
        }

        if let Some(raw) = env(TIMEZONE_ENV_VAR)
            && let Some(tz) = parse_timezone(&raw, TIMEZONE_ENV_VAR)
        {
            cfg.timezone = tz;
        }

        cfg.base_url = normalize_base_url(&cfg.base_url)?;
        info!(
            base_url = %cfg.base_url,
            timezone = cfg.timezone.name(),
            "resolved configuration"
        );
        Ok(cfg)
    }

    #[tracing::instrument(skip(self))]
    fn apply_file(&mut self, path: &Path) -> anyhow::Result<()> {
        let raw = fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
        let parsed: FileConfig =
            toml::from_str(&raw).with_context(|| format!("failed to parse {}", path.display()))?;

        if let Some(base_url) = parsed.base_url {
            self.base_url = base_url;
        }
        if let Some(secs) = parsed.timeout_secs {
            self.timeout = Duration::from_secs(secs);
        }
        if let Some(ms) = parsed.search_debounce_ms {
            self.search_debounce = Duration::from_millis(ms);
        }
        if let Some(ms) = parsed.redirect_delay_ms {
            self.redirect_delay = Duration::from_millis(ms);
        }
        if let Some(raw) = parsed.timezone {
            match parse_timezone(&raw, "config file") {
                Some(tz) => self.timezone = tz,
                None => warn!(file = %path.display(), "ignoring timezone from config file"),
            }
        }

        self.loaded_file = Some(path.to_path_buf());
        Ok(())
    }
}

fn resolve_config_path<F>(env: F) -> Option<PathBuf>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(raw) = env(CONFIG_ENV_VAR) {
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            return Some(PathBuf::from(trimmed));
        }
    }

    let candidates = [
        std::env::current_dir().ok().map(|dir| dir.join(CONFIG_FILE)),
        dirs::config_dir().map(|dir| dir.join("worklog").join(CONFIG_FILE)),
    ];

    candidates.into_iter().flatten().find(|path| path.exists())
}

fn normalize_base_url(raw: &str) -> anyhow::Result<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(anyhow!("API base URL cannot be empty"));
    }
    reqwest::Url::parse(trimmed).with_context(|| format!("invalid API base URL: {trimmed}"))?;
    Ok(trimmed.to_string())
}
