use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use edgar_fetch::{DEFAULT_BASE_URL, FetchConfig, Quarter};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Environment variable that overrides `[edgar] user_agent`.
pub const USER_AGENT_ENV: &str = "EDGAR_USER_AGENT";

/// Top-level application configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    pub edgar: EdgarSection,
    pub storage: StorageSection,
    pub fetch: FetchSection,
}

/// Where filings come from and which ones to keep.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct EdgarSection {
    pub base_url: String,
    /// Sent with every request. EDGAR rejects anonymous traffic.
    pub user_agent: Option<String>,
    pub start_year: u16,
    pub end_year: u16,
    /// Last quarter of `end_year` to fetch an index for.
    pub end_quarter: String,
    pub forms: Vec<String>,
}

impl Default for EdgarSection {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            user_agent: None,
            start_year: 2010,
            end_year: 2025,
            end_quarter: "QTR4".into(),
            forms: vec!["10-K".into()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageSection {
    pub index_dir: PathBuf,
    pub filings_dir: PathBuf,
    pub filings_list: PathBuf,
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            index_dir: PathBuf::from("data/edgar"),
            filings_dir: PathBuf::from("data/edgar/filings"),
            filings_list: PathBuf::from("data/filings_list.csv"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct FetchSection {
    pub request_delay_secs: f64,
    /// Re-download filings that are already stored. Master indexes ignore it.
    pub overwrite: bool,
    /// Log one notice per this many skipped files. Zero disables the notices.
    pub skip_log_interval: u64,
    pub timeout_secs: Option<u64>,
}

impl Default for FetchSection {
    fn default() -> Self {
        Self {
            request_delay_secs: 0.1,
            overwrite: false,
            skip_log_interval: 1000,
            timeout_secs: None,
        }
    }
}

impl AppConfig {
    /// Replace the configured user agent when `user_agent` is set and non-blank.
    pub fn with_user_agent_override(mut self, user_agent: Option<String>) -> Self {
        if let Some(agent) = user_agent
            && !agent.trim().is_empty()
        {
            self.edgar.user_agent = Some(agent);
        }
        self
    }

    pub fn through_quarter(&self) -> Result<Quarter> {
        Quarter::parse(&self.edgar.end_quarter).context("invalid [edgar] end_quarter")
    }

    pub fn request_delay(&self) -> Result<Duration> {
        Duration::try_from_secs_f64(self.fetch.request_delay_secs).with_context(|| {
            format!(
                "invalid [fetch] request_delay_secs: {}",
                self.fetch.request_delay_secs
            )
        })
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.fetch.timeout_secs.map(Duration::from_secs)
    }

    /// Fetch settings for a run that stores into `root`.
    pub fn fetch_config(&self, root: &Path, overwrite: bool) -> Result<FetchConfig> {
        let Some(user_agent) = self.edgar.user_agent.as_deref() else {
            bail!(
                "no user agent configured; set [edgar] user_agent or {USER_AGENT_ENV} \
                 (e.g. \"Jane Doe jane@example.com\")"
            );
        };

        Ok(FetchConfig::new(root, user_agent)
            .with_delay(self.request_delay()?)
            .with_overwrite(overwrite))
    }
}

/// Config file path: `~/.config/edgar-fetch/config.toml`
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("edgar-fetch").join("config.toml"))
}

/// Load config, then apply the environment override.
///
/// An explicit path must exist and parse. The default location falls back to
/// built-in defaults when it is missing or broken.
pub fn load_config(explicit: Option<&Path>) -> Result<AppConfig> {
    let config = match explicit {
        Some(path) => {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config at {}", path.display()))?;
            toml::from_str::<AppConfig>(&contents)
                .with_context(|| format!("failed to parse config at {}", path.display()))?
        }
        None => load_default_location(),
    };

    Ok(config.with_user_agent_override(std::env::var(USER_AGENT_ENV).ok()))
}

fn load_default_location() -> AppConfig {
    if let Some(path) = config_path()
        && let Ok(contents) = std::fs::read_to_string(&path)
    {
        match toml::from_str::<AppConfig>(&contents) {
            Ok(config) => return config,
            Err(e) => warn!(
                path = %path.display(),
                error = %e,
                "failed to parse config, using defaults"
            ),
        }
    }

    AppConfig::default()
}
