//! Bot configuration loading from file and environment variables.

use chrono_tz::Tz;
use geowatch_feed::{DEFAULT_BASE_URL, DEFAULT_USER_AGENT};
use geowatch_notify::{QuakeDisplay, Visibility};
use geowatch_reconcile::{Pairing, DEFAULT_RETAIN_LIMIT};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Top-level bot configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Run each enabled feed's first cycle, then exit.
    #[serde(default)]
    pub run_once: bool,

    /// Upstream feed settings.
    #[serde(default)]
    pub feed: FeedConfig,

    /// Seismic feed settings.
    #[serde(default)]
    pub quakes: QuakeConfig,

    /// Volcanic alert level feed settings.
    #[serde(default)]
    pub volcanoes: VolcanoConfig,

    /// Posting settings.
    #[serde(default)]
    pub mastodon: MastodonConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Upstream API access.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    /// API root, e.g. `https://api.geonet.org.nz`.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// IANA time zone that origin times are displayed in.
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

/// Seismic feed polling and presentation.
#[derive(Debug, Clone, Deserialize)]
pub struct QuakeConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Minimum intensity requested from the feed.
    #[serde(default = "default_min_intensity")]
    pub min_intensity: i32,

    #[serde(default = "default_quake_interval_secs")]
    pub poll_interval_secs: u64,

    /// Include the shaking description in posts.
    #[serde(default = "default_true")]
    pub show_intensity: bool,

    /// Include the data quality in posts.
    #[serde(default)]
    pub show_quality: bool,

    /// Post threaded replies when a tracked event is revised.
    #[serde(default = "default_true")]
    pub post_updates: bool,

    /// Maximum number of events remembered between polls.
    #[serde(default = "default_retain_limit")]
    pub retain_limit: usize,
}

/// Volcano feed polling and presentation.
#[derive(Debug, Clone, Deserialize)]
pub struct VolcanoConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_volcano_interval_secs")]
    pub poll_interval_secs: u64,

    /// File holding the last raw volcano payload.
    #[serde(default = "default_snapshot_path")]
    pub snapshot_path: PathBuf,

    /// How consecutive snapshots are matched up.
    #[serde(default)]
    pub pairing: Pairing,

    /// On the first cycle, announce every matched volcano even when its
    /// level is unchanged.
    #[serde(default)]
    pub emit_all: bool,

    /// On the first cycle, post one aggregated message instead of
    /// per-volcano changes.
    #[serde(default)]
    pub summary: bool,

    /// Lowest level included in the summary.
    #[serde(default = "default_summary_threshold")]
    pub summary_threshold: u32,
}

/// Mastodon account settings.
#[derive(Clone, Deserialize)]
pub struct MastodonConfig {
    #[serde(default = "default_instance_url")]
    pub instance_url: String,

    /// Bearer token. Prefer `GEOWATCH_ACCESS_TOKEN` over the config file.
    #[serde(default)]
    pub access_token: String,

    #[serde(default)]
    pub visibility: Visibility,

    /// Log posts instead of publishing them.
    #[serde(default)]
    pub dry_run: bool,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "geowatch_bot=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

fn default_true() -> bool {
    true
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    20
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_timezone() -> String {
    "Pacific/Auckland".to_string()
}

fn default_min_intensity() -> i32 {
    3
}

fn default_quake_interval_secs() -> u64 {
    60
}

fn default_retain_limit() -> usize {
    DEFAULT_RETAIN_LIMIT
}

fn default_volcano_interval_secs() -> u64 {
    300
}

fn default_snapshot_path() -> PathBuf {
    PathBuf::from("volc.json")
}

fn default_summary_threshold() -> u32 {
    1
}

fn default_instance_url() -> String {
    "https://mastodon.social".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
            timezone: default_timezone(),
        }
    }
}

impl Default for QuakeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_intensity: default_min_intensity(),
            poll_interval_secs: default_quake_interval_secs(),
            show_intensity: true,
            show_quality: false,
            post_updates: true,
            retain_limit: default_retain_limit(),
        }
    }
}

impl Default for VolcanoConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            poll_interval_secs: default_volcano_interval_secs(),
            snapshot_path: default_snapshot_path(),
            pairing: Pairing::default(),
            emit_all: false,
            summary: false,
            summary_threshold: default_summary_threshold(),
        }
    }
}

impl Default for MastodonConfig {
    fn default() -> Self {
        Self {
            instance_url: default_instance_url(),
            access_token: String::new(),
            visibility: Visibility::default(),
            dry_run: false,
        }
    }
}

impl std::fmt::Debug for MastodonConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MastodonConfig")
            .field("instance_url", &self.instance_url)
            .field("access_token", &"[REDACTED]")
            .field("visibility", &self.visibility)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl FeedConfig {
    /// Request timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Parsed display time zone.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if `timezone` is not an IANA zone name.
    pub fn timezone(&self) -> Result<Tz, ConfigError> {
        self.timezone.trim().parse().map_err(|_| {
            ConfigError::Invalid(format!(
                "feed.timezone {:?} is not an IANA time zone",
                self.timezone
            ))
        })
    }
}

impl QuakeConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Presentation toggles for quake posts.
    pub fn display(&self) -> QuakeDisplay {
        QuakeDisplay {
            show_intensity: self.show_intensity,
            show_quality: self.show_quality,
        }
    }
}

impl VolcanoConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of range or inconsistent.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl Config {
    /// Checks values that serde cannot.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` describing the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.feed.timezone()?;
        if self.quakes.enabled && self.quakes.poll_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "quakes.poll_interval_secs must be positive".to_string(),
            ));
        }
        if self.quakes.retain_limit == 0 {
            return Err(ConfigError::Invalid(
                "quakes.retain_limit must be positive".to_string(),
            ));
        }
        if self.volcanoes.enabled && self.volcanoes.poll_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "volcanoes.poll_interval_secs must be positive".to_string(),
            ));
        }
        if !self.mastodon.dry_run && self.mastodon.access_token.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "mastodon.access_token is required unless mastodon.dry_run is set".to_string(),
            ));
        }
        Ok(())
    }
}

/// Applies `GEOWATCH_*` overrides using `lookup` to read variables.
///
/// - `GEOWATCH_LOG_LEVEL` overrides `logging.level`
/// - `GEOWATCH_LOG_JSON` overrides `logging.json` (set to "true" to enable)
/// - `GEOWATCH_ACCESS_TOKEN` overrides `mastodon.access_token`
/// - `GEOWATCH_INSTANCE_URL` overrides `mastodon.instance_url`
/// - `GEOWATCH_DRY_RUN` overrides `mastodon.dry_run`
/// - `GEOWATCH_QUAKE_INTERVAL_SECS` overrides `quakes.poll_interval_secs`
/// - `GEOWATCH_VOLCANO_INTERVAL_SECS` overrides `volcanoes.poll_interval_secs`
/// - `GEOWATCH_SNAPSHOT_PATH` overrides `volcanoes.snapshot_path`
/// - `GEOWATCH_TIMEZONE` overrides `feed.timezone`
pub fn apply_env_overrides(config: &mut Config, lookup: impl Fn(&str) -> Option<String>) {
    let flag = |v: String| v == "true" || v == "1";

    if let Some(level) = lookup("GEOWATCH_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(json) = lookup("GEOWATCH_LOG_JSON") {
        config.logging.json = flag(json);
    }
    if let Some(token) = lookup("GEOWATCH_ACCESS_TOKEN") {
        config.mastodon.access_token = token;
    }
    if let Some(url) = lookup("GEOWATCH_INSTANCE_URL") {
        config.mastodon.instance_url = url;
    }
    if let Some(dry_run) = lookup("GEOWATCH_DRY_RUN") {
        config.mastodon.dry_run = flag(dry_run);
    }
    if let Some(secs) = lookup("GEOWATCH_QUAKE_INTERVAL_SECS") {
        if let Ok(parsed) = secs.parse() {
            config.quakes.poll_interval_secs = parsed;
        }
    }
    if let Some(secs) = lookup("GEOWATCH_VOLCANO_INTERVAL_SECS") {
        if let Ok(parsed) = secs.parse() {
            config.volcanoes.poll_interval_secs = parsed;
        }
    }
    if let Some(path) = lookup("GEOWATCH_SNAPSHOT_PATH") {
        config.volcanoes.snapshot_path = PathBuf::from(path);
    }
    if let Some(tz) = lookup("GEOWATCH_TIMEZONE") {
        config.feed.timezone = tz;
    }
}

/// Loads configuration from a TOML file, falling back to defaults.
///
/// A missing file is not an error. Environment overrides are applied after
/// the file (see [`apply_env_overrides`]) and the result is validated.
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed,
/// or if the merged configuration is invalid.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let mut config = match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => toml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = p, "config file not found, using defaults");
                Config::default()
            }
            Err(e) => return Err(ConfigError::FileRead(e)),
        },
        None => Config::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    config.validate()?;
    Ok(config)
}
