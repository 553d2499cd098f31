//! Configuration for the sitegrid front ends.
//!
//! TOML file plus `SITEGRID_*` environment overrides, credential
//! resolution (env + keyring + plaintext), and translation to
//! `sitegrid_core::SyncConfig` and `sitegrid_api::TransportConfig`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use sitegrid_api::{DEFAULT_TABLE, TransportConfig};
use sitegrid_core::{MarkerStyleConfig, SyncConfig};

/// Environment variable that overrides the config file location.
pub const CONFIG_PATH_ENV: &str = "SITEGRID_CONFIG";

const KEYRING_SERVICE: &str = "sitegrid";
const KEYRING_API_KEY: &str = "remote/api-key";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no remote URL configured")]
    NoRemote,

    #[error("keyring error: {0}")]
    Keyring(String),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub defaults: Defaults,

    /// The authoritative site table.
    #[serde(default)]
    pub remote: Remote,

    /// Durable site cache and highlight set.
    #[serde(default)]
    pub cache: CacheSection,

    /// Projection and marker tuning.
    #[serde(default)]
    pub view: ViewSection,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            timeout: default_timeout(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Remote {
    /// Server root (e.g. "http://localhost:5000").
    pub url: Option<String>,

    #[serde(default = "default_table")]
    pub table: String,

    /// Override `defaults.timeout`.
    pub timeout: Option<u64>,

    /// API key (plaintext, prefer keyring or env var).
    pub api_key: Option<String>,

    /// Environment variable name containing the API key.
    pub api_key_env: Option<String>,
}

impl Default for Remote {
    fn default() -> Self {
        Self {
            url: None,
            table: default_table(),
            timeout: None,
            api_key: None,
            api_key_env: None,
        }
    }
}

fn default_table() -> String {
    DEFAULT_TABLE.into()
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CacheSection {
    /// Directory for the cache and highlight files. Platform data dir
    /// when unset.
    pub dir: Option<PathBuf>,

    #[serde(default = "default_staleness")]
    pub staleness_secs: u64,
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            dir: None,
            staleness_secs: default_staleness(),
        }
    }
}

fn default_staleness() -> u64 {
    300
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ViewSection {
    #[serde(default = "default_debounce")]
    pub filter_debounce_ms: u64,

    #[serde(default = "default_debounce")]
    pub zoom_debounce_ms: u64,

    /// Zoom level the CLI projects at.
    #[serde(default = "default_zoom")]
    pub zoom: f64,

    #[serde(default = "default_min_radius")]
    pub min_radius: f64,

    #[serde(default = "default_max_radius")]
    pub max_radius: f64,

    #[serde(default = "default_min_zoom")]
    pub min_zoom: f64,

    #[serde(default = "default_zoom_range")]
    pub zoom_range: f64,
}

impl Default for ViewSection {
    fn default() -> Self {
        Self {
            filter_debounce_ms: default_debounce(),
            zoom_debounce_ms: default_debounce(),
            zoom: default_zoom(),
            min_radius: default_min_radius(),
            max_radius: default_max_radius(),
            min_zoom: default_min_zoom(),
            zoom_range: default_zoom_range(),
        }
    }
}

fn default_debounce() -> u64 {
    150
}
fn default_zoom() -> f64 {
    12.0
}
fn default_min_radius() -> f64 {
    3.0
}
fn default_max_radius() -> f64 {
    8.0
}
fn default_min_zoom() -> f64 {
    10.0
}
fn default_zoom_range() -> f64 {
    15.0
}

// ── Paths ───────────────────────────────────────────────────────────

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "sitegrid", "sitegrid")
}

/// Resolve the config file path: `SITEGRID_CONFIG`, then XDG / platform
/// conventions.
pub fn config_path() -> PathBuf {
    if let Some(path) = std::env::var_os(CONFIG_PATH_ENV).filter(|p| !p.is_empty()) {
        return PathBuf::from(path);
    }
    project_dirs().map_or_else(
        || home_fallback(".config").join("config.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

/// Directory holding the site cache and highlight set.
pub fn data_dir(cfg: &Config) -> PathBuf {
    if let Some(ref dir) = cfg.cache.dir {
        return dir.clone();
    }
    project_dirs().map_or_else(
        || home_fallback(".local/share"),
        |dirs| dirs.data_dir().to_path_buf(),
    )
}

fn home_fallback(base: &str) -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(base);
    p.push("sitegrid");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from `path` merged with `SITEGRID_*` variables
/// (`SITEGRID_REMOTE__URL` sets `remote.url`).
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("SITEGRID_").ignore(&["config"]).split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file is missing or broken.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credential resolution ───────────────────────────────────────────

/// Resolve the remote API key. The remote may be open, so absence is
/// not an error.
pub fn resolve_api_key(remote: &Remote) -> Option<SecretString> {
    resolve_api_key_with(
        remote,
        |name| std::env::var(name).ok(),
        || {
            keyring::Entry::new(KEYRING_SERVICE, KEYRING_API_KEY)
                .and_then(|entry| entry.get_password())
                .ok()
        },
    )
}

fn resolve_api_key_with(
    remote: &Remote,
    env: impl Fn(&str) -> Option<String>,
    keyring: impl FnOnce() -> Option<String>,
) -> Option<SecretString> {
    // 1. api_key_env → env var lookup
    if let Some(val) = remote.api_key_env.as_deref().and_then(env) {
        return Some(SecretString::from(val));
    }

    // 2. System keyring
    if let Some(secret) = keyring() {
        return Some(SecretString::from(secret));
    }

    // 3. Plaintext in config
    remote.api_key.clone().map(SecretString::from)
}

/// Store the API key in the system keyring.
pub fn store_api_key(secret: &str) -> Result<(), ConfigError> {
    keyring::Entry::new(KEYRING_SERVICE, KEYRING_API_KEY)
        .and_then(|entry| entry.set_password(secret))
        .map_err(|e| ConfigError::Keyring(e.to_string()))
}

// ── Translation ─────────────────────────────────────────────────────

/// The remote server root, validated.
pub fn remote_url(cfg: &Config) -> Result<url::Url, ConfigError> {
    let raw = cfg.remote.url.as_deref().ok_or(ConfigError::NoRemote)?;
    raw.parse().map_err(|_| ConfigError::Validation {
        field: "remote.url".into(),
        reason: format!("invalid URL: {raw}"),
    })
}

/// Transport settings for the remote client. Reads the credential chain.
pub fn to_transport_config(cfg: &Config) -> TransportConfig {
    TransportConfig {
        timeout: Duration::from_secs(cfg.remote.timeout.unwrap_or(cfg.defaults.timeout)),
        api_key: resolve_api_key(&cfg.remote),
    }
}

/// Sync engine settings. Fails on a radius curve that cannot be drawn.
pub fn to_sync_config(cfg: &Config) -> Result<SyncConfig, ConfigError> {
    let view = &cfg.view;
    if !(view.min_radius > 0.0 && view.max_radius >= view.min_radius) {
        return Err(ConfigError::Validation {
            field: "view.max_radius".into(),
            reason: format!(
                "need 0 < min_radius <= max_radius, got {} and {}",
                view.min_radius, view.max_radius
            ),
        });
    }
    if view.zoom_range <= 0.0 {
        return Err(ConfigError::Validation {
            field: "view.zoom_range".into(),
            reason: "must be positive".into(),
        });
    }

    Ok(SyncConfig {
        staleness: Duration::from_secs(cfg.cache.staleness_secs),
        filter_debounce: Duration::from_millis(view.filter_debounce_ms),
        zoom_debounce: Duration::from_millis(view.zoom_debounce_ms),
        marker: MarkerStyleConfig {
            min_radius: view.min_radius,
            max_radius: view.max_radius,
            min_zoom: view.min_zoom,
            zoom_range: view.zoom_range,
            ..MarkerStyleConfig::default()
        },
    })
}
