use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::archive_url::{ArchiveLocator, DEFAULT_CDN_BASE_URL};
use crate::platform::{default_fleet, PlatformDescriptor};
use crate::resolver::DEFAULT_MAX_ATTEMPTS;
use crate::retry::RetryPolicy;
use crate::transport::CurlTransportOptions;
use crate::version::{DepsLookup, DEFAULT_VERSION_LOOKUP_URL};

/// Transient-failure retry for individual requests (optional section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of tries per request (including the first).
    pub max_attempts: u32,
    /// Base delay in seconds for exponential backoff (e.g. 0.25 = 250ms).
    pub base_delay_secs: f64,
    /// Maximum backoff delay in seconds.
    pub max_delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay_secs: 0.25,
            max_delay_secs: 30,
        }
    }
}

/// Global configuration loaded from `~/.config/snaprev/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SnaprevConfig {
    /// Decrements allowed below the base revision before a platform gives up.
    pub max_attempts: u32,
    /// Where the revision table is written.
    pub output_path: PathBuf,
    pub cdn_base_url: String,
    pub version_lookup_url: String,
    pub connect_timeout_secs: u64,
    /// Per existence check.
    pub request_timeout_secs: u64,
    pub download_timeout_secs: u64,
    /// Platforms resolved by `snaprev resolve`, in table order.
    pub fleet: Vec<PlatformDescriptor>,
    /// If missing, every request is made exactly once.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry: Option<RetryConfig>,
}

impl Default for SnaprevConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            output_path: PathBuf::from("revisions.json"),
            cdn_base_url: DEFAULT_CDN_BASE_URL.to_string(),
            version_lookup_url: DEFAULT_VERSION_LOOKUP_URL.to_string(),
            connect_timeout_secs: 15,
            request_timeout_secs: 30,
            download_timeout_secs: 3600,
            fleet: default_fleet(),
            retry: None,
        }
    }
}

impl SnaprevConfig {
    pub fn transport_options(&self) -> CurlTransportOptions {
        CurlTransportOptions {
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            probe_timeout: Duration::from_secs(self.request_timeout_secs),
            download_timeout: Duration::from_secs(self.download_timeout_secs),
            retry: self
                .retry
                .as_ref()
                .map(RetryPolicy::from_config)
                .unwrap_or_else(RetryPolicy::disabled),
        }
    }

    pub fn locator(&self) -> Result<ArchiveLocator> {
        ArchiveLocator::new(&self.cdn_base_url)
            .with_context(|| format!("cdn_base_url {:?}", self.cdn_base_url))
    }

    pub fn version_lookup(&self) -> Result<DepsLookup> {
        let lookup = DepsLookup::new(
            &self.version_lookup_url,
            Duration::from_secs(self.connect_timeout_secs),
            Duration::from_secs(self.request_timeout_secs),
        )?;
        Ok(lookup)
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("snaprev")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<SnaprevConfig> {
    let path = config_path()?;
    load_or_init_at(&path)
}

pub fn load_or_init_at(path: &Path) -> Result<SnaprevConfig> {
    if !path.exists() {
        let default_cfg = SnaprevConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml).with_context(|| format!("write {}", path.display()))?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }
    load_from(path)
}

pub fn load_from(path: &Path) -> Result<SnaprevConfig> {
    let data = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: SnaprevConfig =
        toml::from_str(&data).with_context(|| format!("parse {}", path.display()))?;
    Ok(cfg)
}
