//! Configuration management for Prowl.
//!
//! Provides TOML-based configuration with XDG-compliant paths and
//! environment variable overrides.

use crate::error::{ConfigError, ConfigResult};
use crate::types::MAX_YEARS;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Main application configuration.
///
/// This is loaded from `~/.config/prowl/config.toml` (or platform equivalent).
/// If the file doesn't exist, default values are used.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Discovery API access
    pub discovery: DiscoveryConfig,
    /// Collection filters and limits
    pub collection: CollectionConfig,
    /// Outbound link resolution
    pub resolution: ResolutionConfig,
    /// Browser automation settings
    pub browser: BrowserConfig,
    /// Organization enrichment
    pub enrichment: EnrichmentConfig,
    /// Spreadsheet output
    pub export: ExportConfig,
}

impl AppConfig {
    /// Load configuration from disk, falling back to defaults if not found.
    ///
    /// # Errors
    /// Returns error if:
    /// - Config directory cannot be determined
    /// - File exists but cannot be read
    /// - File contents are not valid TOML
    pub fn load() -> ConfigResult<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            tracing::debug!("Loading config from {}", config_path.display());
            let contents = fs::read_to_string(&config_path)?;
            let config: Self = toml::from_str(&contents)?;
            config.validate()?;
            Ok(config)
        } else {
            tracing::debug!("Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load configuration with environment variable overrides.
    ///
    /// Supports the following environment variables:
    /// - `PROWL_TOKEN`: Discovery API developer token
    /// - `PROWL_HEADLESS`: Override browser headless mode (true/false)
    /// - `PROWL_MAX_PRODUCTS`: Override the collection record cap
    /// - `PROWL_EXPORT_PATH`: Override the spreadsheet path
    pub fn load_with_env() -> ConfigResult<Self> {
        let mut config = Self::load()?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(token) = lookup("PROWL_TOKEN") {
            tracing::debug!("Override discovery.token from env");
            self.discovery.token = token;
        }

        if let Some(val) = lookup("PROWL_HEADLESS") {
            if let Ok(headless) = val.parse() {
                self.browser.headless = headless;
                tracing::debug!("Override browser.headless from env: {}", headless);
            }
        }

        if let Some(val) = lookup("PROWL_MAX_PRODUCTS") {
            if let Ok(max) = val.parse() {
                self.collection.max_products = max;
                tracing::debug!("Override collection.max_products from env: {}", max);
            }
        }

        if let Some(path) = lookup("PROWL_EXPORT_PATH") {
            tracing::debug!("Override export.path from env: {}", path);
            self.export.path = PathBuf::from(path);
        }
    }

    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.collection.years == 0 {
            return Err(ConfigError::InvalidValue {
                field: "collection.years".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if self.collection.years > MAX_YEARS {
            return Err(ConfigError::InvalidValue {
                field: "collection.years".to_string(),
                reason: format!("must be at most {MAX_YEARS}"),
            });
        }
        if self.collection.max_empty_pages == 0 {
            return Err(ConfigError::InvalidValue {
                field: "collection.max_empty_pages".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if self.resolution.probe_workers == 0 {
            return Err(ConfigError::InvalidValue {
                field: "resolution.probe_workers".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Save configuration to disk.
    ///
    /// Creates the config directory if it doesn't exist.
    pub fn save(&self) -> ConfigResult<()> {
        let config_path = Self::config_path()?;
        let config_dir = config_path
            .parent()
            .ok_or_else(|| ConfigError::InvalidValue {
                field: "config_path".to_string(),
                reason: "no parent directory".to_string(),
            })?;

        fs::create_dir_all(config_dir)?;
        tracing::debug!("Saving config to {}", config_path.display());

        let contents = toml::to_string_pretty(self)?;
        fs::write(config_path, contents)?;
        Ok(())
    }

    /// Get the path to the configuration file.
    ///
    /// Uses XDG base directories: `~/.config/prowl/config.toml`
    pub fn config_path() -> ConfigResult<PathBuf> {
        let dirs = ProjectDirs::from("com", "prowl", "prowl").ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Get the data directory path.
    ///
    /// Uses XDG base directories: `~/.local/share/prowl`
    pub fn data_dir() -> ConfigResult<PathBuf> {
        let dirs = ProjectDirs::from("com", "prowl", "prowl").ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.data_dir().to_path_buf())
    }

    /// Directory holding the persistent browser profile (cookies of the
    /// enrichment site login survive between runs).
    pub fn browser_profile_dir(&self) -> ConfigResult<PathBuf> {
        match &self.browser.profile_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(Self::data_dir()?.join("browser-profile")),
        }
    }
}

/// Discovery API access.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Developer token; empty means "ask on first run"
    pub token: String,
    /// GraphQL endpoint
    pub endpoint: String,
    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            endpoint: "https://api.producthunt.com/v2/api/graphql".to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// Collection filters and limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectionConfig {
    /// How many years back the time window reaches
    pub years: u32,
    /// Case-insensitive words rejected in product names
    pub blacklist: Vec<String>,
    /// Products with more makers than this are rejected
    pub max_makers: u32,
    /// Maximum number of records collected per run
    pub max_products: usize,
    /// Consecutive pages without a match before giving up
    pub max_empty_pages: u32,
    /// Pause used when the API signals a rate limit without a usable reset time
    pub default_rate_limit_secs: u64,
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            years: 3,
            blacklist: Vec::new(),
            max_makers: 10,
            max_products: 5000,
            max_empty_pages: 10,
            default_rate_limit_secs: 700,
        }
    }
}

/// Outbound link resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolutionConfig {
    /// Width of the HTTP reachability probe pool
    pub probe_workers: usize,
    /// Timeout for a single HTTP probe in seconds
    pub probe_timeout_secs: u64,
    /// Timeout for a single browser navigation in seconds
    pub navigation_timeout_secs: u64,
    /// Hosts whose links only resolve in a real browser
    pub gated_hosts: Vec<String>,
}

impl Default for ResolutionConfig {
    fn default() -> Self {
        Self {
            probe_workers: 20,
            probe_timeout_secs: 10,
            navigation_timeout_secs: 10,
            gated_hosts: vec!["producthunt.com".to_string()],
        }
    }
}

/// Browser automation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Run browser in headless mode
    pub headless: bool,
    /// Browser window width
    pub window_width: u32,
    /// Browser window height
    pub window_height: u32,
    /// Persistent profile directory; defaults to `<data dir>/browser-profile`
    pub profile_dir: Option<PathBuf>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            window_width: 1920,
            window_height: 1080,
            profile_dir: None,
        }
    }
}

/// Organization enrichment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnrichmentConfig {
    /// Base URL of the organization directory site
    pub base_url: String,
    /// Time given to client-side rendering after a navigation, in milliseconds
    pub settle_delay_ms: u64,
    /// Timeout for organization page navigation in seconds
    pub navigation_timeout_secs: u64,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.crunchbase.com".to_string(),
            settle_delay_ms: 3000,
            navigation_timeout_secs: 60,
        }
    }
}

/// Spreadsheet output.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Output file; `.xlsx` or `.csv`
    pub path: PathBuf,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("producthunt.xlsx"),
        }
    }
}
