//! Configuration loading and representation.
//!
//! Layers, later wins: built-in defaults, an optional TOML file
//! (`shopdesk.toml`, or the path in `SHOPDESK_CONFIG`), then environment
//! variables such as `SHOPDESK__DATABASE__URL` or `SHOPDESK__KASPI__TOKEN`.

use std::path::PathBuf;
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

pub use shopdesk_observability::{LogFormat, LoggingConfig};

pub const CONFIG_PATH_VAR: &str = "SHOPDESK_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "shopdesk.toml";

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub http: HttpConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    pub kaspi: KaspiConfig,
    pub feed: FeedConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    pub bind_addr: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL. Absent: in-memory store (dev/tests).
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// How long a transaction waits for a product row lock.
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,
}

fn default_max_connections() -> u32 {
    10
}

fn default_lock_timeout_ms() -> u64 {
    5_000
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: default_max_connections(),
            lock_timeout_ms: default_lock_timeout_ms(),
        }
    }
}

impl DatabaseConfig {
    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct KaspiConfig {
    pub base_url: String,
    /// Shop API token (`X-Auth-Token`).
    #[serde(default)]
    pub token: Option<String>,
    pub page_size: u32,
    /// Default import window, in days back from now.
    pub window_days: u32,
}

/// Constants written into the partner catalog feed.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    pub company: String,
    pub merchant_id: String,
    pub brand: String,
    pub store_id: String,
}

impl AppConfig {
    /// Load configuration from defaults, the config file and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var(CONFIG_PATH_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE));
        Self::load_from(Some(path))
    }

    /// Load with an explicit file (or none) plus the environment.
    pub fn load_from(path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut builder = Self::defaults()?;
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(false));
        }
        builder
            .add_source(
                Environment::with_prefix("SHOPDESK")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    fn defaults() -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        Config::builder()
            .set_default("http.bind_addr", "0.0.0.0:8080")?
            .set_default("database.max_connections", i64::from(default_max_connections()))?
            .set_default("database.lock_timeout_ms", default_lock_timeout_ms() as i64)?
            .set_default("kaspi.base_url", crate::external::kaspi::DEFAULT_BASE_URL)?
            .set_default("kaspi.page_size", 50)?
            .set_default("kaspi.window_days", 1)?
            .set_default("feed.company", "ShopDesk")?
            .set_default("feed.merchant_id", "ShopDesk")?
            .set_default("feed.brand", "ShopDesk")?
            .set_default("feed.store_id", "PP1")?
            .set_default("logging.format", "json")?
            .set_default("logging.filter", "info")
    }
}
