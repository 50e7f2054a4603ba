//! # Engine Configuration
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     DAFTAR_NAMESPACE=shop-2                                            │
//! │     DAFTAR_DB_PATH=/srv/daftar/books.db                                │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/books/daftar.toml (Linux)                                │
//! │     ~/Library/Application Support/com.daftar.books/daftar.toml (macOS) │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [activity]
//! namespace = "shop-1"
//!
//! [storage]
//! database_path = "/var/lib/daftar/daftar.db"
//! max_connections = 5
//!
//! [inventory]
//! low_stock_threshold = 10
//!
//! [trash]
//! retention_days = 30
//!
//! [display]
//! currency_symbol = "SAR"
//! ```

use std::path::PathBuf;

use daftar_core::Money;
use daftar_db::DbConfig;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::ConfigError;

// =============================================================================
// Sections
// =============================================================================

/// The business activity whose books are open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivitySettings {
    /// Opaque prefix scoping every collection read and write.
    #[serde(default = "default_namespace")]
    pub namespace: String,
}

fn default_namespace() -> String {
    "default".to_string()
}

impl Default for ActivitySettings {
    fn default() -> Self {
        ActivitySettings {
            namespace: default_namespace(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageSettings {
    /// SQLite file. Falls back to the platform data directory.
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

impl Default for StorageSettings {
    fn default() -> Self {
        StorageSettings {
            database_path: None,
            max_connections: default_max_connections(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventorySettings {
    /// Items with `0 < stock <= threshold` are reported as low.
    #[serde(default = "default_low_stock_threshold")]
    pub low_stock_threshold: i64,
}

fn default_low_stock_threshold() -> i64 {
    10
}

impl Default for InventorySettings {
    fn default() -> Self {
        InventorySettings {
            low_stock_threshold: default_low_stock_threshold(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrashSettings {
    /// Days a soft-deleted record stays restorable.
    #[serde(default = "default_retention_days")]
    pub retention_days: i64,
}

fn default_retention_days() -> i64 {
    30
}

impl Default for TrashSettings {
    fn default() -> Self {
        TrashSettings {
            retention_days: default_retention_days(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplaySettings {
    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,
}

fn default_currency_symbol() -> String {
    "SAR".to_string()
}

impl Default for DisplaySettings {
    fn default() -> Self {
        DisplaySettings {
            currency_symbol: default_currency_symbol(),
        }
    }
}

// =============================================================================
// Engine Configuration
// =============================================================================

/// Complete engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub activity: ActivitySettings,

    #[serde(default)]
    pub storage: StorageSettings,

    #[serde(default)]
    pub inventory: InventorySettings,

    #[serde(default)]
    pub trash: TrashSettings,

    #[serde(default)]
    pub display: DisplaySettings,
}

impl EngineConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (daftar.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> Result<(), ConfigError> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| ConfigError::SaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::SaveFailed(e.to_string()))?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents).map_err(|e| ConfigError::SaveFailed(e.to_string()))?;

        info!(?path, "Config saved");
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.activity.namespace.trim().is_empty() {
            return Err(ConfigError::Invalid("namespace must not be empty".into()));
        }

        if self.storage.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "max_connections must be greater than 0".into(),
            ));
        }

        if self.inventory.low_stock_threshold < 0 {
            return Err(ConfigError::Invalid(
                "low_stock_threshold must not be negative".into(),
            ));
        }

        if self.trash.retention_days <= 0 {
            return Err(ConfigError::Invalid(
                "retention_days must be greater than 0".into(),
            ));
        }

        if self.display.currency_symbol.trim().is_empty() {
            return Err(ConfigError::Invalid("currency_symbol must not be empty".into()));
        }

        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(namespace) = std::env::var("DAFTAR_NAMESPACE") {
            debug!(namespace = %namespace, "Overriding namespace from environment");
            self.activity.namespace = namespace;
        }

        if let Ok(path) = std::env::var("DAFTAR_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.storage.database_path = Some(PathBuf::from(path));
        }

        if let Ok(threshold) = std::env::var("DAFTAR_LOW_STOCK_THRESHOLD") {
            match threshold.parse::<i64>() {
                Ok(t) => self.inventory.low_stock_threshold = t,
                Err(_) => warn!(value = %threshold, "Ignoring invalid DAFTAR_LOW_STOCK_THRESHOLD"),
            }
        }

        if let Ok(days) = std::env::var("DAFTAR_TRASH_RETENTION_DAYS") {
            match days.parse::<i64>() {
                Ok(d) => self.trash.retention_days = d,
                Err(_) => warn!(value = %days, "Ignoring invalid DAFTAR_TRASH_RETENTION_DAYS"),
            }
        }

        if let Ok(symbol) = std::env::var("DAFTAR_CURRENCY_SYMBOL") {
            self.display.currency_symbol = symbol;
        }
    }

    fn project_dirs() -> Option<directories::ProjectDirs> {
        directories::ProjectDirs::from("com", "daftar", "books")
    }

    fn default_config_path() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.config_dir().join("daftar.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    pub fn namespace(&self) -> &str {
        &self.activity.namespace
    }

    /// Configured database file, or `daftar.db` in the platform data
    /// directory (created if missing).
    pub fn database_path(&self) -> Result<PathBuf, ConfigError> {
        if let Some(path) = &self.storage.database_path {
            return Ok(path.clone());
        }

        let dirs = Self::project_dirs().ok_or(ConfigError::NoDataDir)?;
        let data_dir = dirs.data_dir();
        std::fs::create_dir_all(data_dir)?;
        Ok(data_dir.join("daftar.db"))
    }

    pub fn db_config(&self) -> Result<DbConfig, ConfigError> {
        Ok(DbConfig::new(self.database_path()?).max_connections(self.storage.max_connections))
    }

    /// How long tombstones stay restorable.
    pub fn retention(&self) -> chrono::Duration {
        chrono::Duration::days(self.trash.retention_days)
    }

    /// `"12.50 SAR"`
    pub fn format_amount(&self, amount: Money) -> String {
        format!("{} {}", amount, self.display.currency_symbol)
    }
}
