//! Store settings loaded from config.toml
//!
//! Every section and field is optional. A missing file or section falls back to
//! the defaults: bootstrap admin `admin` / `admin123`, mirror documents under
//! `./data`, and keys valid for 30 days when a request names no expiry.

use crate::{
    core::validation::expiry_after,
    errors::{Error, Result},
};
use chrono::Utc;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default location of the settings file
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Default, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct AppConfig {
    /// Admin account seeded at startup
    pub admin: AdminSeed,
    /// Per-reseller JSON mirror
    pub mirror: MirrorConfig,
    /// Defaults applied when resolving key requests
    pub keys: KeyDefaults,
}

/// Credentials of the admin created at bootstrap
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct AdminSeed {
    /// Login name of the seeded admin
    pub username: String,
    /// Password of the seeded admin
    pub password: String,
}

impl Default for AdminSeed {
    fn default() -> Self {
        Self {
            username: "admin".to_string(),
            password: "admin123".to_string(),
        }
    }
}

/// Settings for the per-reseller JSON mirror
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct MirrorConfig {
    /// When false no mirror worker is started
    pub enabled: bool,
    /// Directory holding one `<username>.json` document per reseller
    pub data_dir: PathBuf,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            data_dir: PathBuf::from("data"),
        }
    }
}

/// Defaults for key creation
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct KeyDefaults {
    /// Validity period used when a request has neither an expiry date nor a day count
    pub default_days: i64,
}

impl Default for KeyDefaults {
    fn default() -> Self {
        Self { default_days: 30 }
    }
}

/// Loads settings from a TOML file
///
/// # Errors
/// Returns [`Error::Config`] if the file cannot be read, the TOML is invalid,
/// or `keys.default_days` is not positive.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path_ref = path.as_ref();
    tracing::debug!("Attempting to load configuration from: {:?}", path_ref);
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read config file {}: {e}", path_ref.display()),
    })?;

    parse_config(&contents)
}

/// Parses settings from TOML text
pub fn parse_config(contents: &str) -> Result<AppConfig> {
    let config: AppConfig = toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })?;

    if expiry_after(Utc::now(), config.keys.default_days).is_err() {
        return Err(Error::Config {
            message: format!(
                "keys.default_days must be a positive number of days within range, got {}",
                config.keys.default_days
            ),
        });
    }

    Ok(config)
}

/// Loads settings from ./config.toml, or the defaults when the file is absent
pub fn load_default_config() -> Result<AppConfig> {
    if Path::new(DEFAULT_CONFIG_PATH).exists() {
        load_config(DEFAULT_CONFIG_PATH)
    } else {
        tracing::info!("No {} found, using default settings", DEFAULT_CONFIG_PATH);
        Ok(AppConfig::default())
    }
}
