//! Client configuration.
//!
//! All settings live in a single `config.toml` file at
//! `~/.config/drivetoken/config.toml` by default.
//!
//! The two credential paths accept secret references:
//! - `pass::path/in/store` - resolved via `pass show`
//! - `env::VAR_NAME` - resolved from the environment
//! - plain text - used as-is

use std::path::{Path, PathBuf};
use std::time::Duration;

use drivetoken_google::{GoogleConfig, RefreshPersistence};
use serde::{Deserialize, Serialize};

/// Configuration for the drivetoken client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Debug mode.
    pub debug: bool,

    /// Google Drive settings.
    pub google: Option<GoogleSettings>,
}

impl ClientConfig {
    /// Loads configuration from the default path, or defaults if it is absent.
    pub fn load() -> Result<Self, String> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("failed to read config {}: {}", path.display(), e))?;
        toml::from_str(&content).map_err(|e| format!("failed to parse config: {}", e))
    }

    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("drivetoken")
            .join("config.toml")
    }

    /// Builds the provider configuration, using defaults when `[google]` is absent.
    pub fn provider_config(&self) -> Result<GoogleConfig, String> {
        match self.google {
            Some(ref google) => google.to_provider_config(),
            None => GoogleSettings::default().to_provider_config(),
        }
    }
}

/// The `[google]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleSettings {
    /// Stored credential file (`google.credentials.stored`).
    pub credentials_stored: Option<String>,

    /// OAuth client secret JSON (`google.credentials.json`).
    pub credentials_json: Option<String>,

    /// Key of the credential inside the store.
    pub account: Option<String>,

    /// Write refreshed tokens back to the store.
    pub persist_refreshed: bool,

    /// Drive folder used by the upload stub.
    pub drive_target: Option<String>,

    /// Whole-request timeout in seconds.
    pub timeout_secs: Option<u64>,
}

impl GoogleSettings {
    /// Converts to provider configuration.
    ///
    /// Path values go through `secret::resolve()` first. Unset values fall
    /// back to the provider defaults.
    pub fn to_provider_config(&self) -> Result<GoogleConfig, String> {
        let stored = resolve_path(self.credentials_stored.as_deref(), "credentials_stored")?
            .unwrap_or_else(GoogleConfig::default_credentials_stored);
        let json = resolve_path(self.credentials_json.as_deref(), "credentials_json")?
            .unwrap_or_else(GoogleConfig::default_credentials_json);

        let mut config = GoogleConfig::new(stored, json);

        if let Some(ref account) = self.account {
            config = config.with_account(account);
        }

        if self.persist_refreshed {
            config = config.with_persistence(RefreshPersistence::WriteBack);
        }

        if let Some(ref target) = self.drive_target {
            config = config.with_drive_target(target);
        }

        if let Some(secs) = self.timeout_secs {
            if secs == 0 {
                return Err("timeout_secs must be greater than zero".to_string());
            }
            config = config.with_request_timeout(Duration::from_secs(secs));
        }

        config.validate()?;
        Ok(config)
    }
}

fn resolve_path(raw: Option<&str>, field: &str) -> Result<Option<PathBuf>, String> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    let resolved = crate::secret::resolve(raw)
        .map_err(|e| format!("failed to resolve {}: {}", field, e))?;
    if resolved.trim().is_empty() {
        return Err(format!("{} must not be empty", field));
    }
    Ok(Some(PathBuf::from(resolved)))
}
