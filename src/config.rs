//! Configuration module
//!
//! Reads `config.toml` from `$APPOINTMENT_PORTAL_CONFIG` or the user config
//! directory (`~/.config/appointment-portal/config.toml`). Every section has
//! defaults, so a missing file or a partial one is fine.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::application::{GuardSettings, LookupFailurePolicy};
use crate::support::InfraError;

/// Environment variable naming the config file
pub const CONFIG_ENV: &str = "APPOINTMENT_PORTAL_CONFIG";

const APP_DIR: &str = "appointment-portal";
const SNAPSHOT_FILE: &str = "portal-state.json";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub portal: PortalConfig,
    pub storage: StorageConfig,
    pub admin: AdminConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortalConfig {
    /// Login page, relative to the site root
    pub login_entry: String,
    pub on_lookup_failure: LookupFailurePolicy,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            login_entry: "index.html".to_string(),
            on_lookup_failure: LookupFailurePolicy::SignOut,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Defaults to `portal-state.json` next to the config file
    pub snapshot_path: Option<PathBuf>,
    /// bcrypt cost for new passwords
    pub password_cost: u32,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            snapshot_path: None,
            password_cost: bcrypt::DEFAULT_COST,
        }
    }
}

/// Admin account created on first run, when no accounts exist
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            name: "Administrator".to_string(),
            email: "admin@example.com".to_string(),
            password: "admin123".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// `plain` or `json`
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "plain".to_string(),
        }
    }
}

impl AppConfig {
    /// Load from `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, InfraError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self, InfraError> {
        Ok(toml::from_str(text)?)
    }

    pub fn guard_settings(&self) -> GuardSettings {
        GuardSettings {
            login_entry: self.portal.login_entry.clone(),
            on_lookup_failure: self.portal.on_lookup_failure,
        }
    }

    /// Where backend state is saved, given the config file in use.
    pub fn snapshot_path(&self, config_path: &Path) -> PathBuf {
        match &self.storage.snapshot_path {
            Some(path) => path.clone(),
            None => config_path
                .parent()
                .map(|dir| dir.join(SNAPSHOT_FILE))
                .unwrap_or_else(|| PathBuf::from(SNAPSHOT_FILE)),
        }
    }
}

/// `$APPOINTMENT_PORTAL_CONFIG`, else `<config dir>/appointment-portal/config.toml`
pub fn default_config_path() -> PathBuf {
    if let Ok(path) = std::env::var(CONFIG_ENV) {
        return PathBuf::from(path);
    }
    dirs_next::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = AppConfig::from_toml(
            r#"
            [portal]
            on_lookup_failure = "keep_session"

            [logging]
            format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.portal.login_entry, "index.html");
        assert_eq!(config.portal.on_lookup_failure, LookupFailurePolicy::KeepSession);
        assert_eq!(config.logging.format, "json");
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.storage.password_cost, bcrypt::DEFAULT_COST);
    }

    #[test]
    fn test_unknown_policy_is_rejected() {
        let err = AppConfig::from_toml("[portal]\non_lookup_failure = \"retry\"\n").unwrap_err();
        assert!(matches!(err, InfraError::Config(_)));
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let config = AppConfig::load(Path::new("/nonexistent/portal/config.toml")).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_snapshot_defaults_next_to_config() {
        let config = AppConfig::default();
        assert_eq!(
            config.snapshot_path(Path::new("/etc/portal/config.toml")),
            PathBuf::from("/etc/portal/portal-state.json")
        );
        assert_eq!(config.guard_settings().login_entry, "index.html");
    }
}
