use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::crypto::kdf::DEFAULT_ITERATIONS;
use crate::errors::{KeychainError, Result};
use crate::keychain::{KeychainSettings, DEFAULT_PROFILE};

/// Project-level configuration, loaded from `.cloudkeychain.toml`.
///
/// Every field has a sensible default so cloudkeychain works out-of-the-box
/// without any config file at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Keychain folder (relative to the working directory).
    #[serde(default = "default_keychain_path")]
    pub keychain_path: String,

    /// Profile folder inside the keychain.
    #[serde(default = "default_profile_name")]
    pub profile_name: String,

    /// PBKDF2 iteration count for new keychains (default: 2500).
    #[serde(default = "default_iterations")]
    pub iterations: u32,

    /// Seconds of inactivity before an unlocked keychain locks itself.
    #[serde(default = "default_auto_lock_secs")]
    pub auto_lock_secs: u64,

    /// Hint stored in the profile of new keychains.
    #[serde(default)]
    pub password_hint: String,

    /// Writer name stored in the profile.
    #[serde(default = "default_last_updated_by")]
    pub last_updated_by: String,
}

// ── Serde default helpers ────────────────────────────────────────────

fn default_keychain_path() -> String {
    "default.cloudkeychain".to_string()
}

fn default_profile_name() -> String {
    DEFAULT_PROFILE.to_string()
}

fn default_iterations() -> u32 {
    DEFAULT_ITERATIONS
}

fn default_auto_lock_secs() -> u64 {
    60
}

fn default_last_updated_by() -> String {
    "cloudkeychain".to_string()
}

// ── Implementation ───────────────────────────────────────────────────

impl Default for Settings {
    fn default() -> Self {
        Self {
            keychain_path: default_keychain_path(),
            profile_name: default_profile_name(),
            iterations: default_iterations(),
            auto_lock_secs: default_auto_lock_secs(),
            password_hint: String::new(),
            last_updated_by: default_last_updated_by(),
        }
    }
}

impl Settings {
    /// Name of the config file we look for in the project root.
    const FILE_NAME: &'static str = ".cloudkeychain.toml";

    /// Load settings from `<project_dir>/.cloudkeychain.toml`.
    ///
    /// If the file does not exist, sensible defaults are returned.
    /// If the file exists but cannot be parsed, an error is returned.
    pub fn load(project_dir: &Path) -> Result<Self> {
        let config_path = project_dir.join(Self::FILE_NAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path)?;

        let settings: Settings = toml::from_str(&contents).map_err(|e| {
            KeychainError::ConfigError(format!("Failed to parse {}: {e}", config_path.display()))
        })?;

        if settings.iterations < 1 {
            return Err(KeychainError::ConfigError(format!(
                "{}: iterations must be at least 1",
                config_path.display()
            )));
        }

        Ok(settings)
    }

    /// Resolve the keychain folder against `project_dir`.
    pub fn keychain_dir(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(&self.keychain_path)
    }

    pub fn auto_lock(&self) -> Duration {
        Duration::from_secs(self.auto_lock_secs)
    }

    /// Convert into the options `Keychain::create` takes.
    pub fn keychain_settings(&self) -> KeychainSettings {
        KeychainSettings {
            iterations: self.iterations,
            profile_name: self.profile_name.clone(),
            password_hint: self.password_hint.clone(),
            last_updated_by: self.last_updated_by.clone(),
            auto_lock: self.auto_lock(),
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────
