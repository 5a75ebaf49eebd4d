use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::CoreError;

/// Environment variable naming an explicit settings file.
pub const CONFIG_ENV: &str = "VKV_CONFIG";

/// Top-level layer settings, loaded from vkv.toml.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct LayerSettings {
    #[serde(default)]
    pub validation: ValidationSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidationSettings {
    /// Emit advisory findings (e.g. a preTransform that differs from the current transform)
    #[serde(default = "default_true")]
    pub report_performance_warnings: bool,
    /// Verdict returned to the caller when a usage violation is reported
    #[serde(default = "default_true")]
    pub abort_on_error: bool,
    /// Maximum number of messages per VUID (0 = unlimited)
    #[serde(default = "default_duplicate_limit")]
    pub duplicate_message_limit: u32,
    /// VUIDs whose diagnostics are dropped entirely
    #[serde(default)]
    pub muted_vuids: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoggingSettings {
    /// Fallback filter when VKV_LOG is not set
    #[serde(default = "default_level")]
    pub level: String,
}

impl Default for ValidationSettings {
    fn default() -> Self {
        Self {
            report_performance_warnings: true,
            abort_on_error: true,
            duplicate_message_limit: default_duplicate_limit(),
            muted_vuids: Vec::new(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

impl ValidationSettings {
    pub fn is_muted(&self, vuid: &str) -> bool {
        self.muted_vuids.iter().any(|muted| muted == vuid)
    }
}

impl LayerSettings {
    /// Load settings from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse settings from TOML text.
    pub fn parse(content: &str) -> Result<Self, CoreError> {
        let settings: LayerSettings = toml::from_str(content)?;
        if settings.logging.level.trim().is_empty() {
            return Err(CoreError::Config("logging.level must not be empty".to_string()));
        }
        Ok(settings)
    }

    /// Load settings from file if it exists, otherwise return defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            return Self::default();
        }
        Self::load(path).unwrap_or_else(|err| {
            warn!("ignoring layer settings at {}: {}", path.display(), err);
            Self::default()
        })
    }

    /// Load settings from the path found by [`default_config_path`].
    pub fn from_environment() -> Self {
        Self::load_or_default(default_config_path())
    }
}

/// Returns the settings file path based on platform conventions.
/// Search order:
/// 1. `VKV_CONFIG` environment variable
/// 2. System-wide config: `%PROGRAMDATA%\VKV\vkv.toml` (Windows) or `/etc/vkv/vkv.toml` (Linux/macOS)
/// 3. Local fallback: `./vkv.toml`
pub fn default_config_path() -> String {
    if let Ok(path) = std::env::var(CONFIG_ENV) {
        if !path.is_empty() {
            return path;
        }
    }
    #[cfg(windows)]
    {
        let programdata = std::env::var("PROGRAMDATA")
            .unwrap_or_else(|_| r"C:\ProgramData".to_string());
        let system_path = format!(r"{}\VKV\vkv.toml", programdata);
        if Path::new(&system_path).exists() {
            return system_path;
        }
    }
    #[cfg(not(windows))]
    {
        let system_path = "/etc/vkv/vkv.toml";
        if Path::new(system_path).exists() {
            return system_path.to_string();
        }
    }
    "vkv.toml".to_string()
}

fn default_true() -> bool {
    true
}

fn default_duplicate_limit() -> u32 {
    10
}

fn default_level() -> String {
    "info".to_string()
}
