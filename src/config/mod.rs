//! Configuration for the toolbox runtime.
//!
//! A configuration file describes logging, the default input-port policy and
//! per-task overrides. Both JSON and TOML are accepted; the format is picked
//! from the file extension.
//!
//! # Default Location
//!
//! - **Linux**: `~/.config/crn-toolbox/toolbox.toml`
//! - **macOS**: `~/Library/Application Support/crn-toolbox/toolbox.toml`
//! - **Windows**: `%APPDATA%\crn-toolbox\toolbox.toml`
//!
//! # Example
//!
//! ```toml
//! run_seconds = 10
//!
//! [logging]
//! filter = "info,crn_toolbox=debug"
//!
//! [defaults]
//! buffer_size = 256
//! lossless = false
//!
//! [[tasks]]
//! id = "sink"
//! port_settings = { buffer_size = 16, lossless = true }
//! ```

use crate::error::{Result, ResultExt, ToolboxError};
use crate::pipeline::PortSettings;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application identifier for config directories
pub const APP_ID: &str = "crn-toolbox";

/// Default config filename
pub const CONFIG_FILE: &str = "toolbox.toml";

/// Default log filter when `RUST_LOG` is not set
pub const DEFAULT_LOG_FILTER: &str = "info,crn_toolbox=debug";

/// Default runtime of the demo pipeline
pub const DEFAULT_RUN_SECONDS: u64 = 5;

/// Default generator period of the demo pipeline
pub const DEFAULT_PERIOD_MS: u64 = 100;

/// Get the application config directory path
pub fn config_dir() -> Option<PathBuf> {
    dirs_next::config_dir().map(|p| p.join(APP_ID))
}

/// Get the path to the default config file
pub fn default_config_path() -> Option<PathBuf> {
    config_dir().map(|p| p.join(CONFIG_FILE))
}

/// On-disk encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Toml,
}

impl ConfigFormat {
    /// Pick the format from the file extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Ok(ConfigFormat::Json),
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Ok(ConfigFormat::Toml),
            _ => Err(ToolboxError::Config(format!(
                "Unsupported config file extension: {:?}",
                path
            ))),
        }
    }
}

/// Logging settings for the binary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is not set.
    pub filter: String,
    /// Also write daily-rotated log files into this directory.
    pub log_dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: DEFAULT_LOG_FILTER.to_string(),
            log_dir: None,
        }
    }
}

/// Per-task overrides, matched by task id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskConfig {
    pub id: String,

    #[serde(default)]
    pub disabled: bool,

    /// Replaces the global defaults for this task's input ports.
    #[serde(default)]
    pub port_settings: Option<PortSettings>,

    /// Task description document returned by `read_description`.
    #[serde(default)]
    pub description_path: Option<PathBuf>,
}

impl TaskConfig {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            disabled: false,
            port_settings: None,
            description_path: None,
        }
    }
}

/// Settings of the bundled generator → select → sink pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    pub period_ms: u64,
    /// Channels kept by the select task.
    pub select_channels: Vec<usize>,
    pub stream_id: Option<u32>,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            period_ms: DEFAULT_PERIOD_MS,
            select_channels: vec![0, 1],
            stream_id: None,
        }
    }
}

/// Top-level configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolboxConfig {
    pub run_seconds: u64,
    pub logging: LoggingConfig,
    /// Input-port policy for tasks without their own `port_settings`.
    pub defaults: PortSettings,
    pub demo: DemoConfig,
    pub tasks: Vec<TaskConfig>,
}

impl Default for ToolboxConfig {
    fn default() -> Self {
        Self {
            run_seconds: DEFAULT_RUN_SECONDS,
            logging: LoggingConfig::default(),
            defaults: PortSettings::default(),
            demo: DemoConfig::default(),
            tasks: Vec::new(),
        }
    }
}

impl ToolboxConfig {
    /// Load from a `.json` or `.toml` file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let format = ConfigFormat::from_path(path)?;
        let content = std::fs::read_to_string(path).map_err(|e| {
            ToolboxError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;
        Self::parse(&content, format)
            .with_context(|| format!("Failed to parse config file {:?}", path))
    }

    /// Load from `path`, falling back to defaults (logged) on any error.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!("No config file at {:?}, using defaults", path);
            return Self::default();
        }
        Self::load(path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load config: {}", e);
            Self::default()
        })
    }

    pub fn parse(content: &str, format: ConfigFormat) -> Result<Self> {
        match format {
            ConfigFormat::Json => serde_json::from_str(content)
                .map_err(|e| ToolboxError::Serialization(e.to_string())),
            ConfigFormat::Toml => {
                toml::from_str(content).map_err(|e| ToolboxError::Serialization(e.to_string()))
            }
        }
    }

    /// Save to a `.json` or `.toml` file, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = match ConfigFormat::from_path(path)? {
            ConfigFormat::Json => serde_json::to_string_pretty(self)
                .map_err(|e| ToolboxError::Serialization(e.to_string()))?,
            ConfigFormat::Toml => toml::to_string_pretty(self)
                .map_err(|e| ToolboxError::Serialization(e.to_string()))?,
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    ToolboxError::Config(format!("Failed to create config directory: {}", e))
                })?;
            }
        }

        std::fs::write(path, content)
            .map_err(|e| ToolboxError::Config(format!("Failed to write config file: {}", e)))
    }

    pub fn task(&self, id: &str) -> Option<&TaskConfig> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Effective input-port settings for task `id`.
    pub fn port_settings_for(&self, id: &str) -> PortSettings {
        self.task(id)
            .and_then(|t| t.port_settings)
            .unwrap_or(self.defaults)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ToolboxConfig::default();
        assert_eq!(config.defaults, PortSettings::default());
        assert_eq!(config.run_seconds, DEFAULT_RUN_SECONDS);
        assert_eq!(config.logging.filter, DEFAULT_LOG_FILTER);
        assert!(config.tasks.is_empty());
    }

    #[test]
    fn test_parse_toml_with_overrides() {
        let content = r#"
            run_seconds = 2

            [defaults]
            buffer_size = 128

            [[tasks]]
            id = "sink"
            disabled = true
            port_settings = { buffer_size = 4, lossless = true }
        "#;
        let config = ToolboxConfig::parse(content, ConfigFormat::Toml).unwrap();
        assert_eq!(config.run_seconds, 2);
        assert_eq!(config.defaults.buffer_size, 128);
        assert!(!config.defaults.lossless);

        let sink = config.task("sink").unwrap();
        assert!(sink.disabled);
        assert_eq!(
            config.port_settings_for("sink"),
            PortSettings::bounded(4).with_lossless(true)
        );
        assert_eq!(config.port_settings_for("other").buffer_size, 128);
    }

    #[test]
    fn test_save_load_json_and_toml() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = ToolboxConfig::default();
        config.tasks.push(TaskConfig::new("generator"));
        config.demo.select_channels = vec![1];

        for name in ["nested/toolbox.json", "toolbox.toml"] {
            let path = dir.path().join(name);
            config.save(&path).unwrap();
            let loaded = ToolboxConfig::load(&path).unwrap();
            assert_eq!(loaded, config, "format of {}", name);
        }
    }

    #[test]
    fn test_unknown_extension_rejected() {
        let err = ToolboxConfig::load("toolbox.yaml").unwrap_err();
        assert!(err.to_string().contains("Unsupported config file extension"));
    }

    #[test]
    fn test_load_or_default_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert_eq!(ToolboxConfig::load_or_default(&path), ToolboxConfig::default());
        assert_eq!(
            ToolboxConfig::load_or_default(dir.path().join("missing.toml")),
            ToolboxConfig::default()
        );
    }
}
