//! Shell configuration.
//!
//! Every section is `#[serde(default)]`, so a config file only needs the
//! keys it changes.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Editor component settings
    pub editor: EditorConfig,

    /// Tab strip settings
    pub tabs: TabsConfig,

    /// Line export settings
    pub export: ExportSection,

    /// Keyboard settings
    pub keyboard: KeyboardConfig,
}

impl Config {
    /// Loads config from the default location.
    pub fn load() -> Self {
        match Self::load_from_default_path() {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Using default config: {}", e);
                Self::default()
            }
        }
    }

    /// Loads config from a file.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Loads from the default config path.
    fn load_from_default_path() -> Result<Self, ConfigError> {
        let path = Self::default_path()?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Returns the default config file path.
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("vslite").join("config.toml"))
    }

    /// Saves the config to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(Self::default_path()?)
    }

    /// Saves the config to a file, creating parent directories.
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

/// Editor component configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// How long a bind waits for the editor component to load
    pub ready_timeout_ms: u64,

    /// Undo history limit of the embedded editor
    pub undo_limit: usize,
}

impl EditorConfig {
    pub fn ready_timeout(&self) -> Duration {
        Duration::from_millis(self.ready_timeout_ms)
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            ready_timeout_ms: 10_000,
            undo_limit: 1000,
        }
    }
}

/// Tab strip configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TabsConfig {
    /// Show a close button on the Welcome tab
    pub welcome_closable: bool,

    /// Prefix shown on tabs with unsaved changes
    pub modified_marker: String,
}

impl Default for TabsConfig {
    fn default() -> Self {
        Self {
            welcome_closable: true,
            modified_marker: "●".to_string(),
        }
    }
}

/// Line export configuration as stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSection {
    /// 1-based line that triggers an export; 0 disables
    pub trigger_line: usize,

    /// Folder for generated export files
    pub save_path: Option<PathBuf>,

    /// File every export appends to
    pub target_file: Option<PathBuf>,

    /// Heading written at the top of new export files
    pub header_title: String,
}

impl Default for ExportSection {
    fn default() -> Self {
        Self {
            trigger_line: 0,
            save_path: None,
            target_file: None,
            header_title: "Saved Content".to_string(),
        }
    }
}

/// Keyboard configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyboardConfig {
    /// Custom key bindings, e.g. `"ctrl+shift+s" = "file.save"`
    pub bindings: HashMap<String, String>,
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config directory not found")]
    NoConfigDir,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.editor.ready_timeout(), Duration::from_secs(10));
        assert!(config.tabs.welcome_closable);
        assert_eq!(config.tabs.modified_marker, "●");
        assert_eq!(config.export.trigger_line, 0);
        assert_eq!(config.export.header_title, "Saved Content");
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            [export]
            trigger_line = 5
            save_path = "/tmp/notes"

            [keyboard.bindings]
            "ctrl+shift+s" = "file.save"
            "#,
        )
        .unwrap();

        assert_eq!(config.export.trigger_line, 5);
        assert_eq!(config.export.save_path, Some(PathBuf::from("/tmp/notes")));
        assert_eq!(config.export.header_title, "Saved Content");
        assert_eq!(config.editor.ready_timeout_ms, 10_000);
        assert_eq!(config.keyboard.bindings.len(), 1);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.tabs.welcome_closable = false;
        config.export.trigger_line = 3;
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert!(!loaded.tabs.welcome_closable);
        assert_eq!(loaded.export.trigger_line, 3);
    }

    #[test]
    fn test_bad_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[export]\ntrigger_line = \"five\"").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::Parse(_))
        ));
    }
}
