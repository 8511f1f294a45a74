//! Settings parser for the mirrorview config.toml
//!
//! All fields carry serde defaults; a missing or unreadable file falls back
//! to the defaults so the sync layer never fails to start over configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use mirrorview_core::prelude::*;

const CONFIG_FILENAME: &str = "config.toml";
const MIRRORVIEW_DIR: &str = "mirrorview";

/// Sync-layer settings (mirrorview/config.toml)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SyncSettings {
    #[serde(default)]
    pub timing: TimingSettings,

    #[serde(default)]
    pub layout: LayoutSettings,
}

/// Timeouts and debounce intervals
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct TimingSettings {
    /// Timeout for value-returning peer invokes (ms)
    #[serde(default = "default_invoke_timeout_ms")]
    pub invoke_timeout_ms: u64,

    /// Timeout for peer creation (ms)
    #[serde(default = "default_create_timeout_ms")]
    pub create_timeout_ms: u64,

    /// Post-layout delay before the trailing intrinsic-size query (ms)
    #[serde(default = "default_intrinsic_size_delay_ms")]
    pub intrinsic_size_delay_ms: u64,
}

impl Default for TimingSettings {
    fn default() -> Self {
        Self {
            invoke_timeout_ms: default_invoke_timeout_ms(),
            create_timeout_ms: default_create_timeout_ms(),
            intrinsic_size_delay_ms: default_intrinsic_size_delay_ms(),
        }
    }
}

fn default_invoke_timeout_ms() -> u64 {
    5000
}

fn default_create_timeout_ms() -> u64 {
    10000
}

fn default_intrinsic_size_delay_ms() -> u64 {
    50
}

/// Placeholder geometry used until the peer answers a size query
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct LayoutSettings {
    #[serde(default = "default_placeholder_width")]
    pub placeholder_width: f64,

    #[serde(default = "default_placeholder_height")]
    pub placeholder_height: f64,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            placeholder_width: default_placeholder_width(),
            placeholder_height: default_placeholder_height(),
        }
    }
}

fn default_placeholder_width() -> f64 {
    320.0
}

fn default_placeholder_height() -> f64 {
    49.0
}

impl TimingSettings {
    pub fn invoke_timeout(&self) -> Duration {
        Duration::from_millis(self.invoke_timeout_ms)
    }

    pub fn create_timeout(&self) -> Duration {
        Duration::from_millis(self.create_timeout_ms)
    }

    pub fn intrinsic_size_delay(&self) -> Duration {
        Duration::from_millis(self.intrinsic_size_delay_ms)
    }
}

impl SyncSettings {
    /// Load settings from the platform config dir, falling back to defaults.
    ///
    /// Missing file is the normal case; an invalid file logs a warning and
    /// also falls back rather than blocking startup.
    pub fn load() -> SyncSettings {
        let Some(path) = Self::default_path() else {
            debug!("No config dir available, using default settings");
            return SyncSettings::default();
        };
        match Self::load_from(&path) {
            Ok(settings) => settings,
            Err(Error::ConfigNotFound { .. }) => {
                debug!("No config file at {:?}, using defaults", path);
                SyncSettings::default()
            }
            Err(e) => {
                warn!("Failed to load config {:?}: {}, using defaults", path, e);
                SyncSettings::default()
            }
        }
    }

    /// Load and parse a specific settings file
    pub fn load_from(path: &Path) -> Result<SyncSettings> {
        if !path.exists() {
            return Err(Error::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| Error::config(format!("parse {:?}: {}", path, e)))
    }

    /// Default location: `<config_dir>/mirrorview/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(MIRRORVIEW_DIR).join(CONFIG_FILENAME))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let settings = SyncSettings::default();
        assert_eq!(settings.timing.invoke_timeout(), Duration::from_secs(5));
        assert_eq!(settings.timing.create_timeout(), Duration::from_secs(10));
        assert_eq!(
            settings.timing.intrinsic_size_delay(),
            Duration::from_millis(50)
        );
        assert_eq!(settings.layout.placeholder_height, 49.0);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "[timing]\ninvoke_timeout_ms = 250").unwrap();

        let settings = SyncSettings::load_from(&path).unwrap();
        assert_eq!(settings.timing.invoke_timeout(), Duration::from_millis(250));
        // Unspecified fields keep their defaults
        assert_eq!(settings.timing.create_timeout(), Duration::from_secs(10));
        assert_eq!(settings.layout.placeholder_width, 320.0);
    }

    #[test]
    fn test_missing_file_is_config_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = SyncSettings::load_from(&dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, Error::ConfigNotFound { .. }));
    }

    #[test]
    fn test_invalid_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "timing = \"not a table\"").unwrap();

        let err = SyncSettings::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("parse"));
    }
}
