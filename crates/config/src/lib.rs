//! Audioshelf Configuration System
//!
//! Settings live in a single TOML file under the platform config directory.
//! Each section implements [`ConfigSection`] and reports its bad values by
//! their dotted TOML path.
//!
//! - **Graceful degradation**: a missing file means defaults; invalid values
//!   are reported but kept so the user can fix them
//! - **Atomic writes**: config files are never left half-written
//!
//! # Example
//!
//! ```rust,no_run
//! use audioshelf_config::{Config, ConfigManager};
//!
//! let manager = ConfigManager::new().expect("Failed to initialize config");
//! let config = manager.load().unwrap_or_else(|e| {
//!     eprintln!("Config error: {}, using defaults", e);
//!     Config::default()
//! });
//!
//! println!("Chapter languages: {:?}", config.library.preferred_chapter_languages);
//! ```

mod error;
mod file;
mod manager;
mod validation;

// Config sections
mod app_config;
mod library_config;
mod playback_config;

pub use error::{ConfigError, ConfigResult};
pub use manager::ConfigManager;
pub use validation::{ConfigSection, ValidationError};

pub use app_config::{AppConfig, LogLevel};
pub use library_config::LibraryConfig;
pub use playback_config::PlaybackConfig;

use serde::{Deserialize, Serialize};

/// Current config file format version
pub const CONFIG_VERSION: u32 = 1;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Config file format version
    pub version: u32,

    /// Application-level settings
    pub app: AppConfig,

    /// Library settings
    pub library: LibraryConfig,

    /// Playback state and defaults
    pub playback: PlaybackConfig,
}

impl ConfigSection for Config {
    fn check(&self, errors: &mut Vec<ValidationError>) {
        self.app.check(errors);
        self.library.check(errors);
        self.playback.check(errors);
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            app: AppConfig::default(),
            library: LibraryConfig::default(),
            playback: PlaybackConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.version, CONFIG_VERSION);
    }

    #[test]
    fn test_errors_collected_across_sections() {
        let mut config = Config::default();
        config.app.database_path = std::path::PathBuf::new();
        config.playback.default_speed = 0.0;

        assert_eq!(config.validate().unwrap_err().len(), 2);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: Config = toml::from_str("[library]\npreferred_chapter_languages = [\"fr\"]\n")
            .expect("Should parse");

        assert_eq!(config.library.preferred_chapter_languages, vec!["fr"]);
        assert_eq!(config.app, AppConfig::default());
        assert_eq!(config.version, CONFIG_VERSION);
    }
}
