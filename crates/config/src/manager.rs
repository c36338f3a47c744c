//! Locating, loading and updating `config.toml`

use crate::file::ConfigFile;
use crate::{Config, ConfigError, ConfigResult, ConfigSection, LibraryConfig, LogLevel};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

/// Owns the config directory: `config.toml` and, by default, the library
/// database next to it
pub struct ConfigManager {
    file: ConfigFile,
    config_dir: PathBuf,
}

impl ConfigManager {
    /// Creates a new config manager using the default config directory
    ///
    /// - Linux: `~/.config/audioshelf/`
    /// - macOS: `~/Library/Application Support/audioshelf/`
    /// - Windows: `%APPDATA%\audioshelf\`
    pub fn new() -> ConfigResult<Self> {
        let config_dir = Self::default_config_dir()?;
        Self::with_directory(config_dir)
    }

    /// Creates a config manager with a custom config directory
    pub fn with_directory(config_dir: PathBuf) -> ConfigResult<Self> {
        Ok(Self {
            file: ConfigFile::new(config_dir.join("config.toml")),
            config_dir,
        })
    }

    fn default_config_dir() -> ConfigResult<PathBuf> {
        ProjectDirs::from("", "", "audioshelf")
            .map(|proj_dirs| proj_dirs.config_dir().to_path_buf())
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Returns the config directory path
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn config_path(&self) -> PathBuf {
        self.file.path().to_path_buf()
    }

    /// Database location for `config`, resolved against the config directory
    /// when relative
    pub fn database_path(&self, config: &Config) -> PathBuf {
        if config.app.database_path.is_absolute() {
            config.app.database_path.clone()
        } else {
            self.config_dir.join(&config.app.database_path)
        }
    }

    /// The saved config, or the defaults when nothing is saved yet
    pub fn load(&self) -> ConfigResult<Config> {
        self.file.load()
    }

    /// Loads the configuration, falling back to defaults on any error
    pub fn load_or_default(&self) -> Config {
        match self.load() {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Failed to load config: {}, using defaults", e);
                Config::default()
            }
        }
    }

    /// Validates and atomically saves the configuration
    pub fn save(&self, config: &Config) -> ConfigResult<()> {
        self.file.save(config)
    }

    /// Load, change, save
    ///
    /// This is how the current book is remembered:
    ///
    /// ```rust,no_run
    /// # use audioshelf_config::ConfigManager;
    /// # use audioshelf_core::BookId;
    /// # let manager = ConfigManager::new().unwrap();
    /// let id = BookId::new();
    /// manager
    ///     .update(|config| config.playback.current_book_id = Some(id))
    ///     .expect("Failed to save current book");
    /// ```
    pub fn update<F>(&self, update_fn: F) -> ConfigResult<()>
    where
        F: FnOnce(&mut Config),
    {
        let mut config = self.load()?;
        update_fn(&mut config);
        self.save(&config)
    }

    /// Writes the default config unless a file is already there
    ///
    /// Returns whether a file was written.
    pub fn initialize(&self) -> ConfigResult<bool> {
        if self.file.path().exists() {
            log::info!("Keeping existing config at {}", self.file.path().display());
            return Ok(false);
        }

        self.save(&Config::default())?;
        Ok(true)
    }

    /// Loads the config and applies environment variable overrides
    ///
    /// Variables follow the pattern `AUDIOSHELF_SECTION_FIELD`:
    /// - `AUDIOSHELF_APP_DATABASE_PATH`
    /// - `AUDIOSHELF_APP_LOG_LEVEL`
    /// - `AUDIOSHELF_LIBRARY_PREFERRED_LANGUAGES` (comma separated)
    /// - `AUDIOSHELF_PLAYBACK_DEFAULT_SPEED`
    ///
    /// Unparseable values are logged and ignored. Overrides are never saved.
    pub fn load_with_env_overrides(&self) -> ConfigResult<Config> {
        let mut config = self.load()?;
        apply_env_overrides(&mut config, |key| std::env::var(key).ok());

        if let Err(errors) = config.validate() {
            log::warn!("After env overrides: {}", ConfigError::Invalid(errors));
        }

        Ok(config)
    }
}

fn apply_env_overrides<F>(config: &mut Config, var: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(db_path) = var("AUDIOSHELF_APP_DATABASE_PATH") {
        config.app.database_path = PathBuf::from(db_path);
    }

    if let Some(level) = var("AUDIOSHELF_APP_LOG_LEVEL") {
        match level.parse::<LogLevel>() {
            Ok(level) => config.app.log_level = level,
            Err(e) => log::warn!("Ignoring AUDIOSHELF_APP_LOG_LEVEL: {}", e),
        }
    }

    if let Some(languages) = var("AUDIOSHELF_LIBRARY_PREFERRED_LANGUAGES") {
        config.library.preferred_chapter_languages = LibraryConfig::parse_languages(&languages);
    }

    if let Some(speed) = var("AUDIOSHELF_PLAYBACK_DEFAULT_SPEED") {
        match speed.parse::<f32>() {
            Ok(s) => config.playback.default_speed = s,
            Err(_) => log::warn!("Ignoring AUDIOSHELF_PLAYBACK_DEFAULT_SPEED: {}", speed),
        }
    }
}
