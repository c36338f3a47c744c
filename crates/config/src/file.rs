//! `config.toml` on disk
//!
//! A save writes a sibling temp file and renames it over the config, so a
//! crash leaves either the old file or the new one. The old file is also
//! copied to `config.toml.backup` first.

use crate::{Config, ConfigError, ConfigResult, ConfigSection, CONFIG_VERSION};
use std::cmp::Ordering;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

pub(crate) struct ConfigFile {
    path: PathBuf,
}

impl ConfigFile {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn backup_path(&self) -> PathBuf {
        self.path.with_extension("toml.backup")
    }

    /// Reads the config, or the defaults when there is no file yet
    ///
    /// Bad values are logged and kept so they can be fixed by hand. A file
    /// from an older format version is rewritten at the current one.
    pub fn load(&self) -> ConfigResult<Config> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::info!("No config at {}, using defaults", self.path.display());
                return Ok(Config::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        if text.trim().is_empty() {
            return Err(ConfigError::Empty {
                path: self.path.clone(),
            });
        }

        let mut config: Config = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: self.path.clone(),
            source,
        })?;

        match config.version.cmp(&CONFIG_VERSION) {
            Ordering::Less => {
                log::info!(
                    "Upgrading {} from version {} to {}",
                    self.path.display(),
                    config.version,
                    CONFIG_VERSION
                );
                config.version = CONFIG_VERSION;
                self.write(&config)?;
            }
            Ordering::Greater => log::warn!(
                "{} has version {}, newer than {}; reading it anyway",
                self.path.display(),
                config.version,
                CONFIG_VERSION
            ),
            Ordering::Equal => {}
        }

        if let Err(errors) = config.validate() {
            log::warn!("{}", ConfigError::Invalid(errors));
        }

        Ok(config)
    }

    /// Validates `config` and replaces the file with it
    pub fn save(&self, config: &Config) -> ConfigResult<()> {
        config.validate().map_err(ConfigError::Invalid)?;
        self.write(config)
    }

    fn write(&self, config: &Config) -> ConfigResult<()> {
        let text = toml::to_string_pretty(config)?;

        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir).map_err(|e| write_error(dir, e))?;

        if self.path.exists() {
            let backup = self.backup_path();
            fs::copy(&self.path, &backup).map_err(|e| write_error(&backup, e))?;
        }

        let mut temp = NamedTempFile::new_in(dir).map_err(|e| write_error(dir, e))?;
        temp.write_all(text.as_bytes())
            .map_err(|e| write_error(dir, e))?;
        temp.persist(&self.path)
            .map_err(|e| write_error(&self.path, e.error))?;

        log::info!("Saved config to {}", self.path.display());
        Ok(())
    }
}

fn write_error(path: &Path, source: io::Error) -> ConfigError {
    ConfigError::Write {
        path: path.to_path_buf(),
        source,
    }
}
