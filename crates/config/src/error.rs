use crate::validation::ValidationError;
use std::path::PathBuf;
use thiserror::Error;

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Failures reading or writing `config.toml`
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The file exists but holds nothing, usually a truncated write
    #[error("{path} is empty")]
    Empty { path: PathBuf },

    #[error("{path} is not a valid config: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// Creating the directory, the backup or the replacement file failed
    #[error("Cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Cannot serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// Save refused; the file on disk is unchanged
    #[error("Invalid config: {}", join(.0))]
    Invalid(Vec<ValidationError>),

    #[error("This platform has no config directory; pass one explicitly")]
    NoConfigDir,
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ValidationError::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_lists_every_field() {
        let err = ConfigError::Invalid(vec![
            ValidationError::new("app.database_path", "is empty"),
            ValidationError::new("playback.default_speed", "9 is outside 0.5..=3"),
        ]);
        assert_eq!(
            err.to_string(),
            "Invalid config: app.database_path is empty; playback.default_speed 9 is outside 0.5..=3"
        );
    }
}
