//! Playback configuration section

use crate::validation::{ConfigSection, ValidationError};
use audioshelf_core::BookId;
use serde::{Deserialize, Serialize};

/// Playback state that outlives a session
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Book the player resumes with; unset until something is played
    pub current_book_id: Option<BookId>,

    /// Playback speed for newly added books
    pub default_speed: f32,
}

impl PlaybackConfig {
    pub const SPEEDS: std::ops::RangeInclusive<f32> = 0.5..=3.0;
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            current_book_id: None,
            default_speed: 1.0,
        }
    }
}

impl ConfigSection for PlaybackConfig {
    fn check(&self, errors: &mut Vec<ValidationError>) {
        if !Self::SPEEDS.contains(&self.default_speed) {
            errors.push(ValidationError::new(
                "playback.default_speed",
                format!(
                    "{} is outside {}..={}",
                    self.default_speed,
                    Self::SPEEDS.start(),
                    Self::SPEEDS.end()
                ),
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = PlaybackConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.current_book_id.is_none());
    }

    #[test]
    fn test_invalid_speed() {
        let config = PlaybackConfig {
            default_speed: 4.0,
            ..Default::default()
        };
        let errors = config.validate().unwrap_err();
        assert_eq!(errors[0].to_string(), "playback.default_speed 4 is outside 0.5..=3");
    }

    #[test]
    fn test_current_book_id_round_trips_through_toml() {
        let id = BookId::new();
        let config = PlaybackConfig {
            current_book_id: Some(id),
            ..Default::default()
        };

        let text = toml::to_string(&config).unwrap();
        assert!(text.contains(&id.to_string()));

        let parsed: PlaybackConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.current_book_id, Some(id));
    }
}
