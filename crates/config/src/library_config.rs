//! Library configuration section

use crate::validation::{ConfigSection, ValidationError};
use serde::{Deserialize, Serialize};

/// Library settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LibraryConfig {
    /// Languages tried in order when picking a chapter name
    pub preferred_chapter_languages: Vec<String>,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            preferred_chapter_languages: vec!["en".to_string()],
        }
    }
}

impl LibraryConfig {
    /// Parses a comma separated language list such as `"de, en"`
    pub fn parse_languages(list: &str) -> Vec<String> {
        list.split(',')
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect()
    }
}

impl ConfigSection for LibraryConfig {
    fn check(&self, errors: &mut Vec<ValidationError>) {
        let languages = &self.preferred_chapter_languages;
        for (i, language) in languages.iter().enumerate() {
            let field = format!("library.preferred_chapter_languages[{}]", i);
            if language.trim().is_empty() {
                errors.push(ValidationError::new(field, "is blank"));
            } else if languages[..i].contains(language) {
                errors.push(ValidationError::new(field, format!("repeats '{}'", language)));
            }
        }
    }
}
