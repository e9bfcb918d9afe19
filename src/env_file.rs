//! Settings file (`.env` style) reader.
//!
//! The file is parsed with `dotenvy` but never loaded into the process
//! environment; the values only feed [`crate::config::Config::resolve`].

use crate::config::ConfigError;
use std::path::Path;

/// Values read from the settings file. Every field is optional; the config
/// resolver decides what is required.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    pub languages: Option<String>,
    pub openai_api_key: Option<String>,
    pub openai_host: Option<String>,
    pub model: Option<String>,
    pub concurrency: Option<String>,
}

impl Settings {
    /// Read settings from `path`. A missing file yields empty settings.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let iter = match dotenvy::from_path_iter(path) {
            Ok(iter) => iter,
            Err(e) if e.not_found() => return Ok(Self::default()),
            Err(e) => return Err(settings_error(path, e)),
        };

        let mut pairs = Vec::new();
        for item in iter {
            pairs.push(item.map_err(|e| settings_error(path, e))?);
        }
        Ok(Self::from_pairs(pairs))
    }

    /// Build settings from already parsed key/value pairs. Unknown keys are
    /// ignored; a later duplicate wins.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut settings = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "LANGUAGES" => &mut settings.languages,
                "OPENAI_API_KEY" => &mut settings.openai_api_key,
                "OPENAI_HOST" => &mut settings.openai_host,
                "MODEL" => &mut settings.model,
                "CONCURRENCY" => &mut settings.concurrency,
                _ => continue,
            };
            *slot = Some(value);
        }
        settings
    }
}

fn settings_error(path: &Path, error: dotenvy::Error) -> ConfigError {
    ConfigError::SettingsFile {
        path: path.display().to_string(),
        message: error.to_string(),
    }
}
