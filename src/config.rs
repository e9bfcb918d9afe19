use crate::env_file::Settings;
use thiserror::Error;

pub const DEFAULT_HOST: &str = "api.openai.com";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_CONCURRENCY: usize = 5;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("no target languages given (use --languages or LANGUAGES)")]
    MissingLanguages,

    #[error("no API key given (use --api-key or OPENAI_API_KEY)")]
    MissingApiKey,

    #[error("invalid concurrency {0:?}: expected a positive integer")]
    InvalidConcurrency(String),

    #[error("failed to read settings file {path}: {message}")]
    SettingsFile { path: String, message: String },
}

/// Values supplied on the command line. Anything left unset falls back to
/// the settings file, then to the built-in defaults.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub languages: Vec<String>,
    pub api_key: Option<String>,
    pub host: Option<String>,
    pub model: Option<String>,
    pub concurrency: Option<usize>,
    pub verbose: bool,
    pub skip_backup: bool,
    pub force: bool,
    pub no_checkpoint: bool,
}

#[derive(Debug, Clone)]
pub struct Config {
    // Translation targets, in processing order
    pub languages: Vec<String>,

    // OpenAI
    pub openai_api_key: String,
    pub openai_host: String,
    pub openai_model: String,

    // Batching
    pub concurrency: usize,

    // Behavior flags
    pub verbose: bool,
    pub skip_backup: bool,
    pub force: bool,
    pub checkpoint: bool,
}

impl Config {
    /// Merge CLI overrides with the settings file. The CLI wins, then the
    /// settings file, then the defaults.
    pub fn resolve(overrides: Overrides, settings: &Settings) -> Result<Self, ConfigError> {
        let languages = if overrides.languages.is_empty() {
            settings
                .languages
                .as_deref()
                .map(parse_languages)
                .unwrap_or_default()
        } else {
            normalize_languages(overrides.languages)
        };
        if languages.is_empty() {
            return Err(ConfigError::MissingLanguages);
        }

        let openai_api_key = pick(overrides.api_key, &settings.openai_api_key)
            .ok_or(ConfigError::MissingApiKey)?;

        let openai_host =
            pick(overrides.host, &settings.openai_host).unwrap_or_else(|| DEFAULT_HOST.to_string());
        let openai_model =
            pick(overrides.model, &settings.model).unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let concurrency = match overrides.concurrency {
            Some(0) => return Err(ConfigError::InvalidConcurrency("0".to_string())),
            Some(n) => n,
            None => match settings.concurrency.as_deref().map(str::trim) {
                Some(raw) if !raw.is_empty() => match raw.parse::<usize>() {
                    Ok(n) if n > 0 => n,
                    _ => return Err(ConfigError::InvalidConcurrency(raw.to_string())),
                },
                _ => DEFAULT_CONCURRENCY,
            },
        };

        Ok(Self {
            languages,
            openai_api_key,
            openai_host,
            openai_model,
            concurrency,
            verbose: overrides.verbose,
            skip_backup: overrides.skip_backup,
            force: overrides.force,
            checkpoint: !overrides.no_checkpoint,
        })
    }

    /// Full chat completions URL. A host without a scheme means https.
    pub fn chat_completions_url(&self) -> String {
        let host = self.openai_host.trim_end_matches('/');
        if host.starts_with("http://") || host.starts_with("https://") {
            format!("{}/v1/chat/completions", host)
        } else {
            format!("https://{}/v1/chat/completions", host)
        }
    }
}

/// Split a comma-separated language list, trimming blanks and duplicates.
pub fn parse_languages(raw: &str) -> Vec<String> {
    normalize_languages(raw.split(',').map(str::to_string))
}

fn normalize_languages<I>(languages: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut out: Vec<String> = Vec::new();
    for lang in languages {
        let lang = lang.trim();
        if !lang.is_empty() && !out.iter().any(|l| l == lang) {
            out.push(lang.to_string());
        }
    }
    out
}

fn pick(cli: Option<String>, file: &Option<String>) -> Option<String> {
    cli.into_iter()
        .chain(file.iter().cloned())
        .map(|v| v.trim().to_string())
        .find(|v| !v.is_empty())
}
