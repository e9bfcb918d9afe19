//! Batch translation of a catalog.
//!
//! Keys are processed in fixed-size batches. Every key in a batch becomes
//! one task that walks the requested languages in order; the tasks of a
//! batch run concurrently and the batch finishes before the next one starts.
//! Each task works on its own copy of the key's group, and the coordinating
//! loop merges the groups back into the catalog as tasks complete.

use crate::catalog::{Catalog, LocalizationGroup, LocalizationUnit};
use crate::config::Config;
use crate::openai::{Translate, TranslationRequest};
use crate::validator::TranslationValidator;
use anyhow::Result;
use futures::stream::{FuturesUnordered, StreamExt};
use std::fmt;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Target languages, translated in this order for every key
    pub languages: Vec<String>,
    /// Number of keys in flight at once
    pub batch_size: usize,
    /// Re-translate units that already hold a translation
    pub force: bool,
}

impl BatchOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            languages: config.languages.clone(),
            batch_size: config.concurrency,
            force: config.force,
        }
    }
}

/// What happened to a single (key, language) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Translated,
    Failed,
    Skipped,
    Unsupported,
    Verbatim,
}

/// Counts of pair outcomes for a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TranslationSummary {
    /// Translated by the remote model
    pub translated: usize,
    /// Remote call failed, stored with state `error`
    pub failed: usize,
    /// Already translated and left alone
    pub skipped: usize,
    /// Plural/device-variant units passed through
    pub unsupported: usize,
    /// Copied without a remote call
    pub verbatim: usize,
}

impl TranslationSummary {
    fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Translated => self.translated += 1,
            Outcome::Failed => self.failed += 1,
            Outcome::Skipped => self.skipped += 1,
            Outcome::Unsupported => self.unsupported += 1,
            Outcome::Verbatim => self.verbatim += 1,
        }
    }

    fn merge(&mut self, other: &TranslationSummary) {
        self.translated += other.translated;
        self.failed += other.failed;
        self.skipped += other.skipped;
        self.unsupported += other.unsupported;
        self.verbatim += other.verbatim;
    }

    /// Number of units written during the run.
    pub fn changed(&self) -> usize {
        self.translated + self.failed + self.verbatim
    }
}

impl fmt::Display for TranslationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} translated, {} failed, {} copied, {} already done, {} unsupported",
            self.translated, self.failed, self.verbatim, self.skipped, self.unsupported
        )
    }
}

/// Completed-work accumulator used for progress reporting.
#[derive(Debug, Clone)]
pub struct Progress {
    total: usize,
    completed: usize,
    reported_decile: usize,
}

impl Progress {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            completed: 0,
            reported_decile: 0,
        }
    }

    /// Record `items` finished work items. Returns the completed percentage
    /// when this call crossed a new 10% threshold.
    pub fn advance(&mut self, items: usize) -> Option<usize> {
        if self.total == 0 {
            return None;
        }
        self.completed = (self.completed + items).min(self.total);

        let percent = self.completed * 100 / self.total;
        let decile = percent / 10;
        if decile > self.reported_decile {
            self.reported_decile = decile;
            Some(percent)
        } else {
            None
        }
    }

    pub fn completed(&self) -> usize {
        self.completed
    }
}

/// True if `text` contains anything worth sending to the model.
///
/// Strings made only of format placeholders, whitespace, symbols,
/// punctuation, digits or control characters are copied as-is.
pub fn has_translatable_text(text: &str) -> bool {
    TranslationValidator::strip_placeholders(text)
        .chars()
        .any(char::is_alphabetic)
}

/// Translate every missing (key, language) pair of `catalog` in place.
///
/// `checkpoint` is called with the catalog after every batch that changed at
/// least one unit; an error from it aborts the run. Failed remote calls do
/// not: the pair is stored with state `error` and the run continues.
pub async fn translate_catalog<T, F>(
    client: &T,
    catalog: &mut Catalog,
    options: &BatchOptions,
    mut checkpoint: F,
) -> Result<TranslationSummary>
where
    T: Translate,
    F: FnMut(&Catalog) -> Result<()>,
{
    let keys: Vec<String> = catalog.strings.keys().cloned().collect();
    let source_language = catalog.source_language.clone();
    let languages_per_key = options.languages.len();
    let batch_size = options.batch_size.max(1);

    let mut progress = Progress::new(keys.len() * languages_per_key);
    let mut summary = TranslationSummary::default();

    info!(
        "Translating {} keys from {} into [{}], {} at a time",
        keys.len(),
        source_language,
        options.languages.join(", "),
        batch_size
    );

    for batch in keys.chunks(batch_size) {
        let mut in_flight: FuturesUnordered<_> = batch
            .iter()
            .filter_map(|key| {
                let group = catalog.strings.get(key)?.clone();
                Some(translate_entry(client, key, group, &source_language, options))
            })
            .collect();

        let mut batch_changes = 0;
        while let Some(entry) = in_flight.next().await {
            batch_changes += entry.summary.changed();
            summary.merge(&entry.summary);
            catalog.strings.insert(entry.key.to_string(), entry.group);

            if let Some(percent) = progress.advance(languages_per_key) {
                info!("Progress: {}% ({}/{})", percent, progress.completed(), progress.total);
            }
        }

        if batch_changes > 0 {
            checkpoint(catalog)?;
        }
    }

    info!("Translation finished: {}", summary);
    Ok(summary)
}

struct EntryResult<'k> {
    key: &'k str,
    group: LocalizationGroup,
    summary: TranslationSummary,
}

/// Translate one key into every requested language, one language at a time.
async fn translate_entry<'k, T: Translate>(
    client: &T,
    key: &'k str,
    mut group: LocalizationGroup,
    source_language: &str,
    options: &BatchOptions,
) -> EntryResult<'k> {
    let mut summary = TranslationSummary::default();
    for language in &options.languages {
        let outcome =
            translate_unit(client, key, &mut group, source_language, language, options.force).await;
        summary.record(outcome);
    }
    EntryResult {
        key,
        group,
        summary,
    }
}

async fn translate_unit<T: Translate>(
    client: &T,
    key: &str,
    group: &mut LocalizationGroup,
    source_language: &str,
    language: &str,
    force: bool,
) -> Outcome {
    if let Some(unit) = group.unit(language) {
        if unit.has_translation() && !force {
            return Outcome::Skipped;
        }
        if !unit.is_supported_format() {
            warn!("Skipping {:?} ({}): plural and device variations are not supported", key, language);
            return Outcome::Unsupported;
        }
    }

    // A plural source has no single text to translate
    if group
        .unit(source_language)
        .is_some_and(|unit| !unit.is_supported_format())
    {
        warn!(
            "Skipping {:?} ({}): source language uses plural or device variations",
            key, language
        );
        return Outcome::Unsupported;
    }

    let source_text = group.plain_value(source_language).unwrap_or(key).to_string();

    if !group.should_translate() {
        group.set_unit(language, LocalizationUnit::translated(key));
        return Outcome::Verbatim;
    }

    if language == source_language || !has_translatable_text(&source_text) {
        group.set_unit(language, LocalizationUnit::translated(source_text));
        return Outcome::Verbatim;
    }

    let request = TranslationRequest {
        text: &source_text,
        source_language,
        target_language: language,
        context: group.comment.as_deref(),
    };
    let result = client.translate(request).await;

    match result {
        Ok(translated) => {
            debug!("[{}] {:?} -> {:?}", language, source_text, translated);
            group.set_unit(language, LocalizationUnit::translated(translated));
            Outcome::Translated
        }
        Err(e) => {
            warn!("Failed to translate {:?} to {}", key, language);
            debug!("Translation error for {:?} ({}): {:#}", key, language, e);
            group.set_unit(language, LocalizationUnit::failed(source_text));
            Outcome::Failed
        }
    }
}
