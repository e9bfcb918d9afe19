//! Translation quality validation.
//!
//! Checks that format placeholders and URLs survive translation. The model
//! is instructed to keep them verbatim; this module only reports when it did
//! not, it never rejects a translation.

use regex::Regex;
use std::borrow::Cow;
use std::sync::OnceLock;

/// Validation report containing warnings about a translation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// Validator for translation quality.
pub struct TranslationValidator;

static PLACEHOLDER_REGEX: OnceLock<Regex> = OnceLock::new();
static URL_REGEX: OnceLock<Regex> = OnceLock::new();

impl TranslationValidator {
    /// Compare the placeholders and URLs of `original` and `translated`.
    ///
    /// Placeholders are compared as multisets because positional specifiers
    /// (`%1$@`, `%2$@`) may legitimately be reordered.
    pub fn validate(original: &str, translated: &str) -> ValidationReport {
        let mut report = ValidationReport::default();

        let mut orig_placeholders = Self::extract_placeholders(original);
        let mut trans_placeholders = Self::extract_placeholders(translated);
        orig_placeholders.sort();
        trans_placeholders.sort();
        if orig_placeholders != trans_placeholders {
            report.warnings.push(format!(
                "Placeholder mismatch: original has {:?}, translation has {:?}",
                orig_placeholders, trans_placeholders
            ));
        }

        let orig_urls = Self::extract_urls(original);
        let trans_urls = Self::extract_urls(translated);
        if orig_urls != trans_urls {
            report.warnings.push(format!(
                "URL mismatch: original has {} URLs, translation has {} URLs",
                orig_urls.len(),
                trans_urls.len()
            ));
        }

        report
    }

    /// Remove every printf-style format specifier from `text`.
    pub fn strip_placeholders(text: &str) -> Cow<'_, str> {
        Self::placeholder_regex().replace_all(text, "")
    }

    /// Matches printf-style format specifiers (`%@`, `%d`, `%lld`, `%1$@`,
    /// `%.2f`, `%%`, ...)
    fn placeholder_regex() -> &'static Regex {
        PLACEHOLDER_REGEX.get_or_init(|| {
            Regex::new(
                r"%(?:\d+\$)?[-+ #0]*(?:\d+|\*)?(?:\.(?:\d+|\*))?(?:hh|h|ll|l|q|L|z|t|j)?[@dDiuUxXoOfFeEgGcCsSpaA%]",
            )
            .unwrap()
        })
    }

    fn extract_placeholders(text: &str) -> Vec<String> {
        Self::placeholder_regex()
            .find_iter(text)
            .map(|m| m.as_str().to_string())
            .collect()
    }

    /// Extract all URLs from text
    fn extract_urls(text: &str) -> Vec<String> {
        let regex = URL_REGEX.get_or_init(|| Regex::new(r"https?://[^\s)\]]+").unwrap());

        regex
            .find_iter(text)
            .map(|m| m.as_str().to_string())
            .collect()
    }
}
