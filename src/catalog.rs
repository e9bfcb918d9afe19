//! In-memory model of an Xcode String Catalog (`.xcstrings`).
//!
//! Only the plain `stringUnit` form of a localization is modeled. Plural,
//! device-variant and substitution forms are kept as raw JSON so they can be
//! written back exactly as they were read.

use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::ser::Formatter;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::io;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog {path}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse catalog JSON")]
    Parse(#[source] serde_json::Error),

    #[error("failed to serialize catalog JSON")]
    Serialize(#[source] serde_json::Error),
}

/// The full localization document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Catalog {
    pub source_language: String,

    #[serde(default)]
    pub strings: BTreeMap<String, LocalizationGroup>,

    /// Top-level fields we do not model (such as `version`), carried through
    /// untouched whatever their JSON type.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// All localizations of a single key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalizationGroup {
    /// Developer comment, sent to the model as translation context
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,

    /// `Some(false)` means the key is copied verbatim into every language
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub should_translate: Option<bool>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub localizations: BTreeMap<String, LocalizationUnit>,

    /// e.g. `extractionState`
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A language-specific translation record.
///
/// Only [`LocalizationUnit::Plain`] carries translatable text. Everything
/// else (plural variations, device variations, substitutions, states we do
/// not know) is [`LocalizationUnit::Unsupported`] and passes through as-is.
#[derive(Debug, Clone, PartialEq)]
pub enum LocalizationUnit {
    Plain(StringUnit),
    Unsupported(Value),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StringUnit {
    pub state: TranslationState,
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TranslationState {
    Translated,
    Error,
    New,
    NeedsReview,
    Stale,
}

impl Catalog {
    /// Parse a catalog from its JSON text.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        serde_json::from_str(json).map_err(CatalogError::Parse)
    }

    /// Read and parse a catalog file.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&content)
    }

    /// Serialize the catalog the way Xcode writes it: keys sorted at every
    /// level, two-space indent, `" : "` between key and value, unescaped
    /// slashes and a trailing newline.
    pub fn to_pretty_json(&self) -> Result<Vec<u8>, CatalogError> {
        let value = serde_json::to_value(self).map_err(CatalogError::Serialize)?;
        let value = sort_keys(value);

        let mut out = Vec::new();
        let mut serializer = serde_json::Serializer::with_formatter(&mut out, XcodeFormatter::new());
        value
            .serialize(&mut serializer)
            .map_err(CatalogError::Serialize)?;
        out.push(b'\n');
        Ok(out)
    }
}

impl LocalizationGroup {
    pub fn unit(&self, language: &str) -> Option<&LocalizationUnit> {
        self.localizations.get(language)
    }

    /// The plain string value for `language`, if one exists.
    pub fn plain_value(&self, language: &str) -> Option<&str> {
        self.unit(language)
            .and_then(LocalizationUnit::string_unit)
            .map(|unit| unit.value.as_str())
    }

    pub fn set_unit(&mut self, language: &str, unit: LocalizationUnit) {
        self.localizations.insert(language.to_string(), unit);
    }

    pub fn should_translate(&self) -> bool {
        self.should_translate != Some(false)
    }
}

impl LocalizationUnit {
    pub fn translated(value: impl Into<String>) -> Self {
        Self::Plain(StringUnit {
            state: TranslationState::Translated,
            value: value.into(),
        })
    }

    pub fn failed(value: impl Into<String>) -> Self {
        Self::Plain(StringUnit {
            state: TranslationState::Error,
            value: value.into(),
        })
    }

    pub fn string_unit(&self) -> Option<&StringUnit> {
        match self {
            Self::Plain(unit) => Some(unit),
            Self::Unsupported(_) => None,
        }
    }

    /// True for the plain `stringUnit` form.
    pub fn is_supported_format(&self) -> bool {
        matches!(self, Self::Plain(_))
    }

    /// True if a non-empty value in state `translated` exists.
    pub fn has_translation(&self) -> bool {
        self.string_unit().is_some_and(|unit| {
            unit.state == TranslationState::Translated && !unit.value.is_empty()
        })
    }

    fn from_value(value: Value) -> Self {
        if let Value::Object(map) = &value {
            if map.len() == 1 {
                if let Some(Ok(unit)) = map.get("stringUnit").map(StringUnit::deserialize) {
                    return Self::Plain(unit);
                }
            }
        }
        Self::Unsupported(value)
    }
}

impl Serialize for LocalizationUnit {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Plain(unit) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("stringUnit", unit)?;
                map.end()
            }
            Self::Unsupported(raw) => raw.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for LocalizationUnit {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Self::from_value)
    }
}

/// Rebuild every object with its keys in sorted order, regardless of how the
/// map type underneath orders them.
fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(key, value)| (key, sort_keys(value)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}

/// Pretty printer matching Xcode's `.xcstrings` output.
struct XcodeFormatter {
    depth: usize,
    has_value: bool,
}

impl XcodeFormatter {
    const INDENT: &'static [u8] = b"  ";

    fn new() -> Self {
        Self {
            depth: 0,
            has_value: false,
        }
    }

    fn indent<W: ?Sized + io::Write>(&self, writer: &mut W) -> io::Result<()> {
        for _ in 0..self.depth {
            writer.write_all(Self::INDENT)?;
        }
        Ok(())
    }

    fn open<W: ?Sized + io::Write>(&mut self, writer: &mut W, bracket: &[u8]) -> io::Result<()> {
        self.depth += 1;
        self.has_value = false;
        writer.write_all(bracket)
    }

    fn close<W: ?Sized + io::Write>(&mut self, writer: &mut W, bracket: &[u8]) -> io::Result<()> {
        self.depth -= 1;
        if self.has_value {
            writer.write_all(b"\n")?;
            self.indent(writer)?;
        }
        writer.write_all(bracket)
    }

    fn item<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        writer.write_all(if first { b"\n".as_slice() } else { b",\n".as_slice() })?;
        self.indent(writer)
    }
}

impl Formatter for XcodeFormatter {
    fn begin_array<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.open(writer, b"[")
    }

    fn end_array<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.close(writer, b"]")
    }

    fn begin_array_value<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        self.item(writer, first)
    }

    fn end_array_value<W: ?Sized + io::Write>(&mut self, _writer: &mut W) -> io::Result<()> {
        self.has_value = true;
        Ok(())
    }

    fn begin_object<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.open(writer, b"{")
    }

    fn end_object<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.close(writer, b"}")
    }

    fn begin_object_key<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        self.item(writer, first)
    }

    fn begin_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        writer.write_all(b" : ")
    }

    fn end_object_value<W: ?Sized + io::Write>(&mut self, _writer: &mut W) -> io::Result<()> {
        self.has_value = true;
        Ok(())
    }
}
