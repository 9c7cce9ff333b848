use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A selectable UI language.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LangType {
    pub code: String,
    pub language: String,
}

impl LangType {
    pub fn new(code: &str, language: &str) -> Self {
        Self { code: code.to_string(), language: language.to_string() }
    }
}

/// A single translated string as returned by the translation API.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationEntry {
    pub string_id: u64,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub translation_id: Option<u64>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// One element of a translation set. `Error` is the sentinel stored when a fetch fails or
/// returns nothing; it serializes as the literal string `"error"`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Translation {
    Entry(TranslationEntry),
    Error(ErrorMarker),
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorMarker {
    Error,
}

/// The translations currently held for the translated language.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Translations(Vec<Translation>);

impl Translations {
    pub fn new(entries: Vec<TranslationEntry>) -> Self {
        Self(entries.into_iter().map(Translation::Entry).collect())
    }

    /// The single-element `["error"]` sentinel.
    pub fn error() -> Self {
        Self(vec![Translation::Error(ErrorMarker::Error)])
    }

    pub fn is_error(&self) -> bool {
        matches!(self.0.as_slice(), [Translation::Error(_)])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Translation> {
        self.0.iter()
    }

    pub fn entries(&self) -> impl Iterator<Item = &TranslationEntry> {
        self.0.iter().filter_map(|t| match t {
            Translation::Entry(entry) => Some(entry),
            Translation::Error(_) => None,
        })
    }

    /// Text of the entry with the given string id, if any.
    pub fn text_for(&self, string_id: u64) -> Option<&str> {
        self.entries()
            .find(|entry| entry.string_id == string_id)
            .and_then(|entry| entry.text.as_deref())
    }
}
