//! Note corpus model.
//!
//! # Responsibility
//! - Hold the flat `key -> content` mapping that the tree and index derive from.
//! - Decode the fetch/import wire formats without failing on non-text values.
//!
//! # Invariants
//! - Keys are unique (map semantics); iteration order is byte order of keys.
//! - A non-text value is kept as `NoteContent::Malformed`, never dropped.

use serde_json::Value;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Separator between path segments of a note key.
pub const KEY_SEPARATOR: char = '/';

/// Content stored under one note key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteContent {
    /// Markdown or plain text body.
    Text(String),
    /// Value that is not text. Viewable in the tree, excluded from search.
    Malformed {
        /// Short shape label such as `number`, `object` or `blob`.
        kind: &'static str,
    },
}

impl NoteContent {
    /// Maps one JSON value to note content.
    pub fn from_json_value(value: Value) -> Self {
        match value {
            Value::String(text) => Self::Text(text),
            Value::Null => Self::Malformed { kind: "null" },
            Value::Bool(_) => Self::Malformed { kind: "bool" },
            Value::Number(_) => Self::Malformed { kind: "number" },
            Value::Array(_) => Self::Malformed { kind: "array" },
            Value::Object(_) => Self::Malformed { kind: "object" },
        }
    }

    /// Returns the text body, or `None` for malformed content.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text.as_str()),
            Self::Malformed { .. } => None,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Self::Text(_))
    }
}

impl From<String> for NoteContent {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for NoteContent {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// Errors while decoding corpus or import payloads.
#[derive(Debug)]
pub enum CorpusDecodeError {
    /// Payload is not valid JSON.
    Json(serde_json::Error),
    /// Top-level JSON value is not an object.
    NotAnObject(&'static str),
    /// Import payload carries a non-string value.
    NonTextValue { key: String, kind: &'static str },
}

impl Display for CorpusDecodeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json(err) => write!(f, "invalid notes payload: {err}"),
            Self::NotAnObject(kind) => {
                write!(f, "notes payload must be a JSON object, got {kind}")
            }
            Self::NonTextValue { key, kind } => {
                write!(f, "import value for `{key}` must be text, got {kind}")
            }
        }
    }
}

impl Error for CorpusDecodeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Json(err) => Some(err),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for CorpusDecodeError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

/// Full in-memory mapping of note path keys to content.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Corpus {
    notes: BTreeMap<String, NoteContent>,
}

impl Corpus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes a fetch response: a JSON object of key to value.
    ///
    /// Non-string values are kept as malformed content so a single bad note
    /// never fails the whole fetch.
    pub fn from_json(payload: &str) -> Result<Self, CorpusDecodeError> {
        let value: Value = serde_json::from_str(payload)?;
        match value {
            Value::Object(entries) => Ok(entries
                .into_iter()
                .map(|(key, value)| (key, NoteContent::from_json_value(value)))
                .collect()),
            other => Err(CorpusDecodeError::NotAnObject(json_kind(&other))),
        }
    }

    /// Inserts or replaces one note and returns the previous content.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        content: impl Into<NoteContent>,
    ) -> Option<NoteContent> {
        self.notes.insert(key.into(), content.into())
    }

    pub fn get(&self, key: &str) -> Option<&NoteContent> {
        self.notes.get(key)
    }

    /// Like [`Corpus::get`], but also borrows the stored key.
    pub fn get_key_value(&self, key: &str) -> Option<(&str, &NoteContent)> {
        self.notes
            .get_key_value(key)
            .map(|(key, content)| (key.as_str(), content))
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.notes.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Keys in byte order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.notes.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &NoteContent)> {
        self.notes.iter().map(|(key, content)| (key.as_str(), content))
    }

    /// Number of notes whose content is not text.
    pub fn malformed_count(&self) -> usize {
        self.notes.values().filter(|content| !content.is_text()).count()
    }

    /// Keys with a zero-length path segment (leading, trailing or doubled `/`).
    pub fn keys_with_empty_segments(&self) -> Vec<&str> {
        self.keys().filter(|key| has_empty_segment(key)).collect()
    }
}

impl FromIterator<(String, NoteContent)> for Corpus {
    fn from_iter<T: IntoIterator<Item = (String, NoteContent)>>(iter: T) -> Self {
        Self {
            notes: iter.into_iter().collect(),
        }
    }
}

impl From<BTreeMap<String, String>> for Corpus {
    fn from(value: BTreeMap<String, String>) -> Self {
        value
            .into_iter()
            .map(|(key, text)| (key, NoteContent::Text(text)))
            .collect()
    }
}

/// Decodes an import request body: a JSON object of relative path to text.
///
/// Unlike [`Corpus::from_json`], non-text values are rejected because the
/// import side owns the files and can always send text.
pub fn parse_import_payload(payload: &str) -> Result<BTreeMap<String, String>, CorpusDecodeError> {
    let entries = match serde_json::from_str::<Value>(payload)? {
        Value::Object(entries) => entries,
        other => return Err(CorpusDecodeError::NotAnObject(json_kind(&other))),
    };

    let mut files = BTreeMap::new();
    for (key, value) in entries {
        match value {
            Value::String(text) => {
                files.insert(key, text);
            }
            other => {
                return Err(CorpusDecodeError::NonTextValue {
                    key,
                    kind: json_kind(&other),
                })
            }
        }
    }
    Ok(files)
}

/// Returns whether `key` contains a zero-length segment.
pub fn has_empty_segment(key: &str) -> bool {
    key.split(KEY_SEPARATOR).any(str::is_empty)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
