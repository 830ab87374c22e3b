//! Core configuration.
//!
//! # Responsibility
//! - Define the closed set of search index options.
//! - Parse loose option strings (`latin:extra`, `match`, `strict`) into them.
//! - Load and validate the core config document.
//!
//! # Invariants
//! - Unknown option strings are rejected at construction, never ignored.
//! - `search_limit` is always within `1..=MAX_SEARCH_LIMIT` after validation.

use crate::logging::{default_log_level, normalize_level, LoggingError};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Default number of search hits, matching the notes tab.
pub const DEFAULT_SEARCH_LIMIT: usize = 15;
/// Upper bound for caller-provided search limits.
pub const MAX_SEARCH_LIMIT: usize = 500;

/// Character normalization applied before tokenizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaseFolding {
    /// Text is indexed as-is.
    Preserve,
    /// Unicode lowercase.
    Simple,
    /// Lowercase plus folding of Latin diacritics and ligatures.
    #[default]
    ExtendedLatin,
}

impl CaseFolding {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Preserve => "preserve",
            Self::Simple => "latin:default",
            Self::ExtendedLatin => "latin:extra",
        }
    }

    pub fn parse(value: &str) -> Result<Self, IndexConfigError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "preserve" | "exact" => Ok(Self::Preserve),
            "latin:default" | "latin:simple" | "simple" | "lowercase" => Ok(Self::Simple),
            "latin:extra" | "latin:advanced" | "extended_latin" => Ok(Self::ExtendedLatin),
            other => Err(IndexConfigError::new(
                "charset",
                other,
                "preserve|latin:default|latin:extra",
            )),
        }
    }
}

/// Which indexed tokens qualify for one query term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchMode {
    /// Token equals the term.
    Exact,
    /// Token starts with the term.
    Prefix,
    /// Token contains the term anywhere.
    #[default]
    Substring,
}

impl MatchMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Prefix => "forward",
            Self::Substring => "match",
        }
    }

    pub fn parse(value: &str) -> Result<Self, IndexConfigError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "exact" | "default" => Ok(Self::Exact),
            "forward" | "prefix" => Ok(Self::Prefix),
            "match" | "substring" => Ok(Self::Substring),
            other => Err(IndexConfigError::new("preset", other, "exact|forward|match")),
        }
    }
}

/// How text is split into tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tokenization {
    /// Runs of letters, digits and `_`; no fuzzy or phonetic expansion.
    #[default]
    Strict,
    /// Whitespace-separated chunks, punctuation kept.
    Whitespace,
}

impl Tokenization {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::Whitespace => "whitespace",
        }
    }

    pub fn parse(value: &str) -> Result<Self, IndexConfigError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "whitespace" => Ok(Self::Whitespace),
            other => Err(IndexConfigError::new("tokenize", other, "strict|whitespace")),
        }
    }
}

/// Rejected index option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexConfigError {
    pub field: &'static str,
    pub value: String,
    pub expected: &'static str,
}

impl IndexConfigError {
    fn new(field: &'static str, value: &str, expected: &'static str) -> Self {
        Self {
            field,
            value: value.to_string(),
            expected,
        }
    }
}

impl Display for IndexConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "unsupported {} `{}`; expected {}",
            self.field, self.value, self.expected
        )
    }
}

impl Error for IndexConfigError {}

/// Search index options, fixed when an index is constructed.
///
/// Serialized in the loose string form: `{"charset", "preset", "tokenize"}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "RawIndexOptions", into = "RawIndexOptions")]
pub struct IndexOptions {
    pub case_folding: CaseFolding,
    pub match_mode: MatchMode,
    pub tokenization: Tokenization,
}

impl IndexOptions {
    /// Parses loose option strings. `None` keeps the default for that field.
    pub fn parse(
        charset: Option<&str>,
        preset: Option<&str>,
        tokenize: Option<&str>,
    ) -> Result<Self, IndexConfigError> {
        let defaults = Self::default();
        Ok(Self {
            case_folding: charset.map_or(Ok(defaults.case_folding), CaseFolding::parse)?,
            match_mode: preset.map_or(Ok(defaults.match_mode), MatchMode::parse)?,
            tokenization: tokenize.map_or(Ok(defaults.tokenization), Tokenization::parse)?,
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RawIndexOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    charset: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    preset: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tokenize: Option<String>,
}

impl TryFrom<RawIndexOptions> for IndexOptions {
    type Error = IndexConfigError;

    fn try_from(value: RawIndexOptions) -> Result<Self, Self::Error> {
        Self::parse(
            value.charset.as_deref(),
            value.preset.as_deref(),
            value.tokenize.as_deref(),
        )
    }
}

impl From<IndexOptions> for RawIndexOptions {
    fn from(value: IndexOptions) -> Self {
        Self {
            charset: Some(value.case_folding.as_str().to_string()),
            preset: Some(value.match_mode.as_str().to_string()),
            tokenize: Some(value.tokenization.as_str().to_string()),
        }
    }
}

/// Errors while loading [`CoreConfig`].
#[derive(Debug)]
pub enum ConfigError {
    Json(serde_json::Error),
    InvalidSearchLimit(usize),
    InvalidLogLevel(LoggingError),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json(err) => write!(f, "invalid config: {err}"),
            Self::InvalidSearchLimit(limit) => write!(
                f,
                "search_limit must be within 1..={MAX_SEARCH_LIMIT}, got {limit}"
            ),
            Self::InvalidLogLevel(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Json(err) => Some(err),
            Self::InvalidLogLevel(err) => Some(err),
            Self::InvalidSearchLimit(_) => None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

/// Core configuration document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    pub index: IndexOptions,
    /// Hits returned when a caller does not pass a limit.
    pub search_limit: usize,
    pub log_level: String,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            index: IndexOptions::default(),
            search_limit: DEFAULT_SEARCH_LIMIT,
            log_level: default_log_level().to_string(),
        }
    }
}

impl CoreConfig {
    /// Parses and validates a JSON config. Missing fields take defaults.
    pub fn from_json(payload: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_json::from_str(payload)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks limits and normalizes `log_level`.
    pub fn validate(&mut self) -> Result<(), ConfigError> {
        if self.search_limit == 0 || self.search_limit > MAX_SEARCH_LIMIT {
            return Err(ConfigError::InvalidSearchLimit(self.search_limit));
        }
        self.log_level = normalize_level(&self.log_level)
            .map_err(ConfigError::InvalidLogLevel)?
            .to_string();
        Ok(())
    }
}
