//! Core wire and domain types for lingo-dl

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Handle identifying one document translation job
///
/// Created by the upload step; required to poll status and download the
/// result. Callers should retain the handle surfaced inside
/// [`Error::DocumentTranslation`](crate::error::Error::DocumentTranslation)
/// to resume a failed translation manually.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentHandle {
    /// Unique ID assigned to the uploaded document
    pub document_id: String,
    /// Key that authorizes status polls and result downloads for this document
    pub document_key: String,
}

impl std::fmt::Display for DocumentHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.document_id)
    }
}

/// State of a document translation job
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentState {
    /// Queued and waiting for translation to start
    Queued,
    /// Translation in progress
    Translating,
    /// Translation failed (terminal)
    Error,
    /// Translation finished, result available for download (terminal)
    Done,
}

impl std::fmt::Display for DocumentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DocumentState::Queued => "queued",
            DocumentState::Translating => "translating",
            DocumentState::Error => "error",
            DocumentState::Done => "done",
        };
        write!(f, "{}", s)
    }
}

/// Status of a document translation job, as reported by one status poll
///
/// Each poll supersedes the previous one. `Done` and `Error` are terminal.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DocumentStatus {
    /// Current state of the job
    pub status: DocumentState,

    /// Service estimate of the remaining translation time, in seconds
    ///
    /// Unreliable; the polling loop uses a fixed interval instead.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seconds_remaining: Option<u64>,

    /// Number of characters billed for this document, reported once done
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub billed_characters: Option<u64>,

    /// Short description of the failure when `status` is `Error`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl DocumentStatus {
    /// Returns true if the job has not failed (queued, translating, or done)
    pub fn ok(&self) -> bool {
        matches!(
            self.status,
            DocumentState::Queued | DocumentState::Translating | DocumentState::Done
        )
    }

    /// Returns true if the translated document is ready for download
    pub fn done(&self) -> bool {
        self.status == DocumentState::Done
    }
}

/// Desired formality level for translated text
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Formality {
    /// Service default formality
    #[default]
    Default,
    /// More formal phrasing
    More,
    /// Less formal phrasing
    Less,
    /// More formal if the target language supports formality, default otherwise
    PreferMore,
    /// Less formal if the target language supports formality, default otherwise
    PreferLess,
}

impl Formality {
    /// Wire representation of this formality level
    pub fn as_str(&self) -> &'static str {
        match self {
            Formality::Default => "default",
            Formality::More => "more",
            Formality::Less => "less",
            Formality::PreferMore => "prefer_more",
            Formality::PreferLess => "prefer_less",
        }
    }
}

impl std::fmt::Display for Formality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One translated text, as returned by the text translation endpoint
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TextResult {
    /// The translated text
    pub text: String,

    /// Source language detected by the service, when no source was given
    #[serde(
        default,
        rename = "detected_source_language",
        skip_serializing_if = "Option::is_none"
    )]
    pub detected_source_lang: Option<String>,

    /// Number of characters billed for this text, when reported
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub billed_characters: Option<u64>,
}

/// A language supported by the service
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Language {
    /// Language code (e.g. "EN", "DE", "PT-BR")
    pub language: String,

    /// Human-readable language name in English
    pub name: String,

    /// Whether the formality option is supported for this target language
    ///
    /// Only present in target-language listings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supports_formality: Option<bool>,
}

/// Account usage for the current billing period
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Usage {
    /// Characters translated so far in the current billing period
    pub character_count: u64,

    /// Character limit for the current billing period
    pub character_limit: u64,

    /// Documents translated so far, for plans with a document quota
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_count: Option<u64>,

    /// Document limit, for plans with a document quota
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_limit: Option<u64>,
}

impl Usage {
    /// Returns true if any usage limit for the billing period is reached
    pub fn any_limit_reached(&self) -> bool {
        if self.character_count >= self.character_limit {
            return true;
        }
        match (self.document_count, self.document_limit) {
            (Some(count), Some(limit)) => count >= limit,
            _ => false,
        }
    }
}

/// Metadata describing one glossary
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GlossaryInfo {
    /// Unique glossary ID
    pub glossary_id: String,

    /// User-supplied glossary name
    pub name: String,

    /// Whether the glossary can already be used in translations
    pub ready: bool,

    /// Source language code of the glossary
    pub source_lang: String,

    /// Target language code of the glossary
    pub target_lang: String,

    /// When the glossary was created
    pub creation_time: DateTime<Utc>,

    /// Number of entries in the glossary
    pub entry_count: u64,
}

/// A source/target language pair supported for glossaries
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguagePair {
    /// Source language code
    pub source_lang: String,
    /// Target language code
    pub target_lang: String,
}
