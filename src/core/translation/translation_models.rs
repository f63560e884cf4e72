// Translation domain models.
//
// These are produced by the translator once per moderated message and never
// mutated afterwards. No HTTP or platform types in here.

use thiserror::Error;

/// Code reported by providers when the language could not be determined.
pub const UNDETERMINED_LANGUAGE: &str = "und";

/// Display name used when a language code has no known name.
pub const UNKNOWN_LANGUAGE_NAME: &str = "unknown";

#[derive(Debug, Error)]
pub enum TranslationError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Provider returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to parse provider response: {0}")]
    Parse(String),

    #[error("No translation provider succeeded")]
    Unavailable,
}

impl From<reqwest::Error> for TranslationError {
    fn from(err: reqwest::Error) -> Self {
        TranslationError::Http(err.to_string())
    }
}

/// What a single provider hands back, before display names are resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderTranslation {
    pub detected_language_code: String,
    pub translated_text: String,
    /// Detection confidence in [0, 1].
    pub confidence: f64,
}

/// Result of translating one message into the required language.
#[derive(Debug, Clone, PartialEq)]
pub struct Translation {
    pub original_text: String,
    /// ISO code, or [`UNDETERMINED_LANGUAGE`].
    pub detected_language_code: String,
    /// Human-readable name, or [`UNKNOWN_LANGUAGE_NAME`].
    pub detected_language_name: String,
    pub translated_text: String,
    pub confidence: f64,
}

impl Translation {
    pub fn new(
        original_text: impl Into<String>,
        detected_language_code: impl Into<String>,
        detected_language_name: impl Into<String>,
        translated_text: impl Into<String>,
        confidence: f64,
    ) -> Self {
        Self {
            original_text: original_text.into(),
            detected_language_code: detected_language_code.into(),
            detected_language_name: detected_language_name.into(),
            translated_text: translated_text.into(),
            confidence: confidence.clamp(0.0, 1.0),
        }
    }

    /// Whether the provider gave up on detecting the language.
    ///
    /// Some providers report `"und"`, others `"unknown"`; both mean the same.
    pub fn is_undetermined(&self) -> bool {
        let code = self.detected_language_code.as_str();
        code.is_empty() || code == UNDETERMINED_LANGUAGE || code == UNKNOWN_LANGUAGE_NAME
    }

    /// Whether the translated text differs from what the user actually wrote.
    pub fn has_meaningful_translation(&self) -> bool {
        self.translated_text.trim() != self.original_text.trim()
    }
}
