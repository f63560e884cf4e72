// Moderation service - core business logic for language enforcement.
//
// This service handles:
// - Language verdicts from a translation (confidence + detectability)
// - Lexical exemptions (cheap, no I/O)
// - Fuzzy exemptions against the group's stored exception phrases
// - Exception list management
//
// NO Discord dependencies here - just pure domain logic.
// Every external failure (translator, exception store) fails open.

use super::fuzzy_matcher::is_fuzzy_exempt;
use super::lexical_filter::is_lexically_exempt;
use super::moderation_models::{
    normalize_exception_text, ExceptionEntry, ModerationConfig, ModerationContext,
    ModerationVerdict, CONFIDENCE_THRESHOLD, FUZZY_MATCH_THRESHOLD,
};
use crate::core::translation::languages::language_name;
use crate::core::translation::{Translation, TranslatorService};
use async_trait::async_trait;
use thiserror::Error;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum ExceptionError {
    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Exception text is empty")]
    EmptyText,
}

// ============================================================================
// STORAGE TRAIT (PORT)
// ============================================================================

/// Trait for persisting exception phrases, scoped per group.
#[async_trait]
pub trait ExceptionStore: Send + Sync {
    /// Store a new exception phrase.
    async fn add(&self, entry: ExceptionEntry) -> Result<(), ExceptionError>;

    /// Remove every phrase in the group equal to `text`. Returns how many were removed.
    async fn remove(&self, group_id: u64, text: &str) -> Result<u64, ExceptionError>;

    /// All phrases stored for a group.
    async fn list(&self, group_id: u64) -> Result<Vec<ExceptionEntry>, ExceptionError>;
}

// ============================================================================
// DECISION FUNCTIONS
// ============================================================================

/// Decide whether a translation passes language enforcement.
///
/// Missing translations, undetermined languages and low-confidence detections
/// all count as correct.
pub fn evaluate(translation: Option<Translation>, required_language: &str) -> ModerationContext {
    let required_name = language_name(required_language);

    let Some(translation) = translation else {
        return ModerationContext::fail_open(required_language, required_name);
    };

    let is_correct_language = if translation.is_undetermined() {
        tracing::debug!(
            text = %translation.original_text,
            "Couldn't detect language, assuming it is correct"
        );
        true
    } else if translation.confidence < CONFIDENCE_THRESHOLD {
        tracing::debug!(
            confidence = translation.confidence,
            detected = %translation.detected_language_code,
            "Detection confidence too low, assuming language is correct"
        );
        true
    } else {
        translation.detected_language_code == required_language
    };

    ModerationContext {
        required_language_code: required_language.to_string(),
        required_language_name: required_name.to_string(),
        is_correct_language,
        translation: Some(translation),
    }
}

/// Whether a message survives the checks that need no exception lookup.
///
/// `false` means there is nothing to enforce; `true` means the exception list
/// still has to be consulted.
pub fn needs_exception_lookup(text: &str, context: &ModerationContext) -> bool {
    if context.is_correct_language {
        return false;
    }

    !is_lexically_exempt(text)
}

/// Full enforcement decision against an already-fetched exception list.
pub fn should_enforce(
    text: &str,
    context: &ModerationContext,
    exceptions: &[ExceptionEntry],
) -> bool {
    needs_exception_lookup(text, context)
        && !is_fuzzy_exempt(text, exceptions, FUZZY_MATCH_THRESHOLD)
}

// ============================================================================
// CORE SERVICE
// ============================================================================

/// Language enforcement service.
pub struct ModerationService<S: ExceptionStore> {
    store: S,
    translator: TranslatorService,
    config: ModerationConfig,
}

impl<S: ExceptionStore> ModerationService<S> {
    /// Create a new moderation service with the given store and translator.
    pub fn new(store: S, translator: TranslatorService, config: ModerationConfig) -> Self {
        Self {
            store,
            translator,
            config,
        }
    }

    /// Translate a message and decide whether it passes language enforcement.
    pub async fn translate_and_check(&self, text: &str) -> ModerationContext {
        let translation = match self
            .translator
            .translate(text, &self.config.required_language)
            .await
        {
            Ok(translation) => Some(translation),
            Err(e) => {
                tracing::warn!("Translation unavailable, letting message through: {}", e);
                None
            }
        };

        self.evaluate(translation)
    }

    /// Language verdict for an already-obtained translation.
    pub fn evaluate(&self, translation: Option<Translation>) -> ModerationContext {
        evaluate(translation, &self.config.required_language)
    }

    /// Decide whether a message in `group_id` has to be acted on.
    ///
    /// The exception list is only fetched when the cheap checks did not settle it.
    /// If the store fails, the fuzzy check is treated as "no match".
    pub async fn should_enforce(
        &self,
        group_id: u64,
        text: &str,
        context: &ModerationContext,
    ) -> bool {
        if !needs_exception_lookup(text, context) {
            return false;
        }

        let exceptions = match self.store.list(group_id).await {
            Ok(exceptions) => exceptions,
            Err(e) => {
                tracing::warn!(group_id, "Failed to load exception list: {}", e);
                Vec::new()
            }
        };

        should_enforce(text, context, &exceptions)
    }

    /// Run the whole pipeline for one message: translate, evaluate, check exemptions.
    pub async fn check_message(&self, group_id: u64, text: &str) -> ModerationVerdict {
        let context = self.translate_and_check(text).await;

        if context.is_correct_language {
            return ModerationVerdict::no_action(context);
        }

        let should_act = self.should_enforce(group_id, text, &context).await;
        ModerationVerdict {
            should_act,
            context,
        }
    }

    /// Add a phrase to the group's exception list.
    pub async fn add_exception(
        &self,
        group_id: u64,
        text: &str,
    ) -> Result<ExceptionEntry, ExceptionError> {
        if text.trim().is_empty() {
            return Err(ExceptionError::EmptyText);
        }

        let entry = ExceptionEntry::new(group_id, text);
        self.store.add(entry.clone()).await?;
        tracing::info!(group_id, exception = %entry.text, "Exception added");
        Ok(entry)
    }

    /// Remove a phrase from the group's exception list (case-insensitive exact match).
    pub async fn remove_exception(&self, group_id: u64, text: &str) -> Result<u64, ExceptionError> {
        let normalized = normalize_exception_text(text);
        if normalized.is_empty() {
            return Err(ExceptionError::EmptyText);
        }

        let removed = self.store.remove(group_id, &normalized).await?;
        tracing::info!(group_id, exception = %normalized, removed, "Exception removed");
        Ok(removed)
    }

    /// List the group's exception phrases.
    pub async fn list_exceptions(
        &self,
        group_id: u64,
    ) -> Result<Vec<ExceptionEntry>, ExceptionError> {
        self.store.list(group_id).await
    }
}

// ============================================================================
// TESTS
// ============================================================================
