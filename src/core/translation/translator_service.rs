// Translator service - runs an ordered chain of translation providers.
//
// The first provider that answers wins. Providers are expected to fail fairly
// often (quota limits on the free endpoint), so failures are logged and the next
// provider is tried. Only when every provider has failed does the caller see
// `TranslationError::Unavailable`.

use super::languages::language_name;
use super::translation_models::{ProviderTranslation, Translation, TranslationError};
use async_trait::async_trait;

#[async_trait]
pub trait TranslationProvider: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Detect the language of `text` and translate it into `target_language`.
    async fn translate(
        &self,
        text: &str,
        target_language: &str,
    ) -> Result<ProviderTranslation, TranslationError>;
}

pub struct TranslatorService {
    providers: Vec<Box<dyn TranslationProvider>>,
}

impl TranslatorService {
    pub fn new(providers: Vec<Box<dyn TranslationProvider>>) -> Self {
        Self { providers }
    }

    pub fn provider_count(&self) -> usize {
        self.providers.len()
    }

    /// Translate `text` into `target_language`, trying each provider in order.
    pub async fn translate(
        &self,
        text: &str,
        target_language: &str,
    ) -> Result<Translation, TranslationError> {
        for provider in &self.providers {
            match provider.translate(text, target_language).await {
                Ok(raw) => {
                    tracing::debug!(
                        provider = provider.name(),
                        detected = %raw.detected_language_code,
                        confidence = raw.confidence,
                        "Translation succeeded"
                    );
                    let name = language_name(&raw.detected_language_code);
                    return Ok(Translation::new(
                        text,
                        raw.detected_language_code,
                        name,
                        raw.translated_text,
                        raw.confidence,
                    ));
                }
                Err(e) => {
                    tracing::warn!(
                        provider = provider.name(),
                        "Translation provider failed: {}",
                        e
                    );
                }
            }
        }

        Err(TranslationError::Unavailable)
    }
}
