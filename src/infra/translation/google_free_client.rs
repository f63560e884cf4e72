// Unauthenticated Google Translate endpoint (the one the web widget uses).
//
// Free, but rate limited without warning, so it is always tried first and the
// paid client picks up when it fails.
//
// Response is a positional JSON array:
// [0] translated segments, each `[translated, original, ...]`
// [2] detected source language
// [6] detection confidence

use crate::core::translation::{ProviderTranslation, TranslationError, TranslationProvider};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

const DEFAULT_BASE_URL: &str = "https://translate.googleapis.com";

pub struct GoogleFreeClient {
    client: Client,
    base_url: String,
}

impl GoogleFreeClient {
    pub fn new(client: Client) -> Self {
        Self::with_base_url(client, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

fn parse_response(body: &Value) -> Result<ProviderTranslation, TranslationError> {
    let segments = body[0]
        .as_array()
        .ok_or_else(|| TranslationError::Parse("missing translated segments".to_string()))?;

    let translated_text: String = segments
        .iter()
        .filter_map(|segment| segment[0].as_str())
        .collect();

    let detected_language_code = body[2]
        .as_str()
        .ok_or_else(|| TranslationError::Parse("missing source language".to_string()))?
        .to_string();

    let confidence = body[6]
        .as_f64()
        .ok_or_else(|| TranslationError::Parse("missing confidence".to_string()))?;

    Ok(ProviderTranslation {
        detected_language_code,
        translated_text,
        confidence,
    })
}

#[async_trait]
impl TranslationProvider for GoogleFreeClient {
    fn name(&self) -> &'static str {
        "google-free"
    }

    async fn translate(
        &self,
        text: &str,
        target_language: &str,
    ) -> Result<ProviderTranslation, TranslationError> {
        let url = format!("{}/translate_a/single", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("client", "gtx"),
                ("sl", "auto"),
                ("tl", target_language),
                ("dt", "t"),
                ("q", text),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(TranslationError::Status { status, body });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| TranslationError::Parse(e.to_string()))?;

        parse_response(&body)
    }
}
