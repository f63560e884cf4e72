// Google Cloud Translation v2 client (authenticated with an API key).
//
// Works always, but the owner pays for it, so it only runs after the free
// client has failed. Detection and translation are two separate calls.

use crate::core::translation::{ProviderTranslation, TranslationError, TranslationProvider};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;

const DEFAULT_BASE_URL: &str = "https://translation.googleapis.com";

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct DetectData {
    detections: Vec<Vec<Detection>>,
}

#[derive(Debug, Deserialize)]
struct Detection {
    language: String,
    #[serde(default)]
    confidence: f64,
}

#[derive(Debug, Deserialize)]
struct TranslateData {
    translations: Vec<TranslatedText>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TranslatedText {
    translated_text: String,
}

pub struct GoogleCloudClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GoogleCloudClient {
    pub fn new(client: Client, api_key: String) -> Self {
        Self::with_base_url(client, api_key, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(client: Client, api_key: String, base_url: impl Into<String>) -> Self {
        Self {
            client,
            api_key,
            base_url: base_url.into(),
        }
    }

    async fn post<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        payload: serde_json::Value,
    ) -> Result<T, TranslationError> {
        let url = format!("{}/language/translate/v2{}", self.base_url, endpoint);

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(TranslationError::Status { status, body });
        }

        let body: ApiResponse<T> = response
            .json()
            .await
            .map_err(|e| TranslationError::Parse(e.to_string()))?;
        Ok(body.data)
    }

    async fn detect(&self, text: &str) -> Result<Detection, TranslationError> {
        let data: DetectData = self.post("/detect", json!({ "q": text })).await?;

        data.detections
            .into_iter()
            .next()
            .and_then(|candidates| candidates.into_iter().next())
            .ok_or_else(|| TranslationError::Parse("empty detection list".to_string()))
    }
}

#[async_trait]
impl TranslationProvider for GoogleCloudClient {
    fn name(&self) -> &'static str {
        "google-cloud"
    }

    async fn translate(
        &self,
        text: &str,
        target_language: &str,
    ) -> Result<ProviderTranslation, TranslationError> {
        let detection = self.detect(text).await?;

        let data: TranslateData = self
            .post(
                "",
                json!({ "q": text, "target": target_language, "format": "text" }),
            )
            .await?;

        let translated_text = data
            .translations
            .into_iter()
            .next()
            .map(|t| t.translated_text)
            .ok_or_else(|| TranslationError::Parse("empty translation list".to_string()))?;

        Ok(ProviderTranslation {
            detected_language_code: detection.language,
            translated_text,
            confidence: detection.confidence,
        })
    }
}
