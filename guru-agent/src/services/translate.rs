//! Text translation.

use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{language_code, ExternalServiceError, GoogleEndpoint};

const SERVICE: &str = "translate";
const DEFAULT_URL: &str = "https://translation.googleapis.com/language/translate/v2";
/// Translation v2 rejects requests with more `q` segments than this.
pub const MAX_SEGMENTS_PER_REQUEST: usize = 128;

/// One translated string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Translation {
    pub text: String,
    /// Source language when it was auto-detected
    pub detected_source_language: Option<String>,
}

#[async_trait]
pub trait Translator: Send + Sync {
    /// Translate a batch of texts. `source = None` auto-detects.
    async fn translate_batch(
        &self,
        texts: &[String],
        target: &str,
        source: Option<&str>,
    ) -> Result<Vec<Translation>, ExternalServiceError>;

    /// Translate one text with source auto-detection.
    async fn translate(&self, text: &str, target: &str) -> Result<String, ExternalServiceError> {
        let mut translations = self
            .translate_batch(&[text.to_string()], target, None)
            .await?;
        if translations.is_empty() {
            return Ok(String::new());
        }
        Ok(translations.swap_remove(0).text)
    }
}

/// Google Cloud Translation v2.
pub struct GoogleTranslator {
    endpoint: GoogleEndpoint,
}

impl GoogleTranslator {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_url(DEFAULT_URL, api_key)
    }

    pub fn with_url(url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            endpoint: GoogleEndpoint::new(SERVICE, url, api_key),
        }
    }

    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.endpoint = self.endpoint.with_client(client);
        self
    }
}

#[derive(Debug, Serialize)]
struct TranslateRequest<'a> {
    q: &'a [String],
    target: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    source: Option<String>,
    format: &'static str,
}

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    data: TranslateData,
}

#[derive(Debug, Deserialize)]
struct TranslateData {
    #[serde(default)]
    translations: Vec<TranslationItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TranslationItem {
    translated_text: String,
    detected_source_language: Option<String>,
}

#[async_trait]
impl Translator for GoogleTranslator {
    async fn translate_batch(
        &self,
        texts: &[String],
        target: &str,
        source: Option<&str>,
    ) -> Result<Vec<Translation>, ExternalServiceError> {
        let mut translations = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(MAX_SEGMENTS_PER_REQUEST) {
            translations.extend(self.translate_chunk(chunk, target, source).await?);
        }
        Ok(translations)
    }
}

impl GoogleTranslator {
    async fn translate_chunk(
        &self,
        texts: &[String],
        target: &str,
        source: Option<&str>,
    ) -> Result<Vec<Translation>, ExternalServiceError> {
        let request = TranslateRequest {
            q: texts,
            target: language_code(target),
            source: source.map(language_code),
            format: "text",
        };

        let response: TranslateResponse = self.endpoint.post(&request).await?;
        if response.data.translations.len() != texts.len() {
            return Err(ExternalServiceError::Parse {
                service: SERVICE,
                message: format!(
                    "expected {} translations, got {}",
                    texts.len(),
                    response.data.translations.len()
                ),
            });
        }

        Ok(response
            .data
            .translations
            .into_iter()
            .map(|t| Translation {
                text: t.translated_text,
                detected_source_language: t.detected_source_language,
            })
            .collect())
    }
}

/// Translator that tags text with the target code, e.g. `[hi] water`.
#[derive(Debug, Default)]
pub struct MockTranslator {
    calls: Mutex<Vec<(String, String)>>,
}

impl MockTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    /// `(text, target)` pairs seen so far.
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls
            .lock()
            .map(|c| c.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Translator for MockTranslator {
    async fn translate_batch(
        &self,
        texts: &[String],
        target: &str,
        _source: Option<&str>,
    ) -> Result<Vec<Translation>, ExternalServiceError> {
        let code = language_code(target);
        if let Ok(mut calls) = self.calls.lock() {
            calls.extend(texts.iter().map(|t| (t.clone(), code.clone())));
        }
        Ok(texts
            .iter()
            .map(|t| Translation {
                text: format!("[{code}] {t}"),
                detected_source_language: Some("en".to_string()),
            })
            .collect())
    }
}
