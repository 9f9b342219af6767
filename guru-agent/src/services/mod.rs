//! External Google Cloud services: OCR, translation and speech.
//!
//! Each service sits behind an async trait with a REST implementation and a
//! mock, mirroring how LLM backends are abstracted.

pub mod ocr;
pub mod speech;
pub mod translate;

use std::sync::Arc;

use reqwest::Client;
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

pub use ocr::{GoogleVisionOcr, MockOcr, OcrEngine, OcrOutput};
pub use speech::{GoogleSpeech, MockSpeech, SpeechRecognizer};
pub use translate::{GoogleTranslator, MockTranslator, Translation, Translator};

/// Errors from external services.
#[derive(Debug, thiserror::Error)]
pub enum ExternalServiceError {
    /// Transport failure
    #[error("{service} request failed: {message}")]
    Request {
        service: &'static str,
        message: String,
    },

    /// Non-success HTTP status or an error object in the body
    #[error("{service} API error ({status}): {message}")]
    Api {
        service: &'static str,
        status: u16,
        message: String,
    },

    /// Body did not match the expected shape
    #[error("{service} returned an unreadable response: {message}")]
    Parse {
        service: &'static str,
        message: String,
    },

    /// Input rejected before sending
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// The three external services an agent set needs.
#[derive(Clone)]
pub struct ExternalServices {
    pub ocr: Arc<dyn OcrEngine>,
    pub translator: Arc<dyn Translator>,
    pub speech: Arc<dyn SpeechRecognizer>,
}

impl ExternalServices {
    /// Google Cloud implementations sharing one API key.
    pub fn google(api_key: &str) -> Self {
        Self {
            ocr: Arc::new(GoogleVisionOcr::new(api_key)),
            translator: Arc::new(GoogleTranslator::new(api_key)),
            speech: Arc::new(GoogleSpeech::new(api_key)),
        }
    }

    /// Google implementations over a preconfigured HTTP client.
    pub fn google_with_client(api_key: &str, client: Client) -> Self {
        Self {
            ocr: Arc::new(GoogleVisionOcr::new(api_key).with_client(client.clone())),
            translator: Arc::new(GoogleTranslator::new(api_key).with_client(client.clone())),
            speech: Arc::new(GoogleSpeech::new(api_key).with_client(client)),
        }
    }

    /// Offline services for development and tests.
    pub fn mock() -> Self {
        Self {
            ocr: Arc::new(MockOcr::default()),
            translator: Arc::new(MockTranslator::new()),
            speech: Arc::new(MockSpeech::default()),
        }
    }

    pub fn with_ocr(mut self, ocr: Arc<dyn OcrEngine>) -> Self {
        self.ocr = ocr;
        self
    }

    pub fn with_translator(mut self, translator: Arc<dyn Translator>) -> Self {
        self.translator = translator;
        self
    }

    pub fn with_speech(mut self, speech: Arc<dyn SpeechRecognizer>) -> Self {
        self.speech = speech;
        self
    }
}

/// API-key authenticated JSON endpoint shared by the Google clients.
#[derive(Clone)]
pub(crate) struct GoogleEndpoint {
    client: Client,
    url: String,
    api_key: String,
    service: &'static str,
}

impl GoogleEndpoint {
    pub(crate) fn new(
        service: &'static str,
        url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
            api_key: api_key.into(),
            service,
        }
    }

    pub(crate) fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    pub(crate) async fn post<B, R>(&self, body: &B) -> Result<R, ExternalServiceError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        debug!(service = self.service, url = %self.url, "Calling external service");

        let response = self
            .client
            .post(&self.url)
            .query(&[("key", &self.api_key)])
            .json(body)
            .send()
            .await
            .map_err(|e| ExternalServiceError::Request {
                service: self.service,
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ExternalServiceError::Api {
                service: self.service,
                status: status.as_u16(),
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|e| ExternalServiceError::Parse {
                service: self.service,
                message: e.to_string(),
            })
    }
}

/// ISO 639-1 code for a language name; codes pass through unchanged.
pub fn language_code(language: &str) -> String {
    let lowered = language.trim().to_lowercase();
    let code = match lowered.as_str() {
        "english" => "en",
        "hindi" | "hindi_english" => "hi",
        "marathi" => "mr",
        "bengali" | "bangla" => "bn",
        "tamil" => "ta",
        "telugu" => "te",
        "gujarati" => "gu",
        "kannada" => "kn",
        "malayalam" => "ml",
        "punjabi" => "pa",
        "odia" | "oriya" => "or",
        "urdu" => "ur",
        _ => return language.trim().to_string(),
    };
    code.to_string()
}

/// Whether a language name or code means English.
pub fn is_english(language: &str) -> bool {
    let code = language_code(language).to_lowercase();
    code == "en" || code.starts_with("en-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_code() {
        assert_eq!(language_code("Hindi"), "hi");
        assert_eq!(language_code(" marathi "), "mr");
        assert_eq!(language_code("hi-IN"), "hi-IN");
        assert_eq!(language_code("ta"), "ta");
    }

    #[test]
    fn test_is_english() {
        assert!(is_english("English"));
        assert!(is_english("en"));
        assert!(is_english("en-IN"));
        assert!(!is_english("hindi"));
        assert!(!is_english("hindi_english"));
    }
}
