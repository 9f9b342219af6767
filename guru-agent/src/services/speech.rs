//! Speech-to-text for reading assessments.

use async_trait::async_trait;
use base64::Engine as _;
use serde::Deserialize;
use serde_json::json;

use super::{ExternalServiceError, GoogleEndpoint};

const SERVICE: &str = "speech";
const DEFAULT_URL: &str = "https://speech.googleapis.com/v1/speech:recognize";

#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    /// Transcribe recorded audio. `language_code` is BCP-47, e.g. `hi-IN`.
    async fn transcribe(
        &self,
        audio: &[u8],
        language_code: &str,
    ) -> Result<String, ExternalServiceError>;
}

/// Google Cloud Speech-to-Text `speech:recognize`.
pub struct GoogleSpeech {
    endpoint: GoogleEndpoint,
}

impl GoogleSpeech {
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

#[derive(Debug, Deserialize)]
struct RecognizeResponse {
    #[serde(default)]
    results: Vec<RecognitionResult>,
}

#[derive(Debug, Deserialize)]
struct RecognitionResult {
    #[serde(default)]
    alternatives: Vec<Alternative>,
}

#[derive(Debug, Deserialize)]
struct Alternative {
    #[serde(default)]
    transcript: String,
}

#[async_trait]
impl SpeechRecognizer for GoogleSpeech {
    async fn transcribe(
        &self,
        audio: &[u8],
        language_code: &str,
    ) -> Result<String, ExternalServiceError> {
        if audio.is_empty() {
            return Err(ExternalServiceError::InvalidInput("empty audio".to_string()));
        }

        let body = json!({
            "config": {
                "languageCode": language_code,
                "enableAutomaticPunctuation": true
            },
            "audio": {"content": base64::engine::general_purpose::STANDARD.encode(audio)}
        });

        let response: RecognizeResponse = self.endpoint.post(&body).await?;

        // Best alternative of every result, in order
        let transcript = response
            .results
            .into_iter()
            .filter_map(|r| r.alternatives.into_iter().next())
            .map(|a| a.transcript.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        Ok(transcript)
    }
}

/// Recognizer that returns a fixed transcript.
#[derive(Debug, Clone, Default)]
pub struct MockSpeech {
    transcript: String,
}

impl MockSpeech {
    pub fn with_transcript(transcript: impl Into<String>) -> Self {
        Self {
            transcript: transcript.into(),
        }
    }
}

#[async_trait]
impl SpeechRecognizer for MockSpeech {
    async fn transcribe(
        &self,
        audio: &[u8],
        _language_code: &str,
    ) -> Result<String, ExternalServiceError> {
        if audio.is_empty() {
            return Err(ExternalServiceError::InvalidInput("empty audio".to_string()));
        }
        Ok(self.transcript.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_transcripts_joined() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({
                "config": {"languageCode": "hi-IN", "enableAutomaticPunctuation": true}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [
                    {"alternatives": [{"transcript": "पौधे पानी पीते हैं", "confidence": 0.9}]},
                    {"alternatives": [{"transcript": " और धूप लेते हैं "}, {"transcript": "ignored"}]},
                    {"alternatives": []}
                ]
            })))
            .mount(&server)
            .await;

        let speech = GoogleSpeech::with_url(server.uri(), "k");
        let transcript = speech.transcribe(b"RIFF", "hi-IN").await.unwrap();
        assert_eq!(transcript, "पौधे पानी पीते हैं और धूप लेते हैं");
    }

    #[tokio::test]
    async fn test_empty_results() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;

        let transcript = GoogleSpeech::with_url(server.uri(), "k")
            .transcribe(b"RIFF", "en-IN")
            .await
            .unwrap();
        assert!(transcript.is_empty());
    }

    #[tokio::test]
    async fn test_empty_audio_rejected() {
        let err = MockSpeech::with_transcript("x")
            .transcribe(&[], "en-IN")
            .await
            .unwrap_err();
        assert!(matches!(err, ExternalServiceError::InvalidInput(_)));
    }
}
