//! Text detection in textbook photos.

use async_trait::async_trait;
use base64::Engine as _;
use pedagogy::{TextRegion, Vertex};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{ExternalServiceError, GoogleEndpoint};

const SERVICE: &str = "vision";
const DEFAULT_URL: &str = "https://vision.googleapis.com/v1/images:annotate";

/// Raw OCR result: the full page text plus located regions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OcrOutput {
    pub full_text: String,
    pub regions: Vec<TextRegion>,
}

#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// Detect text in an encoded image (PNG, JPEG...).
    async fn detect_text(&self, image: &[u8]) -> Result<OcrOutput, ExternalServiceError>;
}

/// Google Cloud Vision `TEXT_DETECTION`.
pub struct GoogleVisionOcr {
    endpoint: GoogleEndpoint,
}

impl GoogleVisionOcr {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_url(DEFAULT_URL, api_key)
    }

    /// Point at a different `images:annotate` URL.
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
struct AnnotateResponse {
    #[serde(default)]
    responses: Vec<ImageResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImageResponse {
    #[serde(default)]
    text_annotations: Vec<TextAnnotation>,
    error: Option<Status>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct TextAnnotation {
    #[serde(default)]
    description: String,
    bounding_poly: Option<BoundingPoly>,
}

#[derive(Debug, Deserialize, Serialize)]
struct BoundingPoly {
    #[serde(default)]
    vertices: Vec<Vertex>,
}

#[derive(Debug, Deserialize)]
struct Status {
    #[serde(default)]
    code: u16,
    #[serde(default)]
    message: String,
}

#[async_trait]
impl OcrEngine for GoogleVisionOcr {
    async fn detect_text(&self, image: &[u8]) -> Result<OcrOutput, ExternalServiceError> {
        if image.is_empty() {
            return Err(ExternalServiceError::InvalidInput("empty image".to_string()));
        }

        let body = json!({
            "requests": [{
                "image": {"content": base64::engine::general_purpose::STANDARD.encode(image)},
                "features": [{"type": "TEXT_DETECTION"}]
            }]
        });

        let response: AnnotateResponse = self.endpoint.post(&body).await?;
        let Some(first) = response.responses.into_iter().next() else {
            return Ok(OcrOutput::default());
        };

        if let Some(status) = first.error.filter(|s| !s.message.is_empty()) {
            return Err(ExternalServiceError::Api {
                service: SERVICE,
                status: status.code,
                message: status.message,
            });
        }

        // First annotation is the whole page, the rest are individual regions
        let mut annotations = first.text_annotations.into_iter();
        let full_text = annotations
            .next()
            .map(|a| a.description)
            .unwrap_or_default();
        let regions = annotations
            .map(|a| {
                TextRegion::new(a.description)
                    .with_bounding_box(a.bounding_poly.map(|p| p.vertices).unwrap_or_default())
            })
            .collect();

        Ok(OcrOutput { full_text, regions })
    }
}

/// OCR engine that returns a fixed result.
#[derive(Debug, Clone, Default)]
pub struct MockOcr {
    output: OcrOutput,
}

impl MockOcr {
    /// Returns `text` as the page with one region per whitespace-separated word.
    pub fn with_text(text: impl Into<String>) -> Self {
        let full_text = text.into();
        let regions = full_text.split_whitespace().map(TextRegion::new).collect();
        Self {
            output: OcrOutput { full_text, regions },
        }
    }
}

#[async_trait]
impl OcrEngine for MockOcr {
    async fn detect_text(&self, image: &[u8]) -> Result<OcrOutput, ExternalServiceError> {
        if image.is_empty() {
            return Err(ExternalServiceError::InvalidInput("empty image".to_string()));
        }
        Ok(self.output.clone())
    }
}
