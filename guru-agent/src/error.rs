//! Errors raised while serving a teacher request.

use pedagogy::CurriculumError;

use crate::backend::LlmError;
use crate::capability::Capability;
use crate::services::ExternalServiceError;

#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    /// Language model call failed
    #[error("Backend error: {0}")]
    Backend(#[from] LlmError),

    /// OCR, translation or speech call failed
    #[error("External service error: {0}")]
    Service(#[from] ExternalServiceError),

    /// Rule engine rejected the input
    #[error("Curriculum error: {0}")]
    Curriculum(#[from] CurriculumError),

    /// No configured backend is reachable
    #[error("No LLM backend available")]
    NoBackendAvailable,

    /// Capability is not registered or has been disabled
    #[error("Capability not available: {0}")]
    CapabilityNotAvailable(Capability),

    /// Capability exceeded its timeout
    #[error("{capability} timed out after {timeout_ms}ms")]
    Timeout {
        capability: Capability,
        timeout_ms: u64,
    },

    /// Request failed validation
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl AgentError {
    /// Whether the caller sent something unusable, as opposed to a
    /// downstream failure.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidRequest(_)
                | Self::Curriculum(_)
                | Self::Service(ExternalServiceError::InvalidInput(_))
        )
    }
}
