//! Errors raised by the rule engine.

/// Error types for curriculum lookups and rule loading.
#[derive(Debug, thiserror::Error)]
pub enum CurriculumError {
    /// Grade string could not be mapped to grades 1-8
    #[error("Unknown grade level: {0}")]
    UnknownGrade(String),

    /// Subject hint not recognized
    #[error("Unknown subject: {0}")]
    UnknownSubject(String),

    /// Language preference not recognized
    #[error("Unknown language preference: {0}")]
    UnknownLanguage(String),

    /// OCR produced no usable text
    #[error("No text detected in image")]
    NoTextDetected,

    /// Differentiation rules file could not be read
    #[error("Failed to read rules file: {0}")]
    Io(#[from] std::io::Error),

    /// Differentiation rules document is malformed
    #[error("Invalid rules document: {0}")]
    InvalidRules(#[from] serde_yaml::Error),
}
