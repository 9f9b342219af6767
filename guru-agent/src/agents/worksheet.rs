//! Textbook page to differentiated worksheets.
//!
//! The pipeline is rule-based: OCR output is cleaned and analysed by the
//! `pedagogy` crate, which also builds the worksheets. No model call is made.

use std::sync::Arc;

use pedagogy::{ExtractedContent, GradeLevel, LanguagePreference, Subject, WorksheetPacket};
use tracing::info;

use crate::error::AgentError;
use crate::services::OcrEngine;

#[derive(Clone)]
pub struct WorksheetAgent {
    ocr: Arc<dyn OcrEngine>,
}

impl WorksheetAgent {
    pub fn new(ocr: Arc<dyn OcrEngine>) -> Self {
        Self { ocr }
    }

    /// OCR a textbook photo and build one worksheet per grade.
    ///
    /// Without a subject it is detected from the text; without grades the
    /// analysis' suggested grades are used.
    pub async fn process_image(
        &self,
        image: &[u8],
        grades: &[GradeLevel],
        subject: Option<Subject>,
        language: LanguagePreference,
    ) -> Result<WorksheetPacket, AgentError> {
        let output = self.ocr.detect_text(image).await?;
        let extracted = ExtractedContent::from_ocr(output.full_text, output.regions)?;
        let packet = WorksheetPacket::from_extracted(&extracted, subject, grades, language);

        info!(
            subject = %packet.content_analysis.subject,
            worksheets = packet.worksheets.len(),
            confidence = extracted.confidence,
            "Worksheets generated from image"
        );
        Ok(packet)
    }

    /// Same pipeline for text the teacher typed or pasted.
    pub fn process_text(
        &self,
        text: &str,
        grades: &[GradeLevel],
        subject: Option<Subject>,
        language: LanguagePreference,
    ) -> Result<WorksheetPacket, AgentError> {
        if text.trim().is_empty() {
            return Err(AgentError::InvalidRequest("text is empty".to_string()));
        }
        Ok(WorksheetPacket::from_text(text, subject, grades, language))
    }
}

/// Parse request strings: `subject` may be `auto` or empty, `language` a
/// worksheet language preference such as `hindi_english`.
pub fn parse_options(
    subject: &str,
    language: &str,
) -> Result<(Option<Subject>, LanguagePreference), AgentError> {
    let subject_hint = Subject::parse_hint(subject)?;
    let preference: LanguagePreference = language.parse()?;
    Ok((subject_hint, preference))
}
