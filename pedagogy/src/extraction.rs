//! Post-processing of OCR output from textbook photos.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::CurriculumError;
use crate::types::DetectedLanguage;

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

static DISALLOWED_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s\x{0900}-\x{097F}.,;:!?()\-]").unwrap());

static EG_CLAUSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\be\.g\.([^.!?।]*)").unwrap());

static QUESTION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^.!?।]*[?।]").unwrap());

const DEFINITION_MARKERS: &[&str] = &["is called", "means", "is defined as", "कहते हैं"];
const EXAMPLE_MARKERS: &[&str] = &["for example", "उदाहरण"];
const KEY_POINT_MARKERS: &[&str] = &["remember", "important", "ध्यान दें"];

/// Corner of a text bounding box, in image pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vertex {
    #[serde(default)]
    pub x: i32,
    #[serde(default)]
    pub y: i32,
}

/// A block of text located by the OCR engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRegion {
    pub text: String,
    pub bounding_box: Vec<Vertex>,
}

impl TextRegion {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bounding_box: Vec::new(),
        }
    }

    pub fn with_bounding_box(mut self, vertices: Vec<Vertex>) -> Self {
        self.bounding_box = vertices;
        self
    }
}

/// Pattern-matched pieces of a page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredContent {
    pub questions: Vec<String>,
    pub definitions: Vec<String>,
    pub examples: Vec<String>,
    pub key_points: Vec<String>,
}

/// Everything recovered from one image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedContent {
    /// Cleaned text
    pub text: String,
    pub raw_text: String,
    pub language: DetectedLanguage,
    pub confidence: f64,
    pub structured: StructuredContent,
    pub regions: Vec<TextRegion>,
}

impl ExtractedContent {
    /// Build the record from raw OCR output.
    pub fn from_ocr(
        raw_text: impl Into<String>,
        regions: Vec<TextRegion>,
    ) -> Result<Self, CurriculumError> {
        let raw_text = raw_text.into();
        let text = clean_extracted_text(&raw_text);
        if text.is_empty() {
            return Err(CurriculumError::NoTextDetected);
        }

        let language = detect_language(&text);
        let structured = extract_structured_content(&text);
        let confidence = extraction_confidence(&regions);

        debug!(
            chars = text.chars().count(),
            language = language.as_str(),
            confidence,
            questions = structured.questions.len(),
            "Extracted OCR content"
        );

        Ok(Self {
            text,
            raw_text,
            language,
            confidence,
            structured,
            regions,
        })
    }
}

fn is_devanagari(c: char) -> bool {
    ('\u{0900}'..='\u{097F}').contains(&c)
}

/// Count of (Devanagari, Latin) letters.
pub(crate) fn script_counts(text: &str) -> (usize, usize) {
    text.chars().fold((0, 0), |(dev, lat), c| {
        if is_devanagari(c) {
            (dev + 1, lat)
        } else if c.is_ascii_alphabetic() {
            (dev, lat + 1)
        } else {
            (dev, lat)
        }
    })
}

/// Dominant script of a text.
pub fn detect_language(text: &str) -> DetectedLanguage {
    let (devanagari, latin) = script_counts(text);
    if devanagari > latin {
        DetectedLanguage::Hindi
    } else if latin > 0 {
        DetectedLanguage::English
    } else {
        DetectedLanguage::Mixed
    }
}

/// Collapse whitespace and strip OCR noise characters.
pub fn clean_extracted_text(text: &str) -> String {
    let collapsed = WHITESPACE.replace_all(text, " ");
    let stripped = DISALLOWED_CHARS.replace_all(&collapsed, "");
    stripped.trim().to_string()
}

/// Sentences split on `.`, `!`, `?` and `।`, trimmed, empties dropped.
pub(crate) fn split_sentences(text: &str) -> Vec<&str> {
    text.split(['.', '!', '?', '।'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

fn sentences_with(text: &str, markers: &[&str]) -> Vec<String> {
    split_sentences(text)
        .into_iter()
        .filter(|sentence| {
            let lowered = sentence.to_lowercase();
            markers.iter().any(|m| lowered.contains(m))
        })
        .map(str::to_string)
        .collect()
}

/// Questions, definitions, examples and key points found by pattern.
pub fn extract_structured_content(text: &str) -> StructuredContent {
    let questions = QUESTION
        .find_iter(text)
        .map(|m| m.as_str().trim())
        .filter(|q| q.chars().count() > 10)
        .map(str::to_string)
        .collect();

    // "e.g." is cut apart by sentence splitting, so it is matched separately
    let mut examples = sentences_with(text, EXAMPLE_MARKERS);
    examples.extend(eg_clauses(text));

    StructuredContent {
        questions,
        definitions: sentences_with(text, DEFINITION_MARKERS),
        examples,
        key_points: sentences_with(text, KEY_POINT_MARKERS),
    }
}

/// Text following each `e.g.` up to the next sentence end.
fn eg_clauses(text: &str) -> Vec<String> {
    EG_CLAUSE
        .captures_iter(text)
        .map(|caps| caps[1].trim().to_string())
        .filter(|clause| !clause.is_empty())
        .map(|clause| format!("e.g. {clause}"))
        .collect()
}

/// `min(1, total region chars / 100)`, rounded to two decimals.
pub fn extraction_confidence(regions: &[TextRegion]) -> f64 {
    if regions.is_empty() {
        return 0.0;
    }
    let total: usize = regions.iter().map(|r| r.text.chars().count()).sum();
    let ratio = (total as f64 / 100.0).min(1.0);
    (ratio * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_language() {
        assert_eq!(detect_language("पौधे भोजन बनाते हैं"), DetectedLanguage::Hindi);
        assert_eq!(detect_language("Plants make food"), DetectedLanguage::English);
        assert_eq!(detect_language("पौधे भोजन plants"), DetectedLanguage::Hindi);
        assert_eq!(detect_language("12 + 7 = 19"), DetectedLanguage::Mixed);
        assert_eq!(detect_language(""), DetectedLanguage::Mixed);
    }

    #[test]
    fn test_clean_extracted_text() {
        assert_eq!(
            clean_extracted_text("  Plants\n\n need   *water* & air!  "),
            "Plants need water  air!"
        );
        assert_eq!(clean_extracted_text("पानी   ज़रूरी है।"), "पानी ज़रूरी है।");
        assert_eq!(clean_extracted_text("(a) 3-4"), "(a) 3-4");
    }

    #[test]
    fn test_questions_extracted() {
        let text = "Plants are green. What do plants need? Why? पौधे क्या खाते हैं?";
        let structured = extract_structured_content(text);
        assert_eq!(
            structured.questions,
            vec!["What do plants need?", "पौधे क्या खाते हैं?"]
        );
    }

    #[test]
    fn test_definitions_examples_key_points() {
        let text = "The process is called photosynthesis. For example, a mango tree makes food. \
                    Remember to water plants daily. Roots hold soil, e.g. grass roots.";
        let structured = extract_structured_content(text);

        assert_eq!(structured.definitions, vec!["The process is called photosynthesis"]);
        assert!(structured
            .examples
            .contains(&"For example, a mango tree makes food".to_string()));
        assert!(structured.examples.contains(&"e.g. grass roots".to_string()));
        assert_eq!(structured.key_points, vec!["Remember to water plants daily"]);
    }

    #[test]
    fn test_extraction_confidence() {
        assert_eq!(extraction_confidence(&[]), 0.0);
        assert_eq!(
            extraction_confidence(&[TextRegion::new("a".repeat(25)), TextRegion::new("b".repeat(12))]),
            0.37
        );
        assert_eq!(extraction_confidence(&[TextRegion::new("x".repeat(250))]), 1.0);
    }

    #[test]
    fn test_from_ocr() {
        let content = ExtractedContent::from_ocr(
            "What is addition?\n2 + 3 = 5",
            vec![TextRegion::new("What"), TextRegion::new("addition")],
        )
        .unwrap();

        assert_eq!(content.text, "What is addition? 2  3  5");
        assert_eq!(content.language, DetectedLanguage::English);
        assert_eq!(content.confidence, 0.12);
        assert_eq!(content.structured.questions, vec!["What is addition?"]);
    }

    #[test]
    fn test_from_ocr_empty() {
        assert!(matches!(
            ExtractedContent::from_ocr("   \n", vec![]),
            Err(CurriculumError::NoTextDetected)
        ));
        assert!(matches!(
            ExtractedContent::from_ocr("***", vec![]),
            Err(CurriculumError::NoTextDetected)
        ));
    }
}
