//! Subject, complexity and concept detection over extracted text.

use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::extraction::{script_counts, split_sentences};
use crate::types::{ComplexityLevel, GradeLevel, Subject};

const MATH_KEYWORDS: &[&str] = &[
    "addition", "subtraction", "multiply", "divide", "equation", "number", "=", "+", "-", "×",
    "÷",
];
const SCIENCE_KEYWORDS: &[&str] = &[
    "experiment",
    "observation",
    "hypothesis",
    "plant",
    "animal",
    "water",
    "air",
    "energy",
];
const SOCIAL_KEYWORDS: &[&str] = &[
    "history",
    "geography",
    "community",
    "government",
    "culture",
    "society",
    "map",
];

const MATH_CONCEPTS: &[&str] = &[
    "addition",
    "subtraction",
    "multiplication",
    "division",
    "fractions",
    "geometry",
];
const SCIENCE_CONCEPTS: &[&str] = &[
    "plants",
    "animals",
    "water cycle",
    "weather",
    "seasons",
    "food chains",
];

const MAX_KEY_CONCEPTS: usize = 5;

/// Concept -> knowledge it builds on.
const PREREQUISITES: &[(&str, &[&str])] = &[
    ("multiplication", &["addition", "counting"]),
    ("fractions", &["division", "parts_and_wholes"]),
    ("plant_growth", &["living_vs_nonliving", "basic_needs"]),
];

/// Concept -> follow-on topics.
const EXTENSIONS: &[(&str, &[&str])] = &[
    ("addition", &["word_problems", "multi_digit_addition"]),
    ("plants", &["plant_classification", "ecosystem_studies"]),
    ("community", &["local_government", "civic_responsibility"]),
];

/// Kind of question a text already asks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    Factual,
    Analytical,
    Procedural,
}

/// Sentence and vocabulary statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplexityMetrics {
    /// simple, moderate or complex
    pub overall_level: ComplexityLevel,
    /// Words per sentence, one decimal
    pub avg_sentence_length: f64,
    /// Unique words over total words, two decimals
    pub vocabulary_diversity: f64,
    pub total_words: usize,
    pub unique_words: usize,
}

impl ComplexityMetrics {
    pub fn measure(text: &str) -> Self {
        let words: Vec<&str> = text.split_whitespace().collect();
        let sentences = split_sentences(text);
        let unique_words = words.iter().collect::<HashSet<_>>().len();

        let avg_sentence_length = if sentences.is_empty() {
            0.0
        } else {
            words.len() as f64 / sentences.len() as f64
        };
        let vocabulary_diversity = if words.is_empty() {
            0.0
        } else {
            unique_words as f64 / words.len() as f64
        };

        let overall_level = if avg_sentence_length <= 8.0 {
            ComplexityLevel::Simple
        } else if avg_sentence_length <= 15.0 {
            ComplexityLevel::Moderate
        } else {
            ComplexityLevel::Complex
        };

        Self {
            overall_level,
            avg_sentence_length: round_to(avg_sentence_length, 1),
            vocabulary_diversity: round_to(vocabulary_diversity, 2),
            total_words: words.len(),
            unique_words,
        }
    }
}

/// Script mix of a text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageComplexity {
    pub multilingual: bool,
    pub hindi_ratio: f64,
    pub english_ratio: f64,
}

impl LanguageComplexity {
    pub fn measure(text: &str) -> Self {
        let total = text.chars().count();
        if total == 0 {
            return Self {
                multilingual: false,
                hindi_ratio: 0.0,
                english_ratio: 0.0,
            };
        }

        let (devanagari, latin) = script_counts(text);
        let hindi_ratio = devanagari as f64 / total as f64;
        let english_ratio = latin as f64 / total as f64;

        Self {
            multilingual: hindi_ratio > 0.1 && english_ratio > 0.1,
            hindi_ratio: round_to(hindi_ratio, 2),
            english_ratio: round_to(english_ratio, 2),
        }
    }
}

/// Everything the worksheet generator needs to know about a text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentAnalysis {
    pub subject: Subject,
    pub complexity_level: ComplexityLevel,
    pub complexity_metrics: ComplexityMetrics,
    pub key_concepts: Vec<String>,
    pub suggested_grades: Vec<GradeLevel>,
    pub learning_objectives: Vec<String>,
    pub question_types: Vec<QuestionType>,
    pub language_complexity: LanguageComplexity,
    pub prerequisites: Vec<String>,
    pub extension_opportunities: Vec<String>,
    /// Text the analysis was run on
    pub source_text: String,
}

impl ContentAnalysis {
    /// First key concept, or `General`.
    pub fn main_concept(&self) -> &str {
        self.key_concepts
            .first()
            .map(String::as_str)
            .unwrap_or("General")
    }
}

/// Analyze a text. `subject_hint` of `None` means detect the subject.
pub fn analyze_content(text: &str, subject_hint: Option<Subject>) -> ContentAnalysis {
    let subject = subject_hint.unwrap_or_else(|| detect_subject(text));
    let complexity_metrics = ComplexityMetrics::measure(text);
    let key_concepts = key_concepts(text, subject);

    let analysis = ContentAnalysis {
        subject,
        complexity_level: complexity_metrics.overall_level,
        suggested_grades: suggested_grades(complexity_metrics.overall_level),
        learning_objectives: learning_objectives(subject),
        question_types: question_types(text),
        language_complexity: LanguageComplexity::measure(text),
        prerequisites: lookup_related(&key_concepts, PREREQUISITES),
        extension_opportunities: lookup_related(&key_concepts, EXTENSIONS),
        complexity_metrics,
        key_concepts,
        source_text: text.to_string(),
    };

    debug!(
        subject = %analysis.subject,
        complexity = %analysis.complexity_level,
        concepts = ?analysis.key_concepts,
        "Analyzed content"
    );

    analysis
}

fn keyword_score(text: &str, keywords: &[&str]) -> usize {
    keywords.iter().filter(|k| text.contains(*k)).count()
}

/// Subject by keyword score. Ties prefer mathematics, then science.
pub fn detect_subject(text: &str) -> Subject {
    let lowered = text.to_lowercase();
    let math = keyword_score(&lowered, MATH_KEYWORDS);
    let science = keyword_score(&lowered, SCIENCE_KEYWORDS);
    let social = keyword_score(&lowered, SOCIAL_KEYWORDS);

    if math == 0 && science == 0 && social == 0 {
        Subject::General
    } else if math >= science.max(social) {
        Subject::Mathematics
    } else if science >= social {
        Subject::Science
    } else {
        Subject::SocialStudies
    }
}

fn key_concepts(text: &str, subject: Subject) -> Vec<String> {
    let candidates = match subject {
        Subject::Mathematics => MATH_CONCEPTS,
        Subject::Science => SCIENCE_CONCEPTS,
        _ => return Vec::new(),
    };
    let lowered = text.to_lowercase();
    candidates
        .iter()
        .filter(|c| lowered.contains(*c))
        .take(MAX_KEY_CONCEPTS)
        .map(|c| c.to_string())
        .collect()
}

/// Grades a text of this complexity suits.
pub fn suggested_grades(level: ComplexityLevel) -> Vec<GradeLevel> {
    let range = match level {
        ComplexityLevel::VerySimple | ComplexityLevel::Simple => 1..=3,
        ComplexityLevel::Moderate => 3..=5,
        ComplexityLevel::Complex | ComplexityLevel::VeryComplex => 5..=8,
    };
    range.filter_map(GradeLevel::from_number).collect()
}

fn question_types(text: &str) -> Vec<QuestionType> {
    let lowered = text.to_lowercase();
    let has_any = |markers: &[&str]| markers.iter().any(|m| lowered.contains(m));

    let mut types = Vec::new();
    if has_any(&["what", "क्या", "कौन"]) {
        types.push(QuestionType::Factual);
    }
    if has_any(&["why", "क्यों", "कैसे"]) {
        types.push(QuestionType::Analytical);
    }
    if has_any(&["how", "कैसे"]) {
        types.push(QuestionType::Procedural);
    }
    types
}

fn learning_objectives(subject: Subject) -> Vec<String> {
    let objectives: [&str; 3] = match subject {
        Subject::Mathematics => [
            "Understand basic mathematical concepts",
            "Apply problem-solving skills",
            "Use mathematical reasoning",
        ],
        Subject::Science => [
            "Observe natural phenomena",
            "Understand scientific concepts",
            "Develop inquiry skills",
        ],
        _ => [
            "Comprehend written content",
            "Apply knowledge to new situations",
            "Develop critical thinking",
        ],
    };
    objectives.iter().map(|o| o.to_string()).collect()
}

/// Union of the table entries for each concept, sorted and de-duplicated.
fn lookup_related(concepts: &[String], table: &[(&str, &[&str])]) -> Vec<String> {
    let mut related = BTreeSet::new();
    for concept in concepts {
        let key = concept.to_lowercase();
        if let Some((_, items)) = table.iter().find(|(name, _)| *name == key) {
            related.extend(items.iter().map(|s| s.to_string()));
        }
    }
    related.into_iter().collect()
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subject_detection() {
        assert_eq!(detect_subject("Addition of two numbers: 2 + 3"), Subject::Mathematics);
        assert_eq!(
            detect_subject("Plants need water and air to grow"),
            Subject::Science
        );
        assert_eq!(
            detect_subject("The history of our community and its culture"),
            Subject::SocialStudies
        );
        assert_eq!(detect_subject("Once upon a time"), Subject::General);
    }

    #[test]
    fn test_subject_tie_prefers_mathematics() {
        // one math keyword ("number"), one science keyword ("plant")
        assert_eq!(detect_subject("the number of plant"), Subject::Mathematics);
    }

    #[test]
    fn test_complexity_metrics() {
        let metrics = ComplexityMetrics::measure("Plants are green. Plants need water.");
        assert_eq!(metrics.total_words, 6);
        assert_eq!(metrics.unique_words, 5);
        assert_eq!(metrics.avg_sentence_length, 3.0);
        assert_eq!(metrics.vocabulary_diversity, 0.83);
        assert_eq!(metrics.overall_level, ComplexityLevel::Simple);
    }

    #[test]
    fn test_complexity_levels() {
        let moderate = "one two three four five six seven eight nine ten.";
        assert_eq!(
            ComplexityMetrics::measure(moderate).overall_level,
            ComplexityLevel::Moderate
        );

        let complex = "word ".repeat(20);
        assert_eq!(
            ComplexityMetrics::measure(&complex).overall_level,
            ComplexityLevel::Complex
        );

        let empty = ComplexityMetrics::measure("");
        assert_eq!(empty.avg_sentence_length, 0.0);
        assert_eq!(empty.overall_level, ComplexityLevel::Simple);
    }

    #[test]
    fn test_suggested_grades() {
        assert_eq!(
            suggested_grades(ComplexityLevel::Simple),
            vec![GradeLevel::Grade1, GradeLevel::Grade2, GradeLevel::Grade3]
        );
        assert_eq!(suggested_grades(ComplexityLevel::Complex).len(), 4);
    }

    #[test]
    fn test_question_types() {
        assert_eq!(
            question_types("What is a plant? Why is it green?"),
            vec![QuestionType::Factual, QuestionType::Analytical]
        );
        assert_eq!(
            question_types("पौधे कैसे बढ़ते हैं"),
            vec![QuestionType::Analytical, QuestionType::Procedural]
        );
        assert!(question_types("Plants are green").is_empty());
    }

    #[test]
    fn test_language_complexity() {
        let mixed = LanguageComplexity::measure("पौधे plants");
        assert!(mixed.multilingual);

        let english = LanguageComplexity::measure("plants only");
        assert!(!english.multilingual);
        assert_eq!(english.hindi_ratio, 0.0);
    }

    #[test]
    fn test_analyze_content() {
        let analysis = analyze_content(
            "Multiplication is repeated addition. 3 × 4 = 12. Fractions show parts.",
            None,
        );

        assert_eq!(analysis.subject, Subject::Mathematics);
        assert_eq!(
            analysis.key_concepts,
            vec!["addition", "multiplication", "fractions"]
        );
        assert_eq!(
            analysis.prerequisites,
            vec!["addition", "counting", "division", "parts_and_wholes"]
        );
        assert_eq!(
            analysis.extension_opportunities,
            vec!["multi_digit_addition", "word_problems"]
        );
        assert_eq!(analysis.main_concept(), "addition");
        assert_eq!(analysis.learning_objectives[0], "Understand basic mathematical concepts");
    }

    #[test]
    fn test_subject_hint_overrides_detection() {
        let analysis = analyze_content("2 + 2 = 4", Some(Subject::SocialStudies));
        assert_eq!(analysis.subject, Subject::SocialStudies);
        assert!(analysis.key_concepts.is_empty());
        assert_eq!(analysis.main_concept(), "General");
        assert_eq!(analysis.learning_objectives[0], "Comprehend written content");
    }
}
