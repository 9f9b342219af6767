//! Lesson plans, classroom games and reading assessment.

use std::sync::Arc;

use pedagogy::{GradeLevel, GradeProfile};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use super::{parse_json_reply, AgentContext};
use crate::capability::Capability;
use crate::error::AgentError;
use crate::prompts;
use crate::services::{language_code, SpeechRecognizer};

const CAPABILITY: Capability = Capability::AssessmentPlanning;

pub const DEFAULT_DURATION_DAYS: u32 = 5;
pub const DEFAULT_GAME_TYPE: &str = "interactive";

#[derive(Debug, Clone, Serialize)]
pub struct LessonPlan {
    pub lesson_plan: Value,
    pub subjects: Vec<String>,
    pub grade_levels: Vec<GradeLevel>,
    pub duration_days: u32,
    pub language: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct EducationalGame {
    pub game: Value,
    pub concept: String,
    pub grade_levels: Vec<GradeLevel>,
    pub game_type: String,
    pub language: String,
}

/// Word-level comparison of what was read against what was expected.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReadingMetrics {
    pub expected_words: usize,
    pub read_words: usize,
    pub matched_words: usize,
    /// Matched over expected, rounded to 2 decimals
    pub accuracy: f64,
    /// Expected words the reader skipped or misread, in text order
    pub missed_words: Vec<String>,
}

impl ReadingMetrics {
    /// Align the two texts word by word (longest common subsequence).
    ///
    /// `None` when there is no expected text to compare against.
    pub fn compare(expected: &str, transcript: &str) -> Option<Self> {
        let expected = normalized_words(expected);
        if expected.is_empty() {
            return None;
        }
        let read = normalized_words(transcript);
        let matched = lcs_matches(&expected, &read);

        let matched_words = matched.iter().filter(|&&m| m).count();
        let missed_words = expected
            .iter()
            .zip(&matched)
            .filter(|(_, m)| !**m)
            .map(|(w, _)| w.clone())
            .collect();
        let accuracy = (matched_words as f64 / expected.len() as f64 * 100.0).round() / 100.0;

        Some(Self {
            expected_words: expected.len(),
            read_words: read.len(),
            matched_words,
            accuracy,
            missed_words,
        })
    }
}

fn normalized_words(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|w| {
            w.trim_matches(|c: char| {
                c.is_ascii_punctuation() || matches!(c, '।' | '॥' | '“' | '”' | '‘' | '’')
            })
            .to_lowercase()
        })
        .filter(|w| !w.is_empty())
        .collect()
}

/// For each expected word, whether it is part of the longest common
/// subsequence with `read`.
fn lcs_matches(expected: &[String], read: &[String]) -> Vec<bool> {
    let (n, m) = (expected.len(), read.len());
    let mut table = vec![vec![0usize; m + 1]; n + 1];
    for i in (0..n).rev() {
        for j in (0..m).rev() {
            table[i][j] = if expected[i] == read[j] {
                table[i + 1][j + 1] + 1
            } else {
                table[i + 1][j].max(table[i][j + 1])
            };
        }
    }

    let mut matched = vec![false; n];
    let (mut i, mut j) = (0, 0);
    while i < n && j < m {
        if expected[i] == read[j] {
            matched[i] = true;
            i += 1;
            j += 1;
        } else if table[i + 1][j] >= table[i][j + 1] {
            i += 1;
        } else {
            j += 1;
        }
    }
    matched
}

#[derive(Debug, Clone, Serialize)]
pub struct ReadingAssessment {
    pub transcript: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<ReadingMetrics>,
    pub feedback: String,
    pub language: String,
    pub grade_level: GradeLevel,
}

#[derive(Clone)]
pub struct AssessmentAgent {
    ctx: AgentContext,
    speech: Arc<dyn SpeechRecognizer>,
}

impl AssessmentAgent {
    pub fn new(ctx: AgentContext, speech: Arc<dyn SpeechRecognizer>) -> Self {
        Self { ctx, speech }
    }

    /// Multi-day plan covering every grade in the room.
    pub async fn create_lesson_plan(
        &self,
        subjects: &[String],
        grades: &[GradeLevel],
        duration_days: u32,
        language: &str,
    ) -> Result<LessonPlan, AgentError> {
        if grades.is_empty() {
            return Err(AgentError::InvalidRequest("no grade levels given".to_string()));
        }
        if duration_days == 0 {
            return Err(AgentError::InvalidRequest("duration must be at least one day".to_string()));
        }
        let subjects = if subjects.is_empty() {
            vec!["general".to_string()]
        } else {
            subjects.to_vec()
        };

        let reply = self
            .ctx
            .generate_json(
                CAPABILITY,
                prompts::lesson_plan_prompt(&subjects, grades, duration_days),
            )
            .await?;
        let plan = parse_json_reply(&reply).unwrap_or_else(|| json!({ "overview": reply }));
        let lesson_plan = self.localize_value(plan, language).await?;

        info!(
            subjects = ?subjects,
            grades = grades.len(),
            duration_days,
            "Lesson plan created"
        );

        Ok(LessonPlan {
            lesson_plan,
            subjects,
            grade_levels: grades.to_vec(),
            duration_days,
            language: language.to_string(),
        })
    }

    pub async fn generate_educational_game(
        &self,
        concept: &str,
        grades: &[GradeLevel],
        game_type: &str,
        language: &str,
    ) -> Result<EducationalGame, AgentError> {
        let concept = concept.trim();
        if concept.is_empty() {
            return Err(AgentError::InvalidRequest("concept is empty".to_string()));
        }
        if grades.is_empty() {
            return Err(AgentError::InvalidRequest("no grade levels given".to_string()));
        }

        let reply = self
            .ctx
            .generate_json(CAPABILITY, prompts::game_prompt(concept, grades, game_type))
            .await?;
        let game = parse_json_reply(&reply).unwrap_or_else(|| json!({ "description": reply }));
        let game = self.localize_value(game, language).await?;

        Ok(EducationalGame {
            game,
            concept: concept.to_string(),
            grade_levels: grades.to_vec(),
            game_type: game_type.to_string(),
            language: language.to_string(),
        })
    }

    /// Transcribe a read-aloud recording, score it against the expected
    /// text when given, and ask the model for feedback.
    pub async fn assess_reading(
        &self,
        audio: &[u8],
        language: &str,
        grade: GradeLevel,
        expected_text: Option<&str>,
    ) -> Result<ReadingAssessment, AgentError> {
        let transcript = self
            .speech
            .transcribe(audio, &speech_language_code(language))
            .await?;
        let metrics = expected_text.and_then(|e| ReadingMetrics::compare(e, &transcript));
        debug!(
            words = transcript.split_whitespace().count(),
            accuracy = metrics.as_ref().map(|m| m.accuracy),
            "Reading transcribed"
        );

        let profile = GradeProfile::for_grade(grade);
        let feedback = self
            .ctx
            .generate(
                CAPABILITY,
                prompts::reading_feedback_prompt(&transcript, expected_text, &profile, language),
            )
            .await?;
        let feedback = self.ctx.localize(feedback, language).await?;

        Ok(ReadingAssessment {
            transcript,
            metrics,
            feedback,
            language: language.to_string(),
            grade_level: grade,
        })
    }

    /// Translate every non-empty string in a JSON document, keeping its shape.
    async fn localize_value(&self, mut value: Value, language: &str) -> Result<Value, AgentError> {
        let mut texts = Vec::new();
        collect_strings(&value, &mut texts);
        let translated = self.ctx.localize_all(texts, language).await?;
        replace_strings(&mut value, &mut translated.into_iter());
        Ok(value)
    }
}

/// BCP-47 code for speech recognition; bare languages default to India.
fn speech_language_code(language: &str) -> String {
    let code = language_code(language);
    if code.contains('-') {
        code
    } else {
        format!("{code}-IN")
    }
}

fn collect_strings(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::String(s) if !s.trim().is_empty() => out.push(s.clone()),
        Value::Array(items) => items.iter().for_each(|v| collect_strings(v, out)),
        Value::Object(map) => map.values().for_each(|v| collect_strings(v, out)),
        _ => {}
    }
}

fn replace_strings(value: &mut Value, translated: &mut impl Iterator<Item = String>) {
    match value {
        Value::String(s) if !s.trim().is_empty() => {
            if let Some(t) = translated.next() {
                *s = t;
            }
        }
        Value::Array(items) => items.iter_mut().for_each(|v| replace_strings(v, translated)),
        Value::Object(map) => map
            .values_mut()
            .for_each(|v| replace_strings(v, translated)),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::test_support::context;
    use crate::backend::MockBackend;
    use crate::services::MockSpeech;

    fn agent(backend: Arc<MockBackend>, transcript: &str) -> AssessmentAgent {
        AssessmentAgent::new(context(backend), Arc::new(MockSpeech::with_transcript(transcript)))
    }

    #[test]
    fn test_reading_metrics_alignment() {
        let metrics =
            ReadingMetrics::compare("The cat sat on the mat.", "the cat sat on mat").unwrap();
        assert_eq!(metrics.expected_words, 6);
        assert_eq!(metrics.read_words, 5);
        assert_eq!(metrics.matched_words, 5);
        assert_eq!(metrics.accuracy, 0.83);
        assert_eq!(metrics.missed_words, vec!["the"]);
    }

    #[test]
    fn test_reading_metrics_devanagari() {
        let metrics = ReadingMetrics::compare("पौधे पानी पीते हैं।", "पौधे पानी पीते हैं").unwrap();
        assert_eq!(metrics.accuracy, 1.0);
        assert!(metrics.missed_words.is_empty());
    }

    #[test]
    fn test_reading_metrics_without_expected() {
        assert!(ReadingMetrics::compare("  ", "anything").is_none());
    }

    #[test]
    fn test_speech_language_code() {
        assert_eq!(speech_language_code("hindi"), "hi-IN");
        assert_eq!(speech_language_code("english"), "en-IN");
        assert_eq!(speech_language_code("en-US"), "en-US");
    }

    #[tokio::test]
    async fn test_lesson_plan_translated_recursively() {
        let backend = Arc::new(MockBackend::default().with_response(
            r#"{"overview": "Plants week", "objectives": ["Name parts"], "days": [{"day": 1, "activities": ["Walk"]}]}"#,
        ));
        let agent = agent(backend.clone(), "");

        let plan = agent
            .create_lesson_plan(&[], &[GradeLevel::Grade2, GradeLevel::Grade5], 5, "hindi")
            .await
            .unwrap();

        assert_eq!(plan.subjects, vec!["general"]);
        assert_eq!(plan.lesson_plan["overview"], "[hi] Plants week");
        assert_eq!(plan.lesson_plan["objectives"][0], "[hi] Name parts");
        assert_eq!(plan.lesson_plan["days"][0]["day"], 1);
        assert_eq!(plan.lesson_plan["days"][0]["activities"][0], "[hi] Walk");
        assert_eq!(backend.last_request().unwrap().temperature, Some(0.4));
    }

    #[tokio::test]
    async fn test_lesson_plan_plain_reply() {
        let backend = Arc::new(MockBackend::default().with_response("Day 1: counting stones"));
        let plan = agent(backend, "")
            .create_lesson_plan(&["math".to_string()], &[GradeLevel::Grade1], 3, "english")
            .await
            .unwrap();
        assert_eq!(plan.lesson_plan, json!({"overview": "Day 1: counting stones"}));
    }

    #[tokio::test]
    async fn test_lesson_plan_validation() {
        let agent = agent(Arc::new(MockBackend::default()), "");
        assert!(agent
            .create_lesson_plan(&[], &[], 5, "english")
            .await
            .is_err());
        assert!(agent
            .create_lesson_plan(&[], &[GradeLevel::Grade1], 0, "english")
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_educational_game() {
        let backend = Arc::new(
            MockBackend::default().with_response(r#"{"name": "Fraction hop", "rules": ["Hop"]}"#),
        );
        let game = agent(backend, "")
            .generate_educational_game("fractions", &[GradeLevel::Grade4], DEFAULT_GAME_TYPE, "english")
            .await
            .unwrap();
        assert_eq!(game.game["name"], "Fraction hop");
        assert_eq!(game.game_type, "interactive");
    }

    #[tokio::test]
    async fn test_assess_reading() {
        let backend = Arc::new(MockBackend::default().with_response("Good reading!"));
        let result = agent(backend, "the sun is hot")
            .assess_reading(b"RIFF", "english", GradeLevel::Grade2, Some("The sun is very hot."))
            .await
            .unwrap();

        assert_eq!(result.transcript, "the sun is hot");
        assert_eq!(result.feedback, "Good reading!");
        let metrics = result.metrics.unwrap();
        assert_eq!(metrics.missed_words, vec!["very"]);
        assert_eq!(metrics.accuracy, 0.8);
    }
}
