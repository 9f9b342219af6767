//! Teacher request types.

use chrono::{DateTime, Utc};
use pedagogy::GradeLevel;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Grade used when a request names none.
pub const DEFAULT_GRADE: GradeLevel = GradeLevel::Grade5;

/// Language used when a request names none.
pub const DEFAULT_LANGUAGE: &str = "english";

/// A natural-language request from a teacher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeacherRequest {
    /// Unique request identifier
    pub request_id: String,
    /// What the teacher asked for
    pub message: String,
    /// Who is making the request
    pub requester_id: String,
    /// Classroom context
    #[serde(default)]
    pub context: RequestContext,
    /// When the request was made
    pub requested_at: DateTime<Utc>,
}

impl TeacherRequest {
    pub fn new(requester_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            request_id: uuid::Uuid::new_v4().to_string(),
            message: message.into(),
            requester_id: requester_id.into(),
            context: RequestContext::default(),
            requested_at: Utc::now(),
        }
    }

    /// Reuse an existing id, e.g. the HTTP request id.
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = request_id.into();
        self
    }

    pub fn with_context(mut self, context: RequestContext) -> Self {
        self.context = context;
        self
    }

    /// Requested language, `english` by default.
    pub fn language(&self) -> &str {
        self.context
            .language
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .unwrap_or(DEFAULT_LANGUAGE)
    }

    /// Requested grades, grade 5 by default.
    pub fn grades(&self) -> Vec<GradeLevel> {
        if self.context.grade_levels.is_empty() {
            vec![DEFAULT_GRADE]
        } else {
            self.context.grade_levels.clone()
        }
    }

    /// First requested grade; single-grade agents use this one.
    pub fn primary_grade(&self) -> GradeLevel {
        self.context
            .grade_levels
            .first()
            .copied()
            .unwrap_or(DEFAULT_GRADE)
    }
}

/// Classroom context sent along with a request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequestContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Grades as `5`, `"5"` or `"grade_5"`
    #[serde(
        default,
        deserialize_with = "deserialize_grades",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub grade_levels: Vec<GradeLevel>,
    /// Region key for cultural grounding, e.g. `maharashtra_rural`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cultural_context: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    /// Explicit task such as `game` or `analogy`, overriding intent detection
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task: Option<String>,
    /// Anything else the client sent
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RequestContext {
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn with_grades(mut self, grades: impl IntoIterator<Item = GradeLevel>) -> Self {
        self.grade_levels = grades.into_iter().collect();
        self
    }

    pub fn with_cultural_context(mut self, region: impl Into<String>) -> Self {
        self.cultural_context = Some(region.into());
        self
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn with_task(mut self, task: impl Into<String>) -> Self {
        self.task = Some(task.into());
        self
    }

    /// String field the client sent outside the known ones, e.g. `explanation`.
    pub fn extra_str(&self, key: &str) -> Option<&str> {
        self.extra
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// Grades as numbers, `"5"` or `"grade_5"`; `null` means none.
pub fn deserialize_grades<'de, D>(deserializer: D) -> Result<Vec<GradeLevel>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default();
    raw.into_iter()
        .map(|value| match value {
            Value::Number(n) => n
                .as_u64()
                .and_then(|n| u8::try_from(n).ok())
                .and_then(GradeLevel::from_number)
                .ok_or_else(|| serde::de::Error::custom(format!("unknown grade: {n}"))),
            Value::String(s) => s.parse().map_err(serde::de::Error::custom),
            other => Err(serde::de::Error::custom(format!("unknown grade: {other}"))),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_defaults() {
        let request = TeacherRequest::new("teacher-1", "Explain rain");
        assert_eq!(request.language(), "english");
        assert_eq!(request.grades(), vec![GradeLevel::Grade5]);
        assert_eq!(request.primary_grade(), GradeLevel::Grade5);
    }

    #[test]
    fn test_request_builder() {
        let request = TeacherRequest::new("teacher-1", "Story about seeds")
            .with_request_id("req-9")
            .with_context(
                RequestContext::default()
                    .with_language("hindi")
                    .with_grades([GradeLevel::Grade3, GradeLevel::Grade1]),
            );
        assert_eq!(request.request_id, "req-9");
        assert_eq!(request.language(), "hindi");
        assert_eq!(request.primary_grade(), GradeLevel::Grade3);
    }

    #[test]
    fn test_context_grade_spellings() {
        let context: RequestContext = serde_json::from_value(json!({
            "language": "marathi",
            "grade_levels": [3, "4", "grade_6"],
            "cultural_context": "maharashtra_rural",
            "school": "ZP Shala"
        }))
        .unwrap();

        assert_eq!(
            context.grade_levels,
            vec![GradeLevel::Grade3, GradeLevel::Grade4, GradeLevel::Grade6]
        );
        assert_eq!(context.extra["school"], "ZP Shala");
        assert_eq!(context.extra_str("school"), Some("ZP Shala"));
        assert!(context.task.is_none());
    }

    #[test]
    fn test_context_rejects_bad_grade() {
        assert!(serde_json::from_value::<RequestContext>(json!({"grade_levels": [12]})).is_err());
        assert!(serde_json::from_value::<RequestContext>(json!({"grade_levels": [true]})).is_err());
    }

    #[test]
    fn test_blank_language_falls_back() {
        let request = TeacherRequest::new("t", "x")
            .with_context(RequestContext::default().with_language("  "));
        assert_eq!(request.language(), "english");
    }
}
