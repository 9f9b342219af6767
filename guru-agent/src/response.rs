//! Coordinator response types.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use pedagogy::WorksheetPacket;
use serde::Serialize;

use crate::agents::{
    Analogy, EducationalGame, Explanation, FollowUpQuestions, LessonPlan, Story, Translation,
    UnderstandingCheck, VisualAid,
};
use crate::capability::Capability;
use crate::intent::Intent;

/// Outcome of a teacher request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    /// Every planned agent answered
    Fulfilled,
    /// Some planned agents were skipped
    Partial,
    /// No agent could answer
    Declined,
}

impl ResponseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fulfilled => "fulfilled",
            Self::Partial => "partial",
            Self::Declined => "declined",
        }
    }
}

/// What one agent produced.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentOutput {
    Story(Story),
    Analogy(Analogy),
    Translation(Translation),
    Explanation(Explanation),
    FollowUp(FollowUpQuestions),
    UnderstandingCheck(UnderstandingCheck),
    Visual(VisualAid),
    LessonPlan(LessonPlan),
    Game(EducationalGame),
    Worksheets(WorksheetPacket),
}

impl AgentOutput {
    /// Best plain-text rendering, used for chat history.
    pub fn summary(&self) -> String {
        match self {
            Self::Story(s) => s.content.clone(),
            Self::Analogy(a) => a.content.clone(),
            Self::Translation(t) => t.content.clone(),
            Self::Explanation(e) => e.explanation.clone(),
            Self::FollowUp(f) => f.questions.join("\n"),
            Self::UnderstandingCheck(c) => c.questions.join("\n"),
            Self::Visual(v) => {
                let mut text = v.plan.title.clone();
                for (i, step) in v.plan.steps.iter().enumerate() {
                    text.push_str(&format!("\n{}. {step}", i + 1));
                }
                text
            }
            Self::LessonPlan(p) => p
                .lesson_plan
                .get("overview")
                .and_then(|o| o.as_str())
                .map(str::to_string)
                .unwrap_or_else(|| format!("{}-day lesson plan", p.duration_days)),
            Self::Game(g) => g
                .game
                .get("name")
                .and_then(|n| n.as_str())
                .unwrap_or(&g.concept)
                .to_string(),
            Self::Worksheets(p) => p
                .worksheets
                .values()
                .map(|w| w.title.as_str())
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

/// An agent the coordinator planned but did not run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedAgent {
    pub capability: Capability,
    pub reason: String,
}

/// Timing for one request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProcessingStats {
    pub agents_invoked: u32,
    pub processing_time_ms: u64,
}

/// Combined answer to a teacher request.
#[derive(Debug, Clone, Serialize)]
pub struct TeacherResponse {
    pub response_id: String,
    pub request_id: String,
    pub status: ResponseStatus,
    pub intent: Intent,
    /// Keyed by output name: `content`, `explanation`, `visual`,
    /// `assessment`, `worksheets`
    pub responses: BTreeMap<String, AgentOutput>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedAgent>,
    pub stats: ProcessingStats,
    pub responded_at: DateTime<Utc>,
}

impl TeacherResponse {
    pub fn new(
        request_id: impl Into<String>,
        intent: Intent,
        responses: BTreeMap<String, AgentOutput>,
        skipped: Vec<SkippedAgent>,
        stats: ProcessingStats,
    ) -> Self {
        let status = if responses.is_empty() {
            ResponseStatus::Declined
        } else if skipped.is_empty() {
            ResponseStatus::Fulfilled
        } else {
            ResponseStatus::Partial
        };

        Self {
            response_id: uuid::Uuid::new_v4().to_string(),
            request_id: request_id.into(),
            status,
            intent,
            responses,
            skipped,
            stats,
            responded_at: Utc::now(),
        }
    }

    /// Output of the primary capability, if it ran.
    pub fn primary(&self) -> Option<&AgentOutput> {
        self.responses.get(output_key(self.intent.primary))
    }

    /// Plain text for chat: every output's summary, primary first.
    pub fn summary(&self) -> String {
        if self.responses.is_empty() {
            return self
                .skipped
                .iter()
                .map(|s| format!("{} unavailable: {}", s.capability, s.reason))
                .collect::<Vec<_>>()
                .join("\n");
        }

        let primary_key = output_key(self.intent.primary);
        let primary = self.responses.get(primary_key).map(AgentOutput::summary);
        let rest = self
            .responses
            .iter()
            .filter(|(key, _)| key.as_str() != primary_key)
            .map(|(_, output)| output.summary());

        primary
            .into_iter()
            .chain(rest)
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// Key an agent's output is stored under.
pub fn output_key(capability: Capability) -> &'static str {
    match capability {
        Capability::ContentGeneration => "content",
        Capability::KnowledgeExplanation => "explanation",
        Capability::VisualAid => "visual",
        Capability::AssessmentPlanning => "assessment",
        Capability::WorksheetGeneration => "worksheets",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pedagogy::GradeLevel;

    fn explanation(text: &str) -> AgentOutput {
        AgentOutput::Explanation(Explanation {
            explanation: text.to_string(),
            language: "english".to_string(),
            grade_level: GradeLevel::Grade5,
            question: "q".to_string(),
            includes_analogy: false,
        })
    }

    #[test]
    fn test_status_from_outputs() {
        let intent = Intent::new(Capability::KnowledgeExplanation);
        let mut responses = BTreeMap::new();

        let declined = TeacherResponse::new(
            "r1",
            intent.clone(),
            BTreeMap::new(),
            vec![SkippedAgent {
                capability: Capability::KnowledgeExplanation,
                reason: "capability disabled".to_string(),
            }],
            ProcessingStats::default(),
        );
        assert_eq!(declined.status, ResponseStatus::Declined);
        assert!(declined.summary().contains("knowledge-explanation unavailable"));

        responses.insert("explanation".to_string(), explanation("Rain falls."));
        let fulfilled = TeacherResponse::new(
            "r2",
            intent,
            responses,
            Vec::new(),
            ProcessingStats::default(),
        );
        assert_eq!(fulfilled.status, ResponseStatus::Fulfilled);
        assert_eq!(fulfilled.summary(), "Rain falls.");
        assert!(fulfilled.primary().is_some());
    }

    #[test]
    fn test_output_serialized_with_type_tag() {
        let value = serde_json::to_value(explanation("x")).unwrap();
        assert_eq!(value["type"], "explanation");
        assert_eq!(value["explanation"], "x");
    }
}
