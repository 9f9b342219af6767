//! Teaching capability definitions.

use serde::{Deserialize, Serialize};

/// Sampling settings for one capability's prompts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationSettings {
    pub temperature: f32,
    pub top_p: f32,
    pub max_tokens: u32,
}

/// What a teaching agent can do.
///
/// Each capability is served by one agent and selected by one intent keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Capability {
    /// Stories, analogies and translations grounded in local culture
    ContentGeneration,
    /// Simple explanations of concepts
    KnowledgeExplanation,
    /// Blackboard diagrams and charts
    VisualAid,
    /// Lesson plans, games and reading assessment
    AssessmentPlanning,
    /// Differentiated worksheets from textbook pages
    WorksheetGeneration,
}

impl Capability {
    /// Keyword the intent classifier uses for this capability.
    pub fn intent(&self) -> &'static str {
        match self {
            Self::ContentGeneration => "content",
            Self::KnowledgeExplanation => "knowledge",
            Self::VisualAid => "visual",
            Self::AssessmentPlanning => "assessment",
            Self::WorksheetGeneration => "worksheet",
        }
    }

    /// Capability for an intent keyword or agent name.
    ///
    /// Accepts `knowledge`, `knowledge_agent`, `knowledge-explanation` and
    /// specialist names such as `knowledge_base`.
    pub fn from_intent(value: &str) -> Option<Self> {
        let key = value.trim().to_lowercase().replace(['-', ' '], "_");
        let key = key.strip_suffix("_agent").unwrap_or(&key);
        Self::all().into_iter().find(|c| {
            c.intent() == key
                || c.as_str().replace('-', "_") == key
                || c.specialist_name() == key
        })
    }

    /// Specialist name used in model-produced routing plans.
    pub fn specialist_name(&self) -> &'static str {
        match self {
            Self::ContentGeneration => "content_generator",
            Self::KnowledgeExplanation => "knowledge_base",
            Self::VisualAid => "visual_aid_generator",
            Self::AssessmentPlanning => "assessment_planner",
            Self::WorksheetGeneration => "worksheet_processor",
        }
    }

    /// Name of the agent serving this capability.
    pub fn agent_name(&self) -> &'static str {
        match self {
            Self::ContentGeneration => "content_agent",
            Self::KnowledgeExplanation => "knowledge_agent",
            Self::VisualAid => "visual_agent",
            Self::AssessmentPlanning => "assessment_agent",
            Self::WorksheetGeneration => "worksheet_agent",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ContentGeneration => "content-generation",
            Self::KnowledgeExplanation => "knowledge-explanation",
            Self::VisualAid => "visual-aid",
            Self::AssessmentPlanning => "assessment-planning",
            Self::WorksheetGeneration => "worksheet-generation",
        }
    }

    /// Human-readable description.
    pub fn description(&self) -> &'static str {
        match self {
            Self::ContentGeneration => {
                "Create culturally relevant stories, analogies and translations"
            }
            Self::KnowledgeExplanation => "Explain concepts simply with local analogies",
            Self::VisualAid => "Design diagrams and charts that can be drawn on a blackboard",
            Self::AssessmentPlanning => "Plan lessons, design games and assess reading",
            Self::WorksheetGeneration => {
                "Turn textbook pages into differentiated multi-grade worksheets"
            }
        }
    }

    /// Estimated processing time in milliseconds.
    pub fn estimated_time_ms(&self) -> u64 {
        match self {
            Self::VisualAid => 4000,
            Self::KnowledgeExplanation => 5000,
            Self::ContentGeneration => 6000,
            Self::AssessmentPlanning => 8000,
            Self::WorksheetGeneration => 10000,
        }
    }

    /// Sampling settings for this capability's prompts.
    pub fn generation_settings(&self) -> GenerationSettings {
        let (temperature, max_tokens) = match self {
            Self::ContentGeneration => (0.7, 2048),
            Self::KnowledgeExplanation => (0.3, 1024),
            Self::VisualAid => (0.2, 1024),
            Self::AssessmentPlanning => (0.4, 2048),
            Self::WorksheetGeneration => (0.4, 1200),
        };
        GenerationSettings {
            temperature,
            top_p: 0.8,
            max_tokens,
        }
    }

    /// All capabilities.
    pub fn all() -> Vec<Self> {
        vec![
            Self::ContentGeneration,
            Self::KnowledgeExplanation,
            Self::VisualAid,
            Self::AssessmentPlanning,
            Self::WorksheetGeneration,
        ]
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
