//! Request intent detection.
//!
//! The model is asked for a JSON routing plan. Its reply is only ever read as
//! data; when it cannot be read, or no model is reachable, a keyword
//! classifier picks the intent instead.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::agents::{parse_json_reply, AgentContext};
use crate::capability::{Capability, GenerationSettings};
use crate::prompts;

const ROUTER_SETTINGS: GenerationSettings = GenerationSettings {
    temperature: 0.4,
    top_p: 0.8,
    max_tokens: 512,
};

/// Keyword patterns in priority order. Knowledge is the fallback.
static KEYWORDS: LazyLock<Vec<(Capability, Regex)>> = LazyLock::new(|| {
    vec![
        (
            Capability::WorksheetGeneration,
            Regex::new(r"(?i)\b(worksheets?|exercise sheets?)\b|वर्कशीट|अभ्यास पत्र").unwrap(),
        ),
        (
            Capability::VisualAid,
            Regex::new(r"(?i)\b(diagrams?|draw(ing)?|charts?|pictures?|graphs?|sketch)\b|चित्र|आरेख")
                .unwrap(),
        ),
        (
            Capability::AssessmentPlanning,
            Regex::new(
                r"(?i)\b(lesson plans?|plan|assess(ment)?|tests?|quiz(zes)?|games?|evaluate)\b|पाठ योजना|मूल्यांकन|खेल",
            )
            .unwrap(),
        ),
        (
            Capability::ContentGeneration,
            Regex::new(r"(?i)\b(story|stories|poems?|analog(y|ies)|examples?|translate)\b|कहानी|कविता")
                .unwrap(),
        ),
    ]
});

/// Narrower operations, checked only against the chosen capability.
static TASK_KEYWORDS: LazyLock<Vec<(Task, Regex)>> = LazyLock::new(|| {
    vec![
        (Task::Game, Regex::new(r"(?i)\bgames?\b|खेल").unwrap()),
        (Task::Chart, Regex::new(r"(?i)\b(charts?|graphs?)\b").unwrap()),
        (Task::Analogy, Regex::new(r"(?i)\banalog(y|ies)\b").unwrap()),
        (Task::Translate, Regex::new(r"(?i)\btranslate\b|अनुवाद").unwrap()),
        (
            Task::CheckUnderstanding,
            Regex::new(r"(?i)\b(check (their |the )?understanding|comprehension questions?)\b")
                .unwrap(),
        ),
        (Task::FollowUp, Regex::new(r"(?i)\bfollow[- ]?up\b").unwrap()),
    ]
});

/// A specific operation within a capability, instead of its default one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Task {
    /// Content: analogies instead of a story
    Analogy,
    /// Content: translate the message itself
    Translate,
    /// Knowledge: progressively harder questions
    FollowUp,
    /// Knowledge: questions checking an explanation landed
    CheckUnderstanding,
    /// Visual: a chart from data instead of a diagram
    Chart,
    /// Assessment: a classroom game instead of a lesson plan
    Game,
}

impl Task {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Analogy => "analogy",
            Self::Translate => "translate",
            Self::FollowUp => "follow_up",
            Self::CheckUnderstanding => "check_understanding",
            Self::Chart => "chart",
            Self::Game => "game",
        }
    }

    /// Lenient name lookup: case, spaces and dashes are ignored.
    pub fn parse(name: &str) -> Option<Self> {
        let normalized = name.trim().to_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "analogy" | "analogies" => Some(Self::Analogy),
            "translate" | "translation" => Some(Self::Translate),
            "follow_up" | "followup" | "follow_up_questions" => Some(Self::FollowUp),
            "check_understanding" | "understanding" => Some(Self::CheckUnderstanding),
            "chart" | "graph" => Some(Self::Chart),
            "game" | "educational_game" => Some(Self::Game),
            _ => None,
        }
    }

    pub fn capability(&self) -> Capability {
        match self {
            Self::Analogy | Self::Translate => Capability::ContentGeneration,
            Self::FollowUp | Self::CheckUnderstanding => Capability::KnowledgeExplanation,
            Self::Chart => Capability::VisualAid,
            Self::Game => Capability::AssessmentPlanning,
        }
    }
}

impl std::fmt::Display for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How an intent was decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntentSource {
    Model,
    Keywords,
}

/// Routing plan for one teacher request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Intent {
    pub primary: Capability,
    /// Extra capabilities to invoke after the primary, without duplicates
    pub required: Vec<Capability>,
    pub parameters: Map<String, Value>,
    pub source: IntentSource,
}

#[derive(Debug, Deserialize)]
struct RoutingPlan {
    primary_intent: String,
    #[serde(default)]
    required_agents: Vec<Value>,
    #[serde(default)]
    parameters: Value,
}

impl Intent {
    pub fn new(primary: Capability) -> Self {
        Self {
            primary,
            required: Vec::new(),
            parameters: Map::new(),
            source: IntentSource::Keywords,
        }
    }

    /// Read a routing plan from a model reply.
    ///
    /// Returns `None` when the reply is not a plan or names an unknown
    /// primary intent. Unknown required agents are dropped with a warning.
    pub fn from_reply(reply: &str) -> Option<Self> {
        let value = parse_json_reply(reply)?;
        let plan: RoutingPlan = serde_json::from_value(value).ok()?;

        let Some(primary) = Capability::from_intent(&plan.primary_intent) else {
            warn!(intent = %plan.primary_intent, "Unknown primary intent in routing plan");
            return None;
        };

        let mut required = Vec::new();
        for agent in plan.required_agents.iter().filter_map(Value::as_str) {
            match Capability::from_intent(agent) {
                Some(cap) if cap != primary && !required.contains(&cap) => required.push(cap),
                Some(_) => {}
                None => warn!(agent, "Ignoring unknown agent in routing plan"),
            }
        }

        let parameters = match plan.parameters {
            Value::Object(map) => map,
            _ => Map::new(),
        };

        Some(Self {
            primary,
            required,
            parameters,
            source: IntentSource::Model,
        })
    }

    /// Keyword-only classification.
    pub fn classify(request: &str) -> Self {
        let primary = KEYWORDS
            .iter()
            .find(|(_, pattern)| pattern.is_match(request))
            .map(|(cap, _)| *cap)
            .unwrap_or(Capability::KnowledgeExplanation);
        let mut intent = Self::new(primary);
        if let Some((task, _)) = TASK_KEYWORDS
            .iter()
            .find(|(task, pattern)| task.capability() == primary && pattern.is_match(request))
        {
            intent.set_task(*task);
        }
        intent
    }

    /// Force a task, making its capability the primary one.
    pub fn with_task(mut self, task: Task) -> Self {
        let capability = task.capability();
        if self.primary != capability {
            self.required.retain(|c| *c != capability);
            self.primary = capability;
        }
        self.set_task(task);
        self
    }

    fn set_task(&mut self, task: Task) {
        self.parameters
            .insert("task".to_string(), Value::String(task.as_str().to_string()));
    }

    /// Task for `capability`, if the plan names one that belongs to it.
    pub fn task_for(&self, capability: Capability) -> Option<Task> {
        self.parameter_str("task")
            .and_then(Task::parse)
            .filter(|task| task.capability() == capability)
    }

    /// Ask the model for a plan, falling back to keywords.
    pub async fn detect(ctx: &AgentContext, request: &str) -> Self {
        let reply = ctx
            .generate_with(
                prompts::COORDINATOR_SYSTEM_PROMPT,
                ROUTER_SETTINGS,
                prompts::intent_prompt(request),
                true,
            )
            .await;

        match reply {
            Ok(reply) => match Self::from_reply(&reply) {
                Some(intent) => {
                    debug!(primary = %intent.primary, required = intent.required.len(), "Intent from model");
                    intent
                }
                None => {
                    warn!("Routing plan unreadable, classifying by keywords");
                    Self::classify(request)
                }
            },
            Err(e) => {
                debug!(error = %e, "Intent model unavailable, classifying by keywords");
                Self::classify(request)
            }
        }
    }

    pub fn parameter_str(&self, key: &str) -> Option<&str> {
        self.parameters
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Subject named in the plan, if any.
    pub fn subject(&self) -> Option<&str> {
        self.parameter_str("subject")
    }

    /// Duration in days from `duration` or `duration_days`, as a number or
    /// a string like `"5 days"`.
    pub fn duration_days(&self) -> Option<u32> {
        ["duration", "duration_days"].iter().find_map(|key| {
            match self.parameters.get(*key)? {
                Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
                Value::String(s) => s.split_whitespace().next()?.parse().ok(),
                _ => None,
            }
        })
    }

    /// Primary first, then the required ones.
    pub fn capabilities(&self) -> Vec<Capability> {
        std::iter::once(self.primary)
            .chain(self.required.iter().copied())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::test_support::context;
    use crate::backend::MockBackend;
    use std::sync::Arc;

    #[test]
    fn test_from_reply_fenced() {
        let reply = "```json\n{\"primary_intent\": \"assessment\", \"required_agents\": \
                     [\"knowledge_base\", \"assessment_planner\", \"weather_bot\", 7], \
                     \"parameters\": {\"subject\": \"science\", \"duration\": 3}}\n```";
        let intent = Intent::from_reply(reply).unwrap();

        assert_eq!(intent.primary, Capability::AssessmentPlanning);
        assert_eq!(intent.required, vec![Capability::KnowledgeExplanation]);
        assert_eq!(intent.subject(), Some("science"));
        assert_eq!(intent.duration_days(), Some(3));
        assert_eq!(intent.source, IntentSource::Model);
    }

    #[test]
    fn test_from_reply_rejects_garbage() {
        assert!(Intent::from_reply("__import__('os').system('rm -rf /')").is_none());
        assert!(Intent::from_reply(r#"{"primary_intent": "weather"}"#).is_none());
        assert!(Intent::from_reply(r#"{"required_agents": []}"#).is_none());
    }

    #[test]
    fn test_duration_from_string() {
        let intent =
            Intent::from_reply(r#"{"primary_intent": "assessment", "parameters": {"duration_days": "4 days"}}"#)
                .unwrap();
        assert_eq!(intent.duration_days(), Some(4));
        assert_eq!(intent.subject(), None);
    }

    #[test]
    fn test_classify_keywords() {
        assert_eq!(
            Intent::classify("Make a worksheet on fractions").primary,
            Capability::WorksheetGeneration
        );
        assert_eq!(
            Intent::classify("Draw a diagram of the water cycle").primary,
            Capability::VisualAid
        );
        assert_eq!(
            Intent::classify("Create a lesson plan for next week").primary,
            Capability::AssessmentPlanning
        );
        assert_eq!(
            Intent::classify("बारिश के बारे में एक कहानी सुनाओ").primary,
            Capability::ContentGeneration
        );
        assert_eq!(
            Intent::classify("Why is the sky blue?").primary,
            Capability::KnowledgeExplanation
        );
    }

    #[test]
    fn test_classify_tasks() {
        let intent = Intent::classify("Suggest a game to practise fractions");
        assert_eq!(intent.primary, Capability::AssessmentPlanning);
        assert_eq!(intent.task_for(Capability::AssessmentPlanning), Some(Task::Game));

        let intent = Intent::classify("Give an analogy for electricity");
        assert_eq!(intent.task_for(Capability::ContentGeneration), Some(Task::Analogy));

        let intent = Intent::classify("Follow-up questions on the water cycle");
        assert_eq!(intent.primary, Capability::KnowledgeExplanation);
        assert_eq!(intent.task_for(Capability::KnowledgeExplanation), Some(Task::FollowUp));

        let intent = Intent::classify("Create a lesson plan for next week");
        assert_eq!(intent.task_for(Capability::AssessmentPlanning), None);
    }

    #[test]
    fn test_task_parse_and_override() {
        assert_eq!(Task::parse("Follow-Up"), Some(Task::FollowUp));
        assert_eq!(Task::parse("check understanding"), Some(Task::CheckUnderstanding));
        assert_eq!(Task::parse("educational_game"), Some(Task::Game));
        assert_eq!(Task::parse("dance"), None);

        let mut intent = Intent::new(Capability::KnowledgeExplanation);
        intent.required.push(Capability::AssessmentPlanning);
        intent.required.push(Capability::VisualAid);
        let intent = intent.with_task(Task::Game);

        assert_eq!(intent.primary, Capability::AssessmentPlanning);
        assert_eq!(intent.required, vec![Capability::VisualAid]);
        assert_eq!(intent.parameter_str("task"), Some("game"));
        assert_eq!(intent.task_for(Capability::VisualAid), None);
    }

    #[test]
    fn test_model_task_for_other_capability_ignored() {
        let intent = Intent::from_reply(
            r#"{"primary_intent": "knowledge", "parameters": {"task": "game"}}"#,
        )
        .unwrap();
        assert_eq!(intent.task_for(Capability::KnowledgeExplanation), None);
    }

    #[tokio::test]
    async fn test_detect_uses_model_plan() {
        let backend = Arc::new(
            MockBackend::default().with_response(r#"{"primary_intent": "visual", "required_agents": []}"#),
        );
        let intent = Intent::detect(&context(backend.clone()), "show me the moon").await;
        assert_eq!(intent.primary, Capability::VisualAid);

        let request = backend.last_request().unwrap();
        assert_eq!(request.temperature, Some(0.4));
        assert_eq!(request.system_prompt.as_deref(), Some(prompts::COORDINATOR_SYSTEM_PROMPT));
    }

    #[tokio::test]
    async fn test_detect_falls_back_to_keywords() {
        let backend = Arc::new(MockBackend::default().with_response("I think it's a story"));
        let intent = Intent::detect(&context(backend), "Tell a story about rain").await;
        assert_eq!(intent.primary, Capability::ContentGeneration);
        assert_eq!(intent.source, IntentSource::Keywords);

        let offline = Arc::new(MockBackend::default().with_available(false));
        let intent = Intent::detect(&context(offline), "Explain gravity").await;
        assert_eq!(intent.primary, Capability::KnowledgeExplanation);
    }
}
