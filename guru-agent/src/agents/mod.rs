//! The five teaching agents.
//!
//! Agents share an [`AgentContext`] holding the LLM backends and the
//! translator. Each agent owns one capability's prompts and sampling
//! settings; the coordinator decides which agent runs.

pub mod assessment;
pub mod content;
pub mod knowledge;
pub mod visual;
pub mod worksheet;

use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::backend::{CompletionRequest, LlmBackend};
use crate::capability::{Capability, GenerationSettings};
use crate::error::AgentError;
use crate::prompts;
use crate::services::{is_english, Translator};

pub use assessment::{AssessmentAgent, EducationalGame, LessonPlan, ReadingAssessment, ReadingMetrics};
pub use content::{Analogy, ContentAgent, Story, Translation};
pub use knowledge::{Explanation, FollowUpQuestions, KnowledgeAgent, UnderstandingCheck};
pub use visual::{DrawingPlan, VisualAgent, VisualAid};
pub use worksheet::WorksheetAgent;

static CODE_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```(?:json|JSON)?\s*(.*?)\s*```").unwrap());

static LIST_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?:[-*•]|\d+[.)]|Q\d+[.:)])\s*").unwrap());

/// Backends and translator shared by every agent.
#[derive(Clone)]
pub struct AgentContext {
    backends: Vec<Arc<dyn LlmBackend>>,
    translator: Arc<dyn Translator>,
}

impl AgentContext {
    /// Backends are tried in order; the first available one serves each call.
    pub fn new(backends: Vec<Arc<dyn LlmBackend>>, translator: Arc<dyn Translator>) -> Self {
        Self {
            backends,
            translator,
        }
    }

    pub fn translator(&self) -> &Arc<dyn Translator> {
        &self.translator
    }

    /// Whether any backend answers right now.
    pub async fn has_backend(&self) -> bool {
        self.select_backend().await.is_ok()
    }

    async fn select_backend(&self) -> Result<Arc<dyn LlmBackend>, AgentError> {
        for backend in &self.backends {
            if backend.is_available().await {
                return Ok(Arc::clone(backend));
            }
        }
        Err(AgentError::NoBackendAvailable)
    }

    /// Run a prompt with the capability's system prompt and sampling settings.
    pub(crate) async fn generate(
        &self,
        capability: Capability,
        prompt: String,
    ) -> Result<String, AgentError> {
        self.complete(capability, prompt, false).await
    }

    /// Like [`generate`](Self::generate) but asks the backend for JSON.
    pub(crate) async fn generate_json(
        &self,
        capability: Capability,
        prompt: String,
    ) -> Result<String, AgentError> {
        self.complete(capability, prompt, true).await
    }

    async fn complete(
        &self,
        capability: Capability,
        prompt: String,
        json: bool,
    ) -> Result<String, AgentError> {
        self.generate_with(
            prompts::system_prompt(capability),
            capability.generation_settings(),
            prompt,
            json,
        )
        .await
    }

    /// Run a prompt with explicit instructions and sampling settings.
    pub(crate) async fn generate_with(
        &self,
        system: &str,
        settings: GenerationSettings,
        prompt: String,
        json: bool,
    ) -> Result<String, AgentError> {
        let backend = self.select_backend().await?;

        let mut request = CompletionRequest::user(prompt)
            .with_system(system)
            .with_temperature(settings.temperature)
            .with_top_p(settings.top_p)
            .with_max_tokens(settings.max_tokens);
        if json && backend.capabilities().supports_json_mode {
            request = request.with_json_output();
        }

        let response = backend.complete(request).await?;
        debug!(
            backend = backend.id(),
            tokens = response.usage.total(),
            "Completion finished"
        );
        Ok(response.content.trim().to_string())
    }

    /// Translate into `language` unless it is English.
    pub(crate) async fn localize(&self, text: String, language: &str) -> Result<String, AgentError> {
        if is_english(language) || text.trim().is_empty() {
            return Ok(text);
        }
        Ok(self.translator.translate(&text, language).await?)
    }

    /// Translate a batch into `language` unless it is English.
    pub(crate) async fn localize_all(
        &self,
        texts: Vec<String>,
        language: &str,
    ) -> Result<Vec<String>, AgentError> {
        if is_english(language) || texts.is_empty() {
            return Ok(texts);
        }
        let translated = self
            .translator
            .translate_batch(&texts, language, None)
            .await?;
        Ok(translated.into_iter().map(|t| t.text).collect())
    }
}

/// Parse a model reply as JSON, tolerating code fences and surrounding prose.
pub fn parse_json_reply(reply: &str) -> Option<Value> {
    let trimmed = reply.trim();
    if let Ok(value) = serde_json::from_str(trimmed) {
        return Some(value);
    }

    if let Some(inner) = CODE_FENCE.captures(trimmed).and_then(|c| c.get(1)) {
        if let Ok(value) = serde_json::from_str(inner.as_str()) {
            return Some(value);
        }
    }

    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&trimmed[start..=end]).ok()
}

/// Split a list-style reply into items, dropping bullets and numbering.
pub fn reply_lines(reply: &str) -> Vec<String> {
    reply
        .lines()
        .map(|line| LIST_MARKER.replace(line, "").trim().to_string())
        .filter(|line| !line.is_empty())
        .collect()
}

/// Strings from a JSON array field, ignoring anything that is not a string.
pub(crate) fn string_list(value: &Value, key: &str) -> Vec<String> {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockBackend;
    use serde_json::json;

    #[test]
    fn test_parse_json_reply_variants() {
        assert_eq!(parse_json_reply(r#"{"a": 1}"#), Some(json!({"a": 1})));
        assert_eq!(
            parse_json_reply("```json\n{\"a\": 2}\n```"),
            Some(json!({"a": 2}))
        );
        assert_eq!(
            parse_json_reply("Here you go: {\"a\": 3} hope it helps"),
            Some(json!({"a": 3}))
        );
        assert_eq!(parse_json_reply("no json here"), None);
        assert_eq!(parse_json_reply("} backwards {"), None);
    }

    #[test]
    fn test_reply_lines_strips_markers() {
        let lines = reply_lines("1. Why is the sky blue?\n\n- What is rain?\n2) How do clouds form?");
        assert_eq!(
            lines,
            vec!["Why is the sky blue?", "What is rain?", "How do clouds form?"]
        );
    }

    #[tokio::test]
    async fn test_generate_uses_capability_settings() {
        let backend = Arc::new(MockBackend::default().with_response("  answer  "));
        let ctx = test_support::context(backend.clone());

        let reply = ctx
            .generate(Capability::VisualAid, "draw a leaf".to_string())
            .await
            .unwrap();
        assert_eq!(reply, "answer");

        let request = backend.last_request().unwrap();
        assert_eq!(request.temperature, Some(0.2));
        assert_eq!(request.top_p, Some(0.8));
        assert_eq!(
            request.system_prompt.as_deref(),
            Some(prompts::system_prompt(Capability::VisualAid))
        );
    }

    #[tokio::test]
    async fn test_no_backend_available() {
        let backend = Arc::new(MockBackend::default().with_available(false));
        let ctx = test_support::context(backend);
        let err = ctx
            .generate(Capability::ContentGeneration, "x".to_string())
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::NoBackendAvailable));
    }

    #[tokio::test]
    async fn test_localize_skips_english() {
        let ctx = test_support::context(Arc::new(MockBackend::default()));
        assert_eq!(ctx.localize("hi".to_string(), "english").await.unwrap(), "hi");
        assert_eq!(
            ctx.localize("water".to_string(), "hindi").await.unwrap(),
            "[hi] water"
        );
    }
}
