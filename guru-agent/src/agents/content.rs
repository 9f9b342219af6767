//! Culturally grounded stories, analogies and translations.

use pedagogy::analysis::detect_subject;
use pedagogy::culture::{builtin_analogies, ANALOGY_TEACHING_TIPS, STORY_DISCUSSION_QUESTIONS};
use pedagogy::{CulturalAnalogy, CulturalContext, GradeLevel, GradeProfile, StorySetting};
use serde::Serialize;
use tracing::info;

use super::AgentContext;
use crate::capability::Capability;
use crate::error::AgentError;
use crate::prompts;

const CAPABILITY: Capability = Capability::ContentGeneration;

/// A generated story with the context it was grounded in.
#[derive(Debug, Clone, Serialize)]
pub struct Story {
    pub content: String,
    pub language: String,
    pub topic: String,
    pub grade_level: GradeLevel,
    pub cultural_context: CulturalContext,
    pub setting: StorySetting,
    pub discussion_questions: Vec<String>,
}

/// Analogies for one concept: hand-written ones first, then the model's.
#[derive(Debug, Clone, Serialize)]
pub struct Analogy {
    pub content: String,
    pub language: String,
    pub concept: String,
    pub grade_level: GradeLevel,
    pub cultural_context: CulturalContext,
    pub builtin: Vec<CulturalAnalogy>,
    pub teaching_tips: Vec<String>,
}

/// Teaching material in another language.
#[derive(Debug, Clone, Serialize)]
pub struct Translation {
    pub content: String,
    pub original: String,
    pub language: String,
}

#[derive(Clone)]
pub struct ContentAgent {
    ctx: AgentContext,
}

impl ContentAgent {
    pub fn new(ctx: AgentContext) -> Self {
        Self { ctx }
    }

    /// Write a story about `topic`. `region` selects the cultural context.
    pub async fn generate_story(
        &self,
        topic: &str,
        language: &str,
        grade: GradeLevel,
        region: Option<&str>,
    ) -> Result<Story, AgentError> {
        let topic = require_text(topic, "topic")?;
        let profile = GradeProfile::for_grade(grade);
        let cultural_context = CulturalContext::lookup(region.unwrap_or_default());
        let setting = StorySetting::for_subject(detect_subject(topic));

        let prompt = prompts::story_prompt(topic, &profile, &cultural_context, &setting);
        let story = self.ctx.generate(CAPABILITY, prompt).await?;
        let content = self.ctx.localize(story, language).await?;

        info!(topic, region = %cultural_context.region, "Story generated");

        Ok(Story {
            content,
            language: language.to_string(),
            topic: topic.to_string(),
            grade_level: grade,
            cultural_context,
            setting,
            discussion_questions: STORY_DISCUSSION_QUESTIONS
                .iter()
                .map(|q| q.to_string())
                .collect(),
        })
    }

    pub async fn create_analogy(
        &self,
        concept: &str,
        language: &str,
        grade: GradeLevel,
        region: Option<&str>,
    ) -> Result<Analogy, AgentError> {
        let concept = require_text(concept, "concept")?;
        let profile = GradeProfile::for_grade(grade);
        let cultural_context = CulturalContext::lookup(region.unwrap_or_default());

        let prompt = prompts::analogy_prompt(concept, &profile, &cultural_context);
        let generated = self.ctx.generate(CAPABILITY, prompt).await?;
        let content = self.ctx.localize(generated, language).await?;

        Ok(Analogy {
            content,
            language: language.to_string(),
            concept: concept.to_string(),
            grade_level: grade,
            cultural_context,
            builtin: builtin_analogies(concept),
            teaching_tips: ANALOGY_TEACHING_TIPS.iter().map(|t| t.to_string()).collect(),
        })
    }

    /// Translate arbitrary teaching material.
    pub async fn translate_content(
        &self,
        text: &str,
        language: &str,
    ) -> Result<Translation, AgentError> {
        let text = require_text(text, "text")?;
        let content = self.ctx.localize(text.to_string(), language).await?;
        Ok(Translation {
            content,
            original: text.to_string(),
            language: language.to_string(),
        })
    }
}

fn require_text<'a>(value: &'a str, field: &str) -> Result<&'a str, AgentError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AgentError::InvalidRequest(format!("{field} is empty")));
    }
    Ok(trimmed)
}
