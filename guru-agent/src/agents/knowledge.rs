//! Simple explanations and comprehension questions.

use pedagogy::{GradeLevel, GradeProfile};
use serde::Serialize;
use tracing::debug;

use super::{reply_lines, AgentContext};
use crate::capability::Capability;
use crate::error::AgentError;
use crate::prompts;

const CAPABILITY: Capability = Capability::KnowledgeExplanation;

#[derive(Debug, Clone, Serialize)]
pub struct Explanation {
    pub explanation: String,
    pub language: String,
    pub grade_level: GradeLevel,
    pub question: String,
    pub includes_analogy: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct FollowUpQuestions {
    pub original_question: String,
    pub questions: Vec<String>,
    pub grade_level: GradeLevel,
}

#[derive(Debug, Clone, Serialize)]
pub struct UnderstandingCheck {
    pub concept: String,
    pub questions: Vec<String>,
    pub grade_level: GradeLevel,
}

#[derive(Clone)]
pub struct KnowledgeAgent {
    ctx: AgentContext,
}

impl KnowledgeAgent {
    pub fn new(ctx: AgentContext) -> Self {
        Self { ctx }
    }

    /// Explain `question` for a grade, optionally followed by an analogy.
    ///
    /// The whole text is translated once the analogy is appended.
    pub async fn explain_concept(
        &self,
        question: &str,
        language: &str,
        grade: GradeLevel,
        include_analogy: bool,
    ) -> Result<Explanation, AgentError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(AgentError::InvalidRequest("question is empty".to_string()));
        }
        let profile = GradeProfile::for_grade(grade);
        debug!(question, grade = %grade, include_analogy, "Explaining concept");

        let mut explanation = self
            .ctx
            .generate(CAPABILITY, prompts::explanation_prompt(question, &profile))
            .await?;

        if include_analogy {
            let analogy = self
                .ctx
                .generate(CAPABILITY, prompts::simple_analogy_prompt(question, &profile))
                .await?;
            explanation = format!("{explanation}\n\nHere's a simple way to think about it:\n{analogy}");
        }

        let explanation = self.ctx.localize(explanation, language).await?;

        Ok(Explanation {
            explanation,
            language: language.to_string(),
            grade_level: grade,
            question: question.to_string(),
            includes_analogy: include_analogy,
        })
    }

    /// Three progressively harder questions.
    pub async fn follow_up_questions(
        &self,
        question: &str,
        grade: GradeLevel,
    ) -> Result<FollowUpQuestions, AgentError> {
        let profile = GradeProfile::for_grade(grade);
        let reply = self
            .ctx
            .generate(CAPABILITY, prompts::follow_up_prompt(question, &profile))
            .await?;

        Ok(FollowUpQuestions {
            original_question: question.to_string(),
            questions: reply_lines(&reply),
            grade_level: grade,
        })
    }

    /// Two or three questions checking an explanation landed.
    pub async fn check_understanding(
        &self,
        concept: &str,
        explanation: &str,
        grade: GradeLevel,
    ) -> Result<UnderstandingCheck, AgentError> {
        let profile = GradeProfile::for_grade(grade);
        let reply = self
            .ctx
            .generate(
                CAPABILITY,
                prompts::check_understanding_prompt(concept, explanation, &profile),
            )
            .await?;

        Ok(UnderstandingCheck {
            concept: concept.to_string(),
            questions: reply_lines(&reply),
            grade_level: grade,
        })
    }
}
