//! Coordinator: the entry point for teacher requests.
//!
//! Detects intent, routes the primary capability to its agent, then runs any
//! extra agents the routing plan asked for. Every request is audited.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;

use pedagogy::{
    CrossGradeActivity, DifferentiationModel, GradeAdaptation, GradeLevel, WorksheetPacket,
};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::agents::assessment::DEFAULT_GAME_TYPE;
use crate::agents::visual::DEFAULT_CHART_TYPE;
use crate::agents::worksheet::parse_options;
use crate::agents::{
    AgentContext, AssessmentAgent, ContentAgent, KnowledgeAgent, ReadingAssessment, VisualAgent,
    WorksheetAgent,
};
use crate::audit::AuditLog;
use crate::backend::LlmBackend;
use crate::capability::{Capability, CapabilityRegistry};
use crate::error::AgentError;
use crate::intent::{Intent, Task};
use crate::request::TeacherRequest;
use crate::response::{
    output_key, AgentOutput, ProcessingStats, ResponseStatus, SkippedAgent, TeacherResponse,
};
use crate::services::ExternalServices;

/// Subject used for lesson plans when neither the plan nor the context names one.
const DEFAULT_SUBJECT: &str = "general";

/// Lesson plan length when the routing plan gives none.
const DEFAULT_PLAN_DAYS: u32 = 5;

#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Identifies this coordinator in logs
    pub coordinator_id: String,
    /// Record requests in the audit log
    pub audit_enabled: bool,
    /// Append an analogy to explanations
    pub include_analogy: bool,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            coordinator_id: uuid::Uuid::new_v4().to_string(),
            audit_enabled: true,
            include_analogy: true,
        }
    }
}

/// All five agents with their shared services.
pub struct AgentSet {
    pub content: ContentAgent,
    pub knowledge: KnowledgeAgent,
    pub visual: VisualAgent,
    pub assessment: AssessmentAgent,
    pub worksheet: WorksheetAgent,
}

impl AgentSet {
    pub fn new(backends: Vec<Arc<dyn LlmBackend>>, services: ExternalServices) -> Self {
        let ctx = AgentContext::new(backends, services.translator);
        Self {
            content: ContentAgent::new(ctx.clone()),
            knowledge: KnowledgeAgent::new(ctx.clone()),
            visual: VisualAgent::new(ctx.clone()),
            assessment: AssessmentAgent::new(ctx.clone(), services.speech),
            worksheet: WorksheetAgent::new(services.ocr),
        }
    }
}

/// Per-grade adaptations of one piece of content.
#[derive(Debug, Clone, Serialize)]
pub struct MultiGradePlan {
    pub concept: String,
    pub adaptations: BTreeMap<GradeLevel, GradeAdaptation>,
    pub activities: Vec<CrossGradeActivity>,
}

pub struct Coordinator {
    config: CoordinatorConfig,
    ctx: AgentContext,
    agents: AgentSet,
    capabilities: Arc<CapabilityRegistry>,
    differentiation: Arc<DifferentiationModel>,
    audit: Arc<AuditLog>,
}

impl Coordinator {
    /// Coordinator with every capability registered.
    pub async fn new(backends: Vec<Arc<dyn LlmBackend>>, services: ExternalServices) -> Self {
        let ctx = AgentContext::new(backends.clone(), Arc::clone(&services.translator));
        Self {
            config: CoordinatorConfig::default(),
            ctx,
            agents: AgentSet::new(backends, services),
            capabilities: Arc::new(CapabilityRegistry::with_all().await),
            differentiation: Arc::new(DifferentiationModel::new()),
            audit: Arc::new(AuditLog::new()),
        }
    }

    pub fn with_config(mut self, config: CoordinatorConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the built-in concept rules, e.g. with ones loaded from YAML.
    pub fn with_differentiation(mut self, model: DifferentiationModel) -> Self {
        self.differentiation = Arc::new(model);
        self
    }

    pub fn coordinator_id(&self) -> &str {
        &self.config.coordinator_id
    }

    pub fn agents(&self) -> &AgentSet {
        &self.agents
    }

    pub fn capabilities(&self) -> &CapabilityRegistry {
        &self.capabilities
    }

    pub fn audit_log(&self) -> &AuditLog {
        &self.audit
    }

    pub async fn available_capabilities(&self) -> Vec<Capability> {
        self.capabilities.available().await
    }

    pub async fn has_backend(&self) -> bool {
        self.ctx.has_backend().await
    }

    /// Answer a natural-language request.
    ///
    /// A failing primary agent fails the request. A failing extra agent is
    /// reported in `skipped` and the response becomes partial. A task in the
    /// request context overrides the detected primary capability.
    pub async fn process_request(
        &self,
        request: TeacherRequest,
    ) -> Result<TeacherResponse, AgentError> {
        if request.message.trim().is_empty() {
            return Err(AgentError::InvalidRequest("message is empty".to_string()));
        }
        let task = match request.context.task.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => Some(
                Task::parse(name)
                    .ok_or_else(|| AgentError::InvalidRequest(format!("unknown task: {name}")))?,
            ),
            _ => None,
        };

        let entry_id = self.audit_start(&request).await;
        let start = Instant::now();

        let mut intent = Intent::detect(&self.ctx, &request.message).await;
        if let Some(task) = task {
            intent = intent.with_task(task);
        }
        debug!(
            request_id = %request.request_id,
            primary = %intent.primary,
            required = ?intent.required,
            "Routing request"
        );

        let mut responses = BTreeMap::new();
        let mut skipped = Vec::new();
        let mut runnable = Vec::new();

        for capability in intent.capabilities() {
            if self.capabilities.is_available(capability).await {
                runnable.push(capability);
            } else {
                skipped.push(SkippedAgent {
                    capability,
                    reason: "capability disabled".to_string(),
                });
            }
        }
        let agents_invoked = runnable.len() as u32;

        // Primary first so its failure short-circuits; extras run together.
        let extras = match runnable.first() {
            Some(&primary) if primary == intent.primary => {
                match self.run_capability(primary, &request, &intent).await {
                    Ok(output) => {
                        responses.insert(output_key(primary).to_string(), output);
                    }
                    Err(e) => {
                        warn!(request_id = %request.request_id, capability = %primary, error = %e, "Primary agent failed");
                        if let Some(entry_id) = &entry_id {
                            self.audit.log_failure(entry_id, &e).await;
                        }
                        return Err(e);
                    }
                }
                &runnable[1..]
            }
            _ => &runnable[..],
        };

        let results = join_all(
            extras
                .iter()
                .map(|&capability| self.run_capability(capability, &request, &intent)),
        )
        .await;

        for (&capability, result) in extras.iter().zip(results) {
            match result {
                Ok(output) => {
                    responses.insert(output_key(capability).to_string(), output);
                }
                Err(e) => {
                    warn!(request_id = %request.request_id, capability = %capability, error = %e, "Extra agent failed");
                    skipped.push(SkippedAgent {
                        capability,
                        reason: e.to_string(),
                    });
                }
            }
        }

        let stats = ProcessingStats {
            agents_invoked,
            processing_time_ms: start.elapsed().as_millis() as u64,
        };
        let response = TeacherResponse::new(&request.request_id, intent, responses, skipped, stats);

        info!(
            request_id = %request.request_id,
            status = response.status.as_str(),
            agents = response.stats.agents_invoked,
            elapsed_ms = response.stats.processing_time_ms,
            "Request processed"
        );

        if let Some(entry_id) = entry_id {
            self.audit.log_response(&entry_id, &response).await;
        }
        Ok(response)
    }

    /// Turn a textbook photo into worksheets.
    ///
    /// `subject` may be `auto`; `language` is a worksheet language such as
    /// `hindi_english`.
    pub async fn process_textbook_image(
        &self,
        requester_id: &str,
        image: &[u8],
        grades: &[GradeLevel],
        subject: &str,
        language: &str,
    ) -> Result<WorksheetPacket, AgentError> {
        let capability = Capability::WorksheetGeneration;
        self.require(capability).await?;
        let (subject, language) = parse_options(subject, language)?;

        let request = TeacherRequest::new(requester_id, "[textbook image]");
        self.audited(
            &request,
            Some(capability),
            self.agents
                .worksheet
                .process_image(image, grades, subject, language),
        )
        .await
    }

    /// Worksheets from typed or pasted text.
    pub async fn process_text(
        &self,
        requester_id: &str,
        text: &str,
        grades: &[GradeLevel],
        subject: &str,
        language: &str,
    ) -> Result<WorksheetPacket, AgentError> {
        let capability = Capability::WorksheetGeneration;
        self.require(capability).await?;
        let (subject, language) = parse_options(subject, language)?;

        let request = TeacherRequest::new(requester_id, text);
        self.audited(&request, Some(capability), async {
            self.agents
                .worksheet
                .process_text(text, grades, subject, language)
        })
        .await
    }

    /// Score a read-aloud recording, against `expected_text` when given.
    pub async fn assess_reading(
        &self,
        requester_id: &str,
        audio: &[u8],
        grade: GradeLevel,
        language: &str,
        expected_text: Option<&str>,
    ) -> Result<ReadingAssessment, AgentError> {
        let capability = Capability::AssessmentPlanning;
        self.require(capability).await?;
        if audio.is_empty() {
            return Err(AgentError::InvalidRequest("audio is empty".to_string()));
        }

        let request = TeacherRequest::new(requester_id, "[reading assessment]");
        self.audited(
            &request,
            Some(capability),
            self.agents
                .assessment
                .assess_reading(audio, language, grade, expected_text),
        )
        .await
    }

    /// Adapt content about `concept` to each grade in the room.
    pub async fn differentiate(
        &self,
        requester_id: &str,
        content: &str,
        concept: &str,
        grades: &[GradeLevel],
    ) -> Result<MultiGradePlan, AgentError> {
        if grades.is_empty() {
            return Err(AgentError::InvalidRequest("no grade levels given".to_string()));
        }
        let concept = concept.trim();
        if concept.is_empty() {
            return Err(AgentError::InvalidRequest("concept is empty".to_string()));
        }

        let request = TeacherRequest::new(requester_id, format!("[differentiate] {concept}"));
        self.audited(&request, None, async {
            Ok(MultiGradePlan {
                concept: concept.to_string(),
                adaptations: self
                    .differentiation
                    .multi_grade_adaptations(content, concept, grades),
                activities: self.differentiation.cross_grade_activities(concept, grades),
            })
        })
        .await
    }

    /// Audit work that answers outside `process_request`, under the
    /// capability's timeout when it has one.
    async fn audited<T>(
        &self,
        request: &TeacherRequest,
        capability: Option<Capability>,
        work: impl Future<Output = Result<T, AgentError>>,
    ) -> Result<T, AgentError> {
        let entry_id = self.audit_start(request).await;

        let result = match capability {
            Some(capability) => self.with_timeout(capability, work).await,
            None => work.await,
        };

        if let Some(entry_id) = entry_id {
            match &result {
                Ok(_) => {
                    self.audit
                        .log_completion(
                            &entry_id,
                            ResponseStatus::Fulfilled,
                            capability.into_iter().collect(),
                        )
                        .await
                }
                Err(e) => self.audit.log_failure(&entry_id, e).await,
            }
        }
        result
    }

    async fn audit_start(&self, request: &TeacherRequest) -> Option<String> {
        if self.config.audit_enabled {
            Some(self.audit.log_request(request).await)
        } else {
            None
        }
    }

    async fn require(&self, capability: Capability) -> Result<(), AgentError> {
        if self.capabilities.is_available(capability).await {
            Ok(())
        } else {
            Err(AgentError::CapabilityNotAvailable(capability))
        }
    }

    async fn with_timeout<T>(
        &self,
        capability: Capability,
        work: impl Future<Output = Result<T, AgentError>>,
    ) -> Result<T, AgentError> {
        let timeout_ms = self.capabilities.get_timeout(capability).await;
        tokio::time::timeout(Duration::from_millis(timeout_ms), work)
            .await
            .map_err(|_| AgentError::Timeout {
                capability,
                timeout_ms,
            })?
    }

    async fn run_capability(
        &self,
        capability: Capability,
        request: &TeacherRequest,
        intent: &Intent,
    ) -> Result<AgentOutput, AgentError> {
        self.with_timeout(capability, self.dispatch(capability, request, intent))
            .await
    }

    async fn dispatch(
        &self,
        capability: Capability,
        request: &TeacherRequest,
        intent: &Intent,
    ) -> Result<AgentOutput, AgentError> {
        let message = request.message.as_str();
        let language = request.language();
        let grade = request.primary_grade();
        let region = request.context.cultural_context.as_deref();
        let param = |key: &str| {
            intent
                .parameter_str(key)
                .or_else(|| request.context.extra_str(key))
        };
        let task = intent.task_for(capability);

        let output = match capability {
            Capability::ContentGeneration => match task {
                Some(Task::Analogy) => AgentOutput::Analogy(
                    self.agents
                        .content
                        .create_analogy(param("concept").unwrap_or(message), language, grade, region)
                        .await?,
                ),
                Some(Task::Translate) => AgentOutput::Translation(
                    self.agents
                        .content
                        .translate_content(param("text").unwrap_or(message), language)
                        .await?,
                ),
                _ => AgentOutput::Story(
                    self.agents
                        .content
                        .generate_story(message, language, grade, region)
                        .await?,
                ),
            },
            Capability::KnowledgeExplanation => match task {
                Some(Task::FollowUp) => AgentOutput::FollowUp(
                    self.agents
                        .knowledge
                        .follow_up_questions(param("concept").unwrap_or(message), grade)
                        .await?,
                ),
                Some(Task::CheckUnderstanding) => AgentOutput::UnderstandingCheck(
                    self.agents
                        .knowledge
                        .check_understanding(
                            param("concept").unwrap_or(message),
                            param("explanation").unwrap_or(message),
                            grade,
                        )
                        .await?,
                ),
                _ => AgentOutput::Explanation(
                    self.agents
                        .knowledge
                        .explain_concept(message, language, grade, self.config.include_analogy)
                        .await?,
                ),
            },
            Capability::VisualAid => {
                let chart_data = intent
                    .parameters
                    .get("data")
                    .or_else(|| request.context.extra.get("data"))
                    .filter(|data| !data.is_null());
                match (task, chart_data) {
                    (Some(Task::Chart), Some(data)) => AgentOutput::Visual(
                        self.agents
                            .visual
                            .create_chart(
                                data.clone(),
                                param("chart_type").unwrap_or(DEFAULT_CHART_TYPE),
                                language,
                                grade,
                            )
                            .await?,
                    ),
                    // Without data a chart is planned like any other drawing.
                    (Some(Task::Chart), None) => AgentOutput::Visual(
                        self.agents
                            .visual
                            .create_diagram(
                                message,
                                language,
                                grade,
                                Some(param("chart_type").unwrap_or(DEFAULT_CHART_TYPE)),
                            )
                            .await?,
                    ),
                    _ => AgentOutput::Visual(
                        self.agents
                            .visual
                            .create_diagram(message, language, grade, param("diagram_type"))
                            .await?,
                    ),
                }
            }
            Capability::AssessmentPlanning if task == Some(Task::Game) => AgentOutput::Game(
                self.agents
                    .assessment
                    .generate_educational_game(
                        param("concept").unwrap_or(message),
                        &request.grades(),
                        param("game_type").unwrap_or(DEFAULT_GAME_TYPE),
                        language,
                    )
                    .await?,
            ),
            Capability::AssessmentPlanning => {
                let subject = intent
                    .subject()
                    .or(request.context.subject.as_deref())
                    .unwrap_or(DEFAULT_SUBJECT);
                AgentOutput::LessonPlan(
                    self.agents
                        .assessment
                        .create_lesson_plan(
                            &[subject.to_string()],
                            &request.grades(),
                            intent.duration_days().unwrap_or(DEFAULT_PLAN_DAYS),
                            language,
                        )
                        .await?,
                )
            }
            Capability::WorksheetGeneration => {
                // Chat requests carry no worksheet options, so unreadable
                // ones fall back to auto-detection.
                let subject = intent
                    .subject()
                    .or(request.context.subject.as_deref())
                    .unwrap_or_default();
                let (subject, preference) = parse_options(subject, language)
                    .or_else(|_| parse_options("", ""))?;
                AgentOutput::Worksheets(self.agents.worksheet.process_text(
                    message,
                    &request.context.grade_levels,
                    subject,
                    preference,
                )?)
            }
        };
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockBackend;
    use crate::request::RequestContext;
    use crate::services::{MockOcr, MockSpeech};

    async fn coordinator(backend: Arc<MockBackend>) -> Coordinator {
        Coordinator::new(vec![backend], ExternalServices::mock()).await
    }

    #[tokio::test]
    async fn test_routes_primary_intent() {
        let backend = Arc::new(MockBackend::default().with_responses([
            r#"{"primary_intent": "knowledge", "required_agents": [], "parameters": {}}"#,
            "Rain comes from clouds.",
            "Like a wet sponge being squeezed.",
        ]));
        let coordinator = coordinator(backend.clone()).await;

        let response = coordinator
            .process_request(TeacherRequest::new("teacher-1", "Why does it rain?"))
            .await
            .unwrap();

        assert_eq!(response.status, ResponseStatus::Fulfilled);
        let Some(AgentOutput::Explanation(explanation)) = response.responses.get("explanation")
        else {
            panic!("expected an explanation");
        };
        assert!(explanation.explanation.starts_with("Rain comes from clouds."));
        assert_eq!(explanation.grade_level, GradeLevel::Grade5);
        assert_eq!(backend.call_count(), 3);

        let entry = coordinator
            .audit_log()
            .get_by_request(&response.request_id)
            .await
            .unwrap();
        assert_eq!(entry.status, Some(ResponseStatus::Fulfilled));
    }

    #[tokio::test]
    async fn test_runs_required_agents() {
        let backend = Arc::new(MockBackend::default().with_responses([
            r#"{"primary_intent": "content", "required_agents": ["visual_aid_generator", "content_generator"]}"#,
            "Once upon a time a seed woke up.",
            r#"{"title": "Seed", "steps": ["Draw soil"], "labels": ["root"]}"#,
        ]));
        let coordinator = coordinator(backend).await;

        let request = TeacherRequest::new("teacher-1", "A story about seeds")
            .with_context(RequestContext::default().with_grades([GradeLevel::Grade3]));
        let response = coordinator.process_request(request).await.unwrap();

        assert_eq!(
            response.responses.keys().map(String::as_str).collect::<Vec<_>>(),
            vec!["content", "visual"]
        );
        assert!(matches!(
            response.primary(),
            Some(AgentOutput::Story(story)) if story.grade_level == GradeLevel::Grade3
        ));
    }

    #[tokio::test]
    async fn test_disabled_capability_skipped() {
        let backend = Arc::new(MockBackend::default().with_responses([
            r#"{"primary_intent": "knowledge", "required_agents": ["visual"]}"#,
            "Plants make food from light.",
            "Like a kitchen in a leaf.",
        ]));
        let coordinator = coordinator(backend).await;
        coordinator
            .capabilities()
            .set_enabled(Capability::VisualAid, false)
            .await;

        let response = coordinator
            .process_request(TeacherRequest::new("teacher-1", "Explain photosynthesis"))
            .await
            .unwrap();

        assert_eq!(response.status, ResponseStatus::Partial);
        assert_eq!(response.skipped[0].capability, Capability::VisualAid);
        assert!(response.responses.contains_key("explanation"));
    }

    #[tokio::test]
    async fn test_declined_when_primary_disabled() {
        let backend = Arc::new(MockBackend::default().with_response(r#"{"primary_intent": "visual"}"#));
        let coordinator = coordinator(backend).await;
        coordinator
            .capabilities()
            .set_enabled(Capability::VisualAid, false)
            .await;

        let response = coordinator
            .process_request(TeacherRequest::new("teacher-1", "Draw a cell"))
            .await
            .unwrap();
        assert_eq!(response.status, ResponseStatus::Declined);
        assert!(response.responses.is_empty());
    }

    #[tokio::test]
    async fn test_lesson_plan_parameters() {
        let backend = Arc::new(MockBackend::default().with_responses([
            r#"{"primary_intent": "assessment", "parameters": {"subject": "science", "duration": 3}}"#,
            r#"{"day_1": "Seeds"}"#,
        ]));
        let coordinator = coordinator(backend).await;

        let request = TeacherRequest::new("teacher-1", "Plan next week")
            .with_context(RequestContext::default().with_grades([GradeLevel::Grade2, GradeLevel::Grade4]));
        let response = coordinator.process_request(request).await.unwrap();

        let Some(AgentOutput::LessonPlan(plan)) = response.responses.get("assessment") else {
            panic!("expected a lesson plan");
        };
        assert_eq!(plan.subjects, vec!["science"]);
        assert_eq!(plan.duration_days, 3);
        assert_eq!(plan.grade_levels, vec![GradeLevel::Grade2, GradeLevel::Grade4]);
    }

    #[tokio::test]
    async fn test_keyword_fallback_for_worksheets() {
        let backend = Arc::new(MockBackend::default().with_available(false));
        let coordinator = coordinator(backend).await;

        let response = coordinator
            .process_request(TeacherRequest::new(
                "teacher-1",
                "Make a worksheet: Addition means putting numbers together. What is 2 + 3?",
            ))
            .await
            .unwrap();

        assert!(matches!(
            response.responses.get("worksheets"),
            Some(AgentOutput::Worksheets(_))
        ));
    }

    #[tokio::test]
    async fn test_primary_failure_is_audited() {
        let backend = Arc::new(MockBackend::default().with_available(false));
        let coordinator = coordinator(backend).await;

        let request = TeacherRequest::new("teacher-1", "Why is the sky blue?");
        let request_id = request.request_id.clone();
        let err = coordinator.process_request(request).await.unwrap_err();
        assert!(matches!(err, AgentError::NoBackendAvailable));

        let entry = coordinator.audit_log().get_by_request(&request_id).await.unwrap();
        assert!(entry.error.is_some());
    }

    #[tokio::test]
    async fn test_empty_message_rejected() {
        let coordinator = coordinator(Arc::new(MockBackend::default())).await;
        let err = coordinator
            .process_request(TeacherRequest::new("teacher-1", "  "))
            .await
            .unwrap_err();
        assert!(err.is_client_error());
        assert_eq!(coordinator.audit_log().count().await, 0);
    }

    #[tokio::test]
    async fn test_context_task_routes_to_game() {
        let backend = Arc::new(MockBackend::default().with_responses([
            r#"{"primary_intent": "knowledge", "required_agents": []}"#,
            r#"{"name": "Fraction hop", "rules": ["Hop to the half"]}"#,
        ]));
        let coordinator = coordinator(backend).await;

        let request = TeacherRequest::new("teacher-1", "fractions").with_context(
            RequestContext::default()
                .with_grades([GradeLevel::Grade4])
                .with_task("game"),
        );
        let response = coordinator.process_request(request).await.unwrap();

        assert_eq!(response.intent.primary, Capability::AssessmentPlanning);
        let Some(AgentOutput::Game(game)) = response.responses.get("assessment") else {
            panic!("expected a game");
        };
        assert_eq!(game.game["name"], "Fraction hop");
        assert_eq!(game.grade_levels, vec![GradeLevel::Grade4]);
        assert_eq!(game.game_type, DEFAULT_GAME_TYPE);
    }

    #[tokio::test]
    async fn test_model_task_routes_to_analogy() {
        let backend = Arc::new(MockBackend::default().with_responses([
            r#"{"primary_intent": "content", "parameters": {"task": "analogy", "concept": "fractions"}}"#,
            "Like sharing rotis among friends.",
        ]));
        let coordinator = coordinator(backend).await;

        let response = coordinator
            .process_request(TeacherRequest::new("teacher-1", "Help me explain fractions with an analogy"))
            .await
            .unwrap();

        let Some(AgentOutput::Analogy(analogy)) = response.responses.get("content") else {
            panic!("expected an analogy");
        };
        assert_eq!(analogy.concept, "fractions");
        assert_eq!(analogy.content, "Like sharing rotis among friends.");
        assert_eq!(response.summary(), "Like sharing rotis among friends.");
    }

    #[tokio::test]
    async fn test_chart_task_uses_context_data() {
        let backend = Arc::new(MockBackend::default().with_responses([
            r#"{"primary_intent": "visual"}"#,
            r#"{"title": "Crops in our village", "steps": ["Draw two bars"], "labels": ["rice", "wheat"]}"#,
        ]));
        let coordinator = coordinator(backend).await;

        let context: RequestContext = serde_json::from_value(serde_json::json!({
            "task": "chart",
            "data": {"rice": 3, "wheat": 5}
        }))
        .unwrap();
        let request = TeacherRequest::new("teacher-1", "Show crop counts").with_context(context);
        let response = coordinator.process_request(request).await.unwrap();

        let Some(AgentOutput::Visual(visual)) = response.responses.get("visual") else {
            panic!("expected a chart");
        };
        assert_eq!(visual.visual_type, DEFAULT_CHART_TYPE);
        assert_eq!(visual.data.as_ref().unwrap()["wheat"], 5);
        assert_eq!(visual.plan.title, "Crops in our village");
    }

    #[tokio::test]
    async fn test_unknown_task_rejected() {
        let backend = Arc::new(MockBackend::default());
        let coordinator = coordinator(backend.clone()).await;

        let request = TeacherRequest::new("teacher-1", "fractions")
            .with_context(RequestContext::default().with_task("dance"));
        let err = coordinator.process_request(request).await.unwrap_err();

        assert!(err.is_client_error());
        assert_eq!(backend.call_count(), 0);
        assert_eq!(coordinator.audit_log().count().await, 0);
    }

    #[tokio::test]
    async fn test_assess_reading_is_audited() {
        let services = ExternalServices::mock()
            .with_speech(Arc::new(MockSpeech::with_transcript("the sun is hot")));
        let backend = Arc::new(MockBackend::default().with_response("Well read!"));
        let coordinator = Coordinator::new(vec![backend], services).await;

        let assessment = coordinator
            .assess_reading(
                "teacher-1",
                b"RIFF",
                GradeLevel::Grade2,
                "english",
                Some("The sun is very hot."),
            )
            .await
            .unwrap();
        assert_eq!(assessment.feedback, "Well read!");
        assert_eq!(assessment.metrics.unwrap().missed_words, vec!["very"]);

        let err = coordinator
            .assess_reading("teacher-1", b"", GradeLevel::Grade2, "english", None)
            .await
            .unwrap_err();
        assert!(err.is_client_error());

        let entries = coordinator.audit_log().get_by_requester("teacher-1", 5).await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].capabilities, vec![Capability::AssessmentPlanning]);
    }

    #[tokio::test]
    async fn test_process_textbook_image() {
        let services = ExternalServices::mock().with_ocr(Arc::new(MockOcr::with_text(
            "Plants need water and sunlight. Why do leaves turn green?",
        )));
        let coordinator = Coordinator::new(vec![Arc::new(MockBackend::default())], services).await;

        let packet = coordinator
            .process_textbook_image("teacher-1", b"jpeg", &[GradeLevel::Grade3], "auto", "english")
            .await
            .unwrap();
        assert_eq!(packet.worksheets.len(), 1);
        assert_eq!(
            coordinator
                .audit_log()
                .get_by_capability(Capability::WorksheetGeneration, 5)
                .await
                .len(),
            1
        );

        let err = coordinator
            .process_textbook_image("teacher-1", b"jpeg", &[], "astrology", "english")
            .await
            .unwrap_err();
        assert!(err.is_client_error());
    }

    #[tokio::test]
    async fn test_process_text_is_audited() {
        let coordinator = coordinator(Arc::new(MockBackend::default())).await;

        let packet = coordinator
            .process_text(
                "teacher-1",
                "Plants need water and sunlight. Why do leaves turn green?",
                &[GradeLevel::Grade4],
                "science",
                "english",
            )
            .await
            .unwrap();
        assert_eq!(packet.worksheets.len(), 1);

        let entries = coordinator.audit_log().get_by_requester("teacher-1", 5).await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].status, Some(ResponseStatus::Fulfilled));
        assert_eq!(entries[0].capabilities, vec![Capability::WorksheetGeneration]);

        let err = coordinator
            .process_text("teacher-1", "   ", &[], "auto", "english")
            .await
            .unwrap_err();
        assert!(err.is_client_error());
        let stats = coordinator.audit_log().stats().await;
        assert_eq!(stats.total_requests, 2);
        assert_eq!(stats.failed, 1);
    }

    #[tokio::test]
    async fn test_differentiate() {
        let coordinator = coordinator(Arc::new(MockBackend::default())).await;
        let plan = coordinator
            .differentiate(
                "teacher-1",
                "Fractions are parts of a whole.",
                "fractions",
                &[GradeLevel::Grade2, GradeLevel::Grade6],
            )
            .await
            .unwrap();
        assert_eq!(plan.adaptations.len(), 2);
        assert!(!plan.activities.is_empty());
        assert!(coordinator
            .differentiate("teacher-1", "x", "fractions", &[])
            .await
            .is_err());

        let entries = coordinator.audit_log().get_by_requester("teacher-1", 5).await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].message_preview, "[differentiate] fractions");
        assert_eq!(entries[0].status, Some(ResponseStatus::Fulfilled));
    }
}
