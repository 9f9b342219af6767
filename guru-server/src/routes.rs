//! HTTP handlers for `/api/v1`.

use std::sync::Arc;

use axum::extract::multipart::Multipart;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::{Extension, Json};
use guru_agent::agents::ReadingAssessment;
use guru_agent::audit::{AuditEntry, AuditStats};
use guru_agent::request::{deserialize_grades, DEFAULT_GRADE};
use guru_agent::{Capability, MultiGradePlan, RequestContext, TeacherRequest, TeacherResponse};
use pedagogy::{GradeLevel, GradeProfile, WorksheetPacket};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use crate::auth::Teacher;
use crate::error::ApiError;
use crate::middleware::RequestId;
use crate::session::{HistoryEntry, Role, Session};
use crate::state::AppState;

type AppStateArc = Arc<AppState>;

const DEFAULT_WORKSHEET_SUBJECT: &str = "auto";
const DEFAULT_WORKSHEET_LANGUAGE: &str = "hindi_english";
const DEFAULT_READING_LANGUAGE: &str = "hindi";
const DEFAULT_AUDIT_LIMIT: usize = 50;

fn session_not_found() -> ApiError {
    ApiError::NotFound("Session not found".to_string())
}

fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    body.map(|Json(value)| value)
        .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))
}

// === Health ===

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub uptime_secs: u64,
    pub mode: &'static str,
    pub llm_available: bool,
    pub capabilities: Vec<Capability>,
}

/// GET /health
pub async fn health(State(state): State<AppStateArc>) -> Json<HealthResponse> {
    let llm_available = state.coordinator.has_backend().await;
    Json(HealthResponse {
        status: if llm_available { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        uptime_secs: state.started_at.elapsed().as_secs(),
        mode: if state.dev_mode { "development" } else { "production" },
        llm_available,
        capabilities: state.coordinator.available_capabilities().await,
    })
}

// === Sessions ===

#[derive(Serialize)]
pub struct CreateSessionResponse {
    pub session_id: String,
    pub message: &'static str,
}

/// POST /sessions
pub async fn create_session(
    State(state): State<AppStateArc>,
    Extension(Teacher(teacher)): Extension<Teacher>,
) -> Json<CreateSessionResponse> {
    let session = state.sessions.create(&teacher);
    Json(CreateSessionResponse {
        session_id: session.session_id,
        message: "Session created successfully",
    })
}

/// GET /sessions/:id
pub async fn get_session(
    State(state): State<AppStateArc>,
    Extension(Teacher(teacher)): Extension<Teacher>,
    Path(session_id): Path<String>,
) -> Result<Json<Session>, ApiError> {
    state
        .sessions
        .get(&session_id, &teacher)
        .map(Json)
        .ok_or_else(session_not_found)
}

// === Chat ===

#[derive(Deserialize)]
pub struct ChatRequest {
    pub message: Option<String>,
    #[serde(default)]
    pub context: RequestContext,
}

#[derive(Serialize)]
pub struct ChatResponse {
    /// Plain-text answer
    pub response: String,
    /// Every agent's structured output
    pub result: TeacherResponse,
    pub session_id: String,
}

/// POST /chat/:id
pub async fn chat(
    State(state): State<AppStateArc>,
    Extension(Teacher(teacher)): Extension<Teacher>,
    Extension(RequestId(request_id)): Extension<RequestId>,
    Path(session_id): Path<String>,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let body = json_body(body)?;
    let message = body
        .message
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Message is required".to_string()))?;

    state
        .sessions
        .append(
            &session_id,
            &teacher,
            [HistoryEntry::new(Role::User, message.clone())],
        )
        .ok_or_else(session_not_found)?;

    let request = TeacherRequest::new(teacher.clone(), message)
        .with_request_id(request_id)
        .with_context(body.context);
    let result = state.coordinator.process_request(request).await?;
    let response = result.summary();

    let payload =
        serde_json::to_value(&result).map_err(|e| ApiError::Internal(e.to_string()))?;
    state
        .sessions
        .append(
            &session_id,
            &teacher,
            [HistoryEntry::new(Role::Assistant, response.clone()).with_payload(payload)],
        )
        .ok_or_else(session_not_found)?;

    Ok(Json(ChatResponse {
        response,
        result,
        session_id,
    }))
}

// === Worksheets ===

#[derive(Serialize)]
pub struct ProcessImageResponse {
    pub worksheets: WorksheetPacket,
    pub session_id: String,
}

/// POST /process-image/:id (multipart: `image`, repeated `grade_levels`,
/// `subject`, `language`)
pub async fn process_image(
    State(state): State<AppStateArc>,
    Extension(Teacher(teacher)): Extension<Teacher>,
    Path(session_id): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<ProcessImageResponse>, ApiError> {
    state
        .sessions
        .get(&session_id, &teacher)
        .ok_or_else(session_not_found)?;

    let mut image = None;
    let mut grades = Vec::new();
    let mut subject = DEFAULT_WORKSHEET_SUBJECT.to_string();
    let mut language = DEFAULT_WORKSHEET_LANGUAGE.to_string();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "image" => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(e.body_text()))?;
                image = Some(bytes);
            }
            "grade_levels" | "subject" | "language" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(e.body_text()))?;
                let value = value.trim().to_string();
                match name.as_str() {
                    "grade_levels" => grades.push(
                        value
                            .parse::<GradeLevel>()
                            .map_err(|e| ApiError::BadRequest(e.to_string()))?,
                    ),
                    "subject" if !value.is_empty() => subject = value,
                    "language" if !value.is_empty() => language = value,
                    _ => {}
                }
            }
            _ => {}
        }
    }

    let image = image
        .filter(|bytes| !bytes.is_empty())
        .ok_or_else(|| ApiError::BadRequest("No image file provided".to_string()))?;

    let worksheets = state
        .coordinator
        .process_textbook_image(&teacher, &image, &grades, &subject, &language)
        .await?;
    info!(
        session_id = %session_id,
        worksheets = worksheets.worksheets.len(),
        "Textbook image processed"
    );

    let payload = serde_json::to_value(&worksheets).map_err(|e| ApiError::Internal(e.to_string()))?;
    state
        .sessions
        .append(
            &session_id,
            &teacher,
            [HistoryEntry::new(
                Role::System,
                "Processed textbook image and generated worksheets",
            )
            .with_payload(json!({ "worksheets": payload }))],
        )
        .ok_or_else(session_not_found)?;

    Ok(Json(ProcessImageResponse {
        worksheets,
        session_id,
    }))
}

// === Reading ===

#[derive(Serialize)]
pub struct AssessReadingResponse {
    pub assessment: ReadingAssessment,
    pub session_id: String,
}

/// POST /assess-reading/:id (multipart: `audio`, `grade_level`, `language`,
/// optional `expected_text`)
pub async fn assess_reading(
    State(state): State<AppStateArc>,
    Extension(Teacher(teacher)): Extension<Teacher>,
    Path(session_id): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<AssessReadingResponse>, ApiError> {
    state
        .sessions
        .get(&session_id, &teacher)
        .ok_or_else(session_not_found)?;

    let mut audio = None;
    let mut grade = None;
    let mut language = DEFAULT_READING_LANGUAGE.to_string();
    let mut expected_text = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name == "audio" {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::BadRequest(e.body_text()))?;
            audio = Some(bytes);
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?;
        let value = value.trim().to_string();
        if value.is_empty() {
            continue;
        }
        match name.as_str() {
            "grade_level" => {
                grade = Some(
                    value
                        .parse::<GradeLevel>()
                        .map_err(|e| ApiError::BadRequest(e.to_string()))?,
                )
            }
            "language" => language = value,
            "expected_text" => expected_text = Some(value),
            _ => {}
        }
    }

    let audio = audio
        .filter(|bytes| !bytes.is_empty())
        .ok_or_else(|| ApiError::BadRequest("No audio file provided".to_string()))?;

    let assessment = state
        .coordinator
        .assess_reading(
            &teacher,
            &audio,
            grade.unwrap_or(DEFAULT_GRADE),
            &language,
            expected_text.as_deref(),
        )
        .await?;

    let payload =
        serde_json::to_value(&assessment).map_err(|e| ApiError::Internal(e.to_string()))?;
    state
        .sessions
        .append(
            &session_id,
            &teacher,
            [HistoryEntry::new(Role::System, "Assessed reading aloud")
                .with_payload(json!({ "assessment": payload }))],
        )
        .ok_or_else(session_not_found)?;

    Ok(Json(AssessReadingResponse {
        assessment,
        session_id,
    }))
}

#[derive(Deserialize)]
pub struct WorksheetRequest {
    pub text: String,
    #[serde(default, deserialize_with = "deserialize_grades")]
    pub grade_levels: Vec<GradeLevel>,
    pub subject: Option<String>,
    pub language: Option<String>,
}

/// POST /worksheets
pub async fn worksheets(
    State(state): State<AppStateArc>,
    Extension(Teacher(teacher)): Extension<Teacher>,
    body: Result<Json<WorksheetRequest>, JsonRejection>,
) -> Result<Json<WorksheetPacket>, ApiError> {
    let body = json_body(body)?;
    let packet = state
        .coordinator
        .process_text(
            &teacher,
            &body.text,
            &body.grade_levels,
            body.subject.as_deref().unwrap_or(DEFAULT_WORKSHEET_SUBJECT),
            body.language.as_deref().unwrap_or(DEFAULT_WORKSHEET_LANGUAGE),
        )
        .await?;
    Ok(Json(packet))
}

// === Differentiation ===

#[derive(Deserialize)]
pub struct DifferentiateRequest {
    pub content: String,
    pub concept: String,
    #[serde(deserialize_with = "deserialize_grades")]
    pub grade_levels: Vec<GradeLevel>,
}

/// POST /differentiate
pub async fn differentiate(
    State(state): State<AppStateArc>,
    Extension(Teacher(teacher)): Extension<Teacher>,
    body: Result<Json<DifferentiateRequest>, JsonRejection>,
) -> Result<Json<MultiGradePlan>, ApiError> {
    let body = json_body(body)?;
    let plan = state
        .coordinator
        .differentiate(&teacher, &body.content, &body.concept, &body.grade_levels)
        .await?;
    Ok(Json(plan))
}

/// GET /grades
pub async fn grades() -> Json<Vec<GradeProfile>> {
    Json(GradeProfile::all())
}

// === Capabilities and audit ===

#[derive(Serialize)]
pub struct CapabilityInfo {
    pub capability: Capability,
    pub agent: &'static str,
    pub description: &'static str,
    pub enabled: bool,
    pub timeout_ms: u64,
}

/// GET /capabilities
pub async fn capabilities(State(state): State<AppStateArc>) -> Json<Vec<CapabilityInfo>> {
    let registry = state.coordinator.capabilities();
    let mut infos = Vec::new();
    for capability in Capability::all() {
        infos.push(CapabilityInfo {
            capability,
            agent: capability.agent_name(),
            description: capability.description(),
            enabled: registry.is_available(capability).await,
            timeout_ms: registry.get_timeout(capability).await,
        });
    }
    Json(infos)
}

#[derive(Deserialize)]
pub struct AuditQuery {
    pub limit: Option<usize>,
}

#[derive(Serialize)]
pub struct AuditResponse {
    pub entries: Vec<AuditEntry>,
    pub stats: AuditStats,
}

/// GET /audit - the caller's recent requests and their statistics
pub async fn audit(
    State(state): State<AppStateArc>,
    Extension(Teacher(teacher)): Extension<Teacher>,
    query: Result<Query<AuditQuery>, QueryRejection>,
) -> Result<Json<AuditResponse>, ApiError> {
    let Query(query) = query.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    let log = state.coordinator.audit_log();
    Ok(Json(AuditResponse {
        entries: log
            .get_by_requester(&teacher, query.limit.unwrap_or(DEFAULT_AUDIT_LIMIT))
            .await,
        stats: log.stats_for_requester(&teacher).await,
    }))
}

/// Unmatched routes.
pub async fn not_found() -> ApiError {
    ApiError::NotFound("Route not found".to_string())
}
