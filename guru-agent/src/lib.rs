//! Guru Agent - teaching agents for multi-grade classrooms
//!
//! Provides the request-handling side of the teaching assistant:
//! - Trait-based LLM backends (OpenAI-compatible HTTP, mock)
//! - Google OCR, translation and speech clients behind traits
//! - Five capability agents: content, knowledge, visual, assessment, worksheet
//! - Intent detection with a keyword fallback
//! - A coordinator with an in-memory audit trail
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │              Coordinator                │
//! │   (intent → agents → TeacherResponse)   │
//! └────────────────┬────────────────────────┘
//!                  │
//!      ┌───────────┴───────────┐
//!      ▼                       ▼
//! ┌─────────────┐       ┌─────────────┐
//! │ LlmBackend  │       │ External    │
//! │ (OpenAI/    │       │ Services    │
//! │  Mock)      │       │ (OCR, ...)  │
//! └─────────────┘       └─────────────┘
//! ```
//!
//! Grade profiles, differentiation and worksheet rules live in the
//! `pedagogy` crate.

pub mod agents;
pub mod audit;
pub mod backend;
pub mod capability;
pub mod coordinator;
pub mod error;
pub mod intent;
pub mod prompts;
pub mod request;
pub mod response;
pub mod services;

// Re-export main types for convenience
pub use backend::traits::{CompletionRequest, CompletionResponse, LlmBackend, LlmError};
pub use capability::{Capability, CapabilityRegistry};
pub use coordinator::{Coordinator, CoordinatorConfig, MultiGradePlan};
pub use error::AgentError;
pub use intent::{Intent, IntentSource, Task};
pub use request::{RequestContext, TeacherRequest};
pub use response::{AgentOutput, ResponseStatus, TeacherResponse};
pub use services::{ExternalServiceError, ExternalServices};
