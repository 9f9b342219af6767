//! Audit trail of teacher requests.
//!
//! Bounded and in memory: the newest entries are kept, the oldest dropped.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::capability::Capability;
use crate::error::AgentError;
use crate::request::TeacherRequest;
use crate::response::{ResponseStatus, TeacherResponse};

/// Maximum entries in the audit log before pruning.
const MAX_AUDIT_ENTRIES: usize = 10_000;

/// Characters of the teacher's message kept in an entry.
const PREVIEW_CHARS: usize = 120;

/// An entry in the audit log.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEntry {
    pub entry_id: String,
    pub request_id: String,
    pub response_id: Option<String>,
    pub requester_id: String,
    /// Start of the request message
    pub message_preview: String,
    /// Capabilities that produced output
    pub capabilities: Vec<Capability>,
    pub status: Option<ResponseStatus>,
    /// Set when the request failed outright
    pub error: Option<String>,
    pub requested_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
    pub duration_ms: Option<u64>,
}

impl AuditEntry {
    pub fn from_request(request: &TeacherRequest) -> Self {
        Self {
            entry_id: uuid::Uuid::new_v4().to_string(),
            request_id: request.request_id.clone(),
            response_id: None,
            requester_id: request.requester_id.clone(),
            message_preview: request.message.chars().take(PREVIEW_CHARS).collect(),
            capabilities: Vec::new(),
            status: None,
            error: None,
            requested_at: request.requested_at,
            responded_at: None,
            duration_ms: None,
        }
    }

    fn finish(&mut self, at: DateTime<Utc>) {
        self.responded_at = Some(at);
        self.duration_ms = Some((at - self.requested_at).num_milliseconds().max(0) as u64);
    }
}

/// Audit log shared by the coordinator and the server.
pub struct AuditLog {
    /// Newest first
    entries: Arc<RwLock<VecDeque<AuditEntry>>>,
    max_entries: usize,
}

impl AuditLog {
    pub fn new() -> Self {
        Self::with_max_entries(MAX_AUDIT_ENTRIES)
    }

    pub fn with_max_entries(max_entries: usize) -> Self {
        Self {
            entries: Arc::new(RwLock::new(VecDeque::new())),
            max_entries,
        }
    }

    /// Record a request before processing; returns the entry id.
    pub async fn log_request(&self, request: &TeacherRequest) -> String {
        let entry = AuditEntry::from_request(request);
        let entry_id = entry.entry_id.clone();

        let mut entries = self.entries.write().await;
        entries.push_front(entry);
        while entries.len() > self.max_entries {
            entries.pop_back();
        }

        entry_id
    }

    /// Complete an entry from a coordinator response.
    pub async fn log_response(&self, entry_id: &str, response: &TeacherResponse) {
        let capabilities = response
            .intent
            .capabilities()
            .into_iter()
            .filter(|cap| !response.skipped.iter().any(|s| s.capability == *cap))
            .collect();

        self.update(entry_id, |entry| {
            entry.response_id = Some(response.response_id.clone());
            entry.status = Some(response.status);
            entry.capabilities = capabilities;
            entry.finish(response.responded_at);
        })
        .await;
    }

    /// Complete an entry for work that produced no [`TeacherResponse`],
    /// such as a direct worksheet upload.
    pub async fn log_completion(
        &self,
        entry_id: &str,
        status: ResponseStatus,
        capabilities: Vec<Capability>,
    ) {
        self.update(entry_id, |entry| {
            entry.status = Some(status);
            entry.capabilities = capabilities;
            entry.finish(Utc::now());
        })
        .await;
    }

    /// Mark an entry as failed.
    pub async fn log_failure(&self, entry_id: &str, error: &AgentError) {
        self.update(entry_id, |entry| {
            entry.status = Some(ResponseStatus::Declined);
            entry.error = Some(error.to_string());
            entry.finish(Utc::now());
        })
        .await;
    }

    async fn update(&self, entry_id: &str, apply: impl FnOnce(&mut AuditEntry)) {
        let mut entries = self.entries.write().await;
        if let Some(entry) = entries.iter_mut().find(|e| e.entry_id == entry_id) {
            apply(entry);
        }
    }

    pub async fn recent(&self, limit: usize) -> Vec<AuditEntry> {
        let entries = self.entries.read().await;
        entries.iter().take(limit).cloned().collect()
    }

    pub async fn get_by_request(&self, request_id: &str) -> Option<AuditEntry> {
        let entries = self.entries.read().await;
        entries.iter().find(|e| e.request_id == request_id).cloned()
    }

    pub async fn get_by_requester(&self, requester_id: &str, limit: usize) -> Vec<AuditEntry> {
        let entries = self.entries.read().await;
        entries
            .iter()
            .filter(|e| e.requester_id == requester_id)
            .take(limit)
            .cloned()
            .collect()
    }

    /// Entries where `capability` produced output.
    pub async fn get_by_capability(&self, capability: Capability, limit: usize) -> Vec<AuditEntry> {
        let entries = self.entries.read().await;
        entries
            .iter()
            .filter(|e| e.capabilities.contains(&capability))
            .take(limit)
            .cloned()
            .collect()
    }

    pub async fn stats(&self) -> AuditStats {
        let entries = self.entries.read().await;
        AuditStats::from_entries(entries.iter())
    }

    /// Statistics over one requester's entries only.
    pub async fn stats_for_requester(&self, requester_id: &str) -> AuditStats {
        let entries = self.entries.read().await;
        AuditStats::from_entries(entries.iter().filter(|e| e.requester_id == requester_id))
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    pub async fn count(&self) -> usize {
        self.entries.read().await.len()
    }
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new()
    }
}

/// Statistics from the audit log.
#[derive(Debug, Clone, Serialize)]
pub struct AuditStats {
    pub total_requests: usize,
    pub fulfilled: usize,
    pub partial: usize,
    pub declined: usize,
    /// Declined with an error
    pub failed: usize,
    /// Average over completed entries
    pub avg_duration_ms: u64,
}

impl AuditStats {
    fn from_entries<'a>(entries: impl Iterator<Item = &'a AuditEntry>) -> Self {
        let mut stats = Self {
            total_requests: 0,
            fulfilled: 0,
            partial: 0,
            declined: 0,
            failed: 0,
            avg_duration_ms: 0,
        };
        let mut completed = 0u64;
        let mut total_ms = 0u64;

        for entry in entries {
            stats.total_requests += 1;
            match entry.status {
                Some(ResponseStatus::Fulfilled) => stats.fulfilled += 1,
                Some(ResponseStatus::Partial) => stats.partial += 1,
                Some(ResponseStatus::Declined) => stats.declined += 1,
                None => {}
            }
            if entry.error.is_some() {
                stats.failed += 1;
            }
            if let Some(ms) = entry.duration_ms {
                completed += 1;
                total_ms += ms;
            }
        }

        if completed > 0 {
            stats.avg_duration_ms = total_ms / completed;
        }
        stats
    }
}
