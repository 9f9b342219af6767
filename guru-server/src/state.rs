//! Shared application state

use std::sync::Arc;
use std::time::Instant;

use guru_agent::Coordinator;

use crate::auth::TokenAuth;
use crate::session::SessionStore;

/// Default upload limit: 10 MiB.
pub const DEFAULT_MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

pub struct AppState {
    pub coordinator: Arc<Coordinator>,
    pub sessions: SessionStore,
    pub auth: TokenAuth,
    /// Largest accepted request body
    pub max_image_bytes: usize,
    pub dev_mode: bool,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(coordinator: Coordinator, auth: TokenAuth) -> Self {
        Self {
            coordinator: Arc::new(coordinator),
            sessions: SessionStore::new(),
            auth,
            max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
            dev_mode: false,
            started_at: Instant::now(),
        }
    }

    pub fn with_sessions(mut self, sessions: SessionStore) -> Self {
        self.sessions = sessions;
        self
    }

    pub fn with_max_image_bytes(mut self, max_image_bytes: usize) -> Self {
        self.max_image_bytes = max_image_bytes;
        self
    }

    pub fn with_dev_mode(mut self, dev_mode: bool) -> Self {
        self.dev_mode = dev_mode;
        self
    }
}
