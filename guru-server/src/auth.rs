//! Bearer token authentication.
//!
//! Tokens map to teacher ids. In dev mode every caller without a known
//! token is treated as [`DEV_TEACHER`].

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::debug;

use crate::error::ApiError;
use crate::state::AppState;

/// Identity used for every request in dev mode.
pub const DEV_TEACHER: &str = "dev-teacher";

/// Authenticated caller, injected into request extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Teacher(pub String);

#[derive(Debug, Clone, Default)]
pub struct TokenAuth {
    /// token → teacher id
    tokens: HashMap<String, String>,
    dev_mode: bool,
}

impl TokenAuth {
    pub fn new(tokens: HashMap<String, String>) -> Self {
        Self {
            tokens,
            dev_mode: false,
        }
    }

    pub fn dev() -> Self {
        Self {
            tokens: HashMap::new(),
            dev_mode: true,
        }
    }

    pub fn with_dev_mode(mut self, dev_mode: bool) -> Self {
        self.dev_mode = dev_mode;
        self
    }

    /// Resolve an `Authorization` header value to a teacher.
    pub fn authenticate(&self, header: Option<&str>) -> Result<Teacher, ApiError> {
        let token = header
            .and_then(|h| h.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty());

        match token {
            Some(token) => match self.tokens.get(token) {
                Some(user) => Ok(Teacher(user.clone())),
                None if self.dev_mode => Ok(Teacher(DEV_TEACHER.to_string())),
                None => Err(ApiError::InvalidToken),
            },
            None if self.dev_mode => Ok(Teacher(DEV_TEACHER.to_string())),
            None => Err(ApiError::MissingToken),
        }
    }
}

/// Require a valid bearer token and inject [`Teacher`].
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Response {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    match state.auth.authenticate(header) {
        Ok(teacher) => {
            debug!(teacher = %teacher.0, path = %req.uri().path(), "Authenticated");
            req.extensions_mut().insert(teacher);
            next.run(req).await
        }
        Err(err) => err.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth() -> TokenAuth {
        TokenAuth::new(HashMap::from([("tok-1".to_string(), "asha".to_string())]))
    }

    #[test]
    fn test_authenticate() {
        assert_eq!(
            auth().authenticate(Some("Bearer tok-1")).unwrap(),
            Teacher("asha".to_string())
        );
        assert!(matches!(
            auth().authenticate(None),
            Err(ApiError::MissingToken)
        ));
        assert!(matches!(
            auth().authenticate(Some("Basic tok-1")),
            Err(ApiError::MissingToken)
        ));
        assert!(matches!(
            auth().authenticate(Some("Bearer nope")),
            Err(ApiError::InvalidToken)
        ));
    }

    #[test]
    fn test_dev_mode() {
        let auth = auth().with_dev_mode(true);
        assert_eq!(auth.authenticate(None).unwrap().0, DEV_TEACHER);
        assert_eq!(auth.authenticate(Some("Bearer tok-1")).unwrap().0, "asha");
        assert_eq!(TokenAuth::dev().authenticate(Some("Bearer x")).unwrap().0, DEV_TEACHER);
    }
}
