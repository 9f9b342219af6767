//! Request id and timing headers.

use std::time::Instant;

use axum::body::to_bytes;
use axum::extract::Request;
use axum::http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use axum::http::{HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::error::{ErrorBody, ErrorMessage};

pub const REQUEST_ID_HEADER: &str = "x-request-id";
pub const RESPONSE_TIME_HEADER: &str = "x-response-time";

/// Largest plain-text error body carried over into a JSON error.
const MAX_PLAIN_ERROR_BYTES: usize = 4096;

/// Id of the current request, available to handlers as an extension.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// Take `X-Request-ID` from the caller or mint one, echo it back with
/// `X-Response-Time` in seconds, and stamp it into error bodies.
pub async fn request_context(mut req: Request, next: Next) -> Response {
    let start = Instant::now();
    let request_id = req
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    req.extensions_mut().insert(RequestId(request_id.clone()));

    let mut response = next.run(req).await;

    if let Some(ErrorMessage(error)) = response.extensions_mut().remove::<ErrorMessage>() {
        response = error_response(response.status(), error, &request_id);
    } else if is_plain_error(&response) {
        // Framework rejections and unmatched methods answer in plain text.
        let status = response.status();
        let (parts, body) = response.into_parts();
        let error = to_bytes(body, MAX_PLAIN_ERROR_BYTES)
            .await
            .ok()
            .map(|bytes| String::from_utf8_lossy(&bytes).trim().to_string())
            .filter(|text| !text.is_empty())
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("Request failed")
                    .to_string()
            });
        response = error_response(status, error, &request_id);
        for (name, value) in parts.headers.iter() {
            if name != CONTENT_TYPE && name != CONTENT_LENGTH {
                response.headers_mut().insert(name.clone(), value.clone());
            }
        }
    }

    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        headers.insert(REQUEST_ID_HEADER, value);
    }
    let elapsed = format!("{:.4}", start.elapsed().as_secs_f64());
    if let Ok(value) = HeaderValue::from_str(&elapsed) {
        headers.insert(RESPONSE_TIME_HEADER, value);
    }
    response
}

fn error_response(status: StatusCode, error: String, request_id: &str) -> Response {
    tracing::warn!(request_id = %request_id, status = status.as_u16(), error = %error, "Request failed");
    (
        status,
        Json(ErrorBody {
            error,
            request_id: Some(request_id.to_string()),
        }),
    )
        .into_response()
}

/// A 4xx/5xx whose body is not already JSON.
fn is_plain_error(response: &Response) -> bool {
    let status = response.status();
    if !(status.is_client_error() || status.is_server_error()) {
        return false;
    }
    !response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"))
}
