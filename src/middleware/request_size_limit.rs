// src/middleware/request_size_limit.rs

use crate::{error::AppError, state::AppState};
use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, Method},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::warn;

/// Rejects bodies whose declared `Content-Length` exceeds
/// `server.max_request_bytes`. Chunked bodies are capped by the router's
/// `DefaultBodyLimit`.
pub async fn request_size_limit_middleware(
    State(state): State<Arc<AppState>>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let max_size = state.config.server.max_request_bytes;
    let method = request.method();

    if matches!(method, &Method::POST | &Method::PUT | &Method::PATCH) {
        let declared = request
            .headers()
            .get(header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<usize>().ok());

        if let Some(length) = declared {
            if length > max_size {
                warn!(
                    content_length = length,
                    max_size,
                    method = %method,
                    "Request rejected: body size exceeds limit"
                );
                return Err(AppError::RequestTooLarge {
                    size: length,
                    max_size,
                });
            }
        }
    }

    Ok(next.run(request).await)
}
