use std::convert::Infallible;

use axum::body::Body;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{header, HeaderMap, HeaderValue};
use axum::response::{IntoResponse, Response};
use axum::Json;
use futures::StreamExt;
use tracing::debug;

use super::dto::ChatStreamRequest;
use super::error::ApiError;
use super::AppState;
use crate::agent_loop::TurnRequest;
use crate::provider::ToolDefinition;
use crate::stream::TurnStream;

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

pub async fn list_tools(State(state): State<AppState>) -> Json<Vec<ToolDefinition>> {
    Json(state.engine.tool_definitions().to_vec())
}

/// Start a turn and stream its events as SSE.
pub async fn chat_stream(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<ChatStreamRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    state.auth.authorize(&headers)?;
    let Json(body) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let request = TurnRequest::from(body);
    debug!(
        thread_id = %request.thread_id,
        history = request.history.len(),
        "chat stream requested"
    );

    let stream = state.engine.start(request)?;
    Ok(sse_response(stream))
}

fn sse_response(stream: TurnStream) -> Response {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/event-stream"),
    );
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
    headers.insert("x-accel-buffering", HeaderValue::from_static("no"));
    let body = Body::from_stream(stream.map(Ok::<_, Infallible>));
    (headers, body).into_response()
}
