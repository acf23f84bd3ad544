// Chat request handler.
//
// Translates an inbound Ollama chat request into a completion request,
// forwards it to the backend, and translates the answer back — either as
// one buffered JSON body or as a newline-delimited stream of chat chunks.
use axum::{
    body::Body,
    extract::State,
    response::{IntoResponse, Response},
    Json,
};
use tracing::{debug, info};

use crate::handlers::ApiError;
use crate::stream::chat_stream;
use crate::translate::{to_chat_response, to_completion_request};
use crate::types::{ChatRequest, CompletionRequest};
use crate::AppState;

// Handles chat completion requests.
//
// Malformed JSON bodies never reach this function; the `Json` extractor
// rejects them with a client error first.
pub async fn handle_chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Response, ApiError> {
    info!("Received chat request for model: {}", request.model);
    debug!(
        "Chat request details: stream={}, messages={}",
        request.stream,
        request.messages.len()
    );

    let outbound = to_completion_request(&request, state.backend_kind());

    if request.stream {
        handle_streaming_chat(&state, request.model, outbound).await
    } else {
        handle_non_streaming_chat(&state, &request.model, outbound).await
    }
}

// Forwards the request and buffers the single response body.
async fn handle_non_streaming_chat(
    state: &AppState,
    model: &str,
    outbound: CompletionRequest,
) -> Result<Response, ApiError> {
    debug!("Handling non-streaming chat request");

    let completion = state.backend_client().complete(&outbound).await?;
    let response = to_chat_response(model, &completion);

    info!("Returning chat response for model: {}", model);
    Ok(Json(response).into_response())
}

// Forwards the request and hands the backend's byte stream to the pump.
//
// The pump emits one body frame per record, so tokens reach the client
// without buffering delay; hyper's chunked encoding flushes each frame as
// it is produced.
async fn handle_streaming_chat(
    state: &AppState,
    model: String,
    outbound: CompletionRequest,
) -> Result<Response, ApiError> {
    debug!("Handling streaming chat request");

    let upstream = state.backend_client().complete_raw(&outbound).await?;
    let body = Body::from_stream(chat_stream(model, upstream.bytes_stream()));

    Response::builder()
        .header("Content-Type", "application/json")
        .header("Cache-Control", "no-cache")
        .header("Connection", "keep-alive")
        .body(body)
        .map_err(|e| ApiError::InternalError(format!("Failed to create response: {}", e)))
}
