// Model listing handler.
//
// Serves `/api/tags` by reshaping the backend's model list into the Ollama
// listing format. The completion protocol has no notion of model size,
// digest, or details, so those fields are defaulted; see `translate`.
use axum::{
    extract::State,
    response::{IntoResponse, Response},
    Json,
};
use tracing::debug;

use crate::handlers::ApiError;
use crate::translate::to_model_list;
use crate::AppState;

pub async fn handle_list_models(State(state): State<AppState>) -> Result<Response, ApiError> {
    debug!("Listing models from backend");

    let upstream = state.backend_client().list_models().await?;
    let listing = to_model_list(upstream);

    debug!("Returning {} models", listing.models.len());
    Ok(Json(listing).into_response())
}
