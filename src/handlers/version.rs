// Version handler.
//
// Ollama clients probe this endpoint at startup; the exact value is not
// load-bearing, so the proxy reports its own crate version.
use axum::Json;

use crate::types::VersionResponse;

pub async fn handle_version() -> Json<VersionResponse> {
    Json(VersionResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
