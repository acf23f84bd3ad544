// ollama-openai-proxy: serves the Ollama HTTP API and forwards requests to
// an OpenAI-compatible backend (the OpenAI API directly, or a LiteLLM
// gateway), translating both wire formats in both directions.

// Module declarations with descriptive comments
// Client for the OpenAI-compatible backend.
mod backend;
// Configuration loading and management.
mod config;
// HTTP request handlers for API endpoints.
mod handlers;
// Streaming response translation (the SSE-to-NDJSON pump).
mod stream;
// Request/response translation between the two wire formats.
mod translate;
// Common type definitions used throughout the application.
mod types;

// Import declarations with logical grouping
// Internal crate imports
use crate::backend::BackendClient;
use crate::config::BackendKind;
use crate::handlers::*;

// Web framework imports
use axum::{
    routing::{get, post},
    Router,
};

// Standard library imports
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

// Middleware and utility imports
use tower_http::trace::TraceLayer;
use tracing::{error, info};

// Shared application state passed to each request handler.
//
// Holds the backend client and the configured backend flavor; both are
// read-only after startup and safe for concurrent reuse.
#[derive(Clone)]
pub struct AppState {
    // Client for communicating with the OpenAI-compatible backend
    backend_client: BackendClient,
    // Which flavor of backend the proxy targets
    backend_kind: BackendKind,
}

impl AppState {
    // Creates a new builder for constructing AppState with a fluent API.
    pub fn builder() -> AppStateBuilder {
        AppStateBuilder::default()
    }

    pub fn backend_client(&self) -> &BackendClient {
        &self.backend_client
    }

    pub fn backend_kind(&self) -> BackendKind {
        self.backend_kind
    }
}

// Builder for creating AppState instances with a fluent API.
#[derive(Default)]
pub struct AppStateBuilder {
    // Optional backend client to be set before building
    backend_client: Option<BackendClient>,
    // Optional backend flavor to be set before building
    backend_kind: Option<BackendKind>,
}

impl AppStateBuilder {
    // Sets the backend client for the application state.
    pub fn with_backend_client(mut self, client: BackendClient) -> Self {
        self.backend_client = Some(client);
        self
    }

    // Sets the backend flavor for the application state.
    pub fn with_backend_kind(mut self, kind: BackendKind) -> Self {
        self.backend_kind = Some(kind);
        self
    }

    // Builds the AppState from the configured components.
    //
    // # Errors
    //
    // Returns an error if any required component is missing.
    pub fn build(self) -> Result<AppState, &'static str> {
        let backend_client = self.backend_client.ok_or("BackendClient is required")?;
        let backend_kind = self.backend_kind.ok_or("BackendKind is required")?;

        Ok(AppState {
            backend_client,
            backend_kind,
        })
    }
}

// Application entry point that initializes and runs the server.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = config::load_config("config.yaml")?;

    // Initialize logging
    setup_logging(&config.server.debug_level);

    // Create application state
    let state = build_app_state(&config)?;

    // Build router with the served Ollama API endpoints
    let app = build_router(state);

    // Start the server
    start_server(app, &config.server).await?;

    Ok(())
}

// Sets up logging with the configured level.
fn setup_logging(debug_level_str: &str) {
    let debug_level = tracing::Level::from_str(debug_level_str).unwrap_or_else(|_| {
        error!(
            "Unknown debug level: {}, defaulting to ERROR",
            debug_level_str
        );
        tracing::Level::ERROR
    });

    tracing_subscriber::fmt().with_max_level(debug_level).init();
    info!(
        "Starting ollama-openai-proxy server with log level: {}",
        debug_level
    );
}

// Builds the application state with the configured backend.
fn build_app_state(config: &config::Config) -> Result<AppState, Box<dyn std::error::Error>> {
    let state = AppState::builder()
        .with_backend_client(BackendClient::new(&config.backend))
        .with_backend_kind(config.backend.kind)
        .build()?;

    Ok(state)
}

// Builds the router with all API endpoints.
fn build_router(state: AppState) -> Router {
    Router::new()
        // Liveness probe; `get` also answers HEAD requests
        .route("/", get(handle_root))
        // Chat endpoint, streaming and non-streaming
        .route("/api/chat", post(chat::handle_chat))
        // Model listing
        .route("/api/tags", get(models::handle_list_models))
        // Utility endpoints
        .route("/api/version", get(version::handle_version))
        // Middleware and state
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// Liveness message matching what Ollama itself serves at the root.
async fn handle_root() -> &'static str {
    "Ollama is running"
}

// Starts the HTTP server with the configured router.
async fn start_server(
    app: Router,
    server_config: &config::ServerConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let addr = SocketAddr::new(IpAddr::from_str(&server_config.host)?, server_config.port);

    info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

// Resolves when the process receives ctrl-c.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to install shutdown handler: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BackendConfig;
    use axum::{
        body::Body,
        http::StatusCode,
        response::{IntoResponse, Response},
        Json,
    };
    use serde_json::{json, Value};

    // Binds the router on an ephemeral port and serves it in the background.
    async fn spawn(app: Router) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }

    // A stub OpenAI-compatible backend covering both chat shapes and the
    // model list.
    fn stub_backend() -> Router {
        async fn completions(Json(body): Json<Value>) -> Response {
            if body["stream"].as_bool().unwrap_or(false) {
                let sse = "data: {\"choices\":[{\"delta\":{\"content\":\"A\"}}]}\n\n\
                           data: [DONE]\n\n";
                Response::builder()
                    .header("Content-Type", "text/event-stream")
                    .body(Body::from(sse))
                    .unwrap()
            } else {
                Json(json!({"choices": [{"message": {"content": "hello"}}]})).into_response()
            }
        }

        async fn models() -> Json<Value> {
            Json(json!({"data": [{"id": "gpt-x"}]}))
        }

        Router::new()
            .route("/chat/completions", post(completions))
            .route("/models", get(models))
    }

    async fn spawn_proxy(backend_addr: SocketAddr, kind: BackendKind) -> SocketAddr {
        let backend_config = BackendConfig {
            base_url: format!("http://{}", backend_addr),
            api_key: String::new(),
            kind,
            timeout_secs: 5,
        };
        let state = AppState::builder()
            .with_backend_client(BackendClient::new(&backend_config))
            .with_backend_kind(kind)
            .build()
            .unwrap();
        spawn(build_router(state)).await
    }

    #[tokio::test]
    async fn root_reports_liveness() {
        let backend = spawn(stub_backend()).await;
        let proxy = spawn_proxy(backend, BackendKind::OpenAi).await;

        let response = reqwest::get(format!("http://{}/", proxy)).await.unwrap();
        assert_eq!(response.status(), 200);
        assert_eq!(response.text().await.unwrap(), "Ollama is running");
    }

    #[tokio::test]
    async fn non_streaming_chat_round_trip() {
        let backend = spawn(stub_backend()).await;
        let proxy = spawn_proxy(backend, BackendKind::OpenAi).await;

        let response = reqwest::Client::new()
            .post(format!("http://{}/api/chat", proxy))
            .json(&json!({
                "model": "m",
                "messages": [{"role": "user", "content": "hi"}],
                "stream": false
            }))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), 200);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["model"], "m");
        assert_eq!(body["message"]["role"], "assistant");
        assert_eq!(body["message"]["content"], "hello");
        assert_eq!(body["done"], json!(true));
    }

    #[tokio::test]
    async fn streaming_chat_round_trip() {
        let backend = spawn(stub_backend()).await;
        let proxy = spawn_proxy(backend, BackendKind::LiteLlm).await;

        let response = reqwest::Client::new()
            .post(format!("http://{}/api/chat", proxy))
            .json(&json!({
                "model": "m",
                "messages": [{"role": "user", "content": "hi"}],
                "stream": true
            }))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), 200);
        assert_eq!(
            response.headers().get("cache-control").unwrap(),
            "no-cache"
        );

        let body = response.text().await.unwrap();
        let records: Vec<Value> = body
            .lines()
            .filter(|line| !line.is_empty())
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["message"]["content"], "A");
        assert_eq!(records[0]["done"], json!(false));
        assert_eq!(records[1]["message"]["content"], "");
        assert_eq!(records[1]["done"], json!(true));
    }

    #[tokio::test]
    async fn tags_round_trip() {
        let backend = spawn(stub_backend()).await;
        let proxy = spawn_proxy(backend, BackendKind::OpenAi).await;

        let response = reqwest::get(format!("http://{}/api/tags", proxy))
            .await
            .unwrap();

        assert_eq!(response.status(), 200);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["models"][0]["name"], "gpt-x");
        assert_eq!(body["models"][0]["model"], "gpt-x");
        assert_eq!(body["models"][0]["size"], json!(0));
    }

    #[tokio::test]
    async fn version_reports_ok() {
        let backend = spawn(stub_backend()).await;
        let proxy = spawn_proxy(backend, BackendKind::OpenAi).await;

        let response = reqwest::get(format!("http://{}/api/version", proxy))
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
    }

    #[tokio::test]
    async fn malformed_body_is_a_client_error() {
        let backend = spawn(stub_backend()).await;
        let proxy = spawn_proxy(backend, BackendKind::OpenAi).await;

        let response = reqwest::Client::new()
            .post(format!("http://{}/api/chat", proxy))
            .header("Content-Type", "application/json")
            .body("{not json")
            .send()
            .await
            .unwrap();

        assert!(response.status().is_client_error());
    }

    #[tokio::test]
    async fn upstream_error_status_and_body_are_forwarded() {
        let failing = Router::new().route(
            "/chat/completions",
            post(|| async { (StatusCode::TOO_MANY_REQUESTS, "rate limited") }),
        );
        let backend = spawn(failing).await;
        let proxy = spawn_proxy(backend, BackendKind::OpenAi).await;

        let response = reqwest::Client::new()
            .post(format!("http://{}/api/chat", proxy))
            .json(&json!({
                "model": "m",
                "messages": [{"role": "user", "content": "hi"}]
            }))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), 429);
        assert_eq!(response.text().await.unwrap(), "rate limited");
    }
}
