/// Common type definitions used throughout the application.
///
/// This module defines the core data structures for both sides of the proxy:
/// the Ollama API surface served to clients, and the OpenAI-compatible
/// completion API the proxy forwards to.
///
/// # Type Categories
///
/// The types are organized into two main categories:
/// - Ollama API types (chat requests and responses, model listings)
/// - OpenAI-compatible types (completion requests, streamed deltas, model lists)
use serde::{Deserialize, Serialize};
use serde_json::Value;

//------------------------------------------------------------------------------
// Ollama API Types
//------------------------------------------------------------------------------

/// Role of a chat message sender.
///
/// Any other role on the wire is rejected when the request body is decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// Represents a single message in a chat conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Identifies the sender of the message
    pub role: Role,

    /// The actual text content of the message
    pub content: String,

    /// Optional base64-encoded image payloads, as carried on the Ollama wire.
    /// Only user messages are expected to contain these.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
}

/// Request parameters for chat-based interactions.
///
/// This struct encapsulates all parameters of a multi-turn conversation
/// request in the Ollama chat API format. A missing `model` is forwarded to
/// the backend as an empty string; the backend is authoritative for model
/// existence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Name of the model to use
    #[serde(default)]
    pub model: String,

    /// Array of conversation messages with roles and content
    pub messages: Vec<Message>,

    /// Flag to enable streaming responses (defaults to off)
    #[serde(default)]
    pub stream: bool,

    /// Optional model-specific parameters; advisory only, never forwarded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Value>,

    /// Ollama keep-alive hint; advisory only, never forwarded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keep_alive: Option<String>,
}

/// Response to a chat request.
///
/// Non-streaming calls produce exactly one of these with `done: true`.
/// Streaming calls produce many with `done: false` (one per content
/// fragment) followed by exactly one terminal record with `done: true` and
/// empty content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Name of the model that generated the response
    pub model: String,

    /// Timestamp when this record was produced
    pub created_at: String,

    /// The model's response as a Message object
    pub message: Message,

    /// Indicates whether the generation is complete
    pub done: bool,

    /// Reason the generation finished; only set on non-streaming responses
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub done_reason: Option<String>,
}

/// Response containing the list of available models.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListModelsResponse {
    /// Array of ModelInfo objects with details about each available model
    pub models: Vec<ModelInfo>,
}

/// Information about a specific model, in the Ollama listing shape.
///
/// The backend's model list exposes little beyond an identifier, so most of
/// these fields carry defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    /// The model's name/identifier
    pub name: String,

    /// Identifier again; Ollama lists both fields with the same value
    pub model: String,

    /// Timestamp when the model was last modified; empty when the backend
    /// does not report one
    pub modified_at: String,

    /// Size of the model in bytes
    pub size: u64,

    /// Unique hash identifying this version of the model
    pub digest: String,

    /// Additional technical specifications of the model
    pub details: ModelDetails,
}

/// Technical specifications of a model.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelDetails {
    /// Model format (e.g., "gguf")
    #[serde(default)]
    pub format: String,

    /// Model family/architecture (e.g., "llama")
    #[serde(default)]
    pub family: String,

    /// All compatible model families
    #[serde(default)]
    pub families: Vec<String>,

    /// Human-readable parameter count (e.g., "7B")
    #[serde(default)]
    pub parameter_size: String,

    /// Level of precision reduction applied (e.g., "Q4_0")
    #[serde(default)]
    pub quantization_level: String,
}

/// Response containing the API version information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionResponse {
    /// Version string reported to clients
    pub version: String,
}

//------------------------------------------------------------------------------
// OpenAI-compatible API Types
//------------------------------------------------------------------------------

/// A chat completion request in the OpenAI wire format.
#[derive(Debug, Clone, Serialize)]
pub struct CompletionRequest {
    /// Model identifier, passed through from the inbound request
    pub model: String,

    /// Conversation messages in the completion encoding
    pub messages: Vec<CompletionMessage>,

    /// Whether the backend should stream the response
    pub stream: bool,

    /// LiteLLM-specific settings; only present when targeting a LiteLLM
    /// gateway
    #[serde(skip_serializing_if = "Option::is_none")]
    pub litellm_settings: Option<LiteLlmSettings>,
}

/// Settings understood by LiteLLM gateways.
#[derive(Debug, Clone, Serialize)]
pub struct LiteLlmSettings {
    /// Instructs the gateway to normalize parameters for provider
    /// compatibility
    pub modify_params: bool,
}

/// A single message in the completion encoding.
#[derive(Debug, Clone, Serialize)]
pub struct CompletionMessage {
    pub role: Role,
    pub content: CompletionContent,
}

/// Message content: either a plain string or a list of typed content parts.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum CompletionContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

/// A typed content part within a multimodal message.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

/// Image reference carried inside an `image_url` content part.
#[derive(Debug, Clone, Serialize)]
pub struct ImageUrl {
    /// A `data:` URI with the base64 image payload
    pub url: String,
}

/// A fully-buffered completion response from the backend.
///
/// All fields are defaulted so that sparse upstream JSON still parses.
#[derive(Debug, Clone, Deserialize)]
pub struct CompletionResponse {
    #[serde(default)]
    pub choices: Vec<CompletionChoice>,
}

/// One choice within a completion response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompletionChoice {
    #[serde(default)]
    pub message: ChoiceMessage,
}

/// The message carried by a completion choice.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChoiceMessage {
    #[serde(default)]
    pub content: String,
}

/// One parsed line of the backend's SSE stream.
#[derive(Debug, Clone, Deserialize)]
pub struct StreamChunk {
    #[serde(default)]
    pub choices: Vec<StreamChoice>,
}

/// One choice within a streamed chunk.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StreamChoice {
    #[serde(default)]
    pub delta: StreamDelta,

    /// Reason the backend finished generating, when reported
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// The incremental content fragment of a streamed choice.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StreamDelta {
    #[serde(default)]
    pub content: Option<String>,
}

/// The backend's model list (`GET /models`).
#[derive(Debug, Clone, Deserialize)]
pub struct ModelListResponse {
    #[serde(default)]
    pub data: Vec<ModelEntry>,
}

/// One entry of the backend's model list.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelEntry {
    pub id: String,

    /// Unix timestamp of model creation, when the backend reports one
    #[serde(default)]
    pub created: Option<i64>,
}
