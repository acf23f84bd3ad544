// Translation between the Ollama wire protocol and the OpenAI-compatible
// completion protocol.
//
// Everything in this module is a pure mapping over the types in `types`;
// no I/O happens here. The handlers own the inbound decode and the backend
// client owns the outbound call, so these functions have no error paths.
use chrono::{DateTime, Utc};

use crate::config::BackendKind;
use crate::types::{
    ChatRequest, ChatResponse, CompletionContent, CompletionMessage, CompletionRequest,
    CompletionResponse, ContentPart, ImageUrl, ListModelsResponse, LiteLlmSettings, Message,
    ModelDetails, ModelInfo, ModelListResponse, Role,
};

// Fixed done_reason reported on non-streaming chat responses.
const DONE_REASON: &str = "unload";

//------------------------------------------------------------------------------
// Request translation
//------------------------------------------------------------------------------

// Maps an inbound chat request to an outbound completion request.
//
// Message order and count are preserved. Client `options` and `keep_alive`
// are dropped; when targeting a LiteLLM gateway the proxy instead injects
// its own fixed `modify_params` setting so the gateway normalizes
// parameters for provider compatibility.
pub fn to_completion_request(request: &ChatRequest, kind: BackendKind) -> CompletionRequest {
    let messages = request
        .messages
        .iter()
        .map(|message| to_completion_message(message, kind))
        .collect();

    CompletionRequest {
        model: request.model.clone(),
        messages,
        stream: request.stream,
        litellm_settings: match kind {
            BackendKind::LiteLlm => Some(LiteLlmSettings {
                modify_params: true,
            }),
            BackendKind::OpenAi => None,
        },
    }
}

// Encodes one message for the backend.
//
// Only user messages are assumed to carry multimodal content: when talking
// to the OpenAI API directly, a user message with images becomes a parts
// array of base64 data URIs, and one without images becomes a single text
// part. Images on any other role are silently dropped. LiteLLM gateways
// receive plain text for every role.
fn to_completion_message(message: &Message, kind: BackendKind) -> CompletionMessage {
    if kind == BackendKind::OpenAi && message.role == Role::User {
        let content = match message.images.as_deref() {
            Some(images) if !images.is_empty() => CompletionContent::Parts(
                images
                    .iter()
                    .map(|data| ContentPart::ImageUrl {
                        image_url: ImageUrl {
                            url: format!("data:image/jpeg;base64,{}", data),
                        },
                    })
                    .collect(),
            ),
            _ => CompletionContent::Parts(vec![ContentPart::Text {
                text: message.content.clone(),
            }]),
        };
        return CompletionMessage {
            role: message.role,
            content,
        };
    }

    CompletionMessage {
        role: message.role,
        content: CompletionContent::Text(message.content.clone()),
    }
}

//------------------------------------------------------------------------------
// Response translation
//------------------------------------------------------------------------------

// Maps a fully-buffered completion response to a terminal chat response.
//
// An upstream response with zero choices yields empty content rather than
// an error; the backend occasionally answers that way for filtered output.
pub fn to_chat_response(model: &str, completion: &CompletionResponse) -> ChatResponse {
    let content = completion
        .choices
        .first()
        .map(|choice| choice.message.content.clone())
        .unwrap_or_default();

    ChatResponse {
        model: model.to_string(),
        created_at: Utc::now().to_rfc3339(),
        message: assistant_message(content),
        done: true,
        done_reason: Some(DONE_REASON.to_string()),
    }
}

// Builds one streamed chunk carrying a content fragment.
pub fn delta_response(model: &str, content: String) -> ChatResponse {
    ChatResponse {
        model: model.to_string(),
        created_at: Utc::now().to_rfc3339(),
        message: assistant_message(content),
        done: false,
        done_reason: None,
    }
}

// Builds the terminal record that ends every stream.
pub fn final_response(model: &str) -> ChatResponse {
    ChatResponse {
        model: model.to_string(),
        created_at: Utc::now().to_rfc3339(),
        message: assistant_message(String::new()),
        done: true,
        done_reason: None,
    }
}

fn assistant_message(content: String) -> Message {
    Message {
        role: Role::Assistant,
        content,
        images: None,
    }
}

//------------------------------------------------------------------------------
// Model list translation
//------------------------------------------------------------------------------

// Maps the backend's model list to the Ollama listing shape.
//
// The completion protocol exposes no size, digest, or details for a model,
// so those fields carry defaults. This mapping is one-way and lossy.
pub fn to_model_list(upstream: ModelListResponse) -> ListModelsResponse {
    let models = upstream
        .data
        .into_iter()
        .map(|entry| ModelInfo {
            name: entry.id.clone(),
            model: entry.id,
            modified_at: entry
                .created
                .and_then(|secs| DateTime::from_timestamp(secs, 0))
                .map(|ts| ts.to_rfc3339())
                .unwrap_or_default(),
            size: 0,
            digest: String::new(),
            details: ModelDetails::default(),
        })
        .collect();

    ListModelsResponse { models }
}
