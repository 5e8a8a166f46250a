//! OpenAI-compatible chat completion data models
//!
//! These structures define the caller-facing request shape and the
//! completion/chunk shapes returned by both backends. Responses from the
//! Tromero serving layer are normalized into the same types so callers never
//! need to know which backend answered.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single chat message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl ChatMessage {
    /// Convenience constructor for a plain-text message
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: None,
        }
    }
}

/// A tool call attached to an assistant message
///
/// Fields other than `id` are optional because streamed tool-call deltas may
/// arrive partially populated and are accumulated as-is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub call_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function: Option<ToolFunction>,
}

/// Function name/arguments carried by a tool call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolFunction {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arguments: Option<String>,
}

/// Token usage statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// A chat completion choice
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatChoice {
    pub index: u32,
    pub message: ChatMessage,
    pub finish_reason: Option<String>,
    #[serde(default)]
    pub logprobs: Option<Value>,
}

/// A complete (non-streamed or fully merged) chat completion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletion {
    pub id: String,
    pub object: String,
    pub created: i64,
    pub model: String,
    pub choices: Vec<ChatChoice>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

impl ChatCompletion {
    /// Wrap raw generated text from the Tromero serving layer into an
    /// OpenAI-compatible completion with a single choice.
    pub fn from_generated_text(text: String, model: &str, usage: Option<Usage>) -> Self {
        Self {
            id: format!("chatcmpl-{}", uuid::Uuid::new_v4().simple()),
            object: "chat.completion".to_string(),
            created: chrono::Utc::now().timestamp(),
            model: model.to_string(),
            choices: vec![ChatChoice {
                index: 0,
                message: ChatMessage::new(crate::core::constants::role::ASSISTANT, text),
                finish_reason: Some(crate::core::constants::finish::STOP.to_string()),
                logprobs: None,
            }],
            usage,
        }
    }
}

/// Delta payload inside a streaming chunk choice
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatDelta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCallDelta>>,
}

/// Incremental tool-call data inside a streaming delta
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallDelta {
    #[serde(default)]
    pub index: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub call_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function: Option<ToolFunction>,
}

/// A streaming chunk choice
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkChoice {
    pub index: u32,
    pub delta: ChatDelta,
    pub finish_reason: Option<String>,
    #[serde(default)]
    pub logprobs: Option<Value>,
}

/// One incremental unit of a streamed completion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletionChunk {
    pub id: String,
    pub object: String,
    pub created: i64,
    pub model: String,
    pub choices: Vec<ChunkChoice>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

impl ChatCompletionChunk {
    /// Build a chunk from one decoded token event of the Tromero stream
    pub fn from_token(model: &str, text: String, finish_reason: Option<String>) -> Self {
        Self {
            id: format!("chatcmpl-{}", uuid::Uuid::new_v4().simple()),
            object: "chat.completion.chunk".to_string(),
            created: chrono::Utc::now().timestamp(),
            model: model.to_string(),
            choices: vec![ChunkChoice {
                index: 0,
                delta: ChatDelta {
                    role: Some(crate::core::constants::role::ASSISTANT.to_string()),
                    content: Some(text),
                    tool_calls: None,
                },
                finish_reason,
                logprobs: None,
            }],
            usage: None,
        }
    }
}

/// Caller-facing chat completion request
///
/// Common sampling parameters are typed; anything else lands in `extra` and
/// is validated against the resolved backend's allow-list by the parameter
/// formatter. Control settings (`tags`, `saveData`, `useFallback`,
/// `fallbackModel`) ride alongside the backend parameters and are stripped
/// before dispatch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<Value>,
    #[serde(rename = "tags", skip_serializing_if = "Option::is_none")]
    pub tags: Option<Value>,
    #[serde(rename = "saveData", skip_serializing_if = "Option::is_none")]
    pub save_data: Option<bool>,
    #[serde(rename = "useFallback", skip_serializing_if = "Option::is_none")]
    pub use_fallback: Option<bool>,
    #[serde(rename = "fallbackModel", skip_serializing_if = "Option::is_none")]
    pub fallback_model: Option<String>,
    /// Any additional parameters, validated per backend by the formatter
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ChatCompletionRequest {
    /// Serialize into the raw key/value bag consumed by the parameter
    /// formatter. `None` fields are omitted entirely.
    pub fn to_param_map(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_param_map_omits_unset_fields() {
        let request = ChatCompletionRequest {
            model: "gpt-4o".to_string(),
            messages: vec![ChatMessage::new("user", "hi")],
            temperature: Some(0.5),
            ..Default::default()
        };
        let map = request.to_param_map();
        assert!(map.contains_key("model"));
        assert!(map.contains_key("temperature"));
        assert!(!map.contains_key("max_tokens"));
        assert!(!map.contains_key("saveData"));
    }

    #[test]
    fn test_param_map_flattens_extra_keys() {
        let mut request = ChatCompletionRequest {
            model: "my-model".to_string(),
            ..Default::default()
        };
        request
            .extra
            .insert("repetition_penalty".to_string(), Value::from(1.1));
        let map = request.to_param_map();
        assert_eq!(map.get("repetition_penalty"), Some(&Value::from(1.1)));
    }

    #[test]
    fn test_from_generated_text_shape() {
        let completion =
            ChatCompletion::from_generated_text("hello".to_string(), "my-adapter", None);
        assert_eq!(completion.object, "chat.completion");
        assert_eq!(completion.choices.len(), 1);
        assert_eq!(completion.choices[0].message.content.as_deref(), Some("hello"));
        assert_eq!(completion.choices[0].finish_reason.as_deref(), Some("stop"));
        assert!(completion.id.starts_with("chatcmpl-"));
    }
}
