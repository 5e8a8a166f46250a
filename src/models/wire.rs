//! Wire types for the Tromero backend HTTP surface

use crate::models::chat::{ChatMessage, Usage};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Response of `GET {base}/model/{name}/url`
///
/// Older deployments return `baseModel`, newer ones `base_model`; both are
/// accepted.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelUrlResponse {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default, alias = "baseModel")]
    pub base_model: Option<bool>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Response of `POST {serving_url}/generate`
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateResponse {
    #[serde(default)]
    pub generated_text: Option<String>,
    #[serde(default)]
    pub usage: Option<Usage>,
    #[serde(default)]
    pub error: Option<String>,
}

/// One newline-delimited frame of `POST {serving_url}/generate_stream`,
/// after the `data:` prefix is stripped
#[derive(Debug, Clone, Deserialize)]
pub struct TokenFrame {
    pub token: Token,
}

/// A single generated token event
#[derive(Debug, Clone, Deserialize)]
pub struct Token {
    pub text: String,
    #[serde(default)]
    pub special: bool,
}

/// One entry of the primary backend's model listing
#[derive(Debug, Clone, Deserialize)]
pub struct ModelEntry {
    pub id: String,
}

/// Response of `GET {openai_base}/models`
#[derive(Debug, Clone, Deserialize)]
pub struct ModelList {
    pub data: Vec<ModelEntry>,
}

/// Payload shipped to the telemetry endpoint (`POST {base}/data`)
///
/// Write-only: the response body is ignored beyond success/failure.
#[derive(Debug, Clone, Serialize)]
pub struct TelemetryRecord {
    pub messages: Vec<ChatMessage>,
    pub model: String,
    pub kwargs: Map<String, Value>,
    pub creation_time: String,
    pub tags: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_url_accepts_both_field_spellings() {
        let legacy: ModelUrlResponse =
            serde_json::from_str(r#"{"url":"http://a","baseModel":true}"#).unwrap();
        assert_eq!(legacy.base_model, Some(true));

        let current: ModelUrlResponse =
            serde_json::from_str(r#"{"url":"http://a","base_model":false}"#).unwrap();
        assert_eq!(current.base_model, Some(false));
    }

    #[test]
    fn test_token_frame_parsing() {
        let frame: TokenFrame =
            serde_json::from_str(r#"{"token":{"text":"hi","special":false}}"#).unwrap();
        assert_eq!(frame.token.text, "hi");
        assert!(!frame.token.special);
    }

    #[test]
    fn test_token_frame_missing_token_is_rejected() {
        assert!(serde_json::from_str::<TokenFrame>(r#"{"text":"hi"}"#).is_err());
    }
}
