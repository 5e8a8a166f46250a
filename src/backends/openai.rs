//! OpenAI backend invoker
//!
//! Thin pass-through to the OpenAI chat completions endpoint. Requests are
//! the already-formatted parameter maps produced by the formatter; responses
//! come back in the shared completion/chunk types.

use crate::core::constants::{DATA_PREFIX, SSE_DONE};
use crate::error::TromeroError;
use crate::models::chat::{ChatCompletion, ChatCompletionChunk};
use crate::streaming::ChatCompletionStream;
use futures::StreamExt;
use reqwest::Client;
use serde_json::{Map, Value};
use tracing::warn;

pub struct OpenAiBackend {
    client: Client,
    api_key: String,
    base_url: String,
}

impl OpenAiBackend {
    pub fn new(client: Client, api_key: String, base_url: String) -> Self {
        Self {
            client,
            api_key,
            base_url,
        }
    }

    /// Attach helpful context to common OpenAI error bodies
    fn classify_error(error_detail: &str) -> String {
        let error_lower = error_detail.to_lowercase();

        if error_lower.contains("invalid_api_key") || error_lower.contains("unauthorized") {
            return "Invalid API key. Please check your OpenAI API key.".to_string();
        }

        if error_lower.contains("rate_limit") || error_lower.contains("quota") {
            return "Rate limit exceeded. Please wait and try again, or upgrade your API plan."
                .to_string();
        }

        if error_lower.contains("model")
            && (error_lower.contains("not found") || error_lower.contains("does not exist"))
        {
            return "Model not available. OpenAI listed it for this key but rejected the \
                    request; check that your account has access to it."
                .to_string();
        }

        error_detail.to_string()
    }

    async fn send(&self, params: &Map<String, Value>) -> Result<reqwest::Response, TromeroError> {
        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Content-Type", "application/json")
            .bearer_auth(&self.api_key)
            .json(params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(TromeroError::from_status(
                status.as_u16(),
                Self::classify_error(&error_text),
            ));
        }

        Ok(response)
    }

    /// Send a non-streaming chat completion request
    ///
    /// # Errors
    ///
    /// Returns an error for transport failures, non-2xx statuses, or an
    /// unparseable response body.
    pub async fn create(&self, params: &Map<String, Value>) -> Result<ChatCompletion, TromeroError> {
        let response = self.send(params).await?;
        response
            .json()
            .await
            .map_err(|e| TromeroError::InvalidResponse(format!("Failed to parse response: {}", e)))
    }

    /// Send a streaming chat completion request
    ///
    /// The `stream` flag is forced on. SSE `data:` lines are parsed into
    /// typed chunks; the `[DONE]` sentinel ends the stream and unparseable
    /// lines are skipped with a warning.
    pub async fn create_stream(
        &self,
        mut params: Map<String, Value>,
    ) -> Result<ChatCompletionStream, TromeroError> {
        params.insert("stream".to_string(), Value::Bool(true));

        let response = self.send(&params).await?;
        let lines = crate::backends::response_lines(response);

        let stream = async_stream::stream! {
            futures::pin_mut!(lines);
            while let Some(line) = lines.next().await {
                let line = match line {
                    Ok(line) => line,
                    Err(e) => {
                        yield Err(TromeroError::Transport(e.to_string()));
                        return;
                    }
                };

                let trimmed = line.trim();
                if trimmed.is_empty() || !trimmed.starts_with(DATA_PREFIX) {
                    continue;
                }

                let payload = trimmed[DATA_PREFIX.len()..].trim();
                if payload == SSE_DONE {
                    break;
                }

                match serde_json::from_str::<ChatCompletionChunk>(payload) {
                    Ok(chunk) => yield Ok(chunk),
                    Err(e) => {
                        warn!("Failed to parse chunk: {} (line: {})", e, payload);
                        continue;
                    }
                }
            }
        };

        Ok(Box::pin(stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_auth_error() {
        let result = OpenAiBackend::classify_error("invalid_api_key: The API key is invalid");
        assert!(result.contains("API key"));
    }

    #[test]
    fn test_classify_rate_limit_error() {
        let result = OpenAiBackend::classify_error("rate_limit_exceeded");
        assert!(result.contains("Rate limit"));
    }

    #[test]
    fn test_classify_model_error_mentions_listing() {
        let result = OpenAiBackend::classify_error("The model `gpt-9` does not exist");
        assert!(result.contains("listed"));
        assert!(result.contains("access"));
    }

    #[test]
    fn test_classify_unknown_error_passes_through() {
        let result = OpenAiBackend::classify_error("something odd happened");
        assert_eq!(result, "something odd happened");
    }
}
