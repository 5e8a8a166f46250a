//! Tromero backend invoker
//!
//! Issues generate and generate-stream calls against a model's resolved
//! serving URL. The request body carries the adapter name (or the
//! `NO_ADAPTER` sentinel for base models), the normalized messages, and the
//! formatted parameter map. All failures, transport and HTTP alike, surface
//! as `Err` values on both paths.

use crate::error::TromeroError;
use crate::models::chat::ChatMessage;
use crate::models::wire::GenerateResponse;
use crate::streaming::ChatCompletionStream;
use crate::streaming::decoder::decode_token_stream;
use reqwest::Client;
use serde_json::{Map, Value, json};

pub struct TromeroBackend {
    client: Client,
    api_key: String,
}

impl TromeroBackend {
    pub fn new(client: Client, api_key: String) -> Self {
        Self { client, api_key }
    }

    fn body(
        adapter_name: &str,
        messages: &[ChatMessage],
        parameters: &Map<String, Value>,
    ) -> Value {
        json!({
            "adapter_name": adapter_name,
            "messages": messages,
            "parameters": parameters,
        })
    }

    async fn post(
        &self,
        url: String,
        body: &Value,
    ) -> Result<reqwest::Response, TromeroError> {
        let response = self
            .client
            .post(url)
            .header("X-API-KEY", &self.api_key)
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(TromeroError::from_status(status.as_u16(), message));
        }

        Ok(response)
    }

    /// Request a full generation from the serving layer
    ///
    /// # Errors
    ///
    /// Returns an error for transport failures, non-2xx statuses, or an
    /// in-body error report from the serving layer.
    pub async fn generate(
        &self,
        adapter_name: &str,
        serving_url: &str,
        messages: &[ChatMessage],
        parameters: &Map<String, Value>,
    ) -> Result<GenerateResponse, TromeroError> {
        let body = Self::body(adapter_name, messages, parameters);
        let response = self.post(format!("{}/generate", serving_url), &body).await?;

        let generated: GenerateResponse = response
            .json()
            .await
            .map_err(|e| TromeroError::InvalidResponse(e.to_string()))?;

        if let Some(error) = generated.error {
            return Err(TromeroError::InvalidResponse(error));
        }

        Ok(generated)
    }

    /// Open a token stream from the serving layer
    ///
    /// Chunks are yielded in arrival order, one per decoded token event.
    /// The connection is released when the returned stream is dropped, drained
    /// or not.
    pub async fn generate_stream(
        &self,
        adapter_name: &str,
        serving_url: &str,
        model_for_chunks: &str,
        messages: &[ChatMessage],
        parameters: &Map<String, Value>,
    ) -> Result<ChatCompletionStream, TromeroError> {
        let body = Self::body(adapter_name, messages, parameters);
        let response = self
            .post(format!("{}/generate_stream", serving_url), &body)
            .await?;

        let lines = crate::backends::response_lines(response);
        Ok(decode_token_stream(lines, model_for_chunks.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_shape() {
        let messages = vec![ChatMessage::new("user", "hi")];
        let mut parameters = Map::new();
        parameters.insert("temperature".to_string(), Value::from(0.2));

        let body = TromeroBackend::body("NO_ADAPTER", &messages, &parameters);
        assert_eq!(body["adapter_name"], "NO_ADAPTER");
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["parameters"]["temperature"], 0.2);
    }
}
