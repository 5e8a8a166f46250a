//! Model classification
//!
//! Decides, per model name, whether a request should be served by the OpenAI
//! backend or the Tromero serving layer, and caches the decision for the
//! lifetime of the client. The cache has no TTL or invalidation: a model
//! redeployed behind a different serving URL under the same name keeps its
//! stale routing until the client is rebuilt or [`ModelClassifier::register`]
//! overrides it.

use crate::error::TromeroError;
use crate::models::wire::{ModelList, ModelUrlResponse};
use reqwest::Client;
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::warn;

/// Routing decision for a model name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelKind {
    /// Served by the OpenAI chat completions endpoint
    OpenAi,
    /// Served by the Tromero layer behind a per-model resolved URL
    Tromero {
        url: String,
        /// True when the name refers to an un-adapted base model
        base_model: bool,
    },
}

impl ModelKind {
    pub fn backend(&self) -> crate::core::formatter::Backend {
        match self {
            ModelKind::OpenAi => crate::core::formatter::Backend::OpenAi,
            ModelKind::Tromero { .. } => crate::core::formatter::Backend::Tromero,
        }
    }
}

/// Classifies model names against the two backends, caching decisions
///
/// The cache is shared across concurrent calls on one client. Two in-flight
/// first-time lookups for the same name may both miss and both resolve;
/// resolution is idempotent so last-write-wins is tolerated.
pub struct ModelClassifier {
    client: Client,
    openai_key: Option<String>,
    openai_base_url: String,
    tromero_key: Option<String>,
    tromero_base_url: String,
    cache: Mutex<HashMap<String, ModelKind>>,
}

/// Naming filter for the primary listing: gpt-family models minus the
/// completions-only variant that is not chat compatible.
fn is_openai_chat_model(id: &str) -> bool {
    id.contains("gpt") && !id.contains("gpt-3.5-turbo-instruct")
}

impl ModelClassifier {
    pub fn new(
        client: Client,
        openai_key: Option<String>,
        openai_base_url: String,
        tromero_key: Option<String>,
        tromero_base_url: String,
    ) -> Self {
        Self {
            client,
            openai_key,
            openai_base_url,
            tromero_key,
            tromero_base_url,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Seed or override the cached classification for a model name
    pub async fn register(&self, model: &str, kind: ModelKind) {
        self.cache.lock().await.insert(model.to_string(), kind);
    }

    /// Classify a model name, consulting the cache first
    ///
    /// A listing failure on the OpenAI side logs a warning and falls through
    /// to Tromero resolution; the Tromero resolver itself fails loudly when
    /// the model does not exist there either.
    ///
    /// # Errors
    ///
    /// Returns an error when the model is unknown to OpenAI and the Tromero
    /// resolver cannot produce a serving URL for it.
    pub async fn classify(&self, model: &str) -> Result<ModelKind, TromeroError> {
        if let Some(kind) = self.cache.lock().await.get(model) {
            return Ok(kind.clone());
        }

        if self.openai_key.is_some() {
            match self.fetch_openai_models().await {
                Ok(models) => {
                    let mut cache = self.cache.lock().await;
                    for id in models {
                        cache.insert(id, ModelKind::OpenAi);
                    }
                    if let Some(kind) = cache.get(model) {
                        return Ok(kind.clone());
                    }
                }
                Err(e) => {
                    warn!("Error fetching OpenAI models, treating {} as a Tromero model: {}", model, e);
                }
            }
        }

        let kind = self.resolve_tromero_model(model).await?;
        self.cache
            .lock()
            .await
            .insert(model.to_string(), kind.clone());
        Ok(kind)
    }

    /// List OpenAI model ids passing the chat-model naming filter
    async fn fetch_openai_models(&self) -> Result<Vec<String>, TromeroError> {
        let key = self
            .openai_key
            .as_ref()
            .ok_or_else(|| TromeroError::Configuration("OpenAI API key not set".to_string()))?;

        let response = self
            .client
            .get(format!("{}/models", self.openai_base_url))
            .bearer_auth(key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(TromeroError::from_status(status.as_u16(), message));
        }

        let listing: ModelList = response
            .json()
            .await
            .map_err(|e| TromeroError::InvalidResponse(e.to_string()))?;

        Ok(listing
            .data
            .into_iter()
            .filter(|entry| is_openai_chat_model(&entry.id))
            .map(|entry| entry.id)
            .collect())
    }

    /// Resolve a model name to its Tromero serving URL
    async fn resolve_tromero_model(&self, model: &str) -> Result<ModelKind, TromeroError> {
        let key = self.tromero_key.as_ref().ok_or_else(|| {
            TromeroError::Configuration(
                "Tromero client not set. Please provide a tromeroKey to use custom models."
                    .to_string(),
            )
        })?;

        let response = self
            .client
            .get(format!("{}/model/{}/url", self.tromero_base_url, model))
            .header("X-API-KEY", key)
            .header("Content-Type", "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(TromeroError::from_status(status.as_u16(), message));
        }

        let resolved: ModelUrlResponse = response
            .json()
            .await
            .map_err(|e| TromeroError::InvalidResponse(e.to_string()))?;

        if let Some(error) = resolved.error {
            return Err(TromeroError::InvalidResponse(error));
        }

        let url = resolved.url.ok_or_else(|| {
            TromeroError::InvalidResponse(format!("no serving URL returned for model {}", model))
        })?;

        Ok(ModelKind::Tromero {
            url,
            base_model: resolved.base_model.unwrap_or(false),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_model_naming_filter() {
        assert!(is_openai_chat_model("gpt-4o"));
        assert!(is_openai_chat_model("gpt-3.5-turbo"));
        assert!(!is_openai_chat_model("gpt-3.5-turbo-instruct"));
        assert!(!is_openai_chat_model("text-embedding-3-small"));
    }

    #[tokio::test]
    async fn test_cached_classification_skips_network() {
        // Bogus URLs: any network attempt would fail, so a success here
        // proves the cache was consulted first.
        let classifier = ModelClassifier::new(
            Client::new(),
            Some("sk-test".to_string()),
            "http://127.0.0.1:1/v1".to_string(),
            Some("tk".to_string()),
            "http://127.0.0.1:1/tailor/v1".to_string(),
        );
        classifier
            .register(
                "my-adapter",
                ModelKind::Tromero {
                    url: "http://serving.local".to_string(),
                    base_model: false,
                },
            )
            .await;

        let kind = classifier.classify("my-adapter").await.unwrap();
        assert_eq!(
            kind,
            ModelKind::Tromero {
                url: "http://serving.local".to_string(),
                base_model: false,
            }
        );
    }

    #[tokio::test]
    async fn test_missing_tromero_key_is_configuration_error() {
        let classifier = ModelClassifier::new(
            Client::new(),
            None,
            "http://127.0.0.1:1/v1".to_string(),
            None,
            "http://127.0.0.1:1/tailor/v1".to_string(),
        );
        let err = classifier.classify("unknown-model").await.unwrap_err();
        assert!(matches!(err, TromeroError::Configuration(_)));
    }
}
