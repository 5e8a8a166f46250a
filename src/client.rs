//! Tromero client and completion orchestrator
//!
//! `Tromero::chat().completions()` exposes the unified create entry point:
//! classification, parameter formatting, message normalization, backend
//! dispatch, one-shot fallback, and fire-and-forget telemetry, in that
//! order. Callers receive OpenAI-compatible completions and chunk streams
//! regardless of which backend served them.

use crate::backends::openai::OpenAiBackend;
use crate::backends::tromero::TromeroBackend;
use crate::core::classifier::{ModelClassifier, ModelKind};
use crate::core::config::TromeroOptions;
use crate::core::constants::NO_ADAPTER;
use crate::core::formatter::{ControlSettings, format_params};
use crate::core::normalizer::normalize_messages;
use crate::error::TromeroError;
use crate::models::chat::{ChatCompletion, ChatCompletionRequest, ChatMessage};
use crate::models::wire::TelemetryRecord;
use crate::streaming::{ChatCompletionStream, StreamLog, logged_stream};
use crate::telemetry::TelemetrySink;
use reqwest::Client;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

struct ClientInner {
    options: TromeroOptions,
    classifier: ModelClassifier,
    openai: Option<OpenAiBackend>,
    tromero: Option<TromeroBackend>,
    sink: TelemetrySink,
}

/// The Tromero client
///
/// Owns the model-classification cache and backend connections. Cloning is
/// cheap and clones share the cache; separate clients share nothing.
#[derive(Clone)]
pub struct Tromero {
    inner: Arc<ClientInner>,
}

impl Tromero {
    /// Build a client from construction-time options
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the HTTP client cannot be built.
    pub fn new(options: TromeroOptions) -> Result<Self, TromeroError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(options.request_timeout))
            .build()
            .map_err(|e| TromeroError::Configuration(e.to_string()))?;

        match (&options.tromero_key, &options.openai_key) {
            (None, Some(_)) => warn!(
                "You're using the Tromero client without a tromeroKey. OpenAI requests will still go through, but custom models are unavailable and no data will be saved."
            ),
            (None, None) => warn!(
                "You haven't set an apiKey for OpenAI or a tromeroKey for Tromero. Please set one of these to use the client."
            ),
            _ => {}
        }

        let classifier = ModelClassifier::new(
            client.clone(),
            options.openai_key.clone(),
            options.openai_base_url.clone(),
            options.tromero_key.clone(),
            options.base_url.clone(),
        );

        let openai = options
            .openai_key
            .clone()
            .map(|key| OpenAiBackend::new(client.clone(), key, options.openai_base_url.clone()));

        let tromero = options
            .tromero_key
            .clone()
            .map(|key| TromeroBackend::new(client.clone(), key));

        let sink = TelemetrySink::new(
            client,
            options.resolved_data_url(),
            options.tromero_key.clone(),
        );

        Ok(Self {
            inner: Arc::new(ClientInner {
                options,
                classifier,
                openai,
                tromero,
                sink,
            }),
        })
    }

    /// Chat API namespace
    pub fn chat(&self) -> Chat<'_> {
        Chat { client: self }
    }

    /// Seed or override the cached classification for a model name
    ///
    /// Useful when a model was redeployed and the lifetime cache would
    /// otherwise serve stale routing.
    pub async fn register_model(&self, model: &str, kind: ModelKind) {
        self.inner.classifier.register(model, kind).await;
    }
}

/// Chat API namespace
pub struct Chat<'a> {
    client: &'a Tromero,
}

impl<'a> Chat<'a> {
    /// Completions API namespace
    pub fn completions(&self) -> Completions<'a> {
        Completions {
            client: self.client,
        }
    }
}

/// Chat completions entry points
pub struct Completions<'a> {
    client: &'a Tromero,
}

/// Per-attempt request state shared by both dispatch paths
struct Attempt {
    params: Map<String, Value>,
    kwargs: Map<String, Value>,
    messages: Vec<ChatMessage>,
    kind: ModelKind,
    model: String,
    save_data: bool,
    tags: String,
}

impl Completions<'_> {
    /// Create a chat completion
    ///
    /// Routes to whichever backend serves `request.model`, retrying once
    /// with the fallback model if the first attempt fails and the request
    /// opted in via `useFallback`/`fallbackModel`.
    ///
    /// # Errors
    ///
    /// Propagates the final backend error once the fallback policy (if
    /// configured) is exhausted.
    pub async fn create(
        &self,
        request: ChatCompletionRequest,
    ) -> Result<ChatCompletion, TromeroError> {
        let (raw, messages, settings) = self.shape_request(&request);
        let mut model = request.model.clone();
        let mut fallback_allowed = settings.use_fallback;

        loop {
            let result = self
                .attempt_create(&raw, &messages, &model, &settings)
                .await;
            match result {
                Ok(completion) => return Ok(completion),
                Err(e) => match self.next_fallback(&mut fallback_allowed, &settings, &e) {
                    Some(fallback) => model = fallback,
                    None => return Err(e),
                },
            }
        }
    }

    /// Create a streaming chat completion
    ///
    /// The fallback policy applies to establishing the stream; once chunks
    /// are flowing, errors propagate to the consumer directly.
    ///
    /// # Errors
    ///
    /// Propagates the final backend error once the fallback policy (if
    /// configured) is exhausted.
    pub async fn create_stream(
        &self,
        request: ChatCompletionRequest,
    ) -> Result<ChatCompletionStream, TromeroError> {
        let (raw, messages, settings) = self.shape_request(&request);
        let mut model = request.model.clone();
        let mut fallback_allowed = settings.use_fallback;

        loop {
            let result = self
                .attempt_create_stream(&raw, &messages, &model, &settings)
                .await;
            match result {
                Ok(stream) => return Ok(stream),
                Err(e) => match self.next_fallback(&mut fallback_allowed, &settings, &e) {
                    Some(fallback) => model = fallback,
                    None => return Err(e),
                },
            }
        }
    }

    /// Normalize messages once and build the raw parameter bag
    fn shape_request(
        &self,
        request: &ChatCompletionRequest,
    ) -> (Map<String, Value>, Vec<ChatMessage>, ControlSettings) {
        let messages = normalize_messages(request.messages.clone());
        let mut raw = request.to_param_map();
        raw.insert(
            "messages".to_string(),
            serde_json::to_value(&messages).unwrap_or(Value::Array(Vec::new())),
        );
        let settings = ControlSettings::from_map(&raw);
        (raw, messages, settings)
    }

    /// Consume one fallback attempt, if the policy allows another
    fn next_fallback(
        &self,
        fallback_allowed: &mut bool,
        settings: &ControlSettings,
        error: &TromeroError,
    ) -> Option<String> {
        if !*fallback_allowed {
            return None;
        }
        let fallback = settings.fallback_model.clone()?;
        warn!("Error with main model, using fallback model: {}", error);
        *fallback_allowed = false;
        Some(fallback)
    }

    /// Classify the current model and format parameters for its backend
    async fn prepare(
        &self,
        raw: &Map<String, Value>,
        messages: &[ChatMessage],
        model: &str,
        settings: &ControlSettings,
    ) -> Result<Attempt, TromeroError> {
        let kind = self.client.inner.classifier.classify(model).await?;

        let mut raw = raw.clone();
        raw.insert("model".to_string(), Value::String(model.to_string()));
        let (params, _) = format_params(&raw, kind.backend());

        let mut kwargs = params.clone();
        kwargs.remove("messages");
        kwargs.remove("model");
        kwargs.remove("stream");

        let save_data = settings
            .save_data
            .unwrap_or(self.client.inner.options.save_data_default);

        Ok(Attempt {
            params,
            kwargs,
            messages: messages.to_vec(),
            kind,
            model: model.to_string(),
            save_data,
            tags: settings.tags_string(),
        })
    }

    fn openai_backend(&self) -> Result<&OpenAiBackend, TromeroError> {
        self.client.inner.openai.as_ref().ok_or_else(|| {
            TromeroError::Configuration(
                "OpenAI API key not set. Please provide an apiKey to use OpenAI models."
                    .to_string(),
            )
        })
    }

    fn tromero_backend(&self) -> Result<&TromeroBackend, TromeroError> {
        self.client.inner.tromero.as_ref().ok_or_else(|| {
            TromeroError::Configuration(
                "Tromero client not set. Please provide a tromeroKey to use custom models."
                    .to_string(),
            )
        })
    }

    /// Resolve the adapter name sent to the serving layer
    fn adapter_name(kind: &ModelKind, model: &str) -> String {
        match kind {
            ModelKind::Tromero { base_model: true, .. } => NO_ADAPTER.to_string(),
            _ => model.to_string(),
        }
    }

    fn telemetry_record(&self, attempt: &Attempt, final_message: ChatMessage) -> TelemetryRecord {
        let mut messages = attempt.messages.clone();
        messages.push(final_message);
        TelemetryRecord {
            messages,
            model: attempt.model.clone(),
            kwargs: attempt.kwargs.clone(),
            creation_time: chrono::Utc::now().to_rfc3339(),
            tags: attempt.tags.clone(),
        }
    }

    fn stream_log(&self, attempt: &Attempt) -> Option<StreamLog> {
        attempt.save_data.then(|| StreamLog {
            sink: self.client.inner.sink.clone(),
            messages: attempt.messages.clone(),
            model: attempt.model.clone(),
            kwargs: attempt.kwargs.clone(),
            tags: attempt.tags.clone(),
        })
    }

    async fn attempt_create(
        &self,
        raw: &Map<String, Value>,
        messages: &[ChatMessage],
        model: &str,
        settings: &ControlSettings,
    ) -> Result<ChatCompletion, TromeroError> {
        let mut attempt = self.prepare(raw, messages, model, settings).await?;
        // this path never streams, whatever the request's flag says
        attempt
            .params
            .insert("stream".to_string(), Value::Bool(false));

        let completion = match &attempt.kind {
            ModelKind::OpenAi => self.openai_backend()?.create(&attempt.params).await?,
            ModelKind::Tromero { url, .. } => {
                let adapter = Self::adapter_name(&attempt.kind, model);
                let generated = self
                    .tromero_backend()?
                    .generate(&adapter, url, &attempt.messages, &attempt.kwargs)
                    .await?;
                let text = generated.generated_text.ok_or_else(|| {
                    TromeroError::InvalidResponse(
                        "serving layer returned no generated_text".to_string(),
                    )
                })?;
                ChatCompletion::from_generated_text(text, model, generated.usage)
            }
        };

        if attempt.save_data {
            for choice in &completion.choices {
                let record = self.telemetry_record(&attempt, choice.message.clone());
                self.client.inner.sink.spawn_post(record);
            }
        }

        Ok(completion)
    }

    async fn attempt_create_stream(
        &self,
        raw: &Map<String, Value>,
        messages: &[ChatMessage],
        model: &str,
        settings: &ControlSettings,
    ) -> Result<ChatCompletionStream, TromeroError> {
        let attempt = self.prepare(raw, messages, model, settings).await?;

        let inner = match &attempt.kind {
            ModelKind::OpenAi => {
                self.openai_backend()?
                    .create_stream(attempt.params.clone())
                    .await?
            }
            ModelKind::Tromero { url, .. } => {
                let adapter = Self::adapter_name(&attempt.kind, model);
                self.tromero_backend()?
                    .generate_stream(&adapter, url, model, &attempt.messages, &attempt.kwargs)
                    .await?
            }
        };

        Ok(logged_stream(inner, self.stream_log(&attempt)))
    }
}
