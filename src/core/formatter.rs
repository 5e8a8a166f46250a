//! Parameter formatting
//!
//! Splits a raw parameter bag into backend-valid parameters and out-of-band
//! control settings. Unknown keys never reach the wire: the Tromero serving
//! layer forwards arbitrary keys into the model server call, so anything not
//! on the resolved backend's allow-list is dropped with a warning.

use serde_json::{Map, Value};
use tracing::warn;

/// Which backend a request resolved to, for allow-list selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    OpenAi,
    Tromero,
}

impl Backend {
    fn name(self) -> &'static str {
        match self {
            Backend::OpenAi => "OpenAI",
            Backend::Tromero => "Tromero",
        }
    }
}

/// Parameters accepted by the OpenAI chat completions endpoint
const OPENAI_KEYS: &[&str] = &[
    "messages",
    "model",
    "frequency_penalty",
    "function_call",
    "functions",
    "logit_bias",
    "logprobs",
    "max_tokens",
    "n",
    "parallel_tool_calls",
    "presence_penalty",
    "response_format",
    "seed",
    "service_tier",
    "stop",
    "stream",
    "stream_options",
    "temperature",
    "tool_choice",
    "tools",
    "top_logprobs",
    "top_p",
    "user",
];

/// Parameters accepted by the Tromero serving layer
const TROMERO_KEYS: &[&str] = &[
    "messages",
    "model",
    "best_of",
    "presence_penalty",
    "frequency_penalty",
    "repetition_penalty",
    "temperature",
    "top_p",
    "top_k",
    "seed",
    "use_beam_search",
    "length_penalty",
    "early_stopping",
    "stop",
    "stop_token_ids",
    "include_stop_str_in_output",
    "ignore_eos",
    "max_tokens",
    "min_tokens",
    "logprobs",
    "prompt_logprobs",
    "detokenize",
    "skip_special_tokens",
    "spaces_between_special_tokens",
    "logits_processors",
    "truncate_prompt_tokens",
    "stream",
];

/// Control settings recognized regardless of backend
const CONTROL_KEYS: &[&str] = &["useFallback", "fallbackModel", "tags", "saveData"];

/// Out-of-band settings stripped from the parameter bag before dispatch
#[derive(Debug, Clone, Default)]
pub struct ControlSettings {
    pub tags: Option<Value>,
    pub save_data: Option<bool>,
    pub use_fallback: bool,
    pub fallback_model: Option<String>,
}

impl ControlSettings {
    /// Collect control settings from a raw parameter bag
    ///
    /// Unlike [`format_params`] this never warns: it reads the backend
    /// independent control keys and ignores everything else.
    pub fn from_map(raw: &Map<String, Value>) -> Self {
        let mut settings = Self::default();
        for key in CONTROL_KEYS {
            if let Some(value) = raw.get(*key) {
                settings.set(key, value);
            }
        }
        settings
    }

    /// Render tags for the telemetry record: arrays are joined with ", ",
    /// strings pass through, anything else becomes empty.
    pub fn tags_string(&self) -> String {
        match &self.tags {
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| match item {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect::<Vec<_>>()
                .join(", "),
            Some(Value::String(s)) => s.clone(),
            _ => String::new(),
        }
    }

    fn set(&mut self, key: &str, value: &Value) {
        match key {
            "tags" => self.tags = Some(value.clone()),
            "saveData" => self.save_data = value.as_bool(),
            "useFallback" => self.use_fallback = value.as_bool().unwrap_or(false),
            "fallbackModel" => {
                self.fallback_model = value.as_str().map(str::to_string);
            }
            _ => {}
        }
    }
}

/// Split a raw parameter bag into backend parameters and control settings
///
/// Keys on the backend's allow-list are copied through; control keys are
/// collected into [`ControlSettings`]; everything else is dropped with a
/// warning naming the key and backend. When any key was dropped, the full
/// valid-key list is logged once for reference.
pub fn format_params(raw: &Map<String, Value>, backend: Backend) -> (Map<String, Value>, ControlSettings) {
    let valid_keys = match backend {
        Backend::OpenAi => OPENAI_KEYS,
        Backend::Tromero => TROMERO_KEYS,
    };

    let mut params = Map::new();
    let mut settings = ControlSettings::default();
    let mut invalid_key_found = false;

    for (key, value) in raw {
        if valid_keys.contains(&key.as_str()) {
            params.insert(key.clone(), value.clone());
        } else if CONTROL_KEYS.contains(&key.as_str()) {
            settings.set(key, value);
        } else {
            warn!(
                "{} is not a valid parameter for {} models. This parameter will be ignored.",
                key,
                backend.name()
            );
            invalid_key_found = true;
        }
    }

    if invalid_key_found {
        warn!(
            "For your reference, only the following parameters are valid for {} models: {}",
            backend.name(),
            valid_keys.join(", ")
        );
    }

    (params, settings)
}
