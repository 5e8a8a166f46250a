//! Client configuration
//!
//! All settings are supplied at construction time; the SDK never reads
//! ambient environment variables. Defaults mirror the hosted Tromero
//! deployment.

use crate::core::constants::{DEFAULT_BASE_URL, DEFAULT_OPENAI_BASE_URL};

/// Default request timeout in seconds
const DEFAULT_REQUEST_TIMEOUT: u64 = 90;

/// Options for constructing a [`crate::Tromero`] client
#[derive(Debug, Clone)]
pub struct TromeroOptions {
    /// API key for the Tromero backend (enables custom models + telemetry)
    pub tromero_key: Option<String>,

    /// API key for the OpenAI backend
    pub openai_key: Option<String>,

    /// Base URL for the Tromero API
    pub base_url: String,

    /// Telemetry endpoint; derived from `base_url` unless overridden
    pub data_url: Option<String>,

    /// Base URL for the OpenAI API
    pub openai_base_url: String,

    /// HTTP request timeout in seconds
    pub request_timeout: u64,

    /// Client-level default for the per-call `saveData` flag
    pub save_data_default: bool,
}

impl Default for TromeroOptions {
    fn default() -> Self {
        Self {
            tromero_key: None,
            openai_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            data_url: None,
            openai_base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            save_data_default: false,
        }
    }
}

impl TromeroOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tromero_key(mut self, key: impl Into<String>) -> Self {
        self.tromero_key = Some(key.into());
        self
    }

    pub fn openai_key(mut self, key: impl Into<String>) -> Self {
        self.openai_key = Some(key.into());
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn data_url(mut self, url: impl Into<String>) -> Self {
        self.data_url = Some(url.into());
        self
    }

    pub fn openai_base_url(mut self, url: impl Into<String>) -> Self {
        self.openai_base_url = url.into();
        self
    }

    pub fn request_timeout(mut self, seconds: u64) -> Self {
        self.request_timeout = seconds;
        self
    }

    pub fn save_data(mut self, save: bool) -> Self {
        self.save_data_default = save;
        self
    }

    /// Telemetry endpoint, defaulting to `{base_url}/data`
    pub fn resolved_data_url(&self) -> String {
        self.data_url
            .clone()
            .unwrap_or_else(|| format!("{}/data", self.base_url))
    }
}
