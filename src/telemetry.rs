//! Telemetry sink
//!
//! Ships full conversations (request + response) to the Tromero data
//! collection endpoint for later fine-tuning dataset construction. Posting
//! is strictly best-effort: failures are swallowed, never retried, and never
//! surfaced to callers.

use crate::models::wire::TelemetryRecord;
use reqwest::Client;
use tracing::debug;

/// Fire-and-forget JSON sink for conversation records
#[derive(Clone)]
pub struct TelemetrySink {
    client: Client,
    data_url: String,
    api_key: Option<String>,
}

impl TelemetrySink {
    pub fn new(client: Client, data_url: String, api_key: Option<String>) -> Self {
        Self {
            client,
            data_url,
            api_key,
        }
    }

    /// Post one record, swallowing any failure
    ///
    /// A sink without an API key silently drops records; data collection
    /// requires a Tromero key.
    pub async fn post(&self, record: &TelemetryRecord) {
        let Some(key) = &self.api_key else {
            return;
        };

        let result = self
            .client
            .post(&self.data_url)
            .header("X-API-KEY", key)
            .header("Content-Type", "application/json")
            .json(record)
            .send()
            .await;

        match result {
            Ok(response) if !response.status().is_success() => {
                debug!("Telemetry post returned status {}", response.status());
            }
            Err(e) => {
                debug!("Telemetry post failed: {}", e);
            }
            _ => {}
        }
    }

    /// Schedule a post without awaiting it
    ///
    /// Used on the non-streaming success path so logging latency never
    /// affects caller-perceived latency.
    pub fn spawn_post(&self, record: TelemetryRecord) {
        let sink = self.clone();
        tokio::spawn(async move {
            sink.post(&record).await;
        });
    }
}
