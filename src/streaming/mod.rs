//! Streaming support: chunk decoding, merging, and drain-time logging

pub mod decoder;
pub mod merge;

use crate::error::TromeroError;
use crate::models::chat::{ChatCompletion, ChatCompletionChunk, ChatMessage};
use crate::models::wire::TelemetryRecord;
use crate::telemetry::TelemetrySink;
use futures::Stream;
use futures::StreamExt;
use serde_json::{Map, Value};
use std::pin::Pin;

/// An async sequence of completion chunks, in strict arrival order
pub type ChatCompletionStream =
    Pin<Box<dyn Stream<Item = Result<ChatCompletionChunk, TromeroError>> + Send>>;

/// Context needed to post the telemetry record once a stream drains
pub struct StreamLog {
    pub sink: TelemetrySink,
    pub messages: Vec<ChatMessage>,
    pub model: String,
    pub kwargs: Map<String, Value>,
    pub tags: String,
}

impl StreamLog {
    /// Build the record for a fully drained stream
    ///
    /// The logged conversation is always the original messages plus one
    /// assistant message; a stream that drained without a single decoded
    /// chunk contributes an empty-content one.
    fn build_record(&self, merged: Option<ChatCompletion>) -> TelemetryRecord {
        let mut messages = self.messages.clone();
        let final_message = merged
            .and_then(|completion| completion.choices.into_iter().next())
            .map(|choice| choice.message)
            .unwrap_or_else(|| {
                ChatMessage::new(crate::core::constants::role::ASSISTANT, "")
            });
        messages.push(final_message);
        TelemetryRecord {
            messages,
            model: self.model.clone(),
            kwargs: self.kwargs.clone(),
            creation_time: chrono::Utc::now().to_rfc3339(),
            tags: self.tags.clone(),
        }
    }

    async fn post_final(self, merged: Option<ChatCompletion>) {
        let record = self.build_record(merged);
        self.sink.post(&record).await;
    }
}

/// Wrap a chunk stream so the full completion is logged once on drain
///
/// Chunks pass through unmodified and in order while being folded into an
/// accumulated completion. When the inner stream ends normally the telemetry
/// record is posted exactly once, after the last chunk has been yielded. An
/// upstream error propagates to the consumer and discards the accumulation;
/// a consumer that stops polling early drops the stream without logging.
pub fn logged_stream(inner: ChatCompletionStream, log: Option<StreamLog>) -> ChatCompletionStream {
    let stream = async_stream::stream! {
        let mut inner = inner;
        let mut merged: Option<ChatCompletion> = None;

        while let Some(item) = inner.next().await {
            match item {
                Ok(chunk) => {
                    if log.is_some() {
                        merged = Some(merge::merge_chunk(merged.take(), &chunk));
                    }
                    yield Ok(chunk);
                }
                Err(e) => {
                    yield Err(e);
                    return;
                }
            }
        }

        if let Some(log) = log {
            log.post_final(merged).await;
        }
    };
    Box::pin(stream)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::chat::ChatCompletionChunk;

    fn chunk(text: &str) -> ChatCompletionChunk {
        ChatCompletionChunk::from_token("m", text.to_string(), None)
    }

    #[tokio::test]
    async fn test_chunks_pass_through_in_order() {
        let inner: ChatCompletionStream = Box::pin(futures::stream::iter(vec![
            Ok(chunk("a")),
            Ok(chunk("b")),
            Ok(chunk("c")),
        ]));
        let contents: Vec<String> = logged_stream(inner, None)
            .map(|item| {
                item.unwrap().choices[0]
                    .delta
                    .content
                    .clone()
                    .unwrap_or_default()
            })
            .collect()
            .await;
        assert_eq!(contents, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_record_for_empty_stream_gets_empty_assistant_message() {
        let log = StreamLog {
            sink: TelemetrySink::new(
                reqwest::Client::new(),
                "http://127.0.0.1:1/data".to_string(),
                None,
            ),
            messages: vec![ChatMessage::new("user", "hi")],
            model: "my-adapter".to_string(),
            kwargs: Map::new(),
            tags: String::new(),
        };

        let record = log.build_record(None);
        assert_eq!(record.messages.len(), 2);
        assert_eq!(record.messages[1].role, "assistant");
        assert_eq!(record.messages[1].content.as_deref(), Some(""));
    }

    #[test]
    fn test_record_appends_merged_first_choice() {
        let log = StreamLog {
            sink: TelemetrySink::new(
                reqwest::Client::new(),
                "http://127.0.0.1:1/data".to_string(),
                None,
            ),
            messages: vec![ChatMessage::new("user", "hi")],
            model: "my-adapter".to_string(),
            kwargs: Map::new(),
            tags: String::new(),
        };

        let merged = merge::merge_chunk(None, &chunk("answer"));
        let record = log.build_record(Some(merged));
        assert_eq!(record.messages[1].content.as_deref(), Some("answer"));
    }

    #[tokio::test]
    async fn test_error_propagates_and_ends_stream() {
        let inner: ChatCompletionStream = Box::pin(futures::stream::iter(vec![
            Ok(chunk("a")),
            Err(TromeroError::Transport("reset".to_string())),
            Ok(chunk("never")),
        ]));
        let items: Vec<_> = logged_stream(inner, None).collect().await;
        assert_eq!(items.len(), 2);
        assert!(items[0].is_ok());
        assert!(items[1].is_err());
    }
}
