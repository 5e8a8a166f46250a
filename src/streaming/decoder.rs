//! Token stream decoding for the Tromero serving layer
//!
//! The `generate_stream` endpoint frames its output as newline-delimited
//! `data:`-prefixed JSON records, one `{token: {text, special}}` object per
//! token event. Lines arrive from a buffered line reader, so a frame split
//! across TCP segment boundaries is reassembled before it reaches the
//! decoder. Malformed frames are skipped with a warning; they never abort
//! the stream.

use crate::core::constants::{DATA_PREFIX, finish};
use crate::error::TromeroError;
use crate::models::chat::ChatCompletionChunk;
use crate::models::wire::TokenFrame;
use crate::streaming::ChatCompletionStream;
use futures::Stream;
use futures::StreamExt;
use tracing::warn;

/// Decode one `data:` line into a chunk, if it carries a valid token frame
fn decode_line(line: &str, model: &str) -> Option<ChatCompletionChunk> {
    let trimmed = line.trim();
    if trimmed.is_empty() || !trimmed.starts_with(DATA_PREFIX) {
        return None;
    }

    let payload = trimmed[DATA_PREFIX.len()..].trim();
    match serde_json::from_str::<TokenFrame>(payload) {
        Ok(frame) => {
            let finish_reason = frame
                .token
                .special
                .then(|| finish::STOP.to_string());
            Some(ChatCompletionChunk::from_token(
                model,
                frame.token.text,
                finish_reason,
            ))
        }
        Err(e) => {
            warn!("Skipping malformed stream frame: {} (line: {})", e, payload);
            None
        }
    }
}

/// Turn a line stream from `generate_stream` into a chunk stream
///
/// One chunk is yielded per decoded token event, in arrival order. A read
/// error from the transport terminates the stream with that error; the
/// underlying reader is released when the stream is dropped, whether or not
/// the consumer drained it.
pub fn decode_token_stream<S>(lines: S, model: String) -> ChatCompletionStream
where
    S: Stream<Item = Result<String, std::io::Error>> + Send + 'static,
{
    let stream = async_stream::stream! {
        futures::pin_mut!(lines);
        while let Some(line) = lines.next().await {
            match line {
                Ok(line) => {
                    if let Some(chunk) = decode_line(&line, &model) {
                        yield Ok(chunk);
                    }
                }
                Err(e) => {
                    yield Err(TromeroError::Transport(e.to_string()));
                    return;
                }
            }
        }
    };
    Box::pin(stream)
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    async fn decode_all(lines: Vec<&'static str>) -> Vec<Result<ChatCompletionChunk, TromeroError>> {
        let line_stream =
            futures::stream::iter(lines.into_iter().map(|l| Ok::<_, std::io::Error>(l.to_string())));
        decode_token_stream(line_stream, "my-adapter".to_string())
            .collect()
            .await
    }

    #[tokio::test]
    async fn test_malformed_frame_is_skipped() {
        let results = decode_all(vec![
            r#"data:{"token":{"text":"a","special":false}}"#,
            "data:not-json",
        ])
        .await;

        assert_eq!(results.len(), 1);
        let chunk = results[0].as_ref().unwrap();
        assert_eq!(chunk.choices[0].delta.content.as_deref(), Some("a"));
        assert!(chunk.choices[0].finish_reason.is_none());
    }

    #[tokio::test]
    async fn test_blank_and_unprefixed_lines_are_ignored() {
        let results = decode_all(vec![
            "",
            "   ",
            r#"{"token":{"text":"no prefix","special":false}}"#,
            r#"data: {"token":{"text":"ok","special":false}}"#,
        ])
        .await;

        assert_eq!(results.len(), 1);
        assert_eq!(
            results[0].as_ref().unwrap().choices[0].delta.content.as_deref(),
            Some("ok")
        );
    }

    #[tokio::test]
    async fn test_special_token_maps_to_stop() {
        let results = decode_all(vec![r#"data:{"token":{"text":"","special":true}}"#]).await;
        assert_eq!(
            results[0].as_ref().unwrap().choices[0].finish_reason.as_deref(),
            Some("stop")
        );
    }

    #[tokio::test]
    async fn test_frame_without_token_field_is_skipped() {
        let results = decode_all(vec![
            r#"data:{"noise":true}"#,
            r#"data:{"token":{"text":"kept","special":false}}"#,
        ])
        .await;
        assert_eq!(results.len(), 1);
        assert_eq!(
            results[0].as_ref().unwrap().choices[0].delta.content.as_deref(),
            Some("kept")
        );
    }

    #[tokio::test]
    async fn test_transport_error_terminates_stream() {
        let lines: Vec<Result<String, std::io::Error>> = vec![
            Ok(r#"data:{"token":{"text":"a","special":false}}"#.to_string()),
            Err(std::io::Error::other("connection reset")),
            Ok(r#"data:{"token":{"text":"never","special":false}}"#.to_string()),
        ];
        let results: Vec<_> = decode_token_stream(
            futures::stream::iter(lines),
            "my-adapter".to_string(),
        )
        .collect()
        .await;

        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(TromeroError::Transport(_))));
    }
}
