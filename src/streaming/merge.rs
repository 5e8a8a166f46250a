//! Streamed chunk merging
//!
//! Incrementally folds streaming chunks into one logical completion. The
//! merged completion backs the telemetry record for streamed requests, so
//! its content must be a strict concatenation of all deltas per choice in
//! arrival order.

use crate::core::constants::{finish, role};
use crate::models::chat::{
    ChatChoice, ChatCompletion, ChatCompletionChunk, ChatMessage, ToolCall, ToolCallDelta,
};

fn tool_call_from_delta(delta: &ToolCallDelta) -> ToolCall {
    ToolCall {
        id: delta.id.clone().unwrap_or_default(),
        call_type: delta.call_type.clone(),
        function: delta.function.clone(),
    }
}

/// Merge a chunk into the accumulation built so far
///
/// Passing `None` seeds an accumulation from the chunk's envelope fields and
/// merges the chunk into that seed. Choices are keyed by `index`:
/// `finish_reason` is sticky once set, delta content is appended treating
/// missing content as empty, and tool-call deltas accumulate in arrival
/// order with absent ids defaulted to the empty string.
pub fn merge_chunk(base: Option<ChatCompletion>, chunk: &ChatCompletionChunk) -> ChatCompletion {
    let mut merged = base.unwrap_or_else(|| ChatCompletion {
        id: chunk.id.clone(),
        object: "chat.completion".to_string(),
        created: chunk.created,
        model: chunk.model.clone(),
        choices: Vec::new(),
        usage: None,
    });

    for choice in &chunk.choices {
        if let Some(existing) = merged.choices.iter_mut().find(|c| c.index == choice.index) {
            if choice.finish_reason.is_some() {
                existing.finish_reason = choice.finish_reason.clone();
            }

            if let Some(delta_content) = &choice.delta.content {
                let mut content = existing.message.content.take().unwrap_or_default();
                content.push_str(delta_content);
                existing.message.content = Some(content);
            }

            if let Some(tool_deltas) = &choice.delta.tool_calls {
                let calls = existing.message.tool_calls.get_or_insert_with(Vec::new);
                calls.extend(tool_deltas.iter().map(tool_call_from_delta));
            }
        } else {
            merged.choices.push(ChatChoice {
                index: choice.index,
                finish_reason: Some(
                    choice
                        .finish_reason
                        .clone()
                        .unwrap_or_else(|| finish::STOP.to_string()),
                ),
                logprobs: choice.logprobs.clone(),
                message: ChatMessage {
                    role: choice
                        .delta
                        .role
                        .clone()
                        .unwrap_or_else(|| role::ASSISTANT.to_string()),
                    content: choice.delta.content.clone(),
                    tool_calls: choice
                        .delta
                        .tool_calls
                        .as_ref()
                        .map(|deltas| deltas.iter().map(tool_call_from_delta).collect()),
                    tool_call_id: None,
                },
            });
        }
    }

    if chunk.usage.is_some() {
        merged.usage = chunk.usage.clone();
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::chat::{ChatDelta, ChunkChoice, ToolFunction};

    fn chunk_with(choices: Vec<ChunkChoice>) -> ChatCompletionChunk {
        ChatCompletionChunk {
            id: "chatcmpl-1".to_string(),
            object: "chat.completion.chunk".to_string(),
            created: 1_700_000_000,
            model: "gpt-4o".to_string(),
            choices,
            usage: None,
        }
    }

    fn content_choice(index: u32, content: &str, finish_reason: Option<&str>) -> ChunkChoice {
        ChunkChoice {
            index,
            delta: ChatDelta {
                role: Some("assistant".to_string()),
                content: Some(content.to_string()),
                tool_calls: None,
            },
            finish_reason: finish_reason.map(str::to_string),
            logprobs: None,
        }
    }

    #[test]
    fn test_content_concatenation() {
        let mut merged = None;
        for piece in ["Hel", "lo", " world"] {
            merged = Some(merge_chunk(merged, &chunk_with(vec![content_choice(0, piece, None)])));
        }
        let merged = merged.unwrap();
        assert_eq!(merged.choices.len(), 1);
        assert_eq!(merged.choices[0].message.content.as_deref(), Some("Hello world"));
    }

    #[test]
    fn test_seed_from_none_copies_envelope() {
        let merged = merge_chunk(None, &chunk_with(vec![content_choice(0, "a", None)]));
        assert_eq!(merged.id, "chatcmpl-1");
        assert_eq!(merged.object, "chat.completion");
        assert_eq!(merged.created, 1_700_000_000);
        assert_eq!(merged.model, "gpt-4o");
    }

    #[test]
    fn test_distinct_indices_merge_order_independent() {
        let a = chunk_with(vec![content_choice(0, "first", Some("stop"))]);
        let b = chunk_with(vec![content_choice(1, "second", Some("length"))]);

        let mut forward = merge_chunk(Some(merge_chunk(None, &a)), &b);
        let mut reverse = merge_chunk(Some(merge_chunk(None, &b)), &a);
        forward.choices.sort_by_key(|c| c.index);
        reverse.choices.sort_by_key(|c| c.index);

        let flat = |c: &ChatCompletion| {
            c.choices
                .iter()
                .map(|ch| {
                    (
                        ch.index,
                        ch.message.content.clone(),
                        ch.finish_reason.clone(),
                    )
                })
                .collect::<Vec<_>>()
        };
        assert_eq!(flat(&forward), flat(&reverse));
    }

    #[test]
    fn test_finish_reason_sticky() {
        let merged = merge_chunk(None, &chunk_with(vec![content_choice(0, "a", Some("stop"))]));
        let merged = merge_chunk(Some(merged), &chunk_with(vec![content_choice(0, "b", None)]));
        assert_eq!(merged.choices[0].finish_reason.as_deref(), Some("stop"));
    }

    #[test]
    fn test_tool_call_deltas_accumulate_in_order() {
        let tool_chunk = |id: Option<&str>, name: &str| {
            chunk_with(vec![ChunkChoice {
                index: 0,
                delta: ChatDelta {
                    role: None,
                    content: None,
                    tool_calls: Some(vec![ToolCallDelta {
                        index: 0,
                        id: id.map(str::to_string),
                        call_type: Some("function".to_string()),
                        function: Some(ToolFunction {
                            name: Some(name.to_string()),
                            arguments: None,
                        }),
                    }]),
                },
                finish_reason: None,
                logprobs: None,
            }])
        };

        let merged = merge_chunk(None, &tool_chunk(Some("call_1"), "lookup"));
        let merged = merge_chunk(Some(merged), &tool_chunk(None, "lookup_more"));

        let calls = merged.choices[0].message.tool_calls.as_ref().unwrap();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].id, "call_1");
        assert_eq!(calls[1].id, "");
        assert_eq!(
            calls[1].function.as_ref().unwrap().name.as_deref(),
            Some("lookup_more")
        );
    }

    #[test]
    fn test_unknown_index_defaults_finish_reason_to_stop() {
        let merged = merge_chunk(None, &chunk_with(vec![content_choice(2, "x", None)]));
        assert_eq!(merged.choices[0].finish_reason.as_deref(), Some("stop"));
        assert_eq!(merged.choices[0].index, 2);
    }
}
