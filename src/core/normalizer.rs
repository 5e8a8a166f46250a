//! Message normalization
//!
//! The Tromero serving layer and the telemetry schema expect at most one
//! leading system prompt, so consecutive leading system messages are
//! collapsed into one. Normalization runs before dispatch and before any
//! telemetry record is built, keeping the logged conversation identical to
//! the one sent.

use crate::core::constants::role;
use crate::models::chat::ChatMessage;
use tracing::warn;

/// Collapse multiple leading system messages into a single one
///
/// Leading system message contents are joined with single spaces and
/// trimmed. Inputs with at most one leading system message are returned
/// unchanged; messages after the first non-system message are never touched.
pub fn normalize_messages(messages: Vec<ChatMessage>) -> Vec<ChatMessage> {
    let mut system_prompt = String::new();
    let mut num_prompts = 0;

    for message in &messages {
        if message.role == role::SYSTEM {
            if let Some(content) = &message.content {
                system_prompt.push_str(content);
                system_prompt.push(' ');
            }
            num_prompts += 1;
        } else {
            break;
        }
    }

    if num_prompts <= 1 {
        return messages;
    }

    warn!(
        "Multiple system prompts will be combined into one prompt when saving data or calling custom models."
    );

    let combined = ChatMessage::new(role::SYSTEM, system_prompt.trim_end());
    let mut normalized = Vec::with_capacity(messages.len() - num_prompts + 1);
    normalized.push(combined);
    normalized.extend(messages.into_iter().skip(num_prompts));
    normalized
}
