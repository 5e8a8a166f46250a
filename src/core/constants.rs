//! String constants used across the SDK

/// Message role constants
pub mod role {
    /// User role identifier
    pub const USER: &str = "user";

    /// Assistant role identifier
    pub const ASSISTANT: &str = "assistant";

    /// System role identifier
    pub const SYSTEM: &str = "system";

    /// Tool role identifier
    pub const TOOL: &str = "tool";
}

/// Finish reason constants
pub mod finish {
    /// Natural end of generation
    pub const STOP: &str = "stop";

    /// Token limit reached
    pub const LENGTH: &str = "length";

    /// Generation ended on a tool call
    pub const TOOL_CALLS: &str = "tool_calls";
}

/// Adapter name sent when the target model is an un-adapted base model
pub const NO_ADAPTER: &str = "NO_ADAPTER";

/// Default base URL for the Tromero API
pub const DEFAULT_BASE_URL: &str = "https://midyear-grid-402910.lm.r.appspot.com/tailor/v1";

/// Default base URL for the OpenAI API
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Terminal sentinel of the OpenAI SSE stream
pub const SSE_DONE: &str = "[DONE]";

/// Prefix of data frames on both backends' streaming responses
pub const DATA_PREFIX: &str = "data:";
