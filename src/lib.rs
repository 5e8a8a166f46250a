//! Tromero client SDK
//!
//! A drop-in chat completions client that routes each request to the right
//! backend for its model name: OpenAI-family models go straight to the
//! OpenAI API, fine-tuned and base models go to the Tromero serving layer.
//! Both paths return the same OpenAI-compatible completion and chunk types,
//! and both can log the finished exchange to Tromero without blocking the
//! caller.
//!
//! ```no_run
//! use tromero::{ChatCompletionRequest, ChatMessage, Tromero, TromeroOptions};
//!
//! # async fn run() -> Result<(), tromero::TromeroError> {
//! let client = Tromero::new(
//!     TromeroOptions::new()
//!         .openai_key("sk-...")
//!         .tromero_key("tk-..."),
//! )?;
//!
//! let request = ChatCompletionRequest {
//!     model: "my-fine-tuned-model".to_string(),
//!     messages: vec![ChatMessage::new("user", "Hello!")],
//!     ..Default::default()
//! };
//! let completion = client.chat().completions().create(request).await?;
//! # Ok(())
//! # }
//! ```

pub mod backends;
pub mod client;
pub mod core;
pub mod error;
pub mod models;
pub mod streaming;
pub mod telemetry;

pub use crate::client::Tromero;
pub use crate::core::classifier::ModelKind;
pub use crate::core::config::TromeroOptions;
pub use crate::core::logging::init_logging;
pub use crate::error::TromeroError;
pub use crate::models::chat::{
    ChatCompletion, ChatCompletionChunk, ChatCompletionRequest, ChatMessage, Usage,
};
pub use crate::streaming::ChatCompletionStream;
