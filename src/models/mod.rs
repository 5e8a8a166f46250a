//! Data models for chat completions and the Tromero wire protocol

pub mod chat;
pub mod wire;
