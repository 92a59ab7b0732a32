//! Anthropic Claude provider over the Messages API.

pub mod client;
pub mod types;

pub use client::AnthropicProvider;
