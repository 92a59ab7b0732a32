//! Google Gemini provider over the `generateContent` REST endpoint.

pub mod client;
pub mod types;

pub use client::GeminiProvider;
