//! LlmProvider trait definition.
//!
//! This is the core abstraction that all LLM providers implement.

use codeloom_types::llm::{CompletionRequest, CompletionResponse, LlmError};

/// Trait for LLM provider backends (Gemini, Anthropic).
///
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
/// Implementations live in codeloom-infra (e.g., `GeminiProvider`).
pub trait LlmProvider: Send + Sync {
    /// Human-readable provider name (e.g., "gemini").
    fn name(&self) -> &str;

    /// Model used when a request leaves `model` empty.
    fn default_model(&self) -> &str;

    /// Send a completion request and receive the full response.
    fn complete(
        &self,
        request: &CompletionRequest,
    ) -> impl std::future::Future<Output = Result<CompletionResponse, LlmError>> + Send;
}
