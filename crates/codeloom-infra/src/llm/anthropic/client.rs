//! AnthropicProvider -- [`LlmProvider`] implementation for Anthropic Claude.
//!
//! Sends non-streaming requests to the Anthropic Messages API
//! (`/v1/messages`). The API key is wrapped in [`secrecy::SecretString`] and
//! is only exposed when constructing request headers.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use codeloom_core::llm::provider::LlmProvider;
use codeloom_types::llm::{CompletionRequest, CompletionResponse, LlmError, Usage};

use super::types::{AnthropicContentBlock, AnthropicMessage, AnthropicRequest, AnthropicResponse};

pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";

pub struct AnthropicProvider {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
    model: String,
}

impl AnthropicProvider {
    /// The Anthropic API version header value.
    const API_VERSION: &'static str = "2023-06-01";

    pub fn new(api_key: SecretString, model: String) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(300)) // long generations
            .build()
            .map_err(|e| LlmError::Provider {
                message: format!("failed to create HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            model,
        })
    }

    /// Override the base URL (useful for testing or proxies).
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Convert a generic [`CompletionRequest`] into an [`AnthropicRequest`].
    fn to_anthropic_request(&self, request: &CompletionRequest) -> AnthropicRequest {
        let messages = request
            .messages
            .iter()
            .map(|m| AnthropicMessage {
                role: m.role.to_string(),
                content: m.content.clone(),
            })
            .collect();

        let model = if request.model.is_empty() {
            self.model.clone()
        } else {
            request.model.clone()
        };

        AnthropicRequest {
            model,
            max_tokens: request.generation.max_output_tokens,
            messages,
            system: request.system.clone(),
            temperature: request.generation.temperature,
            top_k: request.generation.top_k,
            top_p: request.generation.top_p,
        }
    }
}

/// Join the text blocks of a response.
fn from_anthropic_response(resp: AnthropicResponse) -> Result<CompletionResponse, LlmError> {
    let content = resp
        .content
        .iter()
        .filter_map(|block| match block {
            AnthropicContentBlock::Text { text } => Some(text.as_str()),
            AnthropicContentBlock::Other => None,
        })
        .collect::<Vec<_>>()
        .join("");

    if content.is_empty() {
        return Err(LlmError::EmptyResponse);
    }

    Ok(CompletionResponse {
        content,
        model: resp.model,
        finish_reason: resp.stop_reason,
        usage: Usage {
            input_tokens: resp.usage.input_tokens,
            output_tokens: resp.usage.output_tokens,
        },
    })
}

/// Map a non-success HTTP status to an [`LlmError`] without the upstream body.
pub(crate) fn map_status_error(status: u16) -> LlmError {
    match status {
        401 => LlmError::AuthenticationFailed,
        429 => LlmError::RateLimited {
            retry_after_ms: None,
        },
        529 => LlmError::Overloaded(format!("Anthropic API error: {status}")),
        _ => LlmError::Provider {
            message: format!("Anthropic API error: {status}"),
        },
    }
}

impl LlmProvider for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    fn default_model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let body = self.to_anthropic_request(request);
        let url = self.url("/v1/messages");

        let response = self
            .client
            .post(&url)
            .header("x-api-key", self.api_key.expose_secret())
            .header("anthropic-version", Self::API_VERSION)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Provider {
                message: format!("HTTP request failed: {e}"),
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), body = %error_body, "Anthropic API error");
            return Err(map_status_error(status.as_u16()));
        }

        let anthropic_resp: AnthropicResponse = response.json().await.map_err(|e| {
            LlmError::Deserialization(format!("failed to parse response: {e}"))
        })?;

        from_anthropic_response(anthropic_resp)
    }
}
