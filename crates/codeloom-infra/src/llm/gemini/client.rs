//! GeminiProvider -- [`LlmProvider`] for Google's Generative Language API.
//!
//! Sends one non-streaming `generateContent` call per completion. Gemini has
//! no separate system field in this request shape, so the system prompt is
//! sent as the opening user turn, followed by the history and the new message.
//!
//! The API key is wrapped in [`secrecy::SecretString`] and only exposed when
//! building the request header.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use codeloom_core::llm::provider::LlmProvider;
use codeloom_types::llm::{
    CompletionRequest, CompletionResponse, LlmError, MessageRole, Usage,
};

use super::types::{
    GeminiContent, GeminiGenerationConfig, GeminiPart, GeminiRequest, GeminiResponse,
};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

pub struct GeminiProvider {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
    model: String,
}

impl GeminiProvider {
    pub fn new(api_key: SecretString, model: String) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(300))
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

    /// Override the base URL (proxies, tests).
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn url(&self, model: &str) -> String {
        format!("{}/v1beta/models/{model}:generateContent", self.base_url)
    }
}

/// Convert a generic request into the Gemini body.
pub(crate) fn to_gemini_request(request: &CompletionRequest) -> GeminiRequest {
    let mut contents = Vec::with_capacity(request.messages.len() + 1);

    if let Some(system) = request.system.as_deref().filter(|s| !s.is_empty()) {
        contents.push(GeminiContent {
            role: Some("user".to_string()),
            parts: vec![GeminiPart::text(system)],
        });
    }

    contents.extend(request.messages.iter().map(|m| GeminiContent {
        role: Some(
            match m.role {
                MessageRole::User => "user",
                MessageRole::Assistant => "model",
            }
            .to_string(),
        ),
        parts: vec![GeminiPart::text(m.content.clone())],
    }));

    GeminiRequest {
        contents,
        generation_config: GeminiGenerationConfig {
            temperature: request.generation.temperature,
            top_k: request.generation.top_k,
            top_p: request.generation.top_p,
            max_output_tokens: request.generation.max_output_tokens,
        },
    }
}

/// Extract the reply text of the first candidate.
pub(crate) fn from_gemini_response(
    response: GeminiResponse,
    requested_model: &str,
) -> Result<CompletionResponse, LlmError> {
    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or(LlmError::EmptyResponse)?;

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();
    if text.is_empty() {
        return Err(LlmError::EmptyResponse);
    }

    let usage = response.usage_metadata.unwrap_or_default();
    Ok(CompletionResponse {
        content: text,
        model: response
            .model_version
            .unwrap_or_else(|| requested_model.to_string()),
        finish_reason: candidate.finish_reason,
        usage: Usage {
            input_tokens: usage.prompt_token_count,
            output_tokens: usage.candidates_token_count,
        },
    })
}

/// Map a non-success HTTP status to an [`LlmError`].
///
/// The upstream body only goes to the logs; the error carries the status.
pub(crate) fn map_status_error(status: u16, retry_after: Option<u64>) -> LlmError {
    match status {
        401 | 403 => LlmError::AuthenticationFailed,
        429 => LlmError::RateLimited {
            retry_after_ms: retry_after.map(|secs| secs * 1000),
        },
        503 => LlmError::Overloaded(format!("Gemini API error: {status}")),
        _ => LlmError::Provider {
            message: format!("Gemini API error: {status}"),
        },
    }
}

impl LlmProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    fn default_model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let model = if request.model.is_empty() {
            self.model.as_str()
        } else {
            request.model.as_str()
        };
        let body = to_gemini_request(request);

        let response = self
            .client
            .post(self.url(model))
            .header("x-goog-api-key", self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Provider {
                message: format!("HTTP request failed: {e}"),
            })?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok());
            let error_body = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), body = %error_body, "Gemini API error");
            return Err(map_status_error(status.as_u16(), retry_after));
        }

        let gemini_resp: GeminiResponse = response.json().await.map_err(|e| {
            LlmError::Deserialization(format!("failed to parse response: {e}"))
        })?;

        from_gemini_response(gemini_resp, model)
    }
}
