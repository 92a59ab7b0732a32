//! LLM provider implementations.
//!
//! Concrete implementations of the [`LlmProvider`](codeloom_core::llm::provider::LlmProvider)
//! trait, plus a factory ([`create_provider`]) that builds the configured one
//! from [`ProviderSettings`].

pub mod anthropic;
pub mod gemini;

use secrecy::SecretString;

use codeloom_core::llm::box_provider::BoxLlmProvider;
use codeloom_types::config::ProviderSettings;
use codeloom_types::llm::{LlmError, ProviderType};

use self::anthropic::AnthropicProvider;
use self::gemini::GeminiProvider;

/// Read the provider API key from the environment variable named in settings.
///
/// Empty values count as unset.
pub fn resolve_api_key(settings: &ProviderSettings) -> Option<SecretString> {
    std::env::var(settings.api_key_env())
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(SecretString::from)
}

/// Create a [`BoxLlmProvider`] from [`ProviderSettings`].
///
/// # Errors
///
/// `NotConfigured` when no API key is available, naming the variable to set.
pub fn create_provider(
    settings: &ProviderSettings,
    api_key: Option<SecretString>,
) -> Result<BoxLlmProvider, LlmError> {
    let key = api_key.ok_or_else(|| {
        LlmError::NotConfigured(format!(
            "{} API key missing; set {}",
            settings.kind,
            settings.api_key_env()
        ))
    })?;
    let model = settings.model().to_string();

    match settings.kind {
        ProviderType::Gemini => {
            let mut provider = GeminiProvider::new(key, model)?;
            if let Some(base_url) = &settings.base_url {
                provider = provider.with_base_url(base_url.clone());
            }
            Ok(BoxLlmProvider::new(provider))
        }
        ProviderType::Anthropic => {
            let mut provider = AnthropicProvider::new(key, model)?;
            if let Some(base_url) = &settings.base_url {
                provider = provider.with_base_url(base_url.clone());
            }
            Ok(BoxLlmProvider::new(provider))
        }
    }
}
