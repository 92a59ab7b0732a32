//! Global configuration types for Codeloom.
//!
//! `GlobalConfig` represents the top-level `config.toml` that selects the LLM
//! provider, its sampling settings, the chat history window and the server
//! bind address.

use serde::{Deserialize, Serialize};

use crate::chat::DEFAULT_APOLOGY;
use crate::llm::{GenerationConfig, ProviderType};

/// Top-level configuration for Codeloom.
///
/// Loaded from `~/.codeloom/config.toml`. All fields have sensible defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlobalConfig {
    #[serde(default)]
    pub provider: ProviderSettings,

    #[serde(default)]
    pub generation: GenerationConfig,

    #[serde(default)]
    pub chat: ChatSettings,

    #[serde(default)]
    pub server: ServerSettings,
}

/// Which LLM backs the relay and how to reach it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSettings {
    #[serde(default = "default_provider_kind")]
    pub kind: ProviderType,

    /// Model identifier; provider default when unset.
    #[serde(default)]
    pub model: Option<String>,

    /// Override of the provider's API base URL (proxies, tests).
    #[serde(default)]
    pub base_url: Option<String>,

    /// Name of the environment variable holding the API key.
    #[serde(default)]
    pub api_key_env: Option<String>,
}

fn default_provider_kind() -> ProviderType {
    ProviderType::Gemini
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            kind: default_provider_kind(),
            model: None,
            base_url: None,
            api_key_env: None,
        }
    }
}

impl ProviderSettings {
    /// The configured model, or the provider's default.
    pub fn model(&self) -> &str {
        match (&self.model, self.kind) {
            (Some(model), _) => model,
            (None, ProviderType::Gemini) => "gemini-2.0-flash-exp",
            (None, ProviderType::Anthropic) => "claude-sonnet-4-20250514",
        }
    }

    /// The environment variable to read the API key from.
    pub fn api_key_env(&self) -> &str {
        match (&self.api_key_env, self.kind) {
            (Some(var), _) => var,
            (None, ProviderType::Gemini) => "GOOGLE_GEMINI_API_KEY",
            (None, ProviderType::Anthropic) => "ANTHROPIC_API_KEY",
        }
    }
}

/// Chat turn settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSettings {
    /// How many of the most recent turns are forwarded to the LLM.
    #[serde(default = "default_history_window")]
    pub history_window: usize,

    /// Text shown to the user when a turn fails.
    #[serde(default = "default_apology_message")]
    pub apology_message: String,
}

fn default_history_window() -> usize {
    10
}

fn default_apology_message() -> String {
    DEFAULT_APOLOGY.to_string()
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            history_window: default_history_window(),
            apology_message: default_apology_message(),
        }
    }
}

/// REST server bind address.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}
