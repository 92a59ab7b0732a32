//! Chat turn protocol types for Codeloom.
//!
//! The client sends a [`ChatRequest`] (new message, recent turns, current
//! project state) and receives a [`ChatReply`] (explanatory text plus an
//! optional generated file).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::project::ProjectState;

/// Fixed user-facing text shown when a turn fails for any transport or
/// upstream reason.
pub const DEFAULT_APOLOGY: &str =
    "Sorry, something went wrong while processing your request. Please try again.";

/// First assistant turn of every new workspace session.
pub const GREETING: &str =
    "Hi! I'm here to help you build your app. Describe your idea and I'll start generating it.";

/// Who authored a chat turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

impl fmt::Display for TurnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TurnRole::User => write!(f, "user"),
            TurnRole::Assistant => write!(f, "assistant"),
        }
    }
}

impl FromStr for TurnRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(TurnRole::User),
            "assistant" => Ok(TurnRole::Assistant),
            other => Err(format!("invalid turn role: '{other}'")),
        }
    }
}

/// One message exchanged between the user and the assistant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: TurnRole,
    pub content: String,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Assistant,
            content: content.into(),
        }
    }
}

/// Body of a relay request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub message: String,

    #[serde(default)]
    pub conversation_history: Vec<ChatTurn>,

    /// Client's view of the project; the stored state is used when absent.
    #[serde(default)]
    pub project_state: Option<ProjectState>,
}

/// Structured reply of a chat turn.
///
/// `code` and `filename` serialize as `null` when absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    pub message: String,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
}

/// A file carried by a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeneratedFile<'a> {
    pub filename: &'a str,
    pub code: &'a str,
}

impl ChatReply {
    /// A text-only reply.
    pub fn text(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
            filename: None,
        }
    }

    /// The generated file, when both `code` and `filename` are present and
    /// non-empty.
    pub fn generated_file(&self) -> Option<GeneratedFile<'_>> {
        let filename = self.filename.as_deref().filter(|f| !f.trim().is_empty())?;
        let code = self.code.as_deref().filter(|c| !c.is_empty())?;
        Some(GeneratedFile { filename, code })
    }
}

/// Body returned by the relay when a turn fails.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatFailure {
    /// Diagnostic for logs and developers.
    pub error: String,
    /// The user-facing apology.
    pub message: String,
}
