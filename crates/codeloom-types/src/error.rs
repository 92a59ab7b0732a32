use thiserror::Error;

use crate::llm::LlmError;

/// Errors from repository operations (used by trait definitions in codeloom-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),
}

/// Errors related to project state operations.
#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("invalid file name '{name}': {reason}")]
    InvalidFileName { name: String, reason: String },

    #[error("file '{0}' not found in project")]
    FileNotFound(String),

    #[error("storage error: {0}")]
    Storage(#[from] RepositoryError),
}

/// Errors from a chat turn.
///
/// Anything other than `EmptyMessage` is surfaced to the user as the fixed
/// apology message; the variant only feeds the logs.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("message must not be empty")]
    EmptyMessage,

    #[error("upstream error: {0}")]
    Upstream(#[from] LlmError),

    #[error("project error: {0}")]
    Project(#[from] ProjectError),
}

impl ChatError {
    /// Whether the error was caused by the caller rather than the relay or upstream.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ChatError::EmptyMessage | ChatError::Project(ProjectError::InvalidFileName { .. })
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_error_display() {
        let err = RepositoryError::Query("syntax error".to_string());
        assert_eq!(err.to_string(), "query error: syntax error");
    }

    #[test]
    fn test_invalid_file_name_display() {
        let err = ProjectError::InvalidFileName {
            name: "../etc/passwd".to_string(),
            reason: "parent directory component".to_string(),
        };
        assert!(err.to_string().contains("../etc/passwd"));
        assert!(err.to_string().contains("parent directory"));
    }

    #[test]
    fn test_chat_error_from_llm_error() {
        let err: ChatError = LlmError::AuthenticationFailed.into();
        assert!(matches!(err, ChatError::Upstream(LlmError::AuthenticationFailed)));
        assert!(!err.is_client_error());
    }

    #[test]
    fn test_empty_message_is_client_error() {
        assert!(ChatError::EmptyMessage.is_client_error());
    }
}
