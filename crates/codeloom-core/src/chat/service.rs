//! Chat relay: turns a [`ChatRequest`] into an LLM call and a [`ChatReply`].
//!
//! The relay resolves the caller's project state, builds the system prompt
//! and the trimmed conversation, calls the provider once, and parses the
//! answer. It never writes project state; persisting a generated file is the
//! client's decision (see [`crate::chat::session`]).

use std::sync::Arc;
use std::time::Instant;

use codeloom_types::chat::{ChatFailure, ChatReply, ChatRequest, ChatTurn};
use codeloom_types::config::ChatSettings;
use codeloom_types::error::{ChatError, ProjectError};
use codeloom_types::llm::{CompletionRequest, GenerationConfig, Message, MessageRole};
use codeloom_types::project::ProjectState;
use tracing::{Instrument, error, info, info_span};

use crate::chat::prompt::build_system_prompt;
use crate::chat::reply::parse_reply;
use crate::llm::box_provider::BoxLlmProvider;
use crate::project::repository::ProjectRepository;
use crate::project::service::ProjectService;

/// Relays chat turns to the configured LLM provider.
pub struct ChatService<R: ProjectRepository> {
    projects: Arc<ProjectService<R>>,
    provider: BoxLlmProvider,
    generation: GenerationConfig,
    settings: ChatSettings,
}

impl<R: ProjectRepository> ChatService<R> {
    pub fn new(
        projects: Arc<ProjectService<R>>,
        provider: BoxLlmProvider,
        generation: GenerationConfig,
        settings: ChatSettings,
    ) -> Self {
        Self {
            projects,
            provider,
            generation,
            settings,
        }
    }

    /// The project service used to resolve state.
    pub fn projects(&self) -> &Arc<ProjectService<R>> {
        &self.projects
    }

    pub fn settings(&self) -> &ChatSettings {
        &self.settings
    }

    /// The fixed user-facing failure text.
    pub fn apology(&self) -> &str {
        &self.settings.apology_message
    }

    /// Failure body for a turn that could not be completed.
    pub fn failure(&self, err: &ChatError) -> ChatFailure {
        ChatFailure {
            error: err.to_string(),
            message: self.apology().to_string(),
        }
    }

    /// Run one chat turn for a user.
    ///
    /// # Errors
    ///
    /// `EmptyMessage` for a blank message; `Upstream` for any provider
    /// failure; `Project` when the supplied state has an invalid file name or
    /// the stored state cannot be read.
    pub async fn relay(&self, user_id: &str, request: ChatRequest) -> Result<ChatReply, ChatError> {
        if request.message.trim().is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        if let Some(supplied) = &request.project_state {
            supplied.validate()?;
        }

        let state = self
            .projects
            .resolve(user_id, request.project_state)
            .await
            .map_err(ProjectError::from)?;

        let completion =
            self.build_request(&state, &request.conversation_history, &request.message);

        let span = info_span!(
            "chat",
            provider = self.provider.name(),
            model = %completion.model,
            user_id,
        );

        async {
            info!(messages = completion.messages.len(), "Calling LLM provider");
            let started = Instant::now();

            let response = self.provider.complete(&completion).await.map_err(|e| {
                error!(error = %e, "LLM provider call failed");
                ChatError::Upstream(e)
            })?;

            let reply = parse_reply(&response.content);
            info!(
                elapsed_ms = started.elapsed().as_millis() as u64,
                input_tokens = response.usage.input_tokens,
                output_tokens = response.usage.output_tokens,
                filename = reply.filename.as_deref().unwrap_or(""),
                "LLM reply received"
            );
            Ok::<ChatReply, ChatError>(reply)
        }
        .instrument(span)
        .await
    }

    /// Build the provider request for a turn.
    ///
    /// Only the last `history_window` turns of `history` are forwarded.
    pub fn build_request(
        &self,
        state: &ProjectState,
        history: &[ChatTurn],
        message: &str,
    ) -> CompletionRequest {
        let skip = history.len().saturating_sub(self.settings.history_window);

        let mut messages: Vec<Message> = history[skip..]
            .iter()
            .map(|turn| Message {
                role: turn.role,
                content: turn.content.clone(),
            })
            .collect();
        messages.push(Message {
            role: MessageRole::User,
            content: message.to_string(),
        });

        CompletionRequest {
            model: self.provider.default_model().to_string(),
            system: Some(build_system_prompt(state)),
            messages,
            generation: self.generation.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{InMemoryProjectRepository, MockProvider};
    use codeloom_types::llm::LlmError;

    fn service_with(provider: MockProvider) -> ChatService<InMemoryProjectRepository> {
        let projects = Arc::new(ProjectService::new(InMemoryProjectRepository::default()));
        ChatService::new(
            projects,
            BoxLlmProvider::new(provider),
            GenerationConfig::default(),
            ChatSettings::default(),
        )
    }

    fn request(message: &str) -> ChatRequest {
        ChatRequest {
            message: message.to_string(),
            conversation_history: Vec::new(),
            project_state: None,
        }
    }

    #[tokio::test]
    async fn test_relay_parses_structured_reply() {
        let svc = service_with(MockProvider::replying(
            r#"{"message": "Here is your page", "code": "<h1>Tasks</h1>", "filename": "index.html"}"#,
        ));
        let reply = svc.relay("alice", request("a todo app")).await.unwrap();
        assert_eq!(reply.message, "Here is your page");
        assert_eq!(reply.filename.as_deref(), Some("index.html"));
    }

    #[tokio::test]
    async fn test_relay_does_not_write_state() {
        let svc = service_with(MockProvider::replying(
            r#"{"message": "m", "code": "x", "filename": "index.html"}"#,
        ));
        svc.relay("alice", request("go")).await.unwrap();
        assert!(svc.projects().repo().get("alice").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_relay_rejects_blank_message() {
        let mock = MockProvider::replying("unused");
        let requests = mock.requests();
        let svc = service_with(mock);

        let err = svc.relay("alice", request("   ")).await.unwrap_err();
        assert!(matches!(err, ChatError::EmptyMessage));
        assert!(requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_relay_upstream_error_single_attempt() {
        let mock = MockProvider::failing_with_status(503);
        let requests = mock.requests();
        let svc = service_with(mock);

        let err = svc.relay("alice", request("hello")).await.unwrap_err();
        assert!(matches!(err, ChatError::Upstream(LlmError::Provider { .. })));
        assert_eq!(requests.lock().unwrap().len(), 1, "no retry on failure");

        let failure = svc.failure(&err);
        assert_eq!(failure.message, svc.apology());
        assert!(failure.error.contains("503"));
    }

    #[tokio::test]
    async fn test_relay_empty_candidates_is_upstream_error() {
        let svc = service_with(MockProvider::empty());
        let err = svc.relay("alice", request("hello")).await.unwrap_err();
        assert!(matches!(err, ChatError::Upstream(LlmError::EmptyResponse)));
    }

    #[tokio::test]
    async fn test_relay_uses_stored_state_when_none_supplied() {
        let mock = MockProvider::replying("ok");
        let requests = mock.requests();
        let svc = service_with(mock);
        svc.projects()
            .apply_generated_file("alice", "stored.html", "s")
            .await
            .unwrap();

        svc.relay("alice", request("hi")).await.unwrap();

        let recorded = requests.lock().unwrap();
        let system = recorded[0].system.as_deref().unwrap();
        assert!(system.contains("- Existing files: stored.html"));
    }

    #[tokio::test]
    async fn test_relay_prefers_supplied_state() {
        let mock = MockProvider::replying("ok");
        let requests = mock.requests();
        let svc = service_with(mock);

        let mut supplied = ProjectState::default();
        supplied.merge_file("client.html", "c").unwrap();
        let mut req = request("hi");
        req.project_state = Some(supplied);
        svc.relay("alice", req).await.unwrap();

        let recorded = requests.lock().unwrap();
        let system = recorded[0].system.as_deref().unwrap();
        assert!(system.contains("- Existing files: client.html"));
    }

    #[tokio::test]
    async fn test_relay_rejects_supplied_state_with_unsafe_name() {
        let mock = MockProvider::replying("unused");
        let requests = mock.requests();
        let svc = service_with(mock);

        let mut supplied = ProjectState::default();
        supplied.files.push(codeloom_types::project::ProjectFile {
            name: "../escape.html".to_string(),
            content: String::new(),
        });
        let mut req = request("hi");
        req.project_state = Some(supplied);

        let err = svc.relay("alice", req).await.unwrap_err();
        assert!(matches!(
            err,
            ChatError::Project(ProjectError::InvalidFileName { .. })
        ));
        assert!(err.is_client_error());
        assert!(requests.lock().unwrap().is_empty());
    }

    #[test]
    fn test_build_request_trims_history_window() {
        let svc = service_with(MockProvider::replying("ok"));
        let history: Vec<ChatTurn> = (0..15)
            .map(|i| {
                if i % 2 == 0 {
                    ChatTurn::user(format!("u{i}"))
                } else {
                    ChatTurn::assistant(format!("a{i}"))
                }
            })
            .collect();

        let req = svc.build_request(&ProjectState::default(), &history, "latest");
        assert_eq!(req.messages.len(), 11);
        assert_eq!(req.messages[0].content, "a5");
        assert_eq!(req.messages[9].content, "u14");
        assert_eq!(req.messages[10].content, "latest");
        assert_eq!(req.messages[10].role, MessageRole::User);
        assert_eq!(req.model, "mock-model");
        assert_eq!(req.generation.max_output_tokens, 8192);
    }

    #[test]
    fn test_build_request_short_history_kept_whole() {
        let svc = service_with(MockProvider::replying("ok"));
        let history = vec![ChatTurn::user("hi"), ChatTurn::assistant("hello")];
        let req = svc.build_request(&ProjectState::default(), &history, "next");
        assert_eq!(req.messages.len(), 3);
        assert_eq!(req.messages[1].role, MessageRole::Assistant);
    }
}
