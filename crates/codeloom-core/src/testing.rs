//! Test doubles shared by the unit tests in this crate.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use codeloom_types::error::RepositoryError;
use codeloom_types::llm::{CompletionRequest, CompletionResponse, LlmError, Usage};
use codeloom_types::project::ProjectState;

use crate::llm::provider::LlmProvider;
use crate::project::repository::ProjectRepository;

#[derive(Clone)]
enum MockResult {
    Reply(String),
    Upstream(u16),
    Empty,
}

/// Provider returning a canned reply (or error) and recording every request.
pub struct MockProvider {
    result: MockResult,
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl MockProvider {
    pub fn replying(text: &str) -> Self {
        Self {
            result: MockResult::Reply(text.to_string()),
            requests: Arc::default(),
        }
    }

    pub fn failing_with_status(status: u16) -> Self {
        Self {
            result: MockResult::Upstream(status),
            requests: Arc::default(),
        }
    }

    pub fn empty() -> Self {
        Self {
            result: MockResult::Empty,
            requests: Arc::default(),
        }
    }

    /// Handle onto the recorded requests; stays valid after the provider is boxed.
    pub fn requests(&self) -> Arc<Mutex<Vec<CompletionRequest>>> {
        Arc::clone(&self.requests)
    }
}

impl LlmProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    fn default_model(&self) -> &str {
        "mock-model"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.requests.lock().unwrap().push(request.clone());
        match &self.result {
            MockResult::Reply(text) => Ok(CompletionResponse {
                content: text.clone(),
                model: "mock-model".to_string(),
                finish_reason: Some("STOP".to_string()),
                usage: Usage {
                    input_tokens: 10,
                    output_tokens: 20,
                },
            }),
            MockResult::Upstream(status) => Err(LlmError::Provider {
                message: format!("HTTP {status}"),
            }),
            MockResult::Empty => Err(LlmError::EmptyResponse),
        }
    }
}

/// HashMap-backed repository with switchable write failures.
#[derive(Default)]
pub struct InMemoryProjectRepository {
    states: Mutex<HashMap<String, ProjectState>>,
    fail_writes: AtomicBool,
}

impl InMemoryProjectRepository {
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self) -> Result<(), RepositoryError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(RepositoryError::Query("disk I/O error".to_string()));
        }
        Ok(())
    }
}

impl ProjectRepository for InMemoryProjectRepository {
    async fn get(&self, user_id: &str) -> Result<Option<ProjectState>, RepositoryError> {
        Ok(self.states.lock().unwrap().get(user_id).cloned())
    }

    async fn save(&self, user_id: &str, state: &ProjectState) -> Result<(), RepositoryError> {
        self.check_writable()?;
        self.states
            .lock()
            .unwrap()
            .insert(user_id.to_string(), state.clone());
        Ok(())
    }

    async fn delete(&self, user_id: &str) -> Result<(), RepositoryError> {
        self.check_writable()?;
        self.states.lock().unwrap().remove(user_id);
        Ok(())
    }
}
