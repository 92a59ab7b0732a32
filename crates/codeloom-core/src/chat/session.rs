//! Client-side reconciliation of chat turns, preview and project state.
//!
//! A `WorkspaceSession` is what a chat front-end holds while the user works:
//! the visible turn list, the file currently shown in the preview/editor,
//! and the last project state known to be persisted. Each `send` appends the
//! user turn optimistically, relays it, and then either appends the
//! assistant's reply (updating preview and state when a file came back) or
//! appends the fixed apology. A failed turn never touches project state.

use std::sync::Arc;

use codeloom_types::chat::{ChatReply, ChatRequest, ChatTurn, GREETING};
use codeloom_types::error::{ProjectError, RepositoryError};
use codeloom_types::project::ProjectState;
use tracing::{debug, warn};

use crate::chat::service::ChatService;
use crate::project::repository::ProjectRepository;

/// The file currently rendered in the preview / opened in the editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preview {
    pub filename: String,
    pub code: String,
}

/// What happened to a call to [`WorkspaceSession::send`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// Blank input; nothing was sent.
    Ignored,
    /// The assistant replied. `saved_file` names the file merged into the
    /// persisted project state, if any.
    Replied {
        reply: ChatReply,
        saved_file: Option<String>,
    },
    /// The turn failed; the apology was appended to the turn list.
    Failed { error: String },
}

/// One user's live chat workspace.
pub struct WorkspaceSession<R: ProjectRepository> {
    chat: Arc<ChatService<R>>,
    user_id: String,
    turns: Vec<ChatTurn>,
    preview: Option<Preview>,
    state: ProjectState,
}

impl<R: ProjectRepository> WorkspaceSession<R> {
    /// Open a session for a user, starting from their stored project state.
    pub async fn open(chat: Arc<ChatService<R>>, user_id: &str) -> Result<Self, RepositoryError> {
        let state = chat.projects().load_or_default(user_id).await?;
        Ok(Self {
            chat,
            user_id: user_id.to_string(),
            turns: vec![ChatTurn::assistant(GREETING)],
            preview: None,
            state,
        })
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn turns(&self) -> &[ChatTurn] {
        &self.turns
    }

    pub fn preview(&self) -> Option<&Preview> {
        self.preview.as_ref()
    }

    /// The project state as of this session's last successful save.
    pub fn state(&self) -> &ProjectState {
        &self.state
    }

    /// Send a user message and reconcile the reply into the session.
    pub async fn send(&mut self, message: &str) -> TurnOutcome {
        if message.trim().is_empty() {
            return TurnOutcome::Ignored;
        }

        let window = self.chat.settings().history_window;
        let skip = self.turns.len().saturating_sub(window);
        let request = ChatRequest {
            message: message.to_string(),
            conversation_history: self.turns[skip..].to_vec(),
            project_state: Some(self.state.clone()),
        };
        self.turns.push(ChatTurn::user(message));

        let reply = match self.chat.relay(&self.user_id, request).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(user_id = %self.user_id, error = %e, "Chat turn failed");
                self.turns.push(ChatTurn::assistant(self.chat.apology()));
                return TurnOutcome::Failed {
                    error: e.to_string(),
                };
            }
        };

        self.turns.push(ChatTurn::assistant(reply.message.clone()));

        let saved_file = match reply.generated_file() {
            Some(file) => {
                self.preview = Some(Preview {
                    filename: file.filename.to_string(),
                    code: file.code.to_string(),
                });
                match self.persist(file.filename, file.code).await {
                    Ok(()) => Some(file.filename.to_string()),
                    Err(e) => {
                        warn!(
                            user_id = %self.user_id,
                            filename = file.filename,
                            error = %e,
                            "Generated file not persisted"
                        );
                        None
                    }
                }
            }
            None => None,
        };

        TurnOutcome::Replied { reply, saved_file }
    }

    /// Apply an editor change to the previewed file and persist it.
    pub async fn edit_current(&mut self, code: &str) -> Result<(), ProjectError> {
        let Some(preview) = self.preview.as_mut() else {
            return Err(ProjectError::FileNotFound("<no file open>".to_string()));
        };
        preview.code = code.to_string();
        let filename = preview.filename.clone();
        self.persist(&filename, code).await
    }

    /// Merge into the stored state and adopt what was saved.
    ///
    /// The merge re-reads storage, so files written elsewhere since the last
    /// turn survive.
    async fn persist(&mut self, filename: &str, code: &str) -> Result<(), ProjectError> {
        let saved = self
            .chat
            .projects()
            .apply_generated_file(&self.user_id, filename, code)
            .await?;
        debug!(
            user_id = %self.user_id,
            filename,
            files = saved.files.len(),
            "Workspace state persisted"
        );
        self.state = saved;
        Ok(())
    }
}
