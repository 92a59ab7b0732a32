//! Project service orchestrating per-user project state.
//!
//! Every mutation is a read-modify-write against the repository: load the
//! stored state (or the default), apply the merge in memory, save the whole
//! document. Validation happens before the save, so a rejected change never
//! reaches storage.

use codeloom_types::error::{ProjectError, RepositoryError};
use codeloom_types::project::{validate_file_name, MergeOutcome, ProjectPatch, ProjectState};
use tracing::{debug, info};

use super::repository::ProjectRepository;

/// Loads, merges and saves project state for a user.
///
/// Generic over `ProjectRepository` to maintain clean architecture
/// (codeloom-core never depends on codeloom-infra).
pub struct ProjectService<R: ProjectRepository> {
    repo: R,
}

impl<R: ProjectRepository> ProjectService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Access the underlying repository.
    pub fn repo(&self) -> &R {
        &self.repo
    }

    /// The stored state for a user, or a fresh default project.
    pub async fn load_or_default(&self, user_id: &str) -> Result<ProjectState, RepositoryError> {
        match self.repo.get(user_id).await? {
            Some(state) => Ok(state),
            None => {
                debug!(user_id, "No stored project state, using default");
                Ok(ProjectState::default())
            }
        }
    }

    /// The state a chat turn should see: the client's copy when it sent one,
    /// otherwise the stored (or default) state. Never writes.
    pub async fn resolve(
        &self,
        user_id: &str,
        supplied: Option<ProjectState>,
    ) -> Result<ProjectState, RepositoryError> {
        match supplied {
            Some(state) => Ok(state),
            None => self.load_or_default(user_id).await,
        }
    }

    /// Merge a generated file into the stored state and save it.
    pub async fn apply_generated_file(
        &self,
        user_id: &str,
        name: &str,
        content: &str,
    ) -> Result<ProjectState, ProjectError> {
        validate_file_name(name)?;

        let mut state = self.load_or_default(user_id).await?;
        let outcome = state.merge_file(name, content)?;
        self.repo.save(user_id, &state).await?;

        match outcome {
            MergeOutcome::Added => info!(user_id, filename = name, "Project file added"),
            MergeOutcome::Replaced => info!(user_id, filename = name, "Project file replaced"),
        }
        Ok(state)
    }

    /// Union technologies/libraries and overwrite metadata keys.
    pub async fn apply_patch(
        &self,
        user_id: &str,
        patch: ProjectPatch,
    ) -> Result<ProjectState, ProjectError> {
        let mut state = self.load_or_default(user_id).await?;
        state.merge_patch(patch);
        self.repo.save(user_id, &state).await?;
        debug!(user_id, "Project patch applied");
        Ok(state)
    }

    /// Replace the whole state after validating it.
    pub async fn replace(
        &self,
        user_id: &str,
        state: ProjectState,
    ) -> Result<ProjectState, ProjectError> {
        state.validate()?;
        self.repo.save(user_id, &state).await?;
        debug!(user_id, files = state.files.len(), "Project state replaced");
        Ok(state)
    }

    /// Explicitly remove one file.
    pub async fn delete_file(&self, user_id: &str, name: &str) -> Result<ProjectState, ProjectError> {
        let mut state = self.load_or_default(user_id).await?;
        if !state.remove_file(name) {
            return Err(ProjectError::FileNotFound(name.to_string()));
        }
        self.repo.save(user_id, &state).await?;
        info!(user_id, filename = name, "Project file deleted");
        Ok(state)
    }

    /// Drop the stored state; the next load yields the default project.
    pub async fn reset(&self, user_id: &str) -> Result<(), RepositoryError> {
        self.repo.delete(user_id).await?;
        info!(user_id, "Project state reset");
        Ok(())
    }
}
