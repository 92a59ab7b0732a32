//! ProjectRepository trait definition.
//!
//! One project state per user. Writes are whole-document upserts, so the last
//! write for a user wins.

use codeloom_types::error::RepositoryError;
use codeloom_types::project::ProjectState;

/// Repository trait for per-user project state persistence.
///
/// Implementations live in codeloom-infra (e.g., `SqliteProjectRepository`).
pub trait ProjectRepository: Send + Sync {
    /// Get the stored state for a user, if any.
    fn get(
        &self,
        user_id: &str,
    ) -> impl std::future::Future<Output = Result<Option<ProjectState>, RepositoryError>> + Send;

    /// Insert or replace the state for a user.
    fn save(
        &self,
        user_id: &str,
        state: &ProjectState,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Delete the stored state for a user. Deleting a missing state is not an error.
    fn delete(
        &self,
        user_id: &str,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;
}
