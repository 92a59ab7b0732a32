//! SQLite project state repository.
//!
//! Implements `ProjectRepository` from `codeloom-core` using sqlx with split
//! read/write pools. Each user's state is stored as one JSON text column and
//! written with an upsert, so concurrent writers resolve to the last write.

use chrono::Utc;
use codeloom_core::project::repository::ProjectRepository;
use codeloom_types::error::RepositoryError;
use codeloom_types::project::ProjectState;
use sqlx::Row;

use super::pool::DatabasePool;

/// SQLite-backed implementation of `ProjectRepository`.
pub struct SqliteProjectRepository {
    pool: DatabasePool,
}

impl SqliteProjectRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

impl ProjectRepository for SqliteProjectRepository {
    async fn get(&self, user_id: &str) -> Result<Option<ProjectState>, RepositoryError> {
        let row = sqlx::query("SELECT state FROM project_states WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        match row {
            Some(row) => {
                let state_str: String = row
                    .try_get("state")
                    .map_err(|e| RepositoryError::Query(e.to_string()))?;
                let state: ProjectState = serde_json::from_str(&state_str)
                    .map_err(|e| RepositoryError::Query(format!("invalid project JSON: {e}")))?;
                Ok(Some(state))
            }
            None => Ok(None),
        }
    }

    async fn save(&self, user_id: &str, state: &ProjectState) -> Result<(), RepositoryError> {
        let now = Utc::now().to_rfc3339();
        let state_str = serde_json::to_string(state)
            .map_err(|e| RepositoryError::Query(format!("failed to serialize state: {e}")))?;

        sqlx::query(
            r#"INSERT INTO project_states (user_id, state, created_at, updated_at)
               VALUES (?, ?, ?, ?)
               ON CONFLICT (user_id) DO UPDATE SET state = excluded.state, updated_at = excluded.updated_at"#,
        )
        .bind(user_id)
        .bind(&state_str)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(())
    }

    async fn delete(&self, user_id: &str) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM project_states WHERE user_id = ?")
            .bind(user_id)
            .execute(&self.pool.writer)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_pool() -> DatabasePool {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let url = format!("sqlite://{}?mode=rwc", db_path.display());
        std::mem::forget(dir);
        DatabasePool::new(&url).await.unwrap()
    }

    #[tokio::test]
    async fn test_get_missing_returns_none() {
        let repo = SqliteProjectRepository::new(test_pool().await);
        assert!(repo.get("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_and_get() {
        let repo = SqliteProjectRepository::new(test_pool().await);

        let mut state = ProjectState::default();
        state.merge_file("index.html", "<h1>Hi</h1>").unwrap();
        state.installed_libraries.insert("Chart.js".to_string());
        state
            .metadata
            .insert("title".to_string(), serde_json::json!("Tasks"));

        repo.save("alice", &state).await.unwrap();
        let got = repo.get("alice").await.unwrap().unwrap();
        assert_eq!(got, state);
    }

    #[tokio::test]
    async fn test_save_upserts_last_write_wins() {
        let repo = SqliteProjectRepository::new(test_pool().await);

        let mut first = ProjectState::default();
        first.merge_file("a.html", "1").unwrap();
        repo.save("alice", &first).await.unwrap();

        let mut second = ProjectState::default();
        second.merge_file("b.html", "2").unwrap();
        repo.save("alice", &second).await.unwrap();

        let got = repo.get("alice").await.unwrap().unwrap();
        assert_eq!(got, second);
        assert!(got.file("a.html").is_none());
    }

    #[tokio::test]
    async fn test_users_are_separate_rows() {
        let repo = SqliteProjectRepository::new(test_pool().await);
        let mut alice = ProjectState::default();
        alice.merge_file("a.html", "a").unwrap();
        repo.save("alice", &alice).await.unwrap();
        repo.save("bob", &ProjectState::default()).await.unwrap();

        assert_eq!(repo.get("alice").await.unwrap().unwrap(), alice);
        assert!(repo.get("bob").await.unwrap().unwrap().files.is_empty());
    }

    #[tokio::test]
    async fn test_delete() {
        let repo = SqliteProjectRepository::new(test_pool().await);
        repo.save("alice", &ProjectState::default()).await.unwrap();
        repo.delete("alice").await.unwrap();
        assert!(repo.get("alice").await.unwrap().is_none());
        // Deleting again is not an error.
        repo.delete("alice").await.unwrap();
    }
}
