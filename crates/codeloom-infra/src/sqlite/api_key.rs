//! API key storage.
//!
//! Keys are minted as `loom_` followed by 64 hex characters and only their
//! SHA-256 digest is stored. A key resolves to the user id it was issued for.

use chrono::Utc;
use codeloom_types::error::RepositoryError;
use sha2::{Digest, Sha256};
use sqlx::Row;
use uuid::Uuid;

use super::pool::DatabasePool;

/// Prefix for every minted key.
pub const API_KEY_PREFIX: &str = "loom_";

/// A stored key, without its secret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiKeyRecord {
    pub id: Uuid,
    pub user_id: String,
    pub name: String,
    pub created_at: String,
    pub last_used_at: Option<String>,
}

/// Hash a plaintext key as lowercase hex SHA-256.
pub fn hash_api_key(key: &str) -> String {
    let digest = Sha256::digest(key.as_bytes());
    format!("{digest:x}")
}

/// Generate a fresh plaintext key.
pub fn generate_api_key() -> String {
    format!(
        "{API_KEY_PREFIX}{}{}",
        Uuid::new_v4().simple(),
        Uuid::new_v4().simple()
    )
}

pub struct SqliteApiKeyRepository {
    pool: DatabasePool,
}

impl SqliteApiKeyRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    /// Mint a key for a user and return the plaintext. It is not recoverable later.
    pub async fn create_key(&self, user_id: &str, name: &str) -> Result<String, RepositoryError> {
        let key = generate_api_key();
        let id = Uuid::now_v7();

        sqlx::query(
            "INSERT INTO api_keys (id, user_id, key_hash, name, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(id.to_string())
        .bind(user_id)
        .bind(hash_api_key(&key))
        .bind(name)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool.writer)
        .await
        .map_err(|e| {
            if e.to_string().contains("UNIQUE constraint failed") {
                RepositoryError::Conflict("api key already exists".to_string())
            } else {
                RepositoryError::Query(e.to_string())
            }
        })?;

        Ok(key)
    }

    /// Resolve a plaintext key to its user id, touching `last_used_at`.
    pub async fn resolve_user(&self, key: &str) -> Result<Option<String>, RepositoryError> {
        let hash = hash_api_key(key);
        let row = sqlx::query("SELECT user_id FROM api_keys WHERE key_hash = ?")
            .bind(&hash)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let Some(row) = row else {
            return Ok(None);
        };
        let user_id: String = row
            .try_get("user_id")
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        // Usage tracking is best effort; a failed touch does not reject the key.
        if let Err(e) = sqlx::query("UPDATE api_keys SET last_used_at = ? WHERE key_hash = ?")
            .bind(Utc::now().to_rfc3339())
            .bind(&hash)
            .execute(&self.pool.writer)
            .await
        {
            tracing::debug!(error = %e, "failed to update api key last_used_at");
        }

        Ok(Some(user_id))
    }

    /// List keys issued to a user, oldest first.
    pub async fn list_keys(&self, user_id: &str) -> Result<Vec<ApiKeyRecord>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, user_id, name, created_at, last_used_at FROM api_keys WHERE user_id = ? ORDER BY created_at ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        rows.iter().map(record_from_row).collect()
    }

    /// Revoke a key by id. Returns whether a key was removed.
    pub async fn revoke(&self, id: &Uuid) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM api_keys WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool.writer)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;
        Ok(result.rows_affected() > 0)
    }
}

fn record_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<ApiKeyRecord, RepositoryError> {
    let id_str: String = row
        .try_get("id")
        .map_err(|e| RepositoryError::Query(e.to_string()))?;
    let id = Uuid::parse_str(&id_str)
        .map_err(|e| RepositoryError::Query(format!("invalid api key id: {e}")))?;

    Ok(ApiKeyRecord {
        id,
        user_id: row
            .try_get("user_id")
            .map_err(|e| RepositoryError::Query(e.to_string()))?,
        name: row
            .try_get("name")
            .map_err(|e| RepositoryError::Query(e.to_string()))?,
        created_at: row
            .try_get("created_at")
            .map_err(|e| RepositoryError::Query(e.to_string()))?,
        last_used_at: row
            .try_get("last_used_at")
            .map_err(|e| RepositoryError::Query(e.to_string()))?,
    })
}
