//! Database repository for login sessions.

use chrono::{Duration, Utc};
use sqlx::SqliteConnection;
use tracing::instrument;
use uuid::Uuid;

use crate::db::errors::Result;
use crate::db::models::sessions::{Session, SessionCreateDBRequest};

/// Session lifetime: seven days from creation.
pub const SESSION_TTL_DAYS: i64 = 7;

/// Repository for session operations.
pub struct Sessions<'c> {
    db: &'c mut SqliteConnection,
}

impl<'c> Sessions<'c> {
    pub fn new(db: &'c mut SqliteConnection) -> Self {
        Self { db }
    }

    /// Create a new session with a random ID, expiring [`SESSION_TTL_DAYS`] from now.
    #[instrument(skip_all, fields(identity_id = %request.identity_id), err)]
    pub async fn create(&mut self, request: &SessionCreateDBRequest) -> Result<Session> {
        let now = Utc::now();
        let expires_at = now + Duration::days(SESSION_TTL_DAYS);
        let id = Uuid::new_v4().to_string();

        let session = sqlx::query_as::<_, Session>(
            r#"
            INSERT INTO sessions (id, identity_id, handle, access_token, created_at, expires_at)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&id)
        .bind(&request.identity_id)
        .bind(&request.handle)
        .bind(&request.access_token)
        .bind(now)
        .bind(expires_at)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(session)
    }

    /// Look up an unexpired session. Expired rows are invisible here.
    #[instrument(skip_all, err)]
    pub async fn get_valid(&mut self, id: &str) -> Result<Option<Session>> {
        let session = sqlx::query_as::<_, Session>("SELECT * FROM sessions WHERE id = ? AND expires_at > ?")
            .bind(id)
            .bind(Utc::now())
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(session)
    }

    /// Delete a session by ID (logout). Returns whether a row existed.
    #[instrument(skip_all, err)]
    pub async fn delete(&mut self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM sessions WHERE id = ?")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Remove expired rows. Called opportunistically, not from a background task.
    #[instrument(skip_all, err)]
    pub async fn purge_expired(&mut self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
            .bind(Utc::now())
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::SqlitePool;

    fn request(identity: &str) -> SessionCreateDBRequest {
        SessionCreateDBRequest {
            identity_id: identity.to_string(),
            handle: Some("tester".to_string()),
            access_token: "tok-123".to_string(),
        }
    }

    #[sqlx::test]
    async fn create_and_lookup(pool: SqlitePool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Sessions::new(&mut conn);

        let session = repo.create(&request("ident-1")).await.unwrap();
        assert_eq!(session.identity_id, "ident-1");
        assert!(session.expires_at > session.created_at);

        let found = repo.get_valid(&session.id).await.unwrap();
        assert!(found.is_some());
        assert_eq!(found.unwrap().handle.as_deref(), Some("tester"));
    }

    #[sqlx::test]
    async fn expired_sessions_are_invisible(pool: SqlitePool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Sessions::new(&mut conn);

        let session = repo.create(&request("ident-1")).await.unwrap();

        // Backdate the expiry
        sqlx::query("UPDATE sessions SET expires_at = ? WHERE id = ?")
            .bind(Utc::now() - Duration::minutes(1))
            .bind(&session.id)
            .execute(&mut *conn)
            .await
            .unwrap();

        let mut repo = Sessions::new(&mut conn);
        assert!(repo.get_valid(&session.id).await.unwrap().is_none());

        let purged = repo.purge_expired().await.unwrap();
        assert_eq!(purged, 1);
    }

    #[sqlx::test]
    async fn multiple_sessions_per_identity(pool: SqlitePool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Sessions::new(&mut conn);

        let first = repo.create(&request("ident-1")).await.unwrap();
        let second = repo.create(&request("ident-1")).await.unwrap();
        assert_ne!(first.id, second.id);

        // Deleting one leaves the other intact
        assert!(repo.delete(&first.id).await.unwrap());
        assert!(repo.get_valid(&first.id).await.unwrap().is_none());
        assert!(repo.get_valid(&second.id).await.unwrap().is_some());
    }

    #[sqlx::test]
    async fn delete_missing_session_is_false(pool: SqlitePool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Sessions::new(&mut conn);

        assert!(!repo.delete("no-such-session").await.unwrap());
    }
}
