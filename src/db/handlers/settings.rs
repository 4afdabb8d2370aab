//! Database repository for site-wide key/value settings.

use std::collections::HashMap;

use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::instrument;

use crate::db::errors::Result;
use crate::db::models::settings::Setting;

/// Repository for settings. This is a flat key/value bag with upsert
/// semantics, not a CRUD resource.
pub struct Settings<'c> {
    db: &'c mut SqliteConnection,
}

impl<'c> Settings<'c> {
    pub fn new(db: &'c mut SqliteConnection) -> Self {
        Self { db }
    }

    #[instrument(skip_all, err)]
    pub async fn get_all(&mut self) -> Result<HashMap<String, String>> {
        let rows = sqlx::query_as::<_, Setting>("SELECT * FROM settings ORDER BY key")
            .fetch_all(&mut *self.db)
            .await?;

        Ok(rows.into_iter().map(|s| (s.key, s.value)).collect())
    }

    /// Upsert every supplied pair. Existing keys are overwritten, absent keys
    /// are left alone.
    #[instrument(skip_all, fields(count = pairs.len()), err)]
    pub async fn upsert_many(&mut self, pairs: &HashMap<String, String>) -> Result<()> {
        let now = Utc::now();
        for (key, value) in pairs {
            sqlx::query(
                r#"
                INSERT INTO settings (key, value, updated_at) VALUES (?, ?, ?)
                ON CONFLICT (key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
                "#,
            )
            .bind(key)
            .bind(value)
            .bind(now)
            .execute(&mut *self.db)
            .await?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::SqlitePool;

    #[sqlx::test]
    async fn upsert_overwrites_and_preserves(pool: SqlitePool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Settings::new(&mut conn);

        let mut pairs = HashMap::new();
        pairs.insert("site_title".to_string(), "My Portfolio".to_string());
        pairs.insert("accent_color".to_string(), "#ff8800".to_string());
        repo.upsert_many(&pairs).await.unwrap();

        let mut update = HashMap::new();
        update.insert("site_title".to_string(), "Renamed".to_string());
        repo.upsert_many(&update).await.unwrap();

        let all = repo.get_all().await.unwrap();
        assert_eq!(all.get("site_title").map(String::as_str), Some("Renamed"));
        assert_eq!(all.get("accent_color").map(String::as_str), Some("#ff8800"));
    }
}
