use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Site-wide key/value setting.
#[derive(Debug, Clone, FromRow)]
pub struct Setting {
    pub key: String,
    pub value: String,
    pub updated_at: DateTime<Utc>,
}
