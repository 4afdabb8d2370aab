use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// A login session row. Expired rows are treated as absent at read time and
/// cleaned up opportunistically.
#[derive(Debug, Clone, FromRow)]
pub struct Session {
    pub id: String,
    pub identity_id: String,
    pub handle: Option<String>,
    pub access_token: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct SessionCreateDBRequest {
    pub identity_id: String,
    pub handle: Option<String>,
    pub access_token: String,
}
