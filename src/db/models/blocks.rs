use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Content block row. Within a page, `sort_order` values are kept contiguous
/// from zero by the repository.
#[derive(Debug, Clone, FromRow)]
pub struct Block {
    pub id: String,
    pub page_id: String,
    pub block_type: String,
    pub content: String,
    pub sort_order: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct BlockCreateDBRequest {
    pub page_id: String,
    pub block_type: String,
    pub content: String,
    /// Insert directly after this block; append at the end when absent or
    /// when the referenced block no longer exists.
    pub after_id: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct BlockUpdateDBRequest {
    pub block_type: Option<String>,
    pub content: Option<String>,
}

impl BlockUpdateDBRequest {
    pub fn is_empty(&self) -> bool {
        self.block_type.is_none() && self.content.is_none()
    }
}
