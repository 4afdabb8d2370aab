//! API request/response models for content blocks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::{IntoParams, ToSchema};

use crate::db::models::blocks::{Block, BlockCreateDBRequest, BlockUpdateDBRequest};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BlockCreate {
    pub page_id: String,
    pub block_type: String,
    /// Arbitrary JSON payload interpreted by the renderer. Defaults to an
    /// empty object rather than JSON null.
    #[serde(default = "empty_object")]
    pub content: Value,
    /// Insert directly after this block instead of appending.
    pub after_id: Option<String>,
}

fn empty_object() -> Value {
    Value::Object(serde_json::Map::new())
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct BlockUpdate {
    pub block_type: Option<String>,
    pub content: Option<Value>,
    /// When present, reposition the block to this zero-based sort order
    /// instead of updating its fields.
    pub move_to: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BlockResponse {
    pub id: String,
    pub page_id: String,
    pub block_type: String,
    pub content: Value,
    pub sort_order: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Query parameters for listing blocks.
#[derive(Debug, Deserialize, IntoParams)]
pub struct ListBlocksQuery {
    /// Page whose blocks to list. Required.
    pub page: Option<String>,
}

impl From<Block> for BlockResponse {
    fn from(block: Block) -> Self {
        let content = serde_json::from_str(&block.content).unwrap_or(Value::Null);
        Self {
            id: block.id,
            page_id: block.page_id,
            block_type: block.block_type,
            content,
            sort_order: block.sort_order,
            created_at: block.created_at,
            updated_at: block.updated_at,
        }
    }
}

impl From<BlockCreate> for BlockCreateDBRequest {
    fn from(request: BlockCreate) -> Self {
        Self {
            page_id: request.page_id,
            block_type: request.block_type,
            content: request.content.to_string(),
            after_id: request.after_id,
        }
    }
}

impl From<&BlockUpdate> for BlockUpdateDBRequest {
    fn from(request: &BlockUpdate) -> Self {
        Self {
            block_type: request.block_type.clone(),
            content: request.content.as_ref().map(|v| v.to_string()),
        }
    }
}
