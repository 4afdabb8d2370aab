//! HTTP handlers for content blocks.
//!
//! Every mutation runs inside one transaction so the per-page ordering
//! invariant (sort orders exactly `0..n-1`) holds across concurrent writes.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use tracing::instrument;

use crate::{
    api::models::blocks::{BlockCreate, BlockResponse, BlockUpdate, ListBlocksQuery},
    auth::CurrentAdmin,
    db::{errors::DbError, handlers::Blocks, models::blocks::BlockUpdateDBRequest},
    errors::{Error, Result},
    AppState,
};

/// List a page's blocks in display order.
#[utoipa::path(
    get,
    path = "/blocks",
    tag = "blocks",
    summary = "List blocks",
    params(ListBlocksQuery),
    responses(
        (status = 200, description = "Blocks in sort order", body = [BlockResponse]),
        (status = 400, description = "Missing page parameter"),
    )
)]
#[instrument(skip_all)]
pub async fn list_blocks(
    State(state): State<AppState>,
    Query(query): Query<ListBlocksQuery>,
) -> Result<Json<Vec<BlockResponse>>> {
    let page_id = query.page.ok_or_else(|| Error::Validation {
        message: "The page query parameter is required".to_string(),
    })?;

    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let blocks = Blocks::new(&mut conn).list_for_page(&page_id).await?;
    Ok(Json(blocks.into_iter().map(Into::into).collect()))
}

/// Fetch a single block by id.
#[utoipa::path(
    get,
    path = "/blocks/{id}",
    tag = "blocks",
    summary = "Get block",
    params(("id" = String, Path, description = "Block id")),
    responses(
        (status = 200, description = "The block", body = BlockResponse),
        (status = 404, description = "No such block"),
    )
)]
#[instrument(skip_all, fields(id = %id))]
pub async fn get_block(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<BlockResponse>> {
    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let block = Blocks::new(&mut conn)
        .get_by_id(&id)
        .await?
        .ok_or_else(|| Error::NotFound {
            resource: "block".to_string(),
            id,
        })?;

    Ok(Json(block.into()))
}

/// Create a block, appended or inserted after a sibling.
#[utoipa::path(
    post,
    path = "/blocks",
    tag = "blocks",
    summary = "Create block",
    request_body = BlockCreate,
    responses(
        (status = 201, description = "Block created", body = BlockResponse),
        (status = 400, description = "Missing page_id or block_type"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
    )
)]
#[instrument(skip_all)]
pub async fn create_block(
    State(state): State<AppState>,
    _admin: CurrentAdmin,
    Json(request): Json<BlockCreate>,
) -> Result<(StatusCode, Json<BlockResponse>)> {
    if request.page_id.trim().is_empty() || request.block_type.trim().is_empty() {
        return Err(Error::Validation {
            message: "page_id and block_type are required".to_string(),
        });
    }

    let mut tx = state.db.begin().await.map_err(DbError::from)?;
    let block = Blocks::new(&mut tx).create(&request.into()).await?;
    tx.commit().await.map_err(DbError::from)?;

    Ok((StatusCode::CREATED, Json(block.into())))
}

/// Update a block's fields, or reposition it when `move_to` is supplied.
#[utoipa::path(
    put,
    path = "/blocks/{id}",
    tag = "blocks",
    summary = "Update or move block",
    params(("id" = String, Path, description = "Block id")),
    request_body = BlockUpdate,
    responses(
        (status = 200, description = "Updated block", body = BlockResponse),
        (status = 400, description = "Empty update or target position out of range"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "No such block"),
    )
)]
#[instrument(skip_all, fields(id = %id))]
pub async fn update_block(
    State(state): State<AppState>,
    _admin: CurrentAdmin,
    Path(id): Path<String>,
    Json(request): Json<BlockUpdate>,
) -> Result<Json<BlockResponse>> {
    let mut tx = state.db.begin().await.map_err(DbError::from)?;
    let mut repo = Blocks::new(&mut tx);

    let block = if let Some(target) = request.move_to {
        let current = repo.get_by_id(&id).await?.ok_or_else(|| Error::NotFound {
            resource: "block".to_string(),
            id: id.clone(),
        })?;
        let count = repo.count_for_page(&current.page_id).await?;
        if target < 0 || target >= count {
            return Err(Error::Validation {
                message: format!("move_to must be between 0 and {}", count - 1),
            });
        }
        repo.move_to(&id, target).await?
    } else {
        let db_request: BlockUpdateDBRequest = (&request).into();
        if db_request.is_empty() {
            return Err(Error::Validation {
                message: "No fields to update".to_string(),
            });
        }
        repo.update(&id, &db_request).await?
    };

    tx.commit().await.map_err(DbError::from)?;
    Ok(Json(block.into()))
}

/// Delete a block, closing the gap it leaves.
#[utoipa::path(
    delete,
    path = "/blocks/{id}",
    tag = "blocks",
    summary = "Delete block",
    params(("id" = String, Path, description = "Block id")),
    responses(
        (status = 204, description = "Block deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "No such block"),
    )
)]
#[instrument(skip_all, fields(id = %id))]
pub async fn delete_block(
    State(state): State<AppState>,
    _admin: CurrentAdmin,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    let mut tx = state.db.begin().await.map_err(DbError::from)?;
    let deleted = Blocks::new(&mut tx).delete(&id).await?;
    if !deleted {
        return Err(Error::NotFound {
            resource: "block".to_string(),
            id,
        });
    }
    tx.commit().await.map_err(DbError::from)?;
    Ok(StatusCode::NO_CONTENT)
}
