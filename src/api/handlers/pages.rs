//! HTTP handlers for pages.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use tracing::instrument;

use crate::{
    api::models::pages::{ListPagesQuery, PageCreate, PageResponse, PageUpdate},
    auth::CurrentAdmin,
    db::{
        errors::DbError,
        handlers::{Pages, Repository},
        models::pages::{PageFilter, PageUpdateDBRequest},
    },
    errors::{Error, Result},
    AppState,
};

/// List pages. Drafts are only included with `?admin` and a valid session.
#[utoipa::path(
    get,
    path = "/pages",
    tag = "pages",
    summary = "List pages",
    params(ListPagesQuery),
    responses(
        (status = 200, description = "List of pages", body = [PageResponse]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
    )
)]
#[instrument(skip_all)]
pub async fn list_pages(
    State(state): State<AppState>,
    Query(query): Query<ListPagesQuery>,
    admin: Option<CurrentAdmin>,
) -> Result<Json<Vec<PageResponse>>> {
    let published_only = !(query.admin && admin.is_some());
    let filter = PageFilter {
        published_only,
        page_type: query.page_type,
    };

    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let pages = Pages::new(&mut conn).list(&filter).await?;
    Ok(Json(pages.into_iter().map(Into::into).collect()))
}

/// Fetch one page by slug or id.
#[utoipa::path(
    get,
    path = "/pages/{key}",
    tag = "pages",
    summary = "Get page",
    params(("key" = String, Path, description = "Page slug or id")),
    responses(
        (status = 200, description = "The page", body = PageResponse),
        (status = 404, description = "No such page"),
    )
)]
#[instrument(skip_all, fields(key = %key))]
pub async fn get_page(State(state): State<AppState>, Path(key): Path<String>) -> Result<Json<PageResponse>> {
    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let page = Pages::new(&mut conn)
        .get_by_slug_or_id(&key)
        .await?
        .ok_or_else(|| Error::NotFound {
            resource: "page".to_string(),
            id: key,
        })?;
    Ok(Json(page.into()))
}

/// Create a page.
#[utoipa::path(
    post,
    path = "/pages",
    tag = "pages",
    summary = "Create page",
    request_body = PageCreate,
    responses(
        (status = 201, description = "Page created", body = PageResponse),
        (status = 400, description = "Missing title, slug or content"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 409, description = "Slug already taken"),
    )
)]
#[instrument(skip_all)]
pub async fn create_page(
    State(state): State<AppState>,
    _admin: CurrentAdmin,
    Json(request): Json<PageCreate>,
) -> Result<(StatusCode, Json<PageResponse>)> {
    if request.title.trim().is_empty() || request.slug.trim().is_empty() || request.content.trim().is_empty() {
        return Err(Error::Validation {
            message: "title, slug, and content are required".to_string(),
        });
    }

    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let page = Pages::new(&mut conn).create(&request.into()).await?;
    Ok((StatusCode::CREATED, Json(page.into())))
}

/// Update a page. Only supplied fields change.
#[utoipa::path(
    put,
    path = "/pages/{id}",
    tag = "pages",
    summary = "Update page",
    params(("id" = String, Path, description = "Page id")),
    request_body = PageUpdate,
    responses(
        (status = 200, description = "Updated page", body = PageResponse),
        (status = 400, description = "Empty update"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "No such page"),
    )
)]
#[instrument(skip_all, fields(id = %id))]
pub async fn update_page(
    State(state): State<AppState>,
    _admin: CurrentAdmin,
    Path(id): Path<String>,
    Json(request): Json<PageUpdate>,
) -> Result<Json<PageResponse>> {
    let db_request: PageUpdateDBRequest = request.into();
    if db_request.is_empty() {
        return Err(Error::Validation {
            message: "No fields to update".to_string(),
        });
    }

    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let page = Pages::new(&mut conn).update(id, &db_request).await?;
    Ok(Json(page.into()))
}

/// Delete a page and, via cascade, its blocks.
#[utoipa::path(
    delete,
    path = "/pages/{id}",
    tag = "pages",
    summary = "Delete page",
    params(("id" = String, Path, description = "Page id")),
    responses(
        (status = 204, description = "Page deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "No such page"),
    )
)]
#[instrument(skip_all, fields(id = %id))]
pub async fn delete_page(
    State(state): State<AppState>,
    _admin: CurrentAdmin,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let deleted = Pages::new(&mut conn).delete(id.clone()).await?;
    if !deleted {
        return Err(Error::NotFound {
            resource: "page".to_string(),
            id,
        });
    }
    Ok(StatusCode::NO_CONTENT)
}
