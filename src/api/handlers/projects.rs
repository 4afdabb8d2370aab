//! HTTP handlers for projects.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use tracing::instrument;

use crate::{
    api::models::projects::{ListProjectsQuery, ProjectCreate, ProjectResponse, ProjectUpdate},
    auth::CurrentAdmin,
    db::{
        errors::DbError,
        handlers::{Projects, Repository},
        models::projects::{ProjectFilter, ProjectUpdateDBRequest},
    },
    errors::{Error, Result},
    AppState,
};

/// List projects. The public listing hides archived projects; `?admin`
/// with a valid session shows everything in curation order.
#[utoipa::path(
    get,
    path = "/projects",
    tag = "projects",
    summary = "List projects",
    params(ListProjectsQuery),
    responses(
        (status = 200, description = "List of projects", body = [ProjectResponse]),
        (status = 403, description = "Forbidden"),
    )
)]
#[instrument(skip_all)]
pub async fn list_projects(
    State(state): State<AppState>,
    Query(query): Query<ListProjectsQuery>,
    admin: Option<CurrentAdmin>,
) -> Result<Json<Vec<ProjectResponse>>> {
    let filter = ProjectFilter {
        include_archived: query.admin && admin.is_some(),
    };

    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let projects = Projects::new(&mut conn).list(&filter).await?;
    Ok(Json(projects.into_iter().map(Into::into).collect()))
}

/// Fetch one project.
#[utoipa::path(
    get,
    path = "/projects/{id}",
    tag = "projects",
    summary = "Get project",
    params(("id" = String, Path, description = "Project id")),
    responses(
        (status = 200, description = "The project", body = ProjectResponse),
        (status = 404, description = "No such project"),
    )
)]
#[instrument(skip_all, fields(id = %id))]
pub async fn get_project(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<ProjectResponse>> {
    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let project = Projects::new(&mut conn)
        .get_by_id(id.clone())
        .await?
        .ok_or_else(|| Error::NotFound {
            resource: "project".to_string(),
            id,
        })?;
    Ok(Json(project.into()))
}

/// Create a project.
#[utoipa::path(
    post,
    path = "/projects",
    tag = "projects",
    summary = "Create project",
    request_body = ProjectCreate,
    responses(
        (status = 201, description = "Project created", body = ProjectResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
    )
)]
#[instrument(skip_all)]
pub async fn create_project(
    State(state): State<AppState>,
    _admin: CurrentAdmin,
    Json(request): Json<ProjectCreate>,
) -> Result<(StatusCode, Json<ProjectResponse>)> {
    if request.name.trim().is_empty() || request.slug.trim().is_empty() {
        return Err(Error::Validation {
            message: "name and slug are required".to_string(),
        });
    }

    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let project = Projects::new(&mut conn).create(&request.into()).await?;
    Ok((StatusCode::CREATED, Json(project.into())))
}

/// Update a project. Only supplied fields change.
#[utoipa::path(
    put,
    path = "/projects/{id}",
    tag = "projects",
    summary = "Update project",
    params(("id" = String, Path, description = "Project id")),
    request_body = ProjectUpdate,
    responses(
        (status = 200, description = "Updated project", body = ProjectResponse),
        (status = 400, description = "Empty update"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "No such project"),
    )
)]
#[instrument(skip_all, fields(id = %id))]
pub async fn update_project(
    State(state): State<AppState>,
    _admin: CurrentAdmin,
    Path(id): Path<String>,
    Json(request): Json<ProjectUpdate>,
) -> Result<Json<ProjectResponse>> {
    let db_request: ProjectUpdateDBRequest = request.into();
    if db_request.is_empty() {
        return Err(Error::Validation {
            message: "No fields to update".to_string(),
        });
    }

    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let project = Projects::new(&mut conn).update(id, &db_request).await?;
    Ok(Json(project.into()))
}

/// Delete a project.
#[utoipa::path(
    delete,
    path = "/projects/{id}",
    tag = "projects",
    summary = "Delete project",
    params(("id" = String, Path, description = "Project id")),
    responses(
        (status = 204, description = "Project deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "No such project"),
    )
)]
#[instrument(skip_all, fields(id = %id))]
pub async fn delete_project(
    State(state): State<AppState>,
    _admin: CurrentAdmin,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let deleted = Projects::new(&mut conn).delete(id.clone()).await?;
    if !deleted {
        return Err(Error::NotFound {
            resource: "project".to_string(),
            id,
        });
    }
    Ok(StatusCode::NO_CONTENT)
}
