//! HTTP handlers for site-wide settings.

use axum::{extract::State, response::Json};
use tracing::instrument;

use crate::{
    api::models::settings::{SettingsResponse, SettingsUpdate},
    auth::CurrentAdmin,
    db::{errors::DbError, handlers::Settings},
    errors::{Error, Result},
    AppState,
};

/// Fetch the full settings map.
#[utoipa::path(
    get,
    path = "/settings",
    tag = "settings",
    summary = "Get settings",
    responses(
        (status = 200, description = "All settings", body = SettingsResponse),
    )
)]
#[instrument(skip_all)]
pub async fn get_settings(State(state): State<AppState>) -> Result<Json<SettingsResponse>> {
    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let settings = Settings::new(&mut conn).get_all().await?;
    Ok(Json(SettingsResponse { settings }))
}

/// Upsert the supplied settings; untouched keys keep their values.
#[utoipa::path(
    put,
    path = "/settings",
    tag = "settings",
    summary = "Update settings",
    request_body = SettingsUpdate,
    responses(
        (status = 200, description = "Settings after the update", body = SettingsResponse),
        (status = 400, description = "Empty update"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
    )
)]
#[instrument(skip_all)]
pub async fn update_settings(
    State(state): State<AppState>,
    _admin: CurrentAdmin,
    Json(request): Json<SettingsUpdate>,
) -> Result<Json<SettingsResponse>> {
    if request.settings.is_empty() {
        return Err(Error::Validation {
            message: "No settings to update".to_string(),
        });
    }

    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let mut repo = Settings::new(&mut conn);
    repo.upsert_many(&request.settings).await?;
    let settings = repo.get_all().await?;
    Ok(Json(SettingsResponse { settings }))
}
