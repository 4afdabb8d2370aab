//! OpenAPI document, served through Scalar at `/api/docs`.

use utoipa::OpenApi;

use crate::api::{handlers, models};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "atelier",
        description = "Portfolio site backend: pages, content blocks, projects, images and settings."
    ),
    servers((url = "/api")),
    paths(
        handlers::auth::login,
        handlers::auth::callback,
        handlers::auth::status,
        handlers::auth::logout,
        handlers::pages::list_pages,
        handlers::pages::get_page,
        handlers::pages::create_page,
        handlers::pages::update_page,
        handlers::pages::delete_page,
        handlers::projects::list_projects,
        handlers::projects::get_project,
        handlers::projects::create_project,
        handlers::projects::update_project,
        handlers::projects::delete_project,
        handlers::blocks::list_blocks,
        handlers::blocks::get_block,
        handlers::blocks::create_block,
        handlers::blocks::update_block,
        handlers::blocks::delete_block,
        handlers::images::list_images,
        handlers::images::upload_image,
        handlers::images::get_image,
        handlers::images::delete_image,
        handlers::settings::get_settings,
        handlers::settings::update_settings,
    ),
    components(schemas(
        models::auth::AuthStatusResponse,
        models::auth::LogoutResponse,
        models::pages::PageCreate,
        models::pages::PageUpdate,
        models::pages::PageResponse,
        models::projects::ProjectCreate,
        models::projects::ProjectUpdate,
        models::projects::ProjectResponse,
        models::blocks::BlockCreate,
        models::blocks::BlockUpdate,
        models::blocks::BlockResponse,
        models::images::ImageResponse,
        models::images::ImageListResponse,
        models::settings::SettingsResponse,
        models::settings::SettingsUpdate,
    )),
    tags(
        (name = "auth", description = "OAuth login flow and sessions"),
        (name = "pages", description = "Pages and posts"),
        (name = "projects", description = "Portfolio projects"),
        (name = "blocks", description = "Ordered content blocks"),
        (name = "images", description = "Uploaded images"),
        (name = "settings", description = "Site-wide settings"),
    )
)]
pub struct ApiDoc;
