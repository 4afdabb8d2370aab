//! atelier: backend for a personal portfolio site.
//!
//! Serves pages, ordered content blocks, projects, uploaded images and
//! site settings over an HTTP API, with a single-admin OAuth (PKCE) login
//! flow and cookie sessions persisted in SQLite.

use std::str::FromStr;

use axum::{
    extract::DefaultBodyLimit,
    http::{self, HeaderValue},
    routing::{get, post},
    Router,
};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};
use tokio::net::TcpListener;
use tower_http::{
    cors::CorsLayer,
    services::{ServeDir, ServeFile},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{info, instrument, Level};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod openapi;
pub mod storage;
pub mod telemetry;

#[cfg(test)]
pub mod test_utils;

pub use config::Config;

use crate::openapi::ApiDoc;

/// Uploads are capped well above any reasonable image size.
const IMAGE_UPLOAD_LIMIT: usize = 20 * 1024 * 1024;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Config,
    pub storage: std::sync::Arc<dyn storage::BlobStorage>,
    pub http: reqwest::Client,
}

/// The sqlx migrator backed by the `migrations/` directory.
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let mut origins = Vec::new();
    for origin in &config.cors.allowed_origins {
        let header_value = match origin {
            config::CorsOrigin::Wildcard => "*".parse::<HeaderValue>()?,
            config::CorsOrigin::Url(url) => url.as_str().trim_end_matches('/').parse::<HeaderValue>()?,
        };
        origins.push(header_value);
    }

    let mut cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(config.cors.allow_credentials)
        .allow_methods([
            http::Method::GET,
            http::Method::POST,
            http::Method::PUT,
            http::Method::DELETE,
        ])
        .allow_headers([http::header::CONTENT_TYPE])
        .expose_headers(vec![http::header::LOCATION]);

    if let Some(max_age) = config.cors.max_age {
        cors = cors.max_age(std::time::Duration::from_secs(max_age));
    }

    Ok(cors)
}

/// Build the application router: API routes, docs, optional SPA bundle,
/// CORS and tracing.
#[instrument(skip_all)]
pub fn build_router(state: AppState) -> anyhow::Result<Router> {
    // Separate route for the upload so the body limit only applies there.
    let upload_router = Router::new().route(
        "/images",
        post(api::handlers::images::upload_image).layer(DefaultBodyLimit::max(IMAGE_UPLOAD_LIMIT)),
    );

    let api_routes = Router::new()
        .route("/auth/login", get(api::handlers::auth::login))
        .route("/auth/callback", get(api::handlers::auth::callback))
        .route("/auth/status", get(api::handlers::auth::status))
        .route("/auth/logout", post(api::handlers::auth::logout))
        .route("/pages", get(api::handlers::pages::list_pages).post(api::handlers::pages::create_page))
        .route(
            "/pages/{key}",
            get(api::handlers::pages::get_page)
                .put(api::handlers::pages::update_page)
                .delete(api::handlers::pages::delete_page),
        )
        .route(
            "/projects",
            get(api::handlers::projects::list_projects).post(api::handlers::projects::create_project),
        )
        .route(
            "/projects/{id}",
            get(api::handlers::projects::get_project)
                .put(api::handlers::projects::update_project)
                .delete(api::handlers::projects::delete_project),
        )
        .route(
            "/blocks",
            get(api::handlers::blocks::list_blocks).post(api::handlers::blocks::create_block),
        )
        .route(
            "/blocks/{id}",
            get(api::handlers::blocks::get_block)
                .put(api::handlers::blocks::update_block)
                .delete(api::handlers::blocks::delete_block),
        )
        .merge(upload_router)
        .route("/images", get(api::handlers::images::list_images))
        .route(
            "/images/{*key}",
            get(api::handlers::images::get_image).delete(api::handlers::images::delete_image),
        )
        .route(
            "/settings",
            get(api::handlers::settings::get_settings).put(api::handlers::settings::update_settings),
        )
        .with_state(state.clone());

    let mut router = Router::new()
        .route("/healthz", get(|| async { "OK" }))
        .nest("/api", api_routes)
        .merge(Scalar::with_url("/api/docs", ApiDoc::openapi()));

    // Serve the pre-built SPA bundle when configured, falling back to
    // index.html for client-side routes.
    if let Some(static_dir) = &state.config.static_dir {
        let spa = ServeDir::new(static_dir).fallback(ServeFile::new(static_dir.join("index.html")));
        router = router.fallback_service(spa);
    }

    let cors_layer = create_cors_layer(&state.config)?;

    Ok(router.layer(cors_layer).layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    ))
}

/// The application, fully constructed but not yet serving.
pub struct Application {
    router: Router,
    config: Config,
    pool: SqlitePool,
}

impl Application {
    /// Open the database, run migrations, set up blob storage and build
    /// the router.
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let database_url = config
            .database_url
            .clone()
            .unwrap_or_else(|| config.database.url.clone());

        let options = SqliteConnectOptions::from_str(&database_url)?
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(config.database.max_connections)
            .connect_with(options)
            .await?;

        migrator().run(&pool).await?;

        let storage = storage::create_blob_storage(&config.storage.path).await?;

        let state = AppState {
            db: pool.clone(),
            config: config.clone(),
            storage,
            http: reqwest::Client::new(),
        };
        let router = build_router(state)?;

        Ok(Self { router, config, pool })
    }

    /// Convert the application into a test server (for tests).
    #[cfg(test)]
    pub fn into_test_server(self) -> axum_test::TestServer {
        axum_test::TestServer::new(self.router).expect("Failed to create test server")
    }

    /// Serve until the shutdown future resolves.
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!("atelier listening on http://{bind_addr}");

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Closing database connections...");
        self.pool.close().await;

        Ok(())
    }
}
