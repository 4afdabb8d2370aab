//! HTTP handlers for the OAuth login flow, session status and logout.

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::{
    api::models::auth::{AuthStatusResponse, CallbackParams, LogoutResponse},
    auth::{
        oauth,
        session::{
            build_cookie, clear_cookie, read_cookie, PKCE_COOKIE, SESSION_COOKIE,
            SESSION_COOKIE_MAX_AGE, STATE_COOKIE, TRANSIENT_COOKIE_MAX_AGE,
        },
    },
    db::{errors::DbError, handlers::Sessions, models::sessions::SessionCreateDBRequest},
    errors::{Error, Result},
    AppState,
};

/// Where the browser lands at the end of the flow, successful or not.
const CALLBACK_PATH: &str = "/api/auth/callback";

/// Base URL the provider should redirect back to. Prefers the configured
/// public URL; otherwise reconstructed from proxy headers.
fn request_origin(state: &AppState, headers: &HeaderMap) -> Result<String> {
    if let Some(public_url) = &state.config.public_url {
        return Ok(public_url.trim_end_matches('/').to_string());
    }
    let host = headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| Error::Validation {
            message: "Missing Host header".to_string(),
        })?;
    let proto = headers
        .get("x-forwarded-proto")
        .and_then(|h| h.to_str().ok())
        .unwrap_or("https");
    Ok(format!("{proto}://{host}"))
}

/// 302 response carrying any number of `Set-Cookie` headers.
fn redirect_with_cookies(location: &str, cookies: &[String]) -> Response {
    let mut builder = Response::builder()
        .status(StatusCode::FOUND)
        .header(header::LOCATION, location);
    for cookie in cookies {
        builder = builder.header(header::SET_COOKIE, cookie);
    }
    // Infallible: static header names, values we just formatted.
    builder.body(axum::body::Body::empty()).unwrap_or_else(|_| StatusCode::FOUND.into_response())
}

/// Abort the callback: clear the transient cookies and bounce to the SPA
/// with a machine-readable reason.
fn callback_failure(reason: &str) -> Response {
    warn!("OAuth callback failed: {reason}");
    redirect_with_cookies(
        &format!("/?auth_error={reason}"),
        &[clear_cookie(PKCE_COOKIE), clear_cookie(STATE_COOKIE)],
    )
}

/// Start the OAuth login flow.
#[utoipa::path(
    get,
    path = "/auth/login",
    tag = "auth",
    summary = "Start login",
    description = "Generates PKCE material and redirects to the identity provider.",
    responses(
        (status = 302, description = "Redirect to the provider's authorize endpoint"),
        (status = 500, description = "OAuth is not configured"),
    )
)]
#[instrument(skip_all)]
pub async fn login(State(state): State<AppState>, headers: HeaderMap) -> Result<Response> {
    let oauth_config = &state.config.auth.oauth;
    let client_id = oauth_config.client_id.as_ref().ok_or_else(|| Error::Misconfiguration {
        message: "OAuth client_id is not configured".to_string(),
    })?;

    let verifier = oauth::generate_verifier();
    let challenge = oauth::challenge_s256(&verifier);
    let csrf_state = Uuid::new_v4().to_string();

    let origin = request_origin(&state, &headers)?;
    let redirect_uri = format!("{origin}{CALLBACK_PATH}");
    let authorize = oauth::authorize_url(oauth_config, client_id, &redirect_uri, &csrf_state, &challenge)?;

    Ok(redirect_with_cookies(
        &authorize,
        &[
            build_cookie(PKCE_COOKIE, &verifier, TRANSIENT_COOKIE_MAX_AGE),
            build_cookie(STATE_COOKIE, &csrf_state, TRANSIENT_COOKIE_MAX_AGE),
        ],
    ))
}

/// Finish the OAuth login flow.
///
/// Every failure mode exits with a 302 to `/?auth_error=<reason>` rather
/// than an error status, since the browser is mid-redirect.
#[utoipa::path(
    get,
    path = "/auth/callback",
    tag = "auth",
    summary = "OAuth callback",
    params(CallbackParams),
    responses(
        (status = 302, description = "Redirect to the site root, with a session cookie on success"),
    )
)]
#[instrument(skip_all)]
pub async fn callback(
    State(state): State<AppState>,
    Query(params): Query<CallbackParams>,
    headers: HeaderMap,
) -> Response {
    if let Some(error) = &params.error {
        return callback_failure(error);
    }
    let (code, returned_state) = match (&params.code, &params.state) {
        (Some(code), Some(state)) => (code, state),
        _ => return callback_failure("missing_params"),
    };

    match read_cookie(&headers, STATE_COOKIE) {
        Some(expected) if &expected == returned_state => {}
        _ => return callback_failure("invalid_state"),
    }
    let verifier = match read_cookie(&headers, PKCE_COOKIE) {
        Some(verifier) => verifier,
        None => return callback_failure("missing_verifier"),
    };

    let oauth_config = &state.config.auth.oauth;
    let client_id = match &oauth_config.client_id {
        Some(client_id) => client_id,
        None => return callback_failure("server_error"),
    };
    let origin = match request_origin(&state, &headers) {
        Ok(origin) => origin,
        Err(_) => return callback_failure("server_error"),
    };
    let redirect_uri = format!("{origin}{CALLBACK_PATH}");

    let token = match oauth::exchange_code(&state.http, oauth_config, client_id, code, &redirect_uri, &verifier).await
    {
        Ok(token) => token,
        Err(_) => return callback_failure("token_exchange_failed"),
    };

    let userinfo = match oauth::fetch_userinfo(&state.http, oauth_config, &token.access_token).await {
        Ok(userinfo) => userinfo,
        Err(_) => return callback_failure("userinfo_failed"),
    };

    if !oauth_config.allowed_identities.contains(&userinfo.sub) {
        warn!("Login attempt by identity not on the allow list: {}", userinfo.sub);
        return callback_failure("unauthorized");
    }

    let session = {
        let mut conn = match state.db.acquire().await {
            Ok(conn) => conn,
            Err(_) => return callback_failure("server_error"),
        };
        match Sessions::new(&mut conn)
            .create(&SessionCreateDBRequest {
                identity_id: userinfo.sub.clone(),
                handle: userinfo.handle(),
                access_token: token.access_token,
            })
            .await
        {
            Ok(session) => session,
            Err(_) => return callback_failure("server_error"),
        }
    };

    redirect_with_cookies(
        "/",
        &[
            clear_cookie(PKCE_COOKIE),
            clear_cookie(STATE_COOKIE),
            build_cookie(SESSION_COOKIE, &session.id, SESSION_COOKIE_MAX_AGE),
        ],
    )
}

/// Report whether the request carries a valid admin session.
#[utoipa::path(
    get,
    path = "/auth/status",
    tag = "auth",
    summary = "Session status",
    responses(
        (status = 200, description = "Authentication status", body = AuthStatusResponse),
    )
)]
#[instrument(skip_all)]
pub async fn status(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<AuthStatusResponse>> {
    let session_id = match read_cookie(&headers, SESSION_COOKIE) {
        Some(id) => id,
        None => return Ok(Json(AuthStatusResponse::anonymous())),
    };

    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let session = Sessions::new(&mut conn).get_valid(&session_id).await?;

    let response = match session {
        Some(session) if state.config.auth.oauth.allowed_identities.contains(&session.identity_id) => {
            AuthStatusResponse {
                authenticated: true,
                handle: session.handle,
                expires_at: Some(session.expires_at),
            }
        }
        _ => AuthStatusResponse::anonymous(),
    };
    Ok(Json(response))
}

/// End the current session.
#[utoipa::path(
    post,
    path = "/auth/logout",
    tag = "auth",
    summary = "Log out",
    responses(
        (status = 200, description = "Session ended", body = LogoutResponse),
    )
)]
#[instrument(skip_all)]
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Result<Response> {
    if let Some(session_id) = read_cookie(&headers, SESSION_COOKIE) {
        let mut conn = state.db.acquire().await.map_err(DbError::from)?;
        let mut sessions = Sessions::new(&mut conn);
        sessions.delete(&session_id).await?;
        // Opportunistic cleanup of rows past their expiry
        sessions.purge_expired().await?;
    }

    let response = (
        [(header::SET_COOKIE, clear_cookie(SESSION_COOKIE))],
        Json(LogoutResponse { success: true }),
    );
    Ok(response.into_response())
}
