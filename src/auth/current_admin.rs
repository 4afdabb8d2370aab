use axum::{
    extract::{FromRequestParts, OptionalFromRequestParts},
    http::request::Parts,
};
use tracing::{debug, instrument, trace};

use crate::{
    auth::session::{read_cookie, SESSION_COOKIE},
    db::{errors::DbError, handlers::Sessions},
    errors::{Error, Result},
    AppState,
};

/// The authenticated site owner, extracted from the session cookie.
///
/// Extraction fails with 401 when there is no cookie or the session is
/// missing or expired, and with 403 when the session belongs to an identity
/// that has since been removed from the allow list.
#[derive(Debug, Clone)]
pub struct CurrentAdmin {
    pub identity_id: String,
    pub session_id: String,
    pub handle: Option<String>,
}

impl FromRequestParts<AppState> for CurrentAdmin {
    type Rejection = Error;

    #[instrument(skip(parts, state))]
    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let session_id = match read_cookie(&parts.headers, SESSION_COOKIE) {
            Some(id) => id,
            None => {
                trace!("No session cookie found in request");
                return Err(Error::Unauthenticated { message: None });
            }
        };

        let mut conn = state.db.acquire().await.map_err(DbError::from)?;
        let mut sessions = Sessions::new(&mut conn);

        let session = sessions
            .get_valid(&session_id)
            .await?
            .ok_or(Error::Unauthenticated { message: None })?;

        // Allow-list membership is re-checked on every request so removing
        // an identity from the config locks out live sessions too.
        if !state
            .config
            .auth
            .oauth
            .allowed_identities
            .contains(&session.identity_id)
        {
            return Err(Error::Forbidden {
                identity: session.identity_id,
            });
        }

        debug!("Authenticated admin: {}", session.identity_id);
        Ok(CurrentAdmin {
            identity_id: session.identity_id,
            session_id: session.id,
            handle: session.handle,
        })
    }
}

/// Optional form used by read handlers that behave differently for the
/// admin. An anonymous request extracts as `None`; a session for a removed
/// identity still fails with 403.
impl OptionalFromRequestParts<AppState> for CurrentAdmin {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Option<Self>> {
        match <Self as FromRequestParts<AppState>>::from_request_parts(parts, state).await {
            Ok(admin) => Ok(Some(admin)),
            Err(Error::Unauthenticated { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        test_utils::{create_session, create_test_config, create_test_state},
        AppState,
    };
    use axum::http::request::Parts;
    use sqlx::SqlitePool;
    use tempfile::TempDir;

    fn parts_with_cookie(cookie: Option<&str>) -> Parts {
        let mut builder = axum::http::Request::builder().uri("http://localhost/api/pages");
        if let Some(cookie) = cookie {
            builder = builder.header("cookie", cookie);
        }
        let (parts, _body) = builder.body(()).unwrap().into_parts();
        parts
    }

    async fn create_state_with_session(pool: SqlitePool, identity_id: &str) -> (AppState, String, TempDir) {
        let session_id = create_session(&pool, identity_id).await;
        let (state, tempdir) = create_test_state(pool, create_test_config()).await;
        (state, session_id, tempdir)
    }

    // Both extractor traits are in scope, so the call has to name one.
    async fn extract(parts: &mut Parts, state: &AppState) -> crate::errors::Result<CurrentAdmin> {
        <CurrentAdmin as FromRequestParts<AppState>>::from_request_parts(parts, state).await
    }

    #[sqlx::test]
    async fn test_valid_session_for_allowed_identity(pool: SqlitePool) {
        let (state, session_id, _tempdir) = create_state_with_session(pool, "allowed-identity").await;

        let mut parts = parts_with_cookie(Some(&format!("session={session_id}")));
        let admin = extract(&mut parts, &state).await.unwrap();

        assert_eq!(admin.identity_id, "allowed-identity");
        assert_eq!(admin.session_id, session_id);
        assert_eq!(admin.handle, Some("owner".to_string()));
    }

    #[sqlx::test]
    async fn test_missing_cookie_is_unauthenticated(pool: SqlitePool) {
        let (state, _session_id, _tempdir) = create_state_with_session(pool, "allowed-identity").await;

        let mut parts = parts_with_cookie(None);
        let error = extract(&mut parts, &state).await.unwrap_err();
        assert_eq!(error.status_code(), axum::http::StatusCode::UNAUTHORIZED);
    }

    #[sqlx::test]
    async fn test_unknown_session_is_unauthenticated(pool: SqlitePool) {
        let (state, _session_id, _tempdir) = create_state_with_session(pool, "allowed-identity").await;

        let mut parts = parts_with_cookie(Some("session=not-a-real-session"));
        let error = extract(&mut parts, &state).await.unwrap_err();
        assert_eq!(error.status_code(), axum::http::StatusCode::UNAUTHORIZED);
    }

    #[sqlx::test]
    async fn test_session_for_removed_identity_is_forbidden(pool: SqlitePool) {
        // Session exists and is unexpired, but the identity is no longer
        // on the allow list.
        let (state, session_id, _tempdir) = create_state_with_session(pool, "former-admin").await;

        let mut parts = parts_with_cookie(Some(&format!("session={session_id}")));
        let error = extract(&mut parts, &state).await.unwrap_err();
        assert_eq!(error.status_code(), axum::http::StatusCode::FORBIDDEN);
    }
}
