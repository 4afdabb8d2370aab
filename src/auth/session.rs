//! Session and transient cookie handling.
//!
//! Sessions are opaque identifiers stored server-side (see
//! [`crate::db::handlers::Sessions`]); the cookie only carries the id. The
//! PKCE verifier and OAuth state ride in short-lived cookies between the
//! login redirect and the callback.

use axum::http::HeaderMap;

/// Cookie holding the session id.
pub const SESSION_COOKIE: &str = "session";
/// Cookie holding the PKCE code verifier between login and callback.
pub const PKCE_COOKIE: &str = "pkce_verifier";
/// Cookie holding the CSRF state between login and callback.
pub const STATE_COOKIE: &str = "auth_state";

/// Lifetime of the verifier/state cookies. Users have this long to finish
/// the provider side of the login flow.
pub const TRANSIENT_COOKIE_MAX_AGE: u32 = 600;
/// Lifetime of the session cookie, matching the server-side session TTL.
pub const SESSION_COOKIE_MAX_AGE: u32 = 7 * 24 * 60 * 60;

/// Build a `Set-Cookie` value scoped to the whole site.
pub fn build_cookie(name: &str, value: &str, max_age: u32) -> String {
    format!("{name}={value}; Max-Age={max_age}; Path=/; HttpOnly; Secure; SameSite=Lax")
}

/// Build a `Set-Cookie` value that expires the named cookie immediately.
pub fn clear_cookie(name: &str) -> String {
    format!("{name}=; Max-Age=0; Path=/; HttpOnly; Secure; SameSite=Lax")
}

/// Pull a cookie's value out of the request headers, if present.
pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    let header = headers.get(axum::http::header::COOKIE)?.to_str().ok()?;
    for pair in header.split(';') {
        if let Some((key, value)) = pair.trim().split_once('=') {
            if key == name {
                return Some(value.to_string());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::COOKIE;

    #[test]
    fn test_read_cookie_finds_named_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, "a=1; session=abc123; b=2".parse().unwrap());

        assert_eq!(read_cookie(&headers, SESSION_COOKIE), Some("abc123".to_string()));
        assert_eq!(read_cookie(&headers, "a"), Some("1".to_string()));
        assert_eq!(read_cookie(&headers, "missing"), None);
    }

    #[test]
    fn test_read_cookie_without_header() {
        let headers = HeaderMap::new();
        assert_eq!(read_cookie(&headers, SESSION_COOKIE), None);
    }

    #[test]
    fn test_cookie_attributes() {
        let cookie = build_cookie(SESSION_COOKIE, "abc", SESSION_COOKIE_MAX_AGE);
        assert!(cookie.starts_with("session=abc;"));
        assert!(cookie.contains("Max-Age=604800"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Lax"));

        let cleared = clear_cookie(PKCE_COOKIE);
        assert!(cleared.starts_with("pkce_verifier=;"));
        assert!(cleared.contains("Max-Age=0"));
    }
}
