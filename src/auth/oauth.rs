//! OAuth 2.0 authorization-code flow with PKCE (RFC 7636).
//!
//! The provider is a generic OIDC-ish identity service configured via
//! [`crate::config::OAuthConfig`]. We only need three endpoints: authorize,
//! token, and userinfo.

use std::time::Duration;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::instrument;
use url::Url;

use crate::{
    config::OAuthConfig,
    errors::{Error, Result},
};

/// Unreserved characters permitted in a PKCE code verifier (RFC 7636 §4.1).
const VERIFIER_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-._~";

/// Length of generated code verifiers. RFC allows 43-128; 64 is plenty.
const VERIFIER_LENGTH: usize = 64;

/// How long we wait on the provider before giving up.
const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(10);

/// Generate a random PKCE code verifier.
pub fn generate_verifier() -> String {
    let mut rng = rand::rng();
    (0..VERIFIER_LENGTH)
        .map(|_| VERIFIER_CHARSET[rng.random_range(0..VERIFIER_CHARSET.len())] as char)
        .collect()
}

/// Derive the S256 code challenge from a verifier.
pub fn challenge_s256(verifier: &str) -> String {
    let digest = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(digest)
}

/// Build the provider authorization URL the browser is redirected to.
pub fn authorize_url(
    oauth: &OAuthConfig,
    client_id: &str,
    redirect_uri: &str,
    state: &str,
    challenge: &str,
) -> Result<String> {
    let mut url = Url::parse(&oauth.authorize_url).map_err(|e| Error::Misconfiguration {
        message: format!("invalid authorize_url: {e}"),
    })?;
    url.query_pairs_mut()
        .append_pair("response_type", "code")
        .append_pair("client_id", client_id)
        .append_pair("redirect_uri", redirect_uri)
        .append_pair("scope", &oauth.scope)
        .append_pair("state", state)
        .append_pair("code_challenge", challenge)
        .append_pair("code_challenge_method", "S256");
    Ok(url.to_string())
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TokenRequest<'a> {
    grant_type: &'a str,
    client_id: &'a str,
    code: &'a str,
    redirect_uri: &'a str,
    code_verifier: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
}

/// Identity claims returned by the provider's userinfo endpoint.
#[derive(Debug, Deserialize)]
pub struct UserInfo {
    pub sub: String,
    pub username: Option<String>,
    pub name: Option<String>,
}

impl UserInfo {
    /// Best human-readable label the provider gave us, if any.
    pub fn handle(&self) -> Option<String> {
        self.username.clone().or_else(|| self.name.clone())
    }
}

/// Exchange an authorization code for an access token.
#[instrument(skip_all, err)]
pub async fn exchange_code(
    http: &reqwest::Client,
    oauth: &OAuthConfig,
    client_id: &str,
    code: &str,
    redirect_uri: &str,
    verifier: &str,
) -> Result<TokenResponse> {
    let response = http
        .post(&oauth.token_url)
        .timeout(UPSTREAM_TIMEOUT)
        .json(&TokenRequest {
            grant_type: "authorization_code",
            client_id,
            code,
            redirect_uri,
            code_verifier: verifier,
        })
        .send()
        .await
        .map_err(|e| Error::Upstream {
            operation: "token exchange".to_string(),
            detail: e.to_string(),
        })?;

    if !response.status().is_success() {
        return Err(Error::Upstream {
            operation: "token exchange".to_string(),
            detail: format!("provider returned {}", response.status()),
        });
    }

    response.json().await.map_err(|e| Error::Upstream {
        operation: "token exchange".to_string(),
        detail: format!("malformed token response: {e}"),
    })
}

/// Fetch the identity behind an access token.
#[instrument(skip_all, err)]
pub async fn fetch_userinfo(
    http: &reqwest::Client,
    oauth: &OAuthConfig,
    access_token: &str,
) -> Result<UserInfo> {
    let response = http
        .get(&oauth.userinfo_url)
        .timeout(UPSTREAM_TIMEOUT)
        .bearer_auth(access_token)
        .send()
        .await
        .map_err(|e| Error::Upstream {
            operation: "userinfo".to_string(),
            detail: e.to_string(),
        })?;

    if !response.status().is_success() {
        return Err(Error::Upstream {
            operation: "userinfo".to_string(),
            detail: format!("provider returned {}", response.status()),
        });
    }

    response.json().await.map_err(|e| Error::Upstream {
        operation: "userinfo".to_string(),
        detail: format!("malformed userinfo response: {e}"),
    })
}
