//! Application configuration management.
//!
//! Configuration is loaded from a YAML file with environment variable overrides. The configuration
//! file path defaults to `config.yaml` but can be specified via `-f` flag or `ATELIER_CONFIG`
//! environment variable.
//!
//! ## Loading Priority
//!
//! Configuration sources are merged in the following order (later sources override earlier ones):
//!
//! 1. **YAML config file** - Base configuration (default: `config.yaml`)
//! 2. **Environment variables** - Variables prefixed with `ATELIER_` override YAML values
//! 3. **DATABASE_URL** - Special case: overrides `database.url` if set
//!
//! For nested config values, use double underscores in environment variables. For example,
//! `ATELIER_AUTH__OAUTH__CLIENT_ID=abc` sets the `auth.oauth.client_id` field.

use clap::Parser;
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use url::Url;

use crate::errors::Error;

/// Simple CLI args - just for specifying config file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    #[arg(short = 'f', long, env = "ATELIER_CONFIG", default_value = "config.yaml")]
    pub config: String,

    /// Validate configuration and exit without starting the server.
    /// Useful for CI/CD pipelines to catch config errors before deployment.
    #[arg(long)]
    pub validate: bool,
}

/// Main application configuration.
///
/// This is the root configuration structure loaded from YAML and environment variables.
/// All fields have sensible defaults defined in the `Default` implementation.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// HTTP server host to bind to (e.g., "0.0.0.0" for all interfaces)
    pub host: String,
    /// HTTP server port to bind to
    pub port: u16,
    /// Public base URL of the site (e.g., "https://example.com"). When set it
    /// overrides the Host-header-derived origin used for OAuth redirect URIs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_url: Option<String>,
    /// Convenience override for `database.url`, set via DATABASE_URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_url: Option<String>,
    /// SQLite database configuration
    pub database: DatabaseConfig,
    /// Authentication configuration
    pub auth: AuthConfig,
    /// Image blob storage configuration
    pub storage: StorageConfig,
    /// Directory holding the pre-built frontend bundle, served with an SPA
    /// fallback. Unset disables static serving (API only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub static_dir: Option<PathBuf>,
    /// CORS configuration for browser clients
    pub cors: CorsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            public_url: None,
            database_url: None,
            database: DatabaseConfig::default(),
            auth: AuthConfig::default(),
            storage: StorageConfig::default(),
            static_dir: None,
            cors: CorsConfig::default(),
        }
    }
}

/// SQLite connection settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    /// Connection string, e.g. "sqlite://atelier.db"
    pub url: String,
    /// Maximum number of pooled connections
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://atelier.db".to_string(),
            max_connections: 5,
        }
    }
}

/// Authentication configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuthConfig {
    pub oauth: OAuthConfig,
}

/// OAuth (authorization-code + PKCE) provider settings.
///
/// This is a public client: there is no client secret, the code exchange is
/// bound to the PKCE verifier instead.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct OAuthConfig {
    /// OAuth client ID. Login is disabled (500) while this is unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    /// Provider's authorization endpoint
    pub authorize_url: String,
    /// Provider's token endpoint
    pub token_url: String,
    /// Provider's userinfo endpoint
    pub userinfo_url: String,
    /// Scopes requested at login
    pub scope: String,
    /// Subject identifiers permitted to manage the site. Anyone else
    /// authenticates successfully at the provider but is refused here.
    pub allowed_identities: Vec<String>,
}

impl Default for OAuthConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            authorize_url: "https://id.avknd.dev/oauth/authorize".to_string(),
            token_url: "https://id.avknd.dev/api/oauth/token".to_string(),
            userinfo_url: "https://id.avknd.dev/api/oauth/userinfo".to_string(),
            scope: "openid profile".to_string(),
            allowed_identities: Vec::new(),
        }
    }
}

/// Image blob storage settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    /// Directory where uploaded images are stored
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/images"),
        }
    }
}

/// CORS (Cross-Origin Resource Sharing) configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct CorsConfig {
    /// Allowed origins for CORS requests
    pub allowed_origins: Vec<CorsOrigin>,
    /// Allow credentials (cookies) in CORS requests
    pub allow_credentials: bool,
    /// Preflight cache duration in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_age: Option<u64>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: Vec::new(),
            allow_credentials: true,
            max_age: None,
        }
    }
}

/// CORS origin specification.
///
/// Can be either a wildcard (`*`) to allow all origins, or a specific URL.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum CorsOrigin {
    /// Allow all origins (`*`)
    #[serde(deserialize_with = "parse_wildcard")]
    Wildcard,
    /// Specific origin URL (e.g., `https://app.example.com`)
    #[serde(deserialize_with = "parse_url")]
    Url(Url),
}

fn parse_wildcard<'de, D>(deserializer: D) -> Result<(), D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: String = Deserialize::deserialize(deserializer)?;
    if s == "*" {
        Ok(())
    } else {
        Err(serde::de::Error::custom("Expected '*'"))
    }
}

fn parse_url<'de, D>(deserializer: D) -> Result<Url, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: String = Deserialize::deserialize(deserializer)?;
    Url::parse(&s).map_err(serde::de::Error::custom)
}

impl Config {
    #[allow(clippy::result_large_err)]
    pub fn load(args: &Args) -> Result<Self, figment::Error> {
        let mut config: Self = Self::figment(args).extract()?;

        // if database_url is set, use it (DATABASE_URL wins over the yaml value)
        if let Some(url) = config.database_url.take() {
            config.database.url = url;
        }

        config.validate().map_err(|e| figment::Error::from(e.to_string()))?;
        Ok(config)
    }

    pub fn figment(args: &Args) -> Figment {
        Figment::new()
            .merge(Yaml::file(&args.config))
            .merge(Env::prefixed("ATELIER_").split("__"))
            .merge(Env::raw().only(&["DATABASE_URL"]).map(|_| "database_url".into()))
    }

    /// Validate the configuration for consistency and required fields
    pub fn validate(&self) -> Result<(), Error> {
        if self.auth.oauth.client_id.is_some() && self.auth.oauth.allowed_identities.is_empty() {
            return Err(Error::Misconfiguration {
                message: "Config validation: auth.oauth.client_id is set but auth.oauth.allowed_identities is empty. \
                 At least one identity must be allowed to manage the site."
                    .to_string(),
            });
        }

        if let Some(public_url) = &self.public_url {
            Url::parse(public_url).map_err(|e| Error::Misconfiguration {
                message: format!("Config validation: public_url is not a valid URL: {e}"),
            })?;
        }

        Ok(())
    }

    /// The address the HTTP server binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.bind_address(), "0.0.0.0:8080");
    }

    #[test]
    fn client_id_without_allowlist_is_rejected() {
        let mut config = Config::default();
        config.auth.oauth.client_id = Some("client-123".to_string());
        assert!(config.validate().is_err());

        config.auth.oauth.allowed_identities = vec!["ident-1".to_string()];
        assert!(config.validate().is_ok());
    }

    #[test]
    fn yaml_and_env_layering() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.yaml",
                r#"
                port: 3000
                auth:
                  oauth:
                    client_id: from-yaml
                    allowed_identities: ["ident-1"]
                "#,
            )?;
            jail.set_env("ATELIER_PORT", "4000");
            jail.set_env("ATELIER_AUTH__OAUTH__CLIENT_ID", "from-env");

            let args = Args {
                config: "config.yaml".to_string(),
                validate: false,
            };
            let config = Config::load(&args).expect("config should load");

            assert_eq!(config.port, 4000);
            assert_eq!(config.auth.oauth.client_id.as_deref(), Some("from-env"));
            assert_eq!(config.auth.oauth.allowed_identities, vec!["ident-1"]);
            Ok(())
        });
    }

    #[test]
    fn database_url_env_override() {
        Jail::expect_with(|jail| {
            jail.set_env("DATABASE_URL", "sqlite:///tmp/other.db");

            let args = Args {
                config: "missing.yaml".to_string(),
                validate: false,
            };
            let config = Config::load(&args).expect("config should load");
            assert_eq!(config.database.url, "sqlite:///tmp/other.db");
            Ok(())
        });
    }
}
