//! Token and base-URL resolution.
//!
//! `Authenticator` turns explicit overrides and, failing those, the
//! `YUPDATES_API_TOKEN` / `YUPDATES_API_URL` environment variables into a
//! validated `Config`. Validation happens here so no request is ever
//! attempted with an empty credential.

use std::fmt;

use crate::error::ApiError;

pub const TOKEN_ENV_VAR: &str = "YUPDATES_API_TOKEN";
pub const URL_ENV_VAR: &str = "YUPDATES_API_URL";

/// Resolved client configuration. Both fields are non-empty.
#[derive(Clone, PartialEq, Eq)]
pub struct Config {
    api_token: String,
    api_url: String,
}

impl Config {
    /// Validate and build a configuration. A trailing `/` on `api_url` is
    /// dropped.
    pub fn new(api_token: &str, api_url: &str) -> Result<Self, ApiError> {
        let api_token = api_token.trim();
        if api_token.is_empty() {
            return Err(ApiError::Configuration(format!(
                "API token is missing: set {TOKEN_ENV_VAR}"
            )));
        }
        let api_url = api_url.trim().trim_end_matches('/');
        if api_url.is_empty() {
            return Err(ApiError::Configuration(format!(
                "API URL is missing: set {URL_ENV_VAR}"
            )));
        }
        Ok(Self {
            api_token: api_token.to_string(),
            api_url: api_url.to_string(),
        })
    }

    pub fn api_token(&self) -> &str {
        &self.api_token
    }

    /// Base URL without a trailing slash.
    pub fn api_url(&self) -> &str {
        &self.api_url
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("api_token", &"<redacted>")
            .field("api_url", &self.api_url)
            .finish()
    }
}

/// Resolves a `Config` from explicit values with environment fallback.
#[derive(Debug, Clone, Default)]
pub struct Authenticator {
    token: Option<String>,
    api_url: Option<String>,
}

impl Authenticator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = Some(api_url.into());
        self
    }

    /// Resolve against the process environment.
    pub fn resolve(&self) -> Result<Config, ApiError> {
        self.resolve_with(|name| std::env::var(name).ok())
    }

    /// Resolve with an injected variable lookup in place of the environment.
    pub fn resolve_with<F>(&self, lookup: F) -> Result<Config, ApiError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let token = self
            .token
            .clone()
            .or_else(|| lookup(TOKEN_ENV_VAR))
            .unwrap_or_default();
        let api_url = self
            .api_url
            .clone()
            .or_else(|| lookup(URL_ENV_VAR))
            .unwrap_or_default();
        Config::new(&token, &api_url)
    }

    /// Headers every request carries. The service reads `X-Auth-Token`;
    /// `Authorization` holds the same credential as a bearer token.
    pub fn headers_for(config: &Config) -> Vec<(String, String)> {
        vec![
            (
                "authorization".to_string(),
                format!("Bearer {}", config.api_token),
            ),
            ("x-auth-token".to_string(), config.api_token.clone()),
        ]
    }
}
