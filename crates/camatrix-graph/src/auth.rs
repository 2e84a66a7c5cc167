//! OAuth2 client-credentials token acquisition.
//!
//! The matrix runs as a daemon application: it exchanges its client id and
//! secret for an app-only bearer token with the fixed administrative Graph
//! scope. Tokens are cached until shortly before expiry; a failed exchange
//! is fatal to the run.

use std::time::{Duration, Instant};

use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{GraphError, GraphResult};

const DEFAULT_AUTHORITY: &str = "https://login.microsoftonline.com";
const GRAPH_SCOPE: &str = "https://graph.microsoft.com/.default";

/// Refresh this long before the token actually expires.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

impl CachedToken {
    fn is_valid(&self) -> bool {
        Instant::now() + EXPIRY_MARGIN < self.expires_at
    }
}

/// Acquires and caches app-only bearer tokens for the directory API.
pub struct TokenProvider {
    http: reqwest::Client,
    authority: String,
    tenant_id: String,
    client_id: String,
    client_secret: String,
    cached: RwLock<Option<CachedToken>>,
}

impl TokenProvider {
    /// Creates a provider after a pre-flight credential check.
    ///
    /// Blank credentials are a configuration error caught here, before any
    /// network call is made.
    pub fn new(
        http: reqwest::Client,
        tenant_id: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> GraphResult<Self> {
        let tenant_id = tenant_id.into();
        let client_id = client_id.into();
        let client_secret = client_secret.into();

        for (name, value) in [
            ("tenant id", &tenant_id),
            ("client id", &client_id),
            ("client secret", &client_secret),
        ] {
            if value.trim().is_empty() {
                return Err(GraphError::Configuration {
                    message: format!("{name} must not be empty"),
                });
            }
        }

        Ok(Self {
            http,
            authority: DEFAULT_AUTHORITY.to_string(),
            tenant_id,
            client_id,
            client_secret,
            cached: RwLock::new(None),
        })
    }

    /// Overrides the identity provider base URL (tests).
    pub fn with_authority(mut self, authority: impl Into<String>) -> Self {
        self.authority = authority.into();
        self
    }

    /// Returns a valid bearer token, exchanging credentials if the cached
    /// one is missing or about to expire.
    pub async fn bearer_token(&self) -> GraphResult<String> {
        if let Some(token) = self.cached.read().await.as_ref() {
            if token.is_valid() {
                return Ok(token.access_token.clone());
            }
        }

        let mut slot = self.cached.write().await;
        // Another task may have refreshed while we waited for the lock.
        if let Some(token) = slot.as_ref() {
            if token.is_valid() {
                return Ok(token.access_token.clone());
            }
        }

        let token = self.request_token().await?;
        let access_token = token.access_token.clone();
        *slot = Some(token);
        Ok(access_token)
    }

    async fn request_token(&self) -> GraphResult<CachedToken> {
        let url = format!("{}/{}/oauth2/v2.0/token", self.authority, self.tenant_id);
        let params = [
            ("grant_type", "client_credentials"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("scope", GRAPH_SCOPE),
        ];

        let response = self
            .http
            .post(&url)
            .form(&params)
            .send()
            .await
            .map_err(|err| GraphError::Authentication {
                message: err.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GraphError::Authentication {
                message: format!("token endpoint returned {status}: {body}"),
            });
        }

        let token: TokenResponse =
            response
                .json()
                .await
                .map_err(|err| GraphError::Authentication {
                    message: format!("invalid token response: {err}"),
                })?;

        debug!(expires_in = token.expires_in, "access token acquired");

        Ok(CachedToken {
            access_token: token.access_token,
            expires_at: Instant::now() + Duration::from_secs(token.expires_in),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_credentials_fail_preflight() {
        let http = reqwest::Client::new();
        let result = TokenProvider::new(http.clone(), "", "client", "secret");
        assert!(matches!(result, Err(GraphError::Configuration { .. })));

        let result = TokenProvider::new(http.clone(), "tenant", "client", "   ");
        assert!(matches!(result, Err(GraphError::Configuration { .. })));

        assert!(TokenProvider::new(http, "tenant", "client", "secret").is_ok());
    }

    #[test]
    fn token_validity_respects_expiry_margin() {
        let fresh = CachedToken {
            access_token: "t".into(),
            expires_at: Instant::now() + Duration::from_secs(3600),
        };
        assert!(fresh.is_valid());

        let expiring = CachedToken {
            access_token: "t".into(),
            expires_at: Instant::now() + Duration::from_secs(30),
        };
        assert!(!expiring.is_valid());
    }
}
