//! OAuth2 client-credentials token acquisition for Microsoft Graph.
//!
//! Tokens are cached in memory and refreshed shortly before they expire.
//! Token values are never logged.

use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::GraphError;

const GRAPH_SCOPE: &str = "https://graph.microsoft.com/.default";

/// Refresh this long before the reported expiry.
const EXPIRY_MARGIN: Duration = Duration::from_secs(5 * 60);

const DEFAULT_EXPIRES_IN: u64 = 3600;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

struct CachedToken {
    value: String,
    refresh_at: Instant,
}

pub struct TokenProvider {
    token_url: String,
    client_id: String,
    client_secret: String,
    cached: Mutex<Option<CachedToken>>,
}

impl TokenProvider {
    pub fn new(authority: &str, tenant_id: &str, client_id: &str, client_secret: &str) -> Self {
        Self {
            token_url: format!(
                "{}/{}/oauth2/v2.0/token",
                authority.trim_end_matches('/'),
                tenant_id
            ),
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            cached: Mutex::new(None),
        }
    }

    /// Return a valid access token, acquiring a new one if needed.
    pub async fn access_token(&self, client: &reqwest::Client) -> Result<String, GraphError> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref() {
            if Instant::now() < token.refresh_at {
                return Ok(token.value.clone());
            }
            debug!("Graph access token is about to expire, refreshing");
        }

        let token = self.acquire(client).await?;
        let value = token.value.clone();
        *cached = Some(token);
        Ok(value)
    }

    async fn acquire(&self, client: &reqwest::Client) -> Result<CachedToken, GraphError> {
        let params = [
            ("grant_type", "client_credentials"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("scope", GRAPH_SCOPE),
        ];

        let response = client.post(&self.token_url).form(&params).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = match serde_json::from_str::<TokenErrorResponse>(&body) {
                Ok(err) => match err.error_description {
                    Some(description) => format!("{}: {}", err.error, description),
                    None => err.error,
                },
                Err(_) => body,
            };
            warn!("Graph token request failed with status {} (check tenant/client id/secret)", status);
            return Err(GraphError::Token { status, message });
        }

        let token: TokenResponse = serde_json::from_str(&body)?;
        let lifetime = Duration::from_secs(token.expires_in.unwrap_or(DEFAULT_EXPIRES_IN));

        info!("Acquired Graph access token (valid for {}s)", lifetime.as_secs());

        Ok(CachedToken {
            value: token.access_token,
            refresh_at: Instant::now() + lifetime.saturating_sub(EXPIRY_MARGIN),
        })
    }
}
