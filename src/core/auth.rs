use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;

use crate::core::config::AuthSettings;

pub const GRAPH_SCOPE: &str = "https://graph.microsoft.com/.default";
pub const ACCESS_TOKEN_ENV: &str = "MBU_ACCESS_TOKEN";

/// Source of the bearer token attached to every Graph request.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn access_token(&self) -> Result<String>;
}

/// A token issued elsewhere and handed in as-is.
pub struct StaticToken(String);

impl StaticToken {
    /// Read a pre-issued token from `MBU_ACCESS_TOKEN`, if set and non-empty.
    pub fn from_env() -> Option<Self> {
        std::env::var(ACCESS_TOKEN_ENV)
            .ok()
            .filter(|t| !t.trim().is_empty())
            .map(|t| Self(t.trim().to_string()))
    }
}

#[async_trait]
impl TokenProvider for StaticToken {
    async fn access_token(&self) -> Result<String> {
        Ok(self.0.clone())
    }
}

// --- OAuth2 client credentials ---

#[derive(Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

/// App-only token via the OAuth2 client credentials grant.
#[derive(Debug, Clone)]
pub struct ClientCredentials {
    token_url: String,
    client_id: String,
    client_secret: String,
}

impl ClientCredentials {
    /// Fails when tenant, client id or secret is missing.
    pub fn from_settings(auth: &AuthSettings) -> Result<Self> {
        let missing: Vec<&str> = [
            ("tenant_id", &auth.tenant_id),
            ("client_id", &auth.client_id),
            ("client_secret", &auth.client_secret),
        ]
        .iter()
        .filter(|(_, v)| v.as_deref().map_or(true, |s| s.trim().is_empty()))
        .map(|(name, _)| *name)
        .collect();
        if !missing.is_empty() {
            anyhow::bail!(
                "Missing credentials: {} (set them in the [auth] config table or via MBU_TENANT_ID, MBU_CLIENT_ID, MBU_CLIENT_SECRET)",
                missing.join(", ")
            );
        }

        let tenant = auth.tenant_id.as_deref().unwrap_or_default();
        Ok(Self {
            token_url: format!(
                "{}/{}/oauth2/v2.0/token",
                auth.authority.trim_end_matches('/'),
                tenant
            ),
            client_id: auth.client_id.clone().unwrap_or_default(),
            client_secret: auth.client_secret.clone().unwrap_or_default(),
        })
    }

    pub fn token_url(&self) -> &str {
        &self.token_url
    }
}

fn token_from_response(resp: TokenResponse) -> Result<String> {
    if let Some(error) = resp.error {
        anyhow::bail!(
            "Token endpoint returned {}: {}",
            error,
            resp.error_description.unwrap_or_default()
        );
    }
    let token = resp
        .access_token
        .context("Missing 'access_token' in token response")?;
    if token.is_empty() {
        anyhow::bail!("Empty access token in token response");
    }
    Ok(token)
}

#[async_trait]
impl TokenProvider for ClientCredentials {
    async fn access_token(&self) -> Result<String> {
        tracing::debug!(url = self.token_url(), "Requesting app-only access token");
        let client = reqwest::Client::new();
        let response = client
            .post(&self.token_url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("scope", GRAPH_SCOPE),
            ])
            .send()
            .await
            .context("Failed to send request to token endpoint")?;

        let status = response.status();
        let body = response
            .text()
            .await
            .with_context(|| format!("Failed to read token response (HTTP {})", status.as_u16()))?;
        let parsed: TokenResponse = serde_json::from_str(&body).with_context(|| {
            format!("Failed to parse token response (HTTP {})", status.as_u16())
        })?;
        token_from_response(parsed)
    }
}
