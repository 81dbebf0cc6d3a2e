use anyhow::Context;
use async_trait::async_trait;
use chrono::{Duration, NaiveDateTime, Utc};
use reqwest::header::ACCEPT;
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;

use super::TokenProvider;
use crate::models::AccessToken;

/// Reported lifetimes are capped at a day.
const MAX_TOKEN_TTL_SECONDS: i64 = 24 * 60 * 60;

pub struct ClientCredentialsProvider {
    token_url: String,
    client_id: String,
    client_secret: Secret<String>,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    token_type: Option<String>,
    expires_in: Option<i64>,
}

impl ClientCredentialsProvider {
    pub fn new(token_url: String, client_id: String, client_secret: Secret<String>) -> Self {
        Self {
            token_url,
            client_id,
            client_secret,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl TokenProvider for ClientCredentialsProvider {
    async fn access_token(&self) -> anyhow::Result<AccessToken> {
        let form = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.expose_secret().as_str()),
            ("grant_type", "client_credentials"),
        ];

        let resp = self
            .client
            .post(&self.token_url)
            .header(ACCEPT, "application/json")
            .form(&form)
            .send()
            .await
            .context("failed to call token endpoint")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("token request failed ({status}): {body}");
        }

        let body: TokenResponse = resp
            .json()
            .await
            .context("failed to parse token response")?;

        let access_token = body
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| anyhow::anyhow!("Failed to retrieve valid token"))?;

        tracing::info!(expires_in = ?body.expires_in, "token retrieved successfully");

        Ok(AccessToken {
            access_token,
            token_type: body.token_type.unwrap_or_else(|| "Bearer".to_string()),
            expires_at: body.expires_in.and_then(expiry_after),
        })
    }
}

fn expiry_after(secs: i64) -> Option<NaiveDateTime> {
    let ttl = Duration::try_seconds(secs.clamp(0, MAX_TOKEN_TTL_SECONDS))?;
    Utc::now().naive_utc().checked_add_signed(ttl)
}
