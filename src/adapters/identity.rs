use crate::domain::ports::IdentityProvider;
use crate::utils::error::{DeskError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

/// A fixed bearer token, e.g. a service credential from the environment.
#[derive(Clone)]
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl std::fmt::Debug for StaticTokenProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticTokenProvider")
            .field("token", &"<redacted>")
            .finish()
    }
}

#[async_trait]
impl IdentityProvider for StaticTokenProvider {
    async fn bearer_token(&self) -> Result<String> {
        if self.token.trim().is_empty() {
            return Err(DeskError::credential("no token configured"));
        }
        Ok(self.token.clone())
    }
}

/// Exchanges a long-lived refresh token for a fresh ID token on every call,
/// using the OAuth2 `refresh_token` grant.
pub struct RefreshTokenProvider {
    client: Client,
    token_url: String,
    refresh_token: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    id_token: Option<String>,
    access_token: Option<String>,
}

impl RefreshTokenProvider {
    pub fn new(client: Client, token_url: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            client,
            token_url: token_url.into(),
            refresh_token: refresh_token.into(),
        }
    }
}

#[async_trait]
impl IdentityProvider for RefreshTokenProvider {
    async fn bearer_token(&self) -> Result<String> {
        tracing::debug!("Refreshing credential at: {}", self.token_url);

        let response = self
            .client
            .post(&self.token_url)
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", self.refresh_token.as_str()),
            ])
            .send()
            .await
            .map_err(|e| DeskError::credential(format!("token endpoint unreachable: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DeskError::credential(format!(
                "token endpoint returned {status}"
            )));
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| DeskError::credential(format!("unreadable token response: {e}")))?;

        body.id_token
            .or(body.access_token)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| DeskError::credential("token response carried no token"))
    }
}
