//! Client for the backend's OAuth token endpoints.
//!
//! The browser side of the PKCE flow (consent screen, redirect, verifier
//! generation) is handled by the identity provider. This client only trades an
//! authorization code for tokens and the user's profile.

use crate::auth::Identity;
use crate::error::{AgenticError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TokenExchangeRequest {
    pub code: String,
    pub redirect_uri: String,
    pub client_id: String,
    pub code_verifier: String,
}

impl TokenExchangeRequest {
    /// Names of required fields that are empty.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.code.is_empty() {
            missing.push("code");
        }
        if self.redirect_uri.is_empty() {
            missing.push("redirect_uri");
        }
        if self.client_id.is_empty() {
            missing.push("client_id");
        }
        if self.code_verifier.is_empty() {
            missing.push("code_verifier");
        }
        missing
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UserInfo {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub user_info: UserInfo,
}

impl TokenResponse {
    pub fn identity(&self) -> Result<Identity> {
        let email = self
            .user_info
            .email
            .clone()
            .filter(|e| !e.is_empty())
            .ok_or_else(|| AgenticError::Auth("Token response has no user email".to_string()))?;
        let name = self
            .user_info
            .name
            .clone()
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| email.split('@').next().unwrap_or(&email).to_string());
        Ok(Identity {
            email,
            name,
            picture: self.user_info.picture.clone(),
            is_guest: false,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RefreshedToken {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: String,
}

pub struct TokenExchangeClient {
    client: reqwest::Client,
    base_url: String,
}

impl TokenExchangeClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/auth/{}", self.base_url, path)
    }

    async fn post<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<T> {
        let response = self.client.post(self.url(path)).json(body).send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let detail = serde_json::from_str::<ErrorBody>(&text)
                .map(|b| b.detail)
                .unwrap_or(text);
            return Err(AgenticError::Auth(format!("{} failed ({}): {}", path, status, detail)));
        }

        serde_json::from_str(&text)
            .map_err(|e| AgenticError::Auth(format!("Failed to parse {} response: {e}", path)))
    }

    /// Trade an authorization code and PKCE verifier for tokens.
    pub async fn exchange(&self, request: &TokenExchangeRequest) -> Result<TokenResponse> {
        let missing = request.missing_fields();
        if !missing.is_empty() {
            return Err(AgenticError::Validation(format!(
                "Missing required parameters: {}",
                missing.join(", ")
            )));
        }
        let body = serde_json::to_value(request)?;
        let tokens: TokenResponse = self.post("token", &body).await?;
        tracing::debug!("Token exchange succeeded");
        Ok(tokens)
    }

    pub async fn refresh(&self, refresh_token: &str) -> Result<RefreshedToken> {
        if refresh_token.is_empty() {
            return Err(AgenticError::Validation("Refresh token required".to_string()));
        }
        self.post("refresh", &serde_json::json!({ "refresh_token": refresh_token }))
            .await
    }

    pub async fn revoke(&self, token: &str) -> Result<()> {
        if token.is_empty() {
            return Err(AgenticError::Validation("Token required".to_string()));
        }
        let _: serde_json::Value = self
            .post("revoke", &serde_json::json!({ "token": token }))
            .await?;
        Ok(())
    }
}
