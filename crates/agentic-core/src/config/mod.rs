use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::auth::{TokenExchangeClient, TokenExchangeRequest};
use crate::error::AgenticError;
use crate::llm::GeminiClient;
use crate::report::HttpReportDispatcher;
use crate::store::{ConversationStore, FileBackend};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub completion: CompletionSettings,
    #[serde(default)]
    pub report: ReportSettings,
    #[serde(default)]
    pub storage: StorageSettings,
    #[serde(default)]
    pub auth: AuthSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletionSettings {
    pub model: String,
    pub api_key_env: String,
    pub base_url: Option<String>,
    /// Display-only budget shown next to the running token estimate.
    pub token_limit: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportSettings {
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StorageSettings {
    /// Defaults to the platform data directory when unset.
    pub data_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    pub backend_url: String,
    pub client_id_env: String,
    pub resolve_timeout_secs: u64,
}

impl Default for CompletionSettings {
    fn default() -> Self {
        Self {
            model: "gemini-2.5-flash".to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
            base_url: None,
            token_limit: crate::session::TokenBudget::DEFAULT_LIMIT,
        }
    }
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
        }
    }
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            backend_url: "http://localhost:8000".to_string(),
            client_id_env: "GOOGLE_CLIENT_ID".to_string(),
            resolve_timeout_secs: 10,
        }
    }
}

impl Settings {
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("agentic")
            .join("config.toml")
    }

    pub fn load() -> Self {
        let config_path = Self::config_path();
        let mut settings = if config_path.exists() {
            std::fs::read_to_string(&config_path)
                .ok()
                .and_then(|content| match toml::from_str(&content) {
                    Ok(settings) => Some(settings),
                    Err(e) => {
                        tracing::warn!("Ignoring invalid {}: {}", config_path.display(), e);
                        None
                    }
                })
                .unwrap_or_default()
        } else {
            Self::default()
        };
        settings.apply_env_overrides();
        settings
    }

    /// `AGENTIC_REPORT_URL` overrides the report backend for self-hosted deployments.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("AGENTIC_REPORT_URL") {
            if !url.is_empty() {
                self.report.base_url = url;
            }
        }
    }

    pub fn save(&self) -> Result<(), AgenticError> {
        let config_path = Self::config_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| AgenticError::Config(e.to_string()))?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    /// Get the API key from the environment variable named in settings.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.completion.api_key_env)
            .ok()
            .filter(|k| !k.is_empty())
    }

    pub fn client_id(&self) -> Option<String> {
        std::env::var(&self.auth.client_id_env)
            .ok()
            .filter(|k| !k.is_empty())
    }

    pub fn resolve_timeout(&self) -> Duration {
        Duration::from_secs(self.auth.resolve_timeout_secs)
    }

    /// Build the completion client from the current settings.
    pub fn build_completion_client(&self) -> Result<GeminiClient, AgenticError> {
        let api_key = self.api_key().ok_or_else(|| {
            AgenticError::Config(format!(
                "Set {} to your API key",
                self.completion.api_key_env
            ))
        })?;
        let client = GeminiClient::new(api_key);
        Ok(match self.completion.base_url {
            Some(ref url) => client.with_base_url(url),
            None => client,
        })
    }

    pub fn build_token_exchange_client(&self) -> TokenExchangeClient {
        TokenExchangeClient::new(&self.auth.backend_url)
    }

    /// Token exchange request for an authorization code, with the OAuth
    /// client id taken from the environment variable named in settings.
    pub fn token_exchange_request(
        &self,
        code: &str,
        redirect_uri: &str,
        code_verifier: &str,
    ) -> Result<TokenExchangeRequest, AgenticError> {
        let client_id = self.client_id().ok_or_else(|| {
            AgenticError::Config(format!(
                "Set {} to your OAuth client id",
                self.auth.client_id_env
            ))
        })?;
        Ok(TokenExchangeRequest {
            code: code.to_string(),
            redirect_uri: redirect_uri.to_string(),
            client_id,
            code_verifier: code_verifier.to_string(),
        })
    }

    pub fn build_report_dispatcher(&self) -> HttpReportDispatcher {
        HttpReportDispatcher::new(&self.report.base_url)
    }

    pub fn build_store(&self) -> Result<ConversationStore, AgenticError> {
        let backend = match self.storage.data_dir {
            Some(ref dir) => FileBackend::with_dir(dir.clone())?,
            None => FileBackend::new()?,
        };
        Ok(ConversationStore::new(backend))
    }
}
