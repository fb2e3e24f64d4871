use crate::core::page_window::DEFAULT_PAGE_SIZE;
use crate::core::poller::PollerConfig;
use crate::domain::model::Session;
use crate::utils::error::{DeskError, Result};
use crate::utils::validation::{Field, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_CONFIG_PATH: &str = "flight-desk.toml";
pub const DEFAULT_BASE_URL: &str = "http://localhost:3001";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeskConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    pub session: Option<Session>,
    #[serde(default)]
    pub poller: PollerSection,
    #[serde(default)]
    pub pagination: PaginationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_seconds: Option<u64>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_seconds: None,
        }
    }
}

/// Either a fixed `token`, or `token_url` + `refresh_token` for a fresh
/// credential on every request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    pub token: Option<String>,
    pub token_url: Option<String>,
    pub refresh_token: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PollerSection {
    pub max_retries: Option<u32>,
    pub retry_delay_ms: Option<u64>,
    pub refresh_interval_ms: Option<u64>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PaginationConfig {
    pub page_size: Option<usize>,
}

impl DeskConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(DeskError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content)
            .map_err(|e| DeskError::config(format!("TOML parsing error: {}", e)))
    }

    /// Replaces `${VAR}` with the environment value. Unset variables are
    /// left in place and rejected later by validation.
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}")
            .map_err(|e| DeskError::config(format!("env substitution pattern: {}", e)))?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_seconds.unwrap_or(30))
    }

    pub fn poller_config(&self) -> PollerConfig {
        let defaults = PollerConfig::default();
        PollerConfig {
            max_retries: self.poller.max_retries.unwrap_or(defaults.max_retries),
            retry_delay: self
                .poller
                .retry_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.retry_delay),
            refresh_interval: self
                .poller
                .refresh_interval_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.refresh_interval),
        }
    }

    pub fn page_size(&self) -> usize {
        self.pagination.page_size.unwrap_or(DEFAULT_PAGE_SIZE)
    }

    pub fn session(&self) -> Result<&Session> {
        self.session.as_ref().ok_or(DeskError::NoSession)
    }

    pub fn validate_config(&self) -> Result<()> {
        Field::config("api.base_url").url(&self.api.base_url)?;

        if let Some(timeout) = self.api.timeout_seconds {
            Field::config("api.timeout_seconds").at_least(timeout, 1)?;
        }

        match (&self.auth.token, &self.auth.token_url, &self.auth.refresh_token) {
            (Some(token), None, None) => {
                let field = Field::config("auth.token");
                field.not_blank(token)?;
                field.resolved(token)?;
            }
            (None, Some(url), Some(refresh)) => {
                Field::config("auth.token_url").url(url)?;
                let field = Field::config("auth.refresh_token");
                field.not_blank(refresh)?;
                field.resolved(refresh)?;
            }
            (None, None, None) => {
                return Err(DeskError::MissingConfigError {
                    field: "auth.token or auth.token_url + auth.refresh_token".to_string(),
                })
            }
            _ => {
                return Err(DeskError::config(
                    "set either auth.token, or both auth.token_url and auth.refresh_token",
                ))
            }
        }

        if let Some(session) = &self.session {
            Field::config("session.email").email(&session.email)?;
        }

        if let Some(retries) = self.poller.max_retries {
            Field::config("poller.max_retries").between(retries, 0, 10)?;
        }
        if let Some(delay) = self.poller.retry_delay_ms {
            Field::config("poller.retry_delay_ms").at_least(delay, 1)?;
        }
        if let Some(interval) = self.poller.refresh_interval_ms {
            Field::config("poller.refresh_interval_ms").at_least(interval, 100)?;
        }
        if let Some(size) = self.pagination.page_size {
            Field::config("pagination.page_size").at_least(size as u64, 1)?;
        }

        Ok(())
    }
}

impl Validate for DeskConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
