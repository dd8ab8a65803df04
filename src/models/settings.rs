//! Settings Models
//!
//! Application configuration and settings data structures.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use aspirepath_client::ClientConfig;

use crate::services::analysis::RetryPolicy;

/// Environment variable overriding `api_base_url`.
pub const API_URL_ENV: &str = "ASPIREPATH_API_URL";

/// Application configuration stored in config.json
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Analysis backend base URL
    pub api_base_url: String,
    /// Default timeout for backend calls, in seconds
    pub request_timeout_secs: u64,
    /// Timeout for analysis calls, in seconds
    pub analysis_timeout_secs: u64,
    /// Timeout for each review lookup, in seconds (8-30)
    pub review_timeout_secs: u64,
    /// Retries after the first failed analysis attempt (0-5)
    pub max_retries: u32,
    /// First backoff delay, in milliseconds
    pub retry_initial_delay_ms: u64,
    /// Backoff delay cap, in milliseconds
    pub retry_max_delay_ms: u64,
    /// Keep and resend backend cookies
    pub send_credentials: bool,
    /// Default log level: "trace", "debug", "info", "warn" or "error"
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8000".to_string(),
            request_timeout_secs: 120,
            analysis_timeout_secs: 180,
            review_timeout_secs: 15,
            max_retries: 3,
            retry_initial_delay_ms: 1_000,
            retry_max_delay_ms: 8_000,
            send_credentials: true,
            log_level: "info".to_string(),
        }
    }
}

/// Settings update request (partial update)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SettingsUpdate {
    pub api_base_url: Option<String>,
    pub request_timeout_secs: Option<u64>,
    pub analysis_timeout_secs: Option<u64>,
    pub review_timeout_secs: Option<u64>,
    pub max_retries: Option<u32>,
    pub retry_initial_delay_ms: Option<u64>,
    pub retry_max_delay_ms: Option<u64>,
    pub send_credentials: Option<bool>,
    pub log_level: Option<String>,
}

impl SettingsUpdate {
    /// Overrides taken from the process environment.
    pub fn from_env() -> Self {
        Self {
            api_base_url: std::env::var(API_URL_ENV)
                .ok()
                .filter(|v| !v.trim().is_empty()),
            ..Default::default()
        }
    }
}

impl AppConfig {
    /// Apply a partial update to the configuration
    pub fn apply_update(&mut self, update: SettingsUpdate) {
        if let Some(url) = update.api_base_url {
            self.api_base_url = url;
        }
        if let Some(secs) = update.request_timeout_secs {
            self.request_timeout_secs = secs;
        }
        if let Some(secs) = update.analysis_timeout_secs {
            self.analysis_timeout_secs = secs;
        }
        if let Some(secs) = update.review_timeout_secs {
            self.review_timeout_secs = secs;
        }
        if let Some(retries) = update.max_retries {
            self.max_retries = retries;
        }
        if let Some(ms) = update.retry_initial_delay_ms {
            self.retry_initial_delay_ms = ms;
        }
        if let Some(ms) = update.retry_max_delay_ms {
            self.retry_max_delay_ms = ms;
        }
        if let Some(send) = update.send_credentials {
            self.send_credentials = send;
        }
        if let Some(level) = update.log_level {
            self.log_level = level;
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        match url::Url::parse(&self.api_base_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            _ => {
                return Err(format!(
                    "Invalid api_base_url: {}. Must be an http(s) URL",
                    self.api_base_url
                ))
            }
        }

        if self.request_timeout_secs == 0 || self.analysis_timeout_secs == 0 {
            return Err("timeouts must be at least 1 second".to_string());
        }

        if !(8..=30).contains(&self.review_timeout_secs) {
            return Err(format!(
                "review_timeout_secs must be between 8 and 30 (got {})",
                self.review_timeout_secs
            ));
        }

        if self.max_retries > 5 {
            return Err("max_retries cannot exceed 5".to_string());
        }

        if self.retry_initial_delay_ms == 0 {
            return Err("retry_initial_delay_ms must be at least 1".to_string());
        }

        if self.retry_max_delay_ms < self.retry_initial_delay_ms {
            return Err("retry_max_delay_ms must not be below retry_initial_delay_ms".to_string());
        }

        if !["trace", "debug", "info", "warn", "error"].contains(&self.log_level.as_str()) {
            return Err(format!("Invalid log_level: {}", self.log_level));
        }

        Ok(())
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.api_base_url.clone(),
            timeout: Duration::from_secs(self.request_timeout_secs),
            send_credentials: self.send_credentials,
            ..Default::default()
        }
    }

    pub fn analysis_timeout(&self) -> Duration {
        Duration::from_secs(self.analysis_timeout_secs)
    }

    pub fn review_timeout(&self) -> Duration {
        Duration::from_secs(self.review_timeout_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            initial_delay: Duration::from_millis(self.retry_initial_delay_ms),
            max_delay: Duration::from_millis(self.retry_max_delay_ms),
        }
    }
}
