//! Configuration module
//!
//! Handles loading and managing configuration.

#![allow(dead_code)]

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub mod env;
pub mod file;
pub mod profile;

pub use env::{EnvBuilder, EnvConfig, EnvGuard};
pub use file::{ConfigFile, EnvironmentConfig};
pub use profile::SuiteProfile;

/// Probe target: one deployed marketplace instance
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Deployment base URL, e.g. https://shop.example.com
    pub base_url: String,

    /// Tipster account email for authenticated checks
    pub email: String,

    /// Tipster account password
    pub password: String,

    /// Telegram bot token, needed for webhook registration checks
    #[serde(default)]
    pub bot_token: Option<String>,

    /// Bot username shown in deep links
    #[serde(default)]
    pub bot_username: Option<String>,

    /// HTTP timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Default number of probe rounds
    #[serde(default = "default_rounds")]
    pub default_rounds: u32,

    /// Side-effect evidence settings (database, logs)
    #[serde(default)]
    pub evidence: EvidenceConfig,
}

fn default_timeout() -> u64 {
    30
}

fn default_rounds() -> u32 {
    1
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            email: "tipster@example.com".to_string(),
            password: "changeme".to_string(),
            bot_token: None,
            bot_username: None,
            timeout_secs: default_timeout(),
            default_rounds: default_rounds(),
            evidence: EvidenceConfig::default(),
        }
    }
}

impl TargetConfig {
    /// API root: base URL with the /api prefix
    pub fn api_base(&self) -> String {
        format!("{}/api", self.base_url.trim_end_matches('/'))
    }

    /// Webhook URL the bot must be registered against
    pub fn webhook_url(&self) -> String {
        format!("{}/telegram/webhook", self.api_base())
    }

    /// Host portion of the base URL, used to key stored runs
    pub fn host(&self) -> String {
        self.base_url
            .trim_start_matches("https://")
            .trim_start_matches("http://")
            .trim_end_matches('/')
            .split('/')
            .next()
            .unwrap_or("unknown")
            .to_string()
    }

    /// Load configuration from file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content =
            std::fs::read_to_string(path.as_ref()).context("Failed to read config file")?;

        let config: Self = if path
            .as_ref()
            .extension()
            .map(|e| e == "yaml" || e == "yml")
            .unwrap_or(false)
        {
            serde_yaml::from_str(&content).context("Failed to parse YAML config")?
        } else {
            serde_json::from_str(&content).context("Failed to parse JSON config")?
        };

        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = if path
            .as_ref()
            .extension()
            .map(|e| e == "yaml" || e == "yml")
            .unwrap_or(false)
        {
            serde_yaml::to_string(self).context("Failed to serialize config")?
        } else {
            serde_json::to_string_pretty(self).context("Failed to serialize config")?
        };

        std::fs::write(path, content).context("Failed to write config file")?;
        Ok(())
    }

    /// Apply environment variable overrides
    pub fn apply_env(&mut self, env: &EnvConfig) {
        if let Some(url) = &env.base_url {
            self.base_url = url.clone();
        }
        if let Some(email) = &env.email {
            self.email = email.clone();
        }
        if let Some(password) = &env.password {
            self.password = password.clone();
        }
        if let Some(token) = &env.bot_token {
            self.bot_token = Some(token.clone());
        }
        if let Some(timeout) = env.timeout {
            self.timeout_secs = timeout;
        }
        if let Some(rounds) = env.rounds {
            self.default_rounds = rounds;
        }
        if let Some(db) = &env.mongo_db {
            self.evidence.mongo_db = db.clone();
        }
        if let Some(log) = &env.backend_log {
            self.evidence.backend_log = log.clone();
        }
    }
}

/// Where to look for side effects the API alone cannot prove
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EvidenceConfig {
    /// Mongo shell binary
    pub mongo_bin: String,

    /// Database name holding the orders collection
    pub mongo_db: String,

    /// Backend process log file
    pub backend_log: String,

    /// How many trailing log lines to scan
    pub log_lines: usize,

    /// Timeout for mongo shell calls in seconds
    pub mongo_timeout_secs: u64,

    /// Timeout for log reads in seconds
    pub log_timeout_secs: u64,
}

impl Default for EvidenceConfig {
    fn default() -> Self {
        Self {
            mongo_bin: "mongosh".to_string(),
            mongo_db: "marketplace".to_string(),
            backend_log: "/var/log/supervisor/backend.out.log".to_string(),
            log_lines: 200,
            mongo_timeout_secs: 30,
            log_timeout_secs: 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TargetConfig::default();
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.default_rounds, 1);
        assert_eq!(config.evidence.mongo_timeout_secs, 30);
        assert_eq!(config.evidence.log_timeout_secs, 10);
    }

    #[test]
    fn test_api_base_strips_trailing_slash() {
        let config = TargetConfig {
            base_url: "https://shop.example.com/".to_string(),
            ..Default::default()
        };
        assert_eq!(config.api_base(), "https://shop.example.com/api");
        assert_eq!(
            config.webhook_url(),
            "https://shop.example.com/api/telegram/webhook"
        );
    }

    #[test]
    fn test_host_extraction() {
        let config = TargetConfig {
            base_url: "https://shop.example.com".to_string(),
            ..Default::default()
        };
        assert_eq!(config.host(), "shop.example.com");

        let local = TargetConfig::default();
        assert_eq!(local.host(), "localhost:3000");
    }

    #[test]
    fn test_apply_env_overrides() {
        let mut config = TargetConfig::default();
        let env = EnvConfig {
            base_url: Some("https://staging.example.com".to_string()),
            timeout: Some(60),
            mongo_db: Some("marketplace_staging".to_string()),
            ..Default::default()
        };

        config.apply_env(&env);
        assert_eq!(config.base_url, "https://staging.example.com");
        assert_eq!(config.timeout_secs, 60);
        assert_eq!(config.evidence.mongo_db, "marketplace_staging");
    }
}
