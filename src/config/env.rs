//! MARKET_PROBE_* environment overrides
//!
//! Every setting a CI job would want to inject without touching the config
//! file is readable from the environment. Values here sit between the config
//! file and the command-line flags in precedence.

use std::env;

const ENV_PREFIX: &str = "MARKET_PROBE";

/// Overrides picked up from the process environment
#[derive(Clone, Debug, Default)]
pub struct EnvConfig {
    /// MARKET_PROBE_BASE_URL
    pub base_url: Option<String>,
    /// MARKET_PROBE_EMAIL
    pub email: Option<String>,
    /// MARKET_PROBE_PASSWORD
    pub password: Option<String>,
    /// MARKET_PROBE_BOT_TOKEN
    pub bot_token: Option<String>,
    /// MARKET_PROBE_TIMEOUT (seconds)
    pub timeout: Option<u64>,
    /// MARKET_PROBE_ROUNDS
    pub rounds: Option<u32>,
    /// MARKET_PROBE_CONFIG (config file path)
    pub config_file: Option<String>,
    /// MARKET_PROBE_ENV (environment section name)
    pub environment: Option<String>,
    /// MARKET_PROBE_VERBOSE
    pub verbose: Option<bool>,
    /// MARKET_PROBE_FORMAT
    pub format: Option<String>,
    /// MARKET_PROBE_MONGO_DB (evidence checks)
    pub mongo_db: Option<String>,
    /// MARKET_PROBE_BACKEND_LOG (evidence checks)
    pub backend_log: Option<String>,
}

impl EnvConfig {
    /// Read every override currently set in the environment
    pub fn load() -> Self {
        Self {
            base_url: probe_var("BASE_URL"),
            email: probe_var("EMAIL"),
            password: probe_var("PASSWORD"),
            bot_token: probe_var("BOT_TOKEN"),
            timeout: probe_var("TIMEOUT").and_then(|v| v.parse().ok()),
            rounds: probe_var("ROUNDS").and_then(|v| v.parse().ok()),
            config_file: probe_var("CONFIG"),
            environment: probe_var("ENV"),
            verbose: probe_var("VERBOSE").map(|v| truthy(&v)),
            format: probe_var("FORMAT"),
            mongo_db: probe_var("MONGO_DB"),
            backend_log: probe_var("BACKEND_LOG"),
        }
    }

    /// At least one override is present
    pub fn has_any(&self) -> bool {
        [
            self.base_url.is_some(),
            self.email.is_some(),
            self.password.is_some(),
            self.bot_token.is_some(),
            self.timeout.is_some(),
            self.rounds.is_some(),
            self.config_file.is_some(),
            self.environment.is_some(),
            self.verbose.is_some(),
            self.format.is_some(),
            self.mongo_db.is_some(),
            self.backend_log.is_some(),
        ]
        .into_iter()
        .any(|set| set)
    }

    pub fn base_url_or(&self, default: &str) -> String {
        self.base_url.clone().unwrap_or_else(|| default.to_string())
    }

    pub fn timeout_or(&self, default: u64) -> u64 {
        self.timeout.unwrap_or(default)
    }

    pub fn rounds_or(&self, default: u32) -> u32 {
        self.rounds.unwrap_or(default)
    }

    /// Dump the active overrides, masking credentials
    pub fn print_summary(&self) {
        let secret = |set: bool| if set { "<set>" } else { "<unset>" };

        println!("Active {ENV_PREFIX}_* overrides:");
        println!("  BASE_URL:    {:?}", self.base_url);
        println!("  EMAIL:       {:?}", self.email);
        println!("  PASSWORD:    {}", secret(self.password.is_some()));
        println!("  BOT_TOKEN:   {}", secret(self.bot_token.is_some()));
        println!("  TIMEOUT:     {:?}", self.timeout);
        println!("  ROUNDS:      {:?}", self.rounds);
        println!("  CONFIG:      {:?}", self.config_file);
        println!("  ENV:         {:?}", self.environment);
        println!("  MONGO_DB:    {:?}", self.mongo_db);
        println!("  BACKEND_LOG: {:?}", self.backend_log);
    }
}

fn probe_var(name: &str) -> Option<String> {
    env::var(format!("{ENV_PREFIX}_{name}")).ok()
}

fn truthy(v: &str) -> bool {
    matches!(
        v.to_lowercase().as_str(),
        "1" | "true" | "yes" | "on" | "enabled"
    )
}

/// Sets MARKET_PROBE_* variables, scoped or not. Test helper first, but also
/// what `config show --env` examples are built from.
#[derive(Default)]
pub struct EnvBuilder {
    pending: Vec<(String, String)>,
}

impl EnvBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(mut self, name: &str, value: impl Into<String>) -> Self {
        self.pending.push((format!("{ENV_PREFIX}_{name}"), value.into()));
        self
    }

    pub fn base_url(self, url: impl Into<String>) -> Self {
        self.push("BASE_URL", url)
    }

    pub fn email(self, email: impl Into<String>) -> Self {
        self.push("EMAIL", email)
    }

    pub fn password(self, password: impl Into<String>) -> Self {
        self.push("PASSWORD", password)
    }

    pub fn bot_token(self, token: impl Into<String>) -> Self {
        self.push("BOT_TOKEN", token)
    }

    pub fn timeout(self, timeout: u64) -> Self {
        self.push("TIMEOUT", timeout.to_string())
    }

    pub fn rounds(self, rounds: u32) -> Self {
        self.push("ROUNDS", rounds.to_string())
    }

    pub fn verbose(self, verbose: bool) -> Self {
        self.push("VERBOSE", verbose.to_string())
    }

    pub fn environment(self, name: impl Into<String>) -> Self {
        self.push("ENV", name)
    }

    /// Write the variables into the process environment
    pub fn apply(self) {
        for (key, value) in self.pending {
            env::set_var(key, value);
        }
    }

    /// Write the variables, remembering what they replaced
    pub fn apply_scoped(self) -> EnvGuard {
        let saved = self
            .pending
            .iter()
            .map(|(key, _)| (key.clone(), env::var(key).ok()))
            .collect();

        self.apply();
        EnvGuard { saved }
    }
}

/// Restores replaced variables on drop
pub struct EnvGuard {
    saved: Vec<(String, Option<String>)>,
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, value) in &self.saved {
            match value {
                Some(v) => env::set_var(key, v),
                None => env::remove_var(key),
            }
        }
    }
}

/// Help text for `config env`
pub fn print_env_help() {
    println!("Environment variables (all optional):");
    println!();
    println!("  {ENV_PREFIX}_BASE_URL     Deployment base URL (https://...)");
    println!("  {ENV_PREFIX}_EMAIL        Tipster account email");
    println!("  {ENV_PREFIX}_PASSWORD     Tipster account password");
    println!("  {ENV_PREFIX}_BOT_TOKEN    Telegram bot token");
    println!("  {ENV_PREFIX}_TIMEOUT      Request timeout in seconds");
    println!("  {ENV_PREFIX}_ROUNDS       Number of probe rounds");
    println!("  {ENV_PREFIX}_CONFIG       Path to configuration file");
    println!("  {ENV_PREFIX}_ENV          Environment section name (dev, staging)");
    println!("  {ENV_PREFIX}_VERBOSE      Enable verbose output (true/false)");
    println!("  {ENV_PREFIX}_FORMAT       Output format (table, json, csv)");
    println!("  {ENV_PREFIX}_MONGO_DB     Mongo database name for evidence checks");
    println!("  {ENV_PREFIX}_BACKEND_LOG  Backend log file for evidence checks");
    println!();
    println!("Example:");
    println!("  export {ENV_PREFIX}_BASE_URL=https://shop.example.com");
    println!("  export {ENV_PREFIX}_EMAIL=tipster@example.com");
    println!("  market-probe test");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_carry_no_overrides() {
        let config = EnvConfig::default();
        assert!(!config.has_any());
        assert_eq!(config.base_url_or("http://localhost:3000"), "http://localhost:3000");
        assert_eq!(config.timeout_or(30), 30);
        assert_eq!(config.rounds_or(1), 1);
    }

    #[test]
    fn builder_round_trips_through_load() {
        let _guard = EnvBuilder::new()
            .base_url("https://staging.example.com")
            .email("probe@example.com")
            .timeout(60)
            .verbose(true)
            .apply_scoped();

        let config = EnvConfig::load();
        assert_eq!(config.base_url.as_deref(), Some("https://staging.example.com"));
        assert_eq!(config.email.as_deref(), Some("probe@example.com"));
        assert_eq!(config.timeout, Some(60));
        assert_eq!(config.verbose, Some(true));
        assert!(config.has_any());
    }

    #[test]
    fn truthy_accepts_the_usual_spellings() {
        assert!(truthy("1"));
        assert!(truthy("YES"));
        assert!(truthy("on"));
        assert!(!truthy("0"));
        assert!(!truthy("off"));
    }

    #[test]
    fn any_single_override_counts() {
        let with_log = EnvConfig {
            backend_log: Some("/var/log/app.log".to_string()),
            ..Default::default()
        };
        assert!(with_log.has_any());
    }
}
