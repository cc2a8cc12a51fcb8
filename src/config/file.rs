//! Config file discovery and validation
//!
//! A probe target plus its suite profiles and environment sections live in a
//! YAML (or JSON) file found in a handful of conventional places.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::profile::SuiteProfile;
use super::TargetConfig;
use crate::models::TestCase;

/// Search order for the config file
const CONFIG_LOCATIONS: &[&str] = &[
    "./market-probe.yaml",
    "./market-probe.yml",
    "./.market-probe.yaml",
    "./.market-probe/config.yaml",
    "~/.config/market-probe/config.yaml",
    "~/.market-probe.yaml",
];

/// Everything a config file can carry
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConfigFile {
    /// Config format version
    #[serde(default = "default_version")]
    pub version: String,

    /// Default probe target
    #[serde(default)]
    pub target: TargetConfig,

    /// Suite profiles
    #[serde(default)]
    pub suite_profiles: Vec<SuiteProfile>,

    /// Environment-specific overrides
    #[serde(default)]
    pub environments: Vec<EnvironmentConfig>,
}

fn default_version() -> String {
    "1.0".to_string()
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            version: default_version(),
            target: TargetConfig::default(),
            suite_profiles: Vec::new(),
            environments: Vec::new(),
        }
    }
}

impl ConfigFile {
    /// Create a new config file with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// First existing file from the search list
    pub fn find() -> Option<PathBuf> {
        CONFIG_LOCATIONS
            .iter()
            .map(|location| expand_path(location))
            .find(|path| path.exists())
    }

    /// Load the discovered file, or defaults when there is none
    pub fn load_default() -> Result<Self> {
        match Self::find() {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load and validate one file, format chosen by extension
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read config {}", path.display()))?;

        let config: Self = if is_yaml_file(path) {
            serde_yaml::from_str(&content)
                .with_context(|| format!("bad YAML in {}", path.display()))?
        } else {
            serde_json::from_str(&content)
                .with_context(|| format!("bad JSON in {}", path.display()))?
        };

        config.validate()?;
        Ok(config)
    }

    /// Write the file, creating parent directories as needed
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = if is_yaml_file(path) {
            serde_yaml::to_string(self).context("config does not serialize to YAML")?
        } else {
            serde_json::to_string_pretty(self).context("config does not serialize to JSON")?
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("cannot create {}", parent.display()))?;
        }

        std::fs::write(path, content)
            .with_context(|| format!("cannot write config {}", path.display()))?;

        Ok(())
    }

    /// Reject unknown versions, unknown check numbers, and bare-host URLs
    pub fn validate(&self) -> Result<()> {
        if !["1.0", "1.1"].contains(&self.version.as_str()) {
            anyhow::bail!("Unsupported config version: {}", self.version);
        }

        let max = TestCase::all().len() as u32;
        for profile in &self.suite_profiles {
            for test_num in &profile.tests {
                let known = u8::try_from(*test_num)
                    .ok()
                    .and_then(TestCase::from_number)
                    .is_some();
                if !known {
                    anyhow::bail!(
                        "Invalid check number {} in profile '{}'. Valid range: 1-{}",
                        test_num,
                        profile.name,
                        max
                    );
                }
            }
        }

        if !self.target.base_url.starts_with("http://")
            && !self.target.base_url.starts_with("https://")
        {
            anyhow::bail!("target.base_url must start with http:// or https://");
        }

        Ok(())
    }

    /// Starter file written by `config init`
    pub fn example() -> Self {
        Self {
            version: "1.0".to_string(),
            target: TargetConfig {
                base_url: "https://shop.example.com".to_string(),
                email: "tipster@example.com".to_string(),
                password: "changeme".to_string(),
                bot_token: Some("123456:bot-token-here".to_string()),
                bot_username: Some("marketplace_bot".to_string()),
                ..Default::default()
            },
            suite_profiles: vec![
                SuiteProfile::smoke(),
                SuiteProfile::products(),
                SuiteProfile::checkout(),
                SuiteProfile::webhook(),
                SuiteProfile::full(),
            ],
            environments: vec![
                EnvironmentConfig::new("development", "http://localhost:3000"),
                EnvironmentConfig::new("staging", "https://staging.example.com"),
            ],
        }
    }

    /// Environment section by name
    pub fn environment(&self, name: &str) -> Option<&EnvironmentConfig> {
        self.environments.iter().find(|e| e.name == name)
    }

    /// Suite profile by name
    pub fn suite_profile(&self, name: &str) -> Option<&SuiteProfile> {
        self.suite_profiles.iter().find(|p| p.name == name)
    }

    /// Resolve the target for an optional environment name
    pub fn target_for(&self, environment: Option<&str>) -> TargetConfig {
        let mut target = self.target.clone();
        if let Some(name) = environment {
            if let Some(env) = self.environment(name) {
                target.base_url = env.base_url.clone();
                if let Some(email) = &env.email {
                    target.email = email.clone();
                }
                if let Some(password) = &env.password {
                    target.password = password.clone();
                }
            }
        }
        target
    }
}

/// One deployment the default target can be retargeted at
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    /// Section name, e.g. "staging"
    pub name: String,
    /// Base URL of this deployment
    pub base_url: String,
    /// Account email override
    #[serde(default)]
    pub email: Option<String>,
    /// Account password override
    #[serde(default)]
    pub password: Option<String>,
}

impl EnvironmentConfig {
    pub fn new(name: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into(),
            email: None,
            password: None,
        }
    }

    /// Give this environment its own login
    pub fn with_account(mut self, email: impl Into<String>, password: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self.password = Some(password.into());
        self
    }
}

/// Expand a leading ~/ against the home directory
fn expand_path(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}

fn is_yaml_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn defaults_carry_current_version() {
        let config = ConfigFile::default();
        assert_eq!(config.version, "1.0");
    }

    #[test]
    fn example_file_validates() {
        let config = ConfigFile::example();
        assert!(!config.suite_profiles.is_empty());
        assert!(!config.environments.is_empty());
        config.validate().unwrap();
    }

    #[test]
    fn yaml_save_load_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.yaml");

        let config = ConfigFile::example();
        config.save(&path).unwrap();

        let loaded = ConfigFile::load(&path).unwrap();
        assert_eq!(loaded.version, config.version);
        assert_eq!(loaded.target.base_url, config.target.base_url);
    }

    #[test]
    fn environment_section_overrides_target() {
        let mut config = ConfigFile::example();
        config.environments.push(
            EnvironmentConfig::new("qa", "https://qa.example.com")
                .with_account("qa@example.com", "secret"),
        );

        let target = config.target_for(Some("qa"));
        assert_eq!(target.base_url, "https://qa.example.com");
        assert_eq!(target.email, "qa@example.com");

        let default = config.target_for(None);
        assert_eq!(default.base_url, "https://shop.example.com");
    }

    #[test]
    fn unknown_check_numbers_fail_validation() {
        let mut config = ConfigFile::example();
        config.suite_profiles.push(SuiteProfile {
            name: "invalid".to_string(),
            description: String::new(),
            tests: vec![99],
            rounds: 1,
            tags: Vec::new(),
        });

        assert!(config.validate().is_err());
    }

    #[test]
    fn bare_host_urls_fail_validation() {
        let mut config = ConfigFile::example();
        config.target.base_url = "shop.example.com".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn relative_paths_pass_through_expansion() {
        assert_eq!(expand_path("./probe.yaml"), PathBuf::from("./probe.yaml"));
    }
}
