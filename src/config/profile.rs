//! Named check selections
//!
//! A suite profile bundles a subset of the catalogue under a name, so a
//! config file can define "smoke" or "webhook" runs without listing numbers
//! on the command line.

use serde::{Deserialize, Serialize};

use crate::models::TestCase;

/// A named subset of the check catalogue
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SuiteProfile {
    /// Profile name
    pub name: String,

    /// Human-readable description
    #[serde(default)]
    pub description: String,

    /// Check numbers to run, in catalogue order
    pub tests: Vec<u32>,

    /// Number of rounds
    #[serde(default = "default_profile_rounds")]
    pub rounds: u32,

    /// Tags for filtering
    #[serde(default)]
    pub tags: Vec<String>,
}

fn default_profile_rounds() -> u32 {
    1
}

impl SuiteProfile {
    /// Quick liveness profile: login, list products, gateway selection
    pub fn smoke() -> Self {
        Self {
            name: "smoke".to_string(),
            description: "Login plus the cheapest read-only checks".to_string(),
            tests: vec![1, 2, 9],
            rounds: 1,
            tags: vec!["fast".to_string()],
        }
    }

    /// Product lifecycle profile
    pub fn products() -> Self {
        Self {
            name: "products".to_string(),
            description: "Product CRUD and publication lifecycle".to_string(),
            tests: vec![1, 2, 3, 4, 5, 6, 7, 8],
            rounds: 1,
            tags: vec!["products".to_string()],
        }
    }

    /// Checkout and payment profile
    pub fn checkout() -> Self {
        Self {
            name: "checkout".to_string(),
            description: "Gateway selection, checkout session, simulated payment".to_string(),
            tests: vec![1, 4, 7, 9, 10, 11, 12, 13, 14, 15, 16, 17],
            rounds: 1,
            tags: vec!["checkout".to_string()],
        }
    }

    /// Telegram webhook profile
    pub fn webhook() -> Self {
        Self {
            name: "webhook".to_string(),
            description: "Telegram webhook registration and update handling".to_string(),
            tests: vec![1, 18, 19, 20, 21, 22, 23, 24],
            rounds: 1,
            tags: vec!["telegram".to_string()],
        }
    }

    /// Every check in the catalogue
    pub fn full() -> Self {
        Self {
            name: "full".to_string(),
            description: "The complete catalogue including evidence checks".to_string(),
            tests: TestCase::all().iter().map(|c| c.number() as u32).collect(),
            rounds: 1,
            tags: Vec::new(),
        }
    }

    /// Look up a built-in profile by name
    pub fn builtin(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "smoke" => Some(Self::smoke()),
            "products" => Some(Self::products()),
            "checkout" => Some(Self::checkout()),
            "webhook" => Some(Self::webhook()),
            "full" => Some(Self::full()),
            _ => None,
        }
    }

    /// All built-in profiles
    pub fn builtins() -> Vec<Self> {
        vec![
            Self::smoke(),
            Self::products(),
            Self::checkout(),
            Self::webhook(),
            Self::full(),
        ]
    }

    /// Resolve numbers into test cases, dropping unknown numbers
    pub fn resolve(&self) -> Vec<TestCase> {
        self.tests
            .iter()
            .filter_map(|n| u8::try_from(*n).ok().and_then(TestCase::from_number))
            .collect()
    }

    /// All numbers in this profile are valid catalogue entries
    pub fn is_valid(&self) -> bool {
        self.resolve().len() == self.tests.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_profile_covers_catalogue() {
        let profile = SuiteProfile::full();
        assert_eq!(profile.tests.len(), TestCase::all().len());
        assert!(profile.is_valid());
    }

    #[test]
    fn smoke_resolves_in_order() {
        let cases = SuiteProfile::smoke().resolve();
        assert_eq!(cases.first(), Some(&TestCase::Login));
        assert!(cases.len() == 3);
    }

    #[test]
    fn every_builtin_opens_with_login() {
        // Channel checks need a session, so each builtin earns one first
        for profile in SuiteProfile::builtins() {
            assert_eq!(
                profile.resolve().first(),
                Some(&TestCase::Login),
                "profile {} must start with Login",
                profile.name
            );
        }
    }

    #[test]
    fn unknown_numbers_are_dropped() {
        let profile = SuiteProfile {
            name: "broken".to_string(),
            description: String::new(),
            tests: vec![1, 99],
            rounds: 1,
            tags: Vec::new(),
        };
        assert!(!profile.is_valid());
        assert_eq!(profile.resolve().len(), 1);
    }
}
