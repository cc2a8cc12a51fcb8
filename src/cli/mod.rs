//! CLI argument parsing
//!
//! Defines command-line interface using clap.

use clap::{Parser, Subcommand};

/// Marketplace deployment probe
#[derive(Parser, Debug)]
#[command(name = "market-probe")]
#[command(version)]
#[command(about = "Run live checks against a deployed tipster marketplace")]
#[command(long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run checks against a deployment
    Test(TestArgs),

    /// List the check catalogue
    List(ListArgs),

    /// View stored probe results
    Results(ResultsArgs),

    /// Manage configuration
    Config(ConfigArgs),
}

/// Arguments for test command
#[derive(Parser, Debug)]
pub struct TestArgs {
    /// Deployment base URL (https://shop.example.com)
    #[arg(short, long)]
    pub base_url: Option<String>,

    /// Tipster account email
    #[arg(short, long)]
    pub email: Option<String>,

    /// Tipster account password
    #[arg(short, long)]
    pub password: Option<String>,

    /// Telegram bot token for webhook registration checks
    #[arg(long)]
    pub bot_token: Option<String>,

    /// Bot username shown in deep links
    #[arg(long)]
    pub bot_username: Option<String>,

    /// Specific check number to run (1-28)
    #[arg(short, long)]
    pub check: Option<u8>,

    /// Known product id to fall back on for the public checkout checks
    #[arg(long)]
    pub product_id: Option<String>,

    /// Existing order id for the payment checks
    #[arg(long)]
    pub order_id: Option<String>,

    /// Named suite profile (smoke, products, checkout, webhook, full)
    #[arg(short, long)]
    pub suite: Option<String>,

    /// Number of probe rounds
    #[arg(short, long, default_value = "1")]
    pub rounds: u32,

    /// Output format (table, json, json-pretty, csv, summary)
    #[arg(short, long, default_value = "table")]
    pub format: String,

    /// HTTP timeout in seconds
    #[arg(long, default_value = "30")]
    pub timeout: u64,

    /// Skip specific checks (comma-separated numbers)
    #[arg(long)]
    pub skip: Option<String>,

    /// Named environment from the config file
    #[arg(long)]
    pub environment: Option<String>,

    /// Configuration file path
    #[arg(long)]
    pub config: Option<String>,

    /// Save formatted results to file
    #[arg(short, long)]
    pub output: Option<String>,

    /// Persist the run to results storage
    #[arg(long)]
    pub store: bool,
}

/// Arguments for list command
#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Show detailed check information
    #[arg(short, long)]
    pub detailed: bool,

    /// Show only the suite profiles
    #[arg(short, long)]
    pub suites: bool,
}

/// Arguments for results command
#[derive(Parser, Debug)]
pub struct ResultsArgs {
    /// Filter by target host
    #[arg(short, long)]
    pub target: Option<String>,

    /// Output format
    #[arg(short, long, default_value = "table")]
    pub format: String,

    /// Export latest run to file (.json or .csv)
    #[arg(short, long)]
    pub export: Option<String>,
}

/// Arguments for config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Write an example configuration file
    Init {
        /// Output path
        #[arg(short, long, default_value = "./market-probe.yaml")]
        output: String,

        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Show the active configuration
    Show {
        /// Show environment variable overrides instead
        #[arg(long)]
        env: bool,

        /// Output format (yaml, json)
        #[arg(short, long, default_value = "yaml")]
        format: String,
    },

    /// Validate a configuration file
    Validate {
        /// File to validate (defaults to the discovered config)
        file: Option<String>,
    },

    /// Set a target value in the config file
    Set {
        /// Key to set (base-url, email, password, bot-token, timeout, rounds)
        key: String,

        /// New value
        value: String,
    },

    /// Print a single target value from the config file
    Get {
        /// Key to read (base-url, email, bot-token, timeout, rounds)
        key: String,
    },

    /// Print environment variable help
    Env,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_parsing() {
        let args = Args::parse_from(["market-probe", "list", "--detailed"]);
        match args.command {
            Command::List(list_args) => {
                assert!(list_args.detailed);
            }
            _ => panic!("Expected List command"),
        }
    }

    #[test]
    fn test_test_args() {
        let args = Args::parse_from([
            "market-probe",
            "test",
            "--base-url",
            "https://shop.example.com",
            "--rounds",
            "3",
            "--suite",
            "webhook",
        ]);
        match args.command {
            Command::Test(test_args) => {
                assert_eq!(test_args.base_url.as_deref(), Some("https://shop.example.com"));
                assert_eq!(test_args.rounds, 3);
                assert_eq!(test_args.suite.as_deref(), Some("webhook"));
            }
            _ => panic!("Expected Test command"),
        }
    }

    #[test]
    fn short_c_selects_a_check_alongside_config() {
        let args = Args::parse_from([
            "market-probe",
            "test",
            "-c",
            "5",
            "--config",
            "./probe.yaml",
        ]);
        match args.command {
            Command::Test(test_args) => {
                assert_eq!(test_args.check, Some(5));
                assert_eq!(test_args.config.as_deref(), Some("./probe.yaml"));
            }
            _ => panic!("Expected Test command"),
        }
    }

    #[test]
    fn test_config_init_defaults() {
        let args = Args::parse_from(["market-probe", "config", "init"]);
        match args.command {
            Command::Config(config_args) => match config_args.action {
                ConfigAction::Init { output, force } => {
                    assert_eq!(output, "./market-probe.yaml");
                    assert!(!force);
                }
                _ => panic!("Expected Init action"),
            },
            _ => panic!("Expected Config command"),
        }
    }
}
