//! market-probe: live checks for a deployed tipster marketplace
//!
//! Probes a running deployment end to end: tipster login, product
//! lifecycle, checkout and simulated payment, Telegram webhook handling,
//! and the database and log side effects those flows leave behind.

mod cli;
mod config;
mod executor;
mod http;
mod models;
mod oob;
mod output;
mod results;
mod suites;
mod utils;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::Path;
use tracing::{info, warn};

use cli::{Args, Command, ConfigAction, ConfigArgs, ListArgs, ResultsArgs, TestArgs};
use config::{ConfigFile, EnvConfig, SuiteProfile, TargetConfig};
use executor::ProbeRunner;
use models::{TestCase, TestRoundSummary, TestStatus};
use output::{formatter::write_results_to_file, OutputFormat, ResultFormatter};
use results::{ExportFormat, ResultsStorage, StoredProbeRun};
use utils::{init_logger, LogLevel};

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let env = EnvConfig::load();
    let verbose = args.verbose || env.verbose.unwrap_or(false);
    init_logger(if verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    });

    let outcome = match args.command {
        Command::Test(test_args) => run_tests(test_args, &env).await,
        Command::List(list_args) => {
            list_tests(&list_args);
            Ok(0)
        }
        Command::Results(results_args) => show_results(&results_args).map(|_| 0),
        Command::Config(config_args) => manage_config(&config_args).map(|_| 0),
    };

    match outcome {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {e:#}");
            std::process::exit(2);
        }
    }
}

/// Resolve the effective target from config file, environment, and flags
fn resolve_target(args: &TestArgs, env: &EnvConfig) -> Result<(TargetConfig, ConfigFile)> {
    let config_path = args.config.clone().or_else(|| env.config_file.clone());
    let config = match &config_path {
        Some(path) => ConfigFile::load(path)?,
        None => ConfigFile::load_default()?,
    };

    let environment = args
        .environment
        .as_deref()
        .or(env.environment.as_deref())
        .map(str::to_string);
    if let Some(name) = &environment {
        if config.environment(name).is_none() {
            anyhow::bail!("Unknown environment '{name}' in config file");
        }
    }

    let mut target = config.target_for(environment.as_deref());
    target.apply_env(env);

    // Command-line flags win over everything
    if let Some(url) = &args.base_url {
        target.base_url = url.clone();
    }
    if let Some(email) = &args.email {
        target.email = email.clone();
    }
    if let Some(password) = &args.password {
        target.password = password.clone();
    }
    if let Some(token) = &args.bot_token {
        target.bot_token = Some(token.clone());
    }
    if let Some(username) = &args.bot_username {
        target.bot_username = Some(username.clone());
    }
    if args.timeout != 30 {
        target.timeout_secs = args.timeout;
    }

    if !target.base_url.starts_with("http://") && !target.base_url.starts_with("https://") {
        anyhow::bail!("Base URL must start with http:// or https://");
    }

    Ok((target, config))
}

fn parse_skips(skip: &Option<String>) -> Result<Vec<u8>> {
    let Some(raw) = skip else {
        return Ok(Vec::new());
    };

    let mut skips = Vec::new();
    for part in raw.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let num: u8 = part
            .parse()
            .with_context(|| format!("Invalid check number in --skip: '{part}'"))?;
        if TestCase::from_number(num).is_none() {
            anyhow::bail!("Unknown check number in --skip: {num}");
        }
        skips.push(num);
    }
    Ok(skips)
}

/// Run checks and report. Returns the process exit code.
async fn run_tests(args: TestArgs, env: &EnvConfig) -> Result<i32> {
    let (target, config) = resolve_target(&args, env)?;

    let format_name = env.format.clone().unwrap_or_else(|| args.format.clone());
    let format = OutputFormat::from_str(&format_name)
        .with_context(|| format!("Unknown output format: {format_name}"))?;
    let formatter = ResultFormatter::new(format);

    info!("Probing {}", target.host());

    let skips = parse_skips(&args.skip)?;
    let runner = ProbeRunner::new(target.clone())
        .with_skips(skips)
        .with_seeds(args.product_id.clone(), args.order_id.clone());

    // Single check: no round bookkeeping, just the one result
    if let Some(check_num) = args.check {
        let test_case = TestCase::from_number(check_num)
            .with_context(|| format!("Invalid check number: {check_num}"))?;
        let result = runner.run_single(test_case).await?;
        println!("{}", formatter.format_result(&result));

        return Ok(match result.status {
            TestStatus::Pass | TestStatus::Skip => 0,
            _ => 1,
        });
    }

    let profile = match &args.suite {
        Some(name) => {
            let profile = config
                .suite_profile(name)
                .cloned()
                .or_else(|| SuiteProfile::builtin(name))
                .with_context(|| format!("Unknown suite profile: {name}"))?;
            if !profile.is_valid() {
                anyhow::bail!("Profile '{}' references unknown check numbers", profile.name);
            }
            Some(profile)
        }
        None => None,
    };

    let rounds = if args.rounds > 1 {
        args.rounds
    } else {
        env.rounds.unwrap_or(args.rounds)
    };

    let summaries: Vec<TestRoundSummary> = if let Some(profile) = &profile {
        let cases = profile.resolve();
        info!("Suite '{}': {} checks", profile.name, cases.len());
        vec![runner.run_tests(&cases).await?]
    } else if rounds > 1 {
        runner.run_rounds(rounds).await?
    } else {
        vec![runner.run_all().await?]
    };

    if summaries.len() > 1 {
        println!("{}", formatter.format_rounds(&summaries));
    } else if let Some(summary) = summaries.first() {
        println!("{}", formatter.format_summary(summary));
    }

    if let Some(output_path) = &args.output {
        if let Some(summary) = summaries.last() {
            write_results_to_file(output_path, summary, format)?;
            println!("Results written to {output_path}");
        }
    }

    if args.store {
        match ResultsStorage::default_dir() {
            Ok(storage) => {
                let mut run = StoredProbeRun::new(&target.host(), &target.base_url);
                for summary in &summaries {
                    run.add_round(summary);
                }
                run.calculate_aggregate();
                let path = storage.save(&run)?;
                println!("Run {} stored at {}", run.id, path.display());
            }
            Err(e) => warn!("Could not open results storage: {e:#}"),
        }
    }

    let green = summaries.iter().all(TestRoundSummary::is_green);
    Ok(if green { 0 } else { 1 })
}

/// List the check catalogue
fn list_tests(args: &ListArgs) {
    if args.suites {
        println!("\nSuite Profiles:");
        for profile in SuiteProfile::builtins() {
            println!(
                "  {:10} {:3} checks - {}",
                profile.name,
                profile.tests.len(),
                profile.description
            );
        }
        println!();
        return;
    }

    println!("\nCheck Catalogue:");
    println!("═══════════════════════════════════════════════════════");

    let mut last_category = "";
    for test_case in TestCase::all() {
        let category = test_case.category();
        if category != last_category {
            println!("\n  [{category}]");
            last_category = category;
        }

        if args.detailed {
            println!("  {:2}. {:20} {}", test_case.number(), test_case.name(), test_case.description());
            if test_case.requires_auth() {
                println!("      requires: session token");
            }
        } else {
            println!("  {:2}. {}", test_case.number(), test_case.name());
        }
    }

    println!("\nSuite Profiles:");
    for profile in SuiteProfile::builtins() {
        println!(
            "  {:10} {:3} checks - {}",
            profile.name,
            profile.tests.len(),
            profile.description
        );
    }
    println!();
}

/// Show stored probe results
fn show_results(args: &ResultsArgs) -> Result<()> {
    let storage = ResultsStorage::default_dir()?;

    let Some(target) = &args.target else {
        let targets = storage.list_targets()?;
        if targets.is_empty() {
            println!("No stored results. Run with --store to persist a probe run.");
            return Ok(());
        }

        println!("\nTargets with stored results:");
        for target in targets {
            let runs = storage.list_runs(&target)?;
            println!("  {:40} {} runs", target, runs.len());
        }
        println!("\nUse --target <host> to list runs for a target.");
        return Ok(());
    };

    let runs = storage.list_runs(target)?;
    if runs.is_empty() {
        println!("No stored runs for {target}");
        return Ok(());
    }

    println!("\nRuns for {target} (newest first):");
    for run in &runs {
        println!(
            "  {}  {} round(s)  pass rate {:.1}%  {}",
            run.id,
            run.rounds,
            run.pass_rate * 100.0,
            run.started_at.format("%Y-%m-%d %H:%M:%S UTC")
        );
    }

    if let Some(export_path) = &args.export {
        let latest = storage
            .latest(target)?
            .context("No run available to export")?;
        let path = Path::new(export_path);
        let format = ExportFormat::from_extension(path)
            .or_else(|| ExportFormat::from_str(&args.format))
            .context("Cannot determine export format; use a .json or .csv path")?;
        storage.export(&latest, path, format)?;
        println!("Exported run {} to {export_path}", latest.id);
    }

    Ok(())
}

/// Manage configuration files
fn manage_config(args: &ConfigArgs) -> Result<()> {
    match &args.action {
        ConfigAction::Init { output, force } => {
            let path = Path::new(output);
            if path.exists() && !force {
                anyhow::bail!("{output} already exists. Use --force to overwrite.");
            }

            let config = ConfigFile::example();
            config.save(path)?;
            println!("Wrote example configuration to {output}");
            println!("Edit the target credentials before running checks.");
        }

        ConfigAction::Show { env, format } => {
            if *env {
                let env_config = EnvConfig::load();
                if env_config.has_any() {
                    env_config.print_summary();
                } else {
                    println!("No MARKET_PROBE_* environment variables set.");
                }
                return Ok(());
            }

            let config = ConfigFile::load_default()?;
            let rendered = match format.as_str() {
                "json" => serde_json::to_string_pretty(&config)?,
                _ => serde_yaml::to_string(&config)?,
            };

            match ConfigFile::find() {
                Some(path) => println!("# {}", path.display()),
                None => println!("# built-in defaults (no config file found)"),
            }
            println!("{rendered}");
        }

        ConfigAction::Validate { file } => {
            let path = match file {
                Some(f) => std::path::PathBuf::from(f),
                None => ConfigFile::find().context("No configuration file found")?,
            };

            match ConfigFile::load(&path) {
                Ok(config) => {
                    println!("✓ {} is valid", path.display());
                    println!("  target: {}", config.target.base_url);
                    println!("  profiles: {}", config.suite_profiles.len());
                    println!("  environments: {}", config.environments.len());
                }
                Err(e) => {
                    println!("✗ {} is invalid: {e:#}", path.display());
                    std::process::exit(1);
                }
            }
        }

        ConfigAction::Set { key, value } => {
            let path = ConfigFile::find()
                .context("No configuration file found. Run 'config init' first.")?;
            let mut config = ConfigFile::load(&path)?;

            match key.as_str() {
                "base-url" => config.target.base_url = value.clone(),
                "email" => config.target.email = value.clone(),
                "password" => config.target.password = value.clone(),
                "bot-token" => config.target.bot_token = Some(value.clone()),
                "bot-username" => config.target.bot_username = Some(value.clone()),
                "timeout" => {
                    config.target.timeout_secs =
                        value.parse().context("timeout must be a number of seconds")?
                }
                "rounds" => {
                    config.target.default_rounds =
                        value.parse().context("rounds must be a number")?
                }
                _ => anyhow::bail!("Unknown config key: {key}"),
            }

            config.validate()?;
            config.save(&path)?;
            println!("Set {key} in {}", path.display());
        }

        ConfigAction::Get { key } => {
            let config = ConfigFile::load_default()?;
            let value = match key.as_str() {
                "base-url" => config.target.base_url,
                "email" => config.target.email,
                "bot-token" => config.target.bot_token.unwrap_or_default(),
                "bot-username" => config.target.bot_username.unwrap_or_default(),
                "timeout" => config.target.timeout_secs.to_string(),
                "rounds" => config.target.default_rounds.to_string(),
                "password" => anyhow::bail!("Refusing to print the password"),
                _ => anyhow::bail!("Unknown config key: {key}"),
            };
            println!("{value}");
        }

        ConfigAction::Env => {
            config::env::print_env_help();
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skip_list_parses() {
        let skips = parse_skips(&Some("13, 25,26".to_string())).unwrap();
        assert_eq!(skips, vec![13, 25, 26]);
    }

    #[test]
    fn skip_list_rejects_unknown_numbers() {
        assert!(parse_skips(&Some("99".to_string())).is_err());
        assert!(parse_skips(&Some("abc".to_string())).is_err());
    }

    #[test]
    fn empty_skip_list_is_empty() {
        assert!(parse_skips(&None).unwrap().is_empty());
    }
}
