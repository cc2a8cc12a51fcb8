//! Persistent run records
//!
//! Every stored run is one pretty-printed JSON file under the platform data
//! dir, grouped per target host so one installation can track several
//! deployments side by side.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::models::{TestResult, TestRoundSummary, TestStatus};

/// One persisted probe run
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoredProbeRun {
    /// Run id, timestamp plus random suffix
    pub id: String,

    /// Host the probe ran against
    pub target: String,

    /// Full base URL
    pub base_url: String,

    /// When the run started
    pub started_at: DateTime<Utc>,

    /// When the last round finished
    pub completed_at: DateTime<Utc>,

    /// Number of rounds
    pub rounds: u32,

    /// Per-round summaries
    pub summaries: Vec<StoredRoundSummary>,

    /// Cross-round statistics
    pub aggregate: Option<AggregateStats>,

    /// Where the probe itself ran
    pub environment: EnvironmentInfo,
}

/// Snapshot of one round
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoredRoundSummary {
    /// Round number, 1-based
    pub round: u32,

    /// Checks attempted
    pub total: usize,

    /// Checks passed
    pub passed: usize,

    /// Checks failed
    pub failed: usize,

    /// Checks skipped
    pub skipped: usize,

    /// Checks errored
    pub errors: usize,

    /// Pass rate (0.0 - 1.0)
    pub pass_rate: f64,

    /// Total duration in milliseconds
    pub duration_ms: u64,

    /// Every check result of the round
    pub results: Vec<StoredTestResult>,
}

/// Snapshot of one check result
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoredTestResult {
    /// Check number
    pub check_number: u8,

    /// Check name
    pub check_name: String,

    /// Check category
    pub category: String,

    /// Execution status
    pub status: TestStatus,

    /// Duration in milliseconds
    pub duration_ms: u64,

    /// Message (reason for fail/skip/error, context on pass)
    pub message: Option<String>,
}

/// Statistics folded over all rounds of a run
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AggregateStats {
    /// Mean pass rate over rounds
    pub avg_pass_rate: f64,

    /// Worst round
    pub min_pass_rate: f64,

    /// Best round
    pub max_pass_rate: f64,

    /// Mean round duration
    pub avg_duration_ms: u64,

    /// Summed round durations
    pub total_duration_ms: u64,

    /// Folded per check name
    pub check_stats: BTreeMap<String, CheckStats>,
}

/// How one check behaved across rounds
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CheckStats {
    /// Rounds where it passed
    pub pass_count: u32,

    /// Rounds where it failed or errored
    pub fail_count: u32,

    /// Rounds where it was skipped
    pub skip_count: u32,

    /// Pass rate over rounds that actually executed it
    pub pass_rate: f64,

    /// Mean duration when executed
    pub avg_duration_ms: u64,
}

/// Build and host info recorded with each run
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EnvironmentInfo {
    /// Operating system
    pub os: String,

    /// Architecture
    pub arch: String,

    /// Tool version
    pub tool_version: String,
}

impl Default for EnvironmentInfo {
    fn default() -> Self {
        Self {
            os: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl StoredProbeRun {
    /// Open a record for a fresh run
    pub fn new(target: &str, base_url: &str) -> Self {
        Self {
            id: generate_run_id(),
            target: target.to_string(),
            base_url: base_url.to_string(),
            started_at: Utc::now(),
            completed_at: Utc::now(),
            rounds: 0,
            summaries: Vec::new(),
            aggregate: None,
            environment: EnvironmentInfo::default(),
        }
    }

    /// Fold in a finished round
    pub fn add_round(&mut self, summary: &TestRoundSummary) {
        self.summaries
            .push(StoredRoundSummary::from_round_summary(summary));
        self.rounds = self.summaries.len() as u32;
        self.completed_at = Utc::now();
    }

    /// Recompute the cross-round statistics
    pub fn calculate_aggregate(&mut self) {
        if self.summaries.is_empty() {
            return;
        }

        let mut pass_rates: Vec<f64> = Vec::new();
        let mut durations: Vec<u64> = Vec::new();
        let mut check_results: BTreeMap<String, Vec<(TestStatus, u64)>> = BTreeMap::new();

        for summary in &self.summaries {
            pass_rates.push(summary.pass_rate);
            durations.push(summary.duration_ms);

            for result in &summary.results {
                check_results
                    .entry(result.check_name.clone())
                    .or_default()
                    .push((result.status, result.duration_ms));
            }
        }

        let avg_pass_rate = pass_rates.iter().sum::<f64>() / pass_rates.len() as f64;
        let min_pass_rate = pass_rates.iter().cloned().fold(f64::INFINITY, f64::min);
        let max_pass_rate = pass_rates.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let total_duration_ms: u64 = durations.iter().sum();
        let avg_duration_ms = total_duration_ms / durations.len() as u64;

        let mut check_stats: BTreeMap<String, CheckStats> = BTreeMap::new();
        for (name, results) in check_results {
            let pass_count = results
                .iter()
                .filter(|(s, _)| *s == TestStatus::Pass)
                .count() as u32;
            let skip_count = results
                .iter()
                .filter(|(s, _)| *s == TestStatus::Skip)
                .count() as u32;
            let fail_count = results.len() as u32 - pass_count - skip_count;
            let executed = results.len() as u32 - skip_count;
            let pass_rate = if executed == 0 {
                0.0
            } else {
                pass_count as f64 / executed as f64
            };

            let durs: Vec<u64> = results.iter().map(|(_, d)| *d).collect();
            let avg_dur = durs.iter().sum::<u64>() / durs.len().max(1) as u64;

            check_stats.insert(
                name,
                CheckStats {
                    pass_count,
                    fail_count,
                    skip_count,
                    pass_rate,
                    avg_duration_ms: avg_dur,
                },
            );
        }

        self.aggregate = Some(AggregateStats {
            avg_pass_rate,
            min_pass_rate,
            max_pass_rate,
            avg_duration_ms,
            total_duration_ms,
            check_stats,
        });
    }
}

impl StoredRoundSummary {
    pub fn from_round_summary(summary: &TestRoundSummary) -> Self {
        let results: Vec<StoredTestResult> = summary
            .results
            .iter()
            .map(StoredTestResult::from_test_result)
            .collect();

        let pass_rate = if summary.total > 0 {
            summary.passed as f64 / summary.total as f64
        } else {
            0.0
        };

        Self {
            round: summary.round,
            total: summary.total,
            passed: summary.passed,
            failed: summary.failed,
            skipped: summary.skipped,
            errors: summary.errors,
            pass_rate,
            duration_ms: summary.total_duration_ms,
            results,
        }
    }
}

impl StoredTestResult {
    pub fn from_test_result(result: &TestResult) -> Self {
        Self {
            check_number: result.test_case.number(),
            check_name: result.test_case.name().to_string(),
            category: result.test_case.category().to_string(),
            status: result.status,
            duration_ms: result.duration_ms,
            message: result.message.clone(),
        }
    }
}

/// Timestamped id with a random suffix against same-second collisions
fn generate_run_id() -> String {
    let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
    let random: u32 = rand::random::<u32>() % 10000;
    format!("{timestamp}_{random:04}")
}

/// Filesystem layout and IO for stored runs
pub struct ResultsStorage {
    /// Root directory holding one subdirectory per target
    base_dir: PathBuf,
}

impl ResultsStorage {
    /// Storage rooted at an explicit directory
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Storage under the platform data dir
    pub fn default_dir() -> Result<Self> {
        let base_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("market-probe")
            .join("results");
        Ok(Self::new(base_dir))
    }

    /// Directory for one target's runs
    fn target_dir(&self, target: &str) -> PathBuf {
        // Ports would produce directories with colons on some filesystems
        self.base_dir.join(target.to_lowercase().replace(':', "_"))
    }

    /// File path of one run
    fn run_path(&self, target: &str, run_id: &str) -> PathBuf {
        self.target_dir(target).join(format!("{run_id}.json"))
    }

    /// Persist a run record
    pub fn save(&self, run: &StoredProbeRun) -> Result<PathBuf> {
        let target_dir = self.target_dir(&run.target);
        fs::create_dir_all(&target_dir)?;

        let path = self.run_path(&run.target, &run.id);
        let file = File::create(&path).context("Failed to create results file")?;
        let writer = BufWriter::new(file);

        serde_json::to_writer_pretty(writer, run).context("Failed to write results")?;

        info!("Saved probe results to {}", path.display());
        Ok(path)
    }

    /// Load one run by target and id
    pub fn load(&self, target: &str, run_id: &str) -> Result<StoredProbeRun> {
        let path = self.run_path(target, run_id);
        let file = File::open(&path).context("Failed to open results file")?;
        let reader = BufReader::new(file);

        let run: StoredProbeRun =
            serde_json::from_reader(reader).context("Failed to parse results")?;

        debug!("Loaded probe results from {}", path.display());
        Ok(run)
    }

    /// Load a run record from an explicit path
    pub fn load_from_path(&self, path: &Path) -> Result<StoredProbeRun> {
        let file = File::open(path).context("Failed to open results file")?;
        let reader = BufReader::new(file);
        serde_json::from_reader(reader).context("Failed to parse results")
    }

    /// Targets that have at least one stored run
    pub fn list_targets(&self) -> Result<Vec<String>> {
        if !self.base_dir.exists() {
            return Ok(Vec::new());
        }

        let mut targets: Vec<String> = fs::read_dir(&self.base_dir)?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_dir())
            .filter_map(|entry| entry.file_name().to_str().map(str::to_string))
            .collect();

        targets.sort();
        Ok(targets)
    }

    /// Run listing for one target, newest first
    pub fn list_runs(&self, target: &str) -> Result<Vec<RunInfo>> {
        let target_dir = self.target_dir(target);
        if !target_dir.exists() {
            return Ok(Vec::new());
        }

        let mut runs = Vec::new();
        for entry in fs::read_dir(&target_dir)? {
            let entry = entry?;
            let path = entry.path();

            if path.extension().map(|e| e == "json").unwrap_or(false) {
                if let Ok(run) = self.load_from_path(&path) {
                    runs.push(RunInfo {
                        id: run.id,
                        target: run.target,
                        started_at: run.started_at,
                        rounds: run.rounds,
                        pass_rate: run
                            .aggregate
                            .as_ref()
                            .map(|a| a.avg_pass_rate)
                            .unwrap_or(0.0),
                    });
                }
            }
        }

        runs.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        Ok(runs)
    }

    /// Most recent run for a target
    pub fn latest(&self, target: &str) -> Result<Option<StoredProbeRun>> {
        let runs = self.list_runs(target)?;
        match runs.first() {
            Some(info) => Ok(Some(self.load(target, &info.id)?)),
            None => Ok(None),
        }
    }

    /// Remove one stored run
    pub fn delete(&self, target: &str, run_id: &str) -> Result<()> {
        let path = self.run_path(target, run_id);
        if path.exists() {
            fs::remove_file(&path)?;
            info!("Deleted results: {}", path.display());
        }
        Ok(())
    }

    /// Write a run out as JSON or flat CSV
    pub fn export(&self, run: &StoredProbeRun, path: &Path, format: ExportFormat) -> Result<()> {
        match format {
            ExportFormat::Json => {
                let file = File::create(path)?;
                let writer = BufWriter::new(file);
                serde_json::to_writer_pretty(writer, run)?;
            }
            ExportFormat::Csv => {
                let mut writer = csv::Writer::from_path(path)?;

                writer.write_record([
                    "round",
                    "check_number",
                    "check_name",
                    "category",
                    "status",
                    "duration_ms",
                    "message",
                ])?;

                for summary in &run.summaries {
                    for result in &summary.results {
                        writer.write_record([
                            summary.round.to_string(),
                            result.check_number.to_string(),
                            result.check_name.clone(),
                            result.category.clone(),
                            result.status.to_string(),
                            result.duration_ms.to_string(),
                            result.message.clone().unwrap_or_default(),
                        ])?;
                    }
                }
                writer.flush()?;
            }
        }

        info!("Exported results to {}", path.display());
        Ok(())
    }
}

/// One line of `results` listing output
#[derive(Clone, Debug)]
pub struct RunInfo {
    pub id: String,
    pub target: String,
    pub started_at: DateTime<Utc>,
    pub rounds: u32,
    pub pass_rate: f64,
}

/// Export file format
#[derive(Clone, Copy, Debug)]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(ExportFormat::Json),
            "csv" => Some(ExportFormat::Csv),
            _ => None,
        }
    }

    pub fn from_extension(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{TestCase, TestResult};
    use tempfile::tempdir;

    fn sample_run() -> StoredProbeRun {
        let mut run = StoredProbeRun::new("shop.example.com", "https://shop.example.com");
        let summary = TestRoundSummary::new(
            1,
            "shop.example.com",
            vec![
                TestResult::pass(TestCase::Login, 120),
                TestResult::fail(TestCase::MyProducts, 40, "status 500"),
                TestResult::skip(TestCase::WebhookConfig, "no bot token"),
            ],
        );
        run.add_round(&summary);
        run.calculate_aggregate();
        run
    }

    #[test]
    fn run_ids_are_unique() {
        let id1 = generate_run_id();
        let id2 = generate_run_id();
        assert!(!id1.is_empty());
        assert_ne!(id1, id2);
    }

    #[test]
    fn aggregate_ignores_skips() {
        let run = sample_run();
        let aggregate = run.aggregate.unwrap();

        let login = &aggregate.check_stats["Login"];
        assert_eq!(login.pass_count, 1);
        assert!((login.pass_rate - 1.0).abs() < f64::EPSILON);

        let webhook = &aggregate.check_stats["Webhook Config"];
        assert_eq!(webhook.skip_count, 1);
        assert!((webhook.pass_rate - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn save_load_round_trip() {
        let dir = tempdir().unwrap();
        let storage = ResultsStorage::new(dir.path());

        let run = sample_run();
        storage.save(&run).unwrap();

        let loaded = storage.load("shop.example.com", &run.id).unwrap();
        assert_eq!(loaded.id, run.id);
        assert_eq!(loaded.summaries.len(), 1);

        let runs = storage.list_runs("shop.example.com").unwrap();
        assert_eq!(runs.len(), 1);

        let latest = storage.latest("shop.example.com").unwrap().unwrap();
        assert_eq!(latest.id, run.id);
    }

    #[test]
    fn target_dir_escapes_port() {
        let storage = ResultsStorage::new("/tmp/probe");
        let dir = storage.target_dir("localhost:3000");
        assert!(dir.to_string_lossy().ends_with("localhost_3000"));
    }

    #[test]
    fn csv_export_is_flat() {
        let dir = tempdir().unwrap();
        let storage = ResultsStorage::new(dir.path());
        let run = sample_run();

        let path = dir.path().join("out.csv");
        storage.export(&run, &path, ExportFormat::Csv).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("round,check_number"));
        assert!(content.contains("Login"));
    }

    #[test]
    fn export_format_parses() {
        assert!(matches!(ExportFormat::from_str("json"), Some(ExportFormat::Json)));
        assert!(matches!(ExportFormat::from_str("csv"), Some(ExportFormat::Csv)));
        assert!(ExportFormat::from_str("unknown").is_none());
    }
}
