//! Check execution runner
//!
//! Runs checks strictly in catalogue order. Later checks consume state
//! earlier ones produced, so there is no parallel mode: an authenticated
//! check before login, or a payment check before checkout, is meaningless.

#![allow(dead_code)]

use anyhow::Result;
use tracing::{error, info, warn};

use crate::config::TargetConfig;
use crate::models::{TestCase, TestResult, TestRoundSummary, TestStatus};
use crate::suites::{self, ProbeContext, RunState};
use crate::utils::Timer;

/// Sequential runner bound to one target deployment
pub struct ProbeRunner {
    target: TargetConfig,
    skip_tests: Vec<u8>,
    seed_product_id: Option<String>,
    seed_order_id: Option<String>,
}

impl ProbeRunner {
    /// Create a new runner
    pub fn new(target: TargetConfig) -> Self {
        Self {
            target,
            skip_tests: Vec::new(),
            seed_product_id: None,
            seed_order_id: None,
        }
    }

    /// Numbers to skip this run
    pub fn with_skips(mut self, skips: Vec<u8>) -> Self {
        self.skip_tests = skips;
        self
    }

    /// Known ids to fall back on when no earlier check produced them
    pub fn with_seeds(mut self, product_id: Option<String>, order_id: Option<String>) -> Self {
        self.seed_product_id = product_id;
        self.seed_order_id = order_id;
        self
    }

    fn fresh_state(&self) -> RunState {
        RunState {
            product_id: self.seed_product_id.clone(),
            order_id: self.seed_order_id.clone(),
            ..RunState::default()
        }
    }

    pub fn target(&self) -> &TargetConfig {
        &self.target
    }

    /// Run one check against fresh context and state
    pub async fn run_single(&self, test_case: TestCase) -> Result<TestResult> {
        let mut ctx = ProbeContext::new(self.target.clone())?;
        let mut state = self.fresh_state();

        // Authenticated checks need a session even when run alone
        if test_case.requires_auth() {
            let login = suites::run_test(TestCase::Login, &mut ctx, &mut state).await?;
            if login.status != TestStatus::Pass {
                return Ok(TestResult::skip(
                    test_case,
                    format!("login failed: {}", login.message.unwrap_or_default()),
                ));
            }
        }

        Ok(self.execute(test_case, &mut ctx, &mut state).await)
    }

    /// Run all checks in catalogue order
    pub async fn run_all(&self) -> Result<TestRoundSummary> {
        self.run_round(1, &TestCase::all()).await
    }

    /// Run a selection of checks in catalogue order
    pub async fn run_tests(&self, test_cases: &[TestCase]) -> Result<TestRoundSummary> {
        let mut ordered = test_cases.to_vec();
        ordered.sort_by_key(|c| c.number());
        ordered.dedup();
        self.run_round(1, &ordered).await
    }

    /// Run multiple rounds of the full catalogue
    pub async fn run_rounds(&self, num_rounds: u32) -> Result<Vec<TestRoundSummary>> {
        info!("Running {} rounds against {}", num_rounds, self.target.host());

        let mut summaries = Vec::new();
        for round in 1..=num_rounds {
            info!("=== Round {}/{} ===", round, num_rounds);
            let summary = self.run_round(round, &TestCase::all()).await?;
            info!(
                "Round {} completed: {}/{} passed ({:.1}%)",
                round,
                summary.passed,
                summary.total,
                summary.pass_rate()
            );
            summaries.push(summary);
        }

        Ok(summaries)
    }

    async fn run_round(&self, round: u32, test_cases: &[TestCase]) -> Result<TestRoundSummary> {
        info!("Starting probe round against {}", self.target.host());

        let timer = Timer::start(format!("round {round}"));
        let mut ctx = ProbeContext::new(self.target.clone())?;
        let mut state = self.fresh_state();
        let mut results = Vec::new();
        let mut aborted = false;

        for &test_case in test_cases {
            if aborted {
                results.push(TestResult::skip(test_case, "round aborted after login failure"));
                continue;
            }

            if self.skip_tests.contains(&test_case.number()) {
                results.push(TestResult::skip(test_case, "skipped by configuration"));
                continue;
            }

            if test_case.requires_auth() && !state.has_session() {
                results.push(TestResult::skip(test_case, "no session token"));
                continue;
            }

            let result = self.execute(test_case, &mut ctx, &mut state).await;
            info!("  {}", result);

            // Nothing downstream can work without a session
            if test_case == TestCase::Login && result.status != TestStatus::Pass {
                warn!("login failed, aborting round");
                aborted = true;
            }

            results.push(result);
        }

        let summary = TestRoundSummary::new(round, self.target.host(), results);

        info!(
            "Probe round completed in {}ms - Pass: {}/{} ({:.1}%)",
            timer.finish(),
            summary.passed,
            summary.total,
            summary.pass_rate()
        );

        Ok(summary)
    }

    async fn execute(
        &self,
        test_case: TestCase,
        ctx: &mut ProbeContext,
        state: &mut RunState,
    ) -> TestResult {
        info!("Running {}", test_case);

        match suites::run_test(test_case, ctx, state).await {
            Ok(result) => result,
            Err(e) => {
                error!("{} errored: {:#}", test_case, e);
                TestResult::error(test_case, format!("{e:#}"))
            }
        }
    }
}

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_runner_creation() {
        let runner = ProbeRunner::new(TargetConfig::default());
        assert_eq!(runner.target().host(), "localhost:3000");
    }

    #[test]
    fn test_skip_configuration() {
        let runner = ProbeRunner::new(TargetConfig::default()).with_skips(vec![13, 25]);
        assert!(runner.skip_tests.contains(&13));
        assert!(!runner.skip_tests.contains(&1));
    }

    #[test]
    fn seeds_flow_into_fresh_state() {
        let runner = ProbeRunner::new(TargetConfig::default())
            .with_seeds(Some("64a1f0c2e9b3d4a5f6071829".to_string()), None);
        let state = runner.fresh_state();
        assert_eq!(state.product_id.as_deref(), Some("64a1f0c2e9b3d4a5f6071829"));
        assert!(state.order_id.is_none());
        assert!(!state.has_session());
    }
}
