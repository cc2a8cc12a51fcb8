//! Data models shared across the probe

pub mod api;
pub mod telegram;
pub mod test_result;

pub use test_result::{TestCase, TestResult, TestRoundSummary, TestStatus};
