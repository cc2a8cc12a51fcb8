//! Check catalogue and result models
//!
//! Defines the numbered checks the probe runs against the platform,
//! their execution statuses, and round summaries.

use serde::{Deserialize, Serialize};
use std::fmt;

/// All 28 checks, grouped by category
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestCase {
    // Auth (1)
    Login,

    // Products (2-8)
    MyProducts,
    CreateProduct,
    GetProduct,
    UpdateProduct,
    PauseProduct,
    PublishProduct,
    ProductInList,

    // Checkout (9-13)
    CheckoutProduct,
    CheckoutSession,
    DetectGateway,
    FeatureFlags,
    TestPurchase,

    // Payment (14-17)
    OrderDetails,
    SimulatePayment,
    CompletePayment,
    OrderStats,

    // Webhook (18-24)
    WebhookConfig,
    StartCommand,
    ProductLink,
    InvalidText,
    DeepLink,
    ChannelInfo,
    PremiumChannel,

    // Database (25-26)
    OrdersCollection,
    OrderRecorded,

    // Logs (27-28)
    NotificationLogs,
    WebhookLogs,
}

impl TestCase {
    /// Get check number (1-28)
    pub fn number(&self) -> u8 {
        match self {
            TestCase::Login => 1,
            TestCase::MyProducts => 2,
            TestCase::CreateProduct => 3,
            TestCase::GetProduct => 4,
            TestCase::UpdateProduct => 5,
            TestCase::PauseProduct => 6,
            TestCase::PublishProduct => 7,
            TestCase::ProductInList => 8,
            TestCase::CheckoutProduct => 9,
            TestCase::CheckoutSession => 10,
            TestCase::DetectGateway => 11,
            TestCase::FeatureFlags => 12,
            TestCase::TestPurchase => 13,
            TestCase::OrderDetails => 14,
            TestCase::SimulatePayment => 15,
            TestCase::CompletePayment => 16,
            TestCase::OrderStats => 17,
            TestCase::WebhookConfig => 18,
            TestCase::StartCommand => 19,
            TestCase::ProductLink => 20,
            TestCase::InvalidText => 21,
            TestCase::DeepLink => 22,
            TestCase::ChannelInfo => 23,
            TestCase::PremiumChannel => 24,
            TestCase::OrdersCollection => 25,
            TestCase::OrderRecorded => 26,
            TestCase::NotificationLogs => 27,
            TestCase::WebhookLogs => 28,
        }
    }

    /// Get check name
    pub fn name(&self) -> &'static str {
        match self {
            TestCase::Login => "Login",
            TestCase::MyProducts => "My Products",
            TestCase::CreateProduct => "Create Product",
            TestCase::GetProduct => "Get Product",
            TestCase::UpdateProduct => "Update Product",
            TestCase::PauseProduct => "Pause Product",
            TestCase::PublishProduct => "Publish Product",
            TestCase::ProductInList => "Product In List",
            TestCase::CheckoutProduct => "Checkout Product",
            TestCase::CheckoutSession => "Checkout Session",
            TestCase::DetectGateway => "Detect Gateway",
            TestCase::FeatureFlags => "Feature Flags",
            TestCase::TestPurchase => "Test Purchase",
            TestCase::OrderDetails => "Order Details",
            TestCase::SimulatePayment => "Simulate Payment",
            TestCase::CompletePayment => "Complete Payment",
            TestCase::OrderStats => "Order Stats",
            TestCase::WebhookConfig => "Webhook Config",
            TestCase::StartCommand => "Start Command",
            TestCase::ProductLink => "Product Link",
            TestCase::InvalidText => "Invalid Text",
            TestCase::DeepLink => "Deep Link",
            TestCase::ChannelInfo => "Channel Info",
            TestCase::PremiumChannel => "Premium Channel",
            TestCase::OrdersCollection => "Orders Collection",
            TestCase::OrderRecorded => "Order Recorded",
            TestCase::NotificationLogs => "Notification Logs",
            TestCase::WebhookLogs => "Webhook Logs",
        }
    }

    /// Get check category
    pub fn category(&self) -> &'static str {
        match self {
            TestCase::Login => "Auth",
            TestCase::MyProducts
            | TestCase::CreateProduct
            | TestCase::GetProduct
            | TestCase::UpdateProduct
            | TestCase::PauseProduct
            | TestCase::PublishProduct
            | TestCase::ProductInList => "Products",
            TestCase::CheckoutProduct
            | TestCase::CheckoutSession
            | TestCase::DetectGateway
            | TestCase::FeatureFlags
            | TestCase::TestPurchase => "Checkout",
            TestCase::OrderDetails
            | TestCase::SimulatePayment
            | TestCase::CompletePayment
            | TestCase::OrderStats => "Payment",
            TestCase::WebhookConfig
            | TestCase::StartCommand
            | TestCase::ProductLink
            | TestCase::InvalidText
            | TestCase::DeepLink
            | TestCase::ChannelInfo
            | TestCase::PremiumChannel => "Webhook",
            TestCase::OrdersCollection | TestCase::OrderRecorded => "Database",
            TestCase::NotificationLogs | TestCase::WebhookLogs => "Logs",
        }
    }

    /// Get check description
    pub fn description(&self) -> &'static str {
        match self {
            TestCase::Login => "Authenticate and capture a session token",
            TestCase::MyProducts => "List products owned by the tipster account",
            TestCase::CreateProduct => "Create a product and verify the echo",
            TestCase::GetProduct => "Fetch a single product by ID",
            TestCase::UpdateProduct => "Patch title and price on a product",
            TestCase::PauseProduct => "Pause a product and verify it deactivates",
            TestCase::PublishProduct => "Publish a product and verify it reactivates",
            TestCase::ProductInList => "Verify the product appears in the public listing",
            TestCase::CheckoutProduct => "Fetch the public checkout page payload",
            TestCase::CheckoutSession => "Open a checkout session for a guest buyer",
            TestCase::DetectGateway => "Verify gateway selection returns a known provider",
            TestCase::FeatureFlags => "Fetch the deployment feature flag map",
            TestCase::TestPurchase => "Exercise the dev-only purchase helper",
            TestCase::OrderDetails => "Fetch order details for the tracked order",
            TestCase::SimulatePayment => "Simulate a successful payment on the order",
            TestCase::CompletePayment => "Complete payment and verify the paid status",
            TestCase::OrderStats => "Fetch aggregate order statistics",
            TestCase::WebhookConfig => "Verify the Telegram webhook registration URL",
            TestCase::StartCommand => "Inject a /start command update",
            TestCase::ProductLink => "Inject a message containing a product link",
            TestCase::InvalidText => "Inject plain text with no product reference",
            TestCase::DeepLink => "Inject a /start deep link for the product",
            TestCase::ChannelInfo => "Fetch connected Telegram channel info",
            TestCase::PremiumChannel => "Request the premium channel invite link",
            TestCase::OrdersCollection => "Count documents in the orders collection",
            TestCase::OrderRecorded => "Verify the tracked order is recorded as paid",
            TestCase::NotificationLogs => "Scan backend logs for payment notifications",
            TestCase::WebhookLogs => "Scan backend logs for webhook processing",
        }
    }

    /// Whether the check sends an Authorization header
    pub fn requires_auth(&self) -> bool {
        matches!(
            self,
            TestCase::MyProducts
                | TestCase::CreateProduct
                | TestCase::GetProduct
                | TestCase::UpdateProduct
                | TestCase::PauseProduct
                | TestCase::PublishProduct
                | TestCase::ProductInList
                | TestCase::OrderStats
                | TestCase::ChannelInfo
                | TestCase::PremiumChannel
        )
    }

    /// Get all checks in run order
    pub fn all() -> Vec<TestCase> {
        vec![
            TestCase::Login,
            TestCase::MyProducts,
            TestCase::CreateProduct,
            TestCase::GetProduct,
            TestCase::UpdateProduct,
            TestCase::PauseProduct,
            TestCase::PublishProduct,
            TestCase::ProductInList,
            TestCase::CheckoutProduct,
            TestCase::CheckoutSession,
            TestCase::DetectGateway,
            TestCase::FeatureFlags,
            TestCase::TestPurchase,
            TestCase::OrderDetails,
            TestCase::SimulatePayment,
            TestCase::CompletePayment,
            TestCase::OrderStats,
            TestCase::WebhookConfig,
            TestCase::StartCommand,
            TestCase::ProductLink,
            TestCase::InvalidText,
            TestCase::DeepLink,
            TestCase::ChannelInfo,
            TestCase::PremiumChannel,
            TestCase::OrdersCollection,
            TestCase::OrderRecorded,
            TestCase::NotificationLogs,
            TestCase::WebhookLogs,
        ]
    }

    /// Parse from check number
    pub fn from_number(n: u8) -> Option<TestCase> {
        Self::all().into_iter().find(|c| c.number() == n)
    }
}

impl fmt::Display for TestCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Check {}: {}", self.number(), self.name())
    }
}

/// Check execution status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestStatus {
    Pass,
    Fail,
    Skip,
    Error,
}

impl TestStatus {
    pub fn symbol(&self) -> &'static str {
        match self {
            TestStatus::Pass => "✓",
            TestStatus::Fail => "✗",
            TestStatus::Skip => "○",
            TestStatus::Error => "!",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, TestStatus::Pass)
    }
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestStatus::Pass => write!(f, "PASS"),
            TestStatus::Fail => write!(f, "FAIL"),
            TestStatus::Skip => write!(f, "SKIP"),
            TestStatus::Error => write!(f, "ERROR"),
        }
    }
}

/// Result of a single check execution
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TestResult {
    pub test_case: TestCase,
    pub status: TestStatus,
    pub duration_ms: u64,
    pub message: Option<String>,
    pub details: Option<serde_json::Value>,
}

impl TestResult {
    pub fn pass(test_case: TestCase, duration_ms: u64) -> Self {
        Self {
            test_case,
            status: TestStatus::Pass,
            duration_ms,
            message: None,
            details: None,
        }
    }

    pub fn fail(test_case: TestCase, duration_ms: u64, message: impl Into<String>) -> Self {
        Self {
            test_case,
            status: TestStatus::Fail,
            duration_ms,
            message: Some(message.into()),
            details: None,
        }
    }

    pub fn skip(test_case: TestCase, reason: impl Into<String>) -> Self {
        Self {
            test_case,
            status: TestStatus::Skip,
            duration_ms: 0,
            message: Some(reason.into()),
            details: None,
        }
    }

    pub fn error(test_case: TestCase, error: impl Into<String>) -> Self {
        Self {
            test_case,
            status: TestStatus::Error,
            duration_ms: 0,
            message: Some(error.into()),
            details: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

impl fmt::Display for TestResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} [{}ms]",
            self.status.symbol(),
            self.test_case,
            self.duration_ms
        )?;
        if let Some(msg) = &self.message {
            write!(f, " - {msg}")?;
        }
        Ok(())
    }
}

/// Summary of one round of checks
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TestRoundSummary {
    pub round: u32,
    pub target: String,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub errors: usize,
    pub total_duration_ms: u64,
    pub results: Vec<TestResult>,
}

impl TestRoundSummary {
    pub fn new(round: u32, target: impl Into<String>, results: Vec<TestResult>) -> Self {
        let total = results.len();
        let passed = results
            .iter()
            .filter(|r| r.status == TestStatus::Pass)
            .count();
        let failed = results
            .iter()
            .filter(|r| r.status == TestStatus::Fail)
            .count();
        let skipped = results
            .iter()
            .filter(|r| r.status == TestStatus::Skip)
            .count();
        let errors = results
            .iter()
            .filter(|r| r.status == TestStatus::Error)
            .count();
        let total_duration_ms = results.iter().map(|r| r.duration_ms).sum();

        Self {
            round,
            target: target.into(),
            total,
            passed,
            failed,
            skipped,
            errors,
            total_duration_ms,
            results,
        }
    }

    pub fn pass_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.passed as f64 / self.total as f64) * 100.0
        }
    }

    /// A round is green when nothing failed or errored (skips are fine)
    pub fn is_green(&self) -> bool {
        self.failed == 0 && self.errors == 0
    }
}

impl fmt::Display for TestRoundSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Round {} - {}", self.round, self.target)?;
        writeln!(f, "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━")?;
        for result in &self.results {
            writeln!(f, "  {result}")?;
        }
        writeln!(f, "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━")?;
        writeln!(
            f,
            "Total: {} | Pass: {} | Fail: {} | Skip: {} | Error: {}",
            self.total, self.passed, self.failed, self.skipped, self.errors
        )?;
        writeln!(
            f,
            "Pass Rate: {:.1}% | Duration: {}ms",
            self.pass_rate(),
            self.total_duration_ms
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_numbers() {
        assert_eq!(TestCase::Login.number(), 1);
        assert_eq!(TestCase::WebhookLogs.number(), 28);
    }

    #[test]
    fn test_case_from_number() {
        assert_eq!(TestCase::from_number(1), Some(TestCase::Login));
        assert_eq!(TestCase::from_number(28), Some(TestCase::WebhookLogs));
        assert_eq!(TestCase::from_number(29), None);
    }

    #[test]
    fn test_all_cases() {
        let all = TestCase::all();
        assert_eq!(all.len(), 28);

        // Numbers match run order
        for (i, case) in all.iter().enumerate() {
            assert_eq!(case.number() as usize, i + 1);
        }
    }

    #[test]
    fn test_auth_requirements() {
        assert!(TestCase::MyProducts.requires_auth());
        assert!(TestCase::PremiumChannel.requires_auth());
        assert!(!TestCase::Login.requires_auth());
        assert!(!TestCase::CheckoutProduct.requires_auth());
        assert!(!TestCase::StartCommand.requires_auth());
    }

    #[test]
    fn test_result_creation() {
        let result = TestResult::pass(TestCase::Login, 100);
        assert!(result.status.is_success());
        assert_eq!(result.duration_ms, 100);
    }

    #[test]
    fn test_round_summary() {
        let results = vec![
            TestResult::pass(TestCase::Login, 100),
            TestResult::fail(TestCase::MyProducts, 50, "status 500"),
            TestResult::skip(TestCase::GetProduct, "no product id"),
        ];

        let summary = TestRoundSummary::new(1, "api.example.com", results);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.passed, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.skipped, 1);
        assert!(!summary.is_green());
    }

    #[test]
    fn test_skips_keep_round_green() {
        let results = vec![
            TestResult::pass(TestCase::Login, 100),
            TestResult::skip(TestCase::WebhookConfig, "no bot token"),
        ];

        let summary = TestRoundSummary::new(1, "api.example.com", results);
        assert!(summary.is_green());
    }
}
