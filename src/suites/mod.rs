//! Marketplace check implementations
//!
//! This module contains all 28 checks the probe runs against a deployment.
//!
//! ## Check Categories
//!
//! ### Auth (1)
//! - Login
//!
//! ### Products (2-8)
//! - My Products, Create, Get, Update, Pause, Publish, Product In List
//!
//! ### Checkout (9-13)
//! - Checkout Product, Checkout Session, Detect Gateway, Feature Flags,
//!   Test Purchase
//!
//! ### Payment (14-17)
//! - Order Details, Simulate Payment, Complete Payment, Order Stats
//!
//! ### Webhook (18-24)
//! - Webhook Config, Start Command, Product Link, Invalid Text, Deep Link,
//!   Channel Info, Premium Channel
//!
//! ### Evidence (25-28)
//! - Orders Collection, Order Recorded, Notification Logs, Webhook Logs
//!
//! Checks run strictly in catalogue order within a round. Later checks
//! consume state earlier ones produced (session token, product id, order id);
//! a check whose input never materialized reports Skip, not Fail.

mod auth;
mod checkout;
mod evidence;
mod payment;
mod products;
mod webhook;

use anyhow::Result;

use crate::config::TargetConfig;
use crate::http::ApiClient;
use crate::models::{TestCase, TestResult};
use crate::oob::{LogTail, MongoShell};

/// Everything a check needs to reach the deployment
pub struct ProbeContext {
    pub client: ApiClient,
    pub target: TargetConfig,
    pub mongo: MongoShell,
    pub logs: LogTail,
}

impl ProbeContext {
    pub fn new(target: TargetConfig) -> Result<Self> {
        let client = ApiClient::new(&target.api_base(), target.timeout_secs)?;
        let mongo = MongoShell::new(&target.evidence);
        let logs = LogTail::new(&target.evidence);

        Ok(Self {
            client,
            target,
            mongo,
            logs,
        })
    }
}

/// State carried across one round of checks
#[derive(Clone, Debug, Default)]
pub struct RunState {
    /// Session token from the login check
    pub access_token: Option<String>,

    /// Product created (or borrowed from the owned listing) this round
    pub product_id: Option<String>,

    /// Title of the product the round is working with
    pub product_title: Option<String>,

    /// Order produced by checkout, test purchase, or direct insert
    pub order_id: Option<String>,
}

impl RunState {
    pub fn has_session(&self) -> bool {
        self.access_token.is_some()
    }
}

/// Run a single check, mutating the round state as it goes
pub async fn run_test(
    test_case: TestCase,
    ctx: &mut ProbeContext,
    state: &mut RunState,
) -> Result<TestResult> {
    match test_case {
        TestCase::Login => auth::login(ctx, state).await,

        TestCase::MyProducts => products::my_products(ctx, state).await,
        TestCase::CreateProduct => products::create_product(ctx, state).await,
        TestCase::GetProduct => products::get_product(ctx, state).await,
        TestCase::UpdateProduct => products::update_product(ctx, state).await,
        TestCase::PauseProduct => products::pause_product(ctx, state).await,
        TestCase::PublishProduct => products::publish_product(ctx, state).await,
        TestCase::ProductInList => products::product_in_list(ctx, state).await,

        TestCase::CheckoutProduct => checkout::checkout_product(ctx, state).await,
        TestCase::CheckoutSession => checkout::checkout_session(ctx, state).await,
        TestCase::DetectGateway => checkout::detect_gateway(ctx).await,
        TestCase::FeatureFlags => checkout::feature_flags(ctx).await,
        TestCase::TestPurchase => checkout::test_purchase(ctx, state).await,

        TestCase::OrderDetails => payment::order_details(ctx, state).await,
        TestCase::SimulatePayment => payment::simulate_payment(ctx, state).await,
        TestCase::CompletePayment => payment::complete_payment(ctx, state).await,
        TestCase::OrderStats => payment::order_stats(ctx).await,

        TestCase::WebhookConfig => webhook::webhook_config(ctx).await,
        TestCase::StartCommand => webhook::start_command(ctx).await,
        TestCase::ProductLink => webhook::product_link(ctx, state).await,
        TestCase::InvalidText => webhook::invalid_text(ctx).await,
        TestCase::DeepLink => webhook::deep_link(ctx, state).await,
        TestCase::ChannelInfo => webhook::channel_info(ctx).await,
        TestCase::PremiumChannel => webhook::premium_channel(ctx).await,

        TestCase::OrdersCollection => evidence::orders_collection(ctx).await,
        TestCase::OrderRecorded => evidence::order_recorded(ctx, state).await,
        TestCase::NotificationLogs => evidence::notification_logs(ctx).await,
        TestCase::WebhookLogs => evidence::webhook_logs(ctx).await,
    }
}
