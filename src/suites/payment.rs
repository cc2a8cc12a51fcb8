//! Checks 14-17: order lifecycle and payment simulation
//!
//! When no order survived the checkout checks, the simulation check inserts
//! a pending order straight into the database so the payment path still gets
//! exercised. Orders marked paid carry the platform's PAGADA status.

use anyhow::Result;
use std::time::Instant;
use tracing::{debug, info, warn};

use super::{ProbeContext, RunState};
use crate::models::api::{OrderEnvelope, PaymentResult, ORDER_STATUS_PAID};
use crate::models::{TestCase, TestResult};

/// Check 14: GET /checkout/order/{id}
pub async fn order_details(ctx: &mut ProbeContext, state: &mut RunState) -> Result<TestResult> {
    ensure_order(ctx, state).await;

    let Some(order_id) = state.order_id.clone() else {
        return Ok(TestResult::skip(TestCase::OrderDetails, "no order id available this round"));
    };

    info!("Running Order Details check");
    let start = Instant::now();

    let response = ctx
        .client
        .get(&format!("/checkout/order/{order_id}"))
        .await?;
    let duration = start.elapsed().as_millis() as u64;

    if !response.is_success() {
        return Ok(TestResult::fail(
            TestCase::OrderDetails,
            duration,
            format!("status {} for order {order_id}", response.status),
        ));
    }

    let Some(envelope) = response.json_as::<OrderEnvelope>() else {
        return Ok(TestResult::fail(
            TestCase::OrderDetails,
            duration,
            format!("unparseable order payload: {}", response.body_excerpt()),
        ));
    };

    let Some(order) = envelope.order else {
        return Ok(TestResult::fail(
            TestCase::OrderDetails,
            duration,
            "envelope has no order section",
        ));
    };

    if order.id.as_deref() != Some(order_id.as_str()) {
        return Ok(TestResult::fail(
            TestCase::OrderDetails,
            duration,
            format!("asked for {order_id}, got {:?}", order.id),
        ));
    }

    let status = order.status.unwrap_or_else(|| "unknown".to_string());
    Ok(TestResult::pass(TestCase::OrderDetails, duration)
        .with_message(format!("order {order_id} in status {status}")))
}

/// Check 15: POST /checkout/simulate-payment/{id}
pub async fn simulate_payment(ctx: &mut ProbeContext, state: &mut RunState) -> Result<TestResult> {
    ensure_order(ctx, state).await;

    let Some(order_id) = state.order_id.clone() else {
        return Ok(TestResult::skip(TestCase::SimulatePayment, "no order id available this round"));
    };

    info!("Running Simulate Payment check");
    let start = Instant::now();

    let response = ctx
        .client
        .post_empty(&format!("/checkout/simulate-payment/{order_id}"))
        .await?;
    let duration = start.elapsed().as_millis() as u64;

    if !response.is_success() {
        return Ok(TestResult::fail(
            TestCase::SimulatePayment,
            duration,
            format!("status {}: {}", response.status, response.body_excerpt()),
        ));
    }

    let Some(result) = response.json_as::<PaymentResult>() else {
        return Ok(TestResult::fail(
            TestCase::SimulatePayment,
            duration,
            format!("unparseable payment result: {}", response.body_excerpt()),
        ));
    };

    if !result.success {
        return Ok(TestResult::fail(
            TestCase::SimulatePayment,
            duration,
            "payment simulation reported success=false",
        ));
    }

    let status = result
        .order
        .and_then(|o| o.status)
        .unwrap_or_else(|| "unknown".to_string());

    if status != ORDER_STATUS_PAID {
        return Ok(TestResult::fail(
            TestCase::SimulatePayment,
            duration,
            format!("order {order_id} in status {status} after simulation"),
        ));
    }

    let notified = result.telegram_notification.is_some();
    debug!("order {order_id} paid, telegram notified: {notified}");

    Ok(TestResult::pass(TestCase::SimulatePayment, duration)
        .with_message(format!(
            "order {order_id} now {ORDER_STATUS_PAID}, telegram notification {}",
            if notified { "sent" } else { "not reported" }
        )))
}

/// Check 16: POST /checkout/complete-payment
pub async fn complete_payment(ctx: &mut ProbeContext, state: &mut RunState) -> Result<TestResult> {
    let Some(order_id) = state.order_id.clone() else {
        return Ok(TestResult::skip(TestCase::CompletePayment, "no order id available this round"));
    };

    info!("Running Complete Payment check");
    let start = Instant::now();

    let body = serde_json::json!({ "orderId": order_id });
    let response = ctx.client.post("/checkout/complete-payment", &body).await?;
    let duration = start.elapsed().as_millis() as u64;

    if !response.is_success() {
        return Ok(TestResult::fail(
            TestCase::CompletePayment,
            duration,
            format!("status {}: {}", response.status, response.body_excerpt()),
        ));
    }

    let Some(envelope) = response.json_as::<OrderEnvelope>() else {
        return Ok(TestResult::fail(
            TestCase::CompletePayment,
            duration,
            format!("unparseable completion payload: {}", response.body_excerpt()),
        ));
    };

    if envelope.product.is_none() || envelope.tipster.is_none() {
        return Ok(TestResult::fail(
            TestCase::CompletePayment,
            duration,
            "completion envelope is missing the product or tipster section",
        ));
    }

    let status = envelope
        .order
        .and_then(|o| o.status)
        .unwrap_or_else(|| "unknown".to_string());

    // Completion is idempotent: running after the simulation check, the
    // order is already paid and must stay that way.
    if status != ORDER_STATUS_PAID {
        return Ok(TestResult::fail(
            TestCase::CompletePayment,
            duration,
            format!("order {order_id} in status {status} after completion"),
        ));
    }

    Ok(TestResult::pass(TestCase::CompletePayment, duration)
        .with_message(format!("order {order_id} confirmed {ORDER_STATUS_PAID}")))
}

/// Check 17: GET /orders/stats
pub async fn order_stats(ctx: &mut ProbeContext) -> Result<TestResult> {
    info!("Running Order Stats check");
    let start = Instant::now();

    let response = ctx.client.get("/orders/stats").await?;
    let duration = start.elapsed().as_millis() as u64;

    if !response.is_success() {
        return Ok(TestResult::fail(
            TestCase::OrderStats,
            duration,
            format!("status {}: {}", response.status, response.body_excerpt()),
        ));
    }

    match response.json() {
        Some(json) if json.is_object() => {
            let total = json
                .pointer("/total")
                .or_else(|| json.pointer("/totalOrders"))
                .and_then(|v| v.as_i64());
            Ok(TestResult::pass(TestCase::OrderStats, duration)
                .with_message(match total {
                    Some(n) => format!("{n} orders reported for account"),
                    None => "stats object returned".to_string(),
                }))
        }
        _ => Ok(TestResult::fail(
            TestCase::OrderStats,
            duration,
            format!("expected a JSON object: {}", response.body_excerpt()),
        )),
    }
}

/// Make sure the round has an order id, inserting a pending order directly
/// when checkout could not open one.
async fn ensure_order(ctx: &mut ProbeContext, state: &mut RunState) {
    if state.order_id.is_some() {
        return;
    }
    let Some(product_id) = state.product_id.clone() else {
        return;
    };

    match ctx.mongo.insert_pending_order(&product_id, 3500).await {
        Ok(Some(order_id)) => {
            debug!("inserted pending order {order_id} for payment checks");
            state.order_id = Some(order_id);
        }
        Ok(None) => warn!("pending order insert produced no id"),
        Err(e) => warn!("pending order insert failed: {e}"),
    }
}
