//! Check 1: Login
//!
//! Everything authenticated hangs off this one. The runner aborts the round
//! when it fails, so the check reports precisely why the session could not
//! be established.

use anyhow::Result;
use std::time::Instant;
use tracing::{debug, info};

use super::{ProbeContext, RunState};
use crate::models::api::{LoginRequest, LoginResponse};
use crate::models::{TestCase, TestResult};

pub async fn login(ctx: &mut ProbeContext, state: &mut RunState) -> Result<TestResult> {
    info!("Running Login check");
    let start = Instant::now();

    let body = LoginRequest {
        email: ctx.target.email.clone(),
        password: ctx.target.password.clone(),
    };

    let response = ctx.client.post("/auth/login", &body).await?;
    let duration = start.elapsed().as_millis() as u64;

    if !response.is_success() {
        return Ok(TestResult::fail(
            TestCase::Login,
            duration,
            format!(
                "login returned {} for {}: {}",
                response.status,
                ctx.target.email,
                response.body_excerpt()
            ),
        ));
    }

    let Some(login) = response.json_as::<LoginResponse>() else {
        return Ok(TestResult::fail(
            TestCase::Login,
            duration,
            format!("no access_token in response: {}", response.body_excerpt()),
        ));
    };

    if login.access_token.is_empty() {
        return Ok(TestResult::fail(
            TestCase::Login,
            duration,
            "access_token is empty",
        ));
    }

    debug!("session established for {}", ctx.target.email);
    ctx.client.set_bearer(login.access_token.clone());
    state.access_token = Some(login.access_token);

    Ok(TestResult::pass(TestCase::Login, duration)
        .with_message(format!("session token obtained for {}", ctx.target.email)))
}
