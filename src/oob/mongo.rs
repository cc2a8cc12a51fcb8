//! Mongo shell access for database evidence
//!
//! Runs `mongosh --quiet <db> --eval <script>` on the backend host. Scripts
//! print their findings to stdout; the probe never keeps a driver connection
//! open.

use anyhow::{Context, Result};
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

use super::ShellOutput;
use crate::config::EvidenceConfig;

/// Prefix the insert script prints the new order id behind
const ORDER_ID_MARKER: &str = "ORDER_ID=";

/// Mongo shell runner bound to one database
#[derive(Clone, Debug)]
pub struct MongoShell {
    bin: String,
    db: String,
    timeout_secs: u64,
}

impl MongoShell {
    pub fn new(evidence: &EvidenceConfig) -> Self {
        Self {
            bin: evidence.mongo_bin.clone(),
            db: evidence.mongo_db.clone(),
            timeout_secs: evidence.mongo_timeout_secs,
        }
    }

    /// Run a script through the shell, bounded by the evidence timeout
    pub async fn eval(&self, script: &str) -> Result<ShellOutput> {
        debug!(db = %self.db, "running mongo script");

        let future = Command::new(&self.bin)
            .arg("--quiet")
            .arg(&self.db)
            .arg("--eval")
            .arg(script)
            .output();

        let output = timeout(Duration::from_secs(self.timeout_secs), future)
            .await
            .with_context(|| format!("mongo shell timed out after {}s", self.timeout_secs))?
            .with_context(|| format!("failed to run {}", self.bin))?;

        Ok(ShellOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            exit_code: output.status.code().unwrap_or(-1),
        })
    }

    /// Insert a pending order directly and return its id
    pub async fn insert_pending_order(
        &self,
        product_id: &str,
        amount_cents: i64,
    ) -> Result<Option<String>> {
        if !is_object_id(product_id) {
            anyhow::bail!("product id {product_id:?} is not a Mongo ObjectId");
        }

        let script = format!(
            "var r = db.orders.insertOne({{ \
               productId: ObjectId('{product_id}'), \
               status: 'PENDIENTE', \
               amountCents: {amount_cents}, \
               currency: 'EUR', \
               paymentProvider: 'stripe', \
               createdAt: new Date() \
             }}); \
             print('{ORDER_ID_MARKER}' + r.insertedId.toString());"
        );

        let output = self.eval(&script).await?;
        if !output.success() {
            debug!(stderr = %output.stderr, "order insert failed");
            return Ok(None);
        }

        Ok(parse_order_id(&output.stdout))
    }

    /// Fetch one order as extended JSON, `None` when absent
    pub async fn find_order(&self, order_id: &str) -> Result<Option<String>> {
        if !is_object_id(order_id) {
            anyhow::bail!("order id {order_id:?} is not a Mongo ObjectId");
        }

        let script = format!(
            "var o = db.orders.findOne({{ _id: ObjectId('{order_id}') }}); \
             if (o) {{ print(EJSON.stringify(o)); }}"
        );

        let output = self.eval(&script).await?;
        if !output.success() {
            return Ok(None);
        }

        let body = output.stdout.trim().to_string();
        Ok(if body.is_empty() { None } else { Some(body) })
    }

    /// Count orders in the collection, a cheap reachability probe
    pub async fn count_orders(&self) -> Result<Option<u64>> {
        let output = self.eval("print(db.orders.countDocuments({}));").await?;
        if !output.success() {
            return Ok(None);
        }
        Ok(output.stdout.trim().lines().last().and_then(|l| l.trim().parse().ok()))
    }
}

/// Extract the inserted order id from script output
fn parse_order_id(stdout: &str) -> Option<String> {
    stdout
        .lines()
        .find_map(|line| line.trim().strip_prefix(ORDER_ID_MARKER))
        .map(|raw| {
            raw.trim()
                .trim_start_matches("ObjectId(\"")
                .trim_start_matches("ObjectId('")
                .trim_end_matches("\")")
                .trim_end_matches("')")
                .trim_matches(|c| c == '"' || c == '\'')
                .to_string()
        })
        .filter(|id| !id.is_empty())
}

/// 24 hex characters
fn is_object_id(s: &str) -> bool {
    s.len() == 24 && s.chars().all(|c| c.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_order_id() {
        let out = "something\nORDER_ID=64f1a2b3c4d5e6f7a8b9c0d1\n";
        assert_eq!(
            parse_order_id(out).as_deref(),
            Some("64f1a2b3c4d5e6f7a8b9c0d1")
        );
    }

    #[test]
    fn parses_wrapped_order_id() {
        let out = "ORDER_ID=ObjectId(\"64f1a2b3c4d5e6f7a8b9c0d1\")";
        assert_eq!(
            parse_order_id(out).as_deref(),
            Some("64f1a2b3c4d5e6f7a8b9c0d1")
        );
    }

    #[test]
    fn missing_marker_yields_none() {
        assert!(parse_order_id("no id here").is_none());
        assert!(parse_order_id("ORDER_ID=").is_none());
    }

    #[test]
    fn object_id_validation() {
        assert!(is_object_id("64f1a2b3c4d5e6f7a8b9c0d1"));
        assert!(!is_object_id("not-an-id"));
        assert!(!is_object_id("64f1a2b3c4d5e6f7a8b9c0d1ff"));
        assert!(!is_object_id("'); db.dropDatabase(); ('"));
    }
}
