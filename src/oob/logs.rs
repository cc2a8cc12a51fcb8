//! Backend log scanning
//!
//! Tails the backend process log and looks for the markers the handlers
//! print while processing payments and Telegram updates.

use anyhow::{Context, Result};
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

use super::ShellOutput;
use crate::config::EvidenceConfig;

/// Marker printed while handling a payment confirmation
pub const MARKER_PAYMENT: &str = "Processing payment success notification";
/// Marker printed when the bot receives /start
pub const MARKER_START: &str = "Received /start command";
/// Marker printed when a product link is found in a message
pub const MARKER_LINK_DETECTED: &str = "Detected product link, extracting ID";
/// Marker printed when free text has no product link
pub const MARKER_NO_LINK: &str = "Text does not contain valid product link";
/// Marker printed when a deep link starts the product flow
pub const MARKER_DEEP_LINK: &str = "Starting product flow from deep link";

/// Tails a log file with `tail -n N`
#[derive(Clone, Debug)]
pub struct LogTail {
    path: String,
    lines: usize,
    timeout_secs: u64,
}

impl LogTail {
    pub fn new(evidence: &EvidenceConfig) -> Self {
        Self {
            path: evidence.backend_log.clone(),
            lines: evidence.log_lines,
            timeout_secs: evidence.log_timeout_secs,
        }
    }

    /// Read the trailing window of the log
    pub async fn read(&self) -> Result<String> {
        debug!(path = %self.path, lines = self.lines, "tailing backend log");

        let future = Command::new("tail")
            .arg("-n")
            .arg(self.lines.to_string())
            .arg(&self.path)
            .output();

        let output = timeout(Duration::from_secs(self.timeout_secs), future)
            .await
            .with_context(|| format!("log read timed out after {}s", self.timeout_secs))?
            .context("failed to run tail")?;

        let shell = ShellOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            exit_code: output.status.code().unwrap_or(-1),
        };

        if !shell.success() {
            anyhow::bail!("tail failed on {}: {}", self.path, shell.stderr.trim());
        }

        Ok(shell.stdout)
    }

    /// Whether the trailing window mentions the marker
    pub async fn contains(&self, marker: &str) -> Result<bool> {
        Ok(self.read().await?.contains(marker))
    }

    /// First marker from the list found in the trailing window
    pub async fn find_any<'a>(&self, markers: &[&'a str]) -> Result<Option<&'a str>> {
        let window = self.read().await?;
        Ok(markers.iter().find(|m| window.contains(**m)).copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn tail_for(file: &NamedTempFile) -> LogTail {
        LogTail {
            path: file.path().to_string_lossy().to_string(),
            lines: 200,
            timeout_secs: 5,
        }
    }

    #[tokio::test]
    async fn finds_marker_in_tail_window() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "boot").unwrap();
        writeln!(file, "{MARKER_START} from user 42").unwrap();
        file.flush().unwrap();

        let tail = tail_for(&file);
        assert!(tail.contains(MARKER_START).await.unwrap());
        assert!(!tail.contains(MARKER_PAYMENT).await.unwrap());
    }

    #[tokio::test]
    async fn find_any_returns_first_hit() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{MARKER_NO_LINK}").unwrap();
        file.flush().unwrap();

        let tail = tail_for(&file);
        let hit = tail
            .find_any(&[MARKER_LINK_DETECTED, MARKER_NO_LINK])
            .await
            .unwrap();
        assert_eq!(hit, Some(MARKER_NO_LINK));
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        let tail = LogTail {
            path: "/nonexistent/backend.out.log".to_string(),
            lines: 50,
            timeout_secs: 5,
        };
        assert!(tail.read().await.is_err());
    }
}
