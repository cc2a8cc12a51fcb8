//! Rendering check results for terminals, files, and pipelines

#![allow(dead_code)]

use std::io::Write;

use crate::models::{TestResult, TestRoundSummary, TestStatus};

const GREEN: &str = "32";
const RED: &str = "31";
const YELLOW: &str = "33";

/// How results get rendered
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    JsonPretty,
    Csv,
    Summary,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "table" => Some(OutputFormat::Table),
            "json" => Some(OutputFormat::Json),
            "json-pretty" | "jsonpretty" => Some(OutputFormat::JsonPretty),
            "csv" => Some(OutputFormat::Csv),
            "summary" => Some(OutputFormat::Summary),
            _ => None,
        }
    }
}

fn status_label(status: TestStatus) -> (&'static str, &'static str) {
    match status {
        TestStatus::Pass => ("✓ PASS", GREEN),
        TestStatus::Fail => ("✗ FAIL", RED),
        TestStatus::Skip => ("○ SKIP", YELLOW),
        TestStatus::Error => ("! ERROR", RED),
    }
}

/// Renders results in one chosen format, with or without color
pub struct ResultFormatter {
    format: OutputFormat,
    colorize: bool,
}

impl ResultFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            colorize: true,
        }
    }

    pub fn no_color(mut self) -> Self {
        self.colorize = false;
        self
    }

    fn paint(&self, color: &str, text: &str) -> String {
        if self.colorize {
            format!("\x1b[{color}m{text}\x1b[0m")
        } else {
            text.to_string()
        }
    }

    /// One check result in the configured format
    pub fn format_result(&self, result: &TestResult) -> String {
        match self.format {
            OutputFormat::Table => self.result_line(result),
            OutputFormat::Json => serde_json::to_string(result).unwrap_or_default(),
            OutputFormat::JsonPretty => serde_json::to_string_pretty(result).unwrap_or_default(),
            OutputFormat::Csv => self.result_csv_row(result),
            OutputFormat::Summary => format!(
                "{} {} ({}ms)",
                result.status.symbol(),
                result.test_case.name(),
                result.duration_ms
            ),
        }
    }

    fn result_line(&self, result: &TestResult) -> String {
        let (label, color) = status_label(result.status);
        format!(
            "{:2}. {:20} {} [{:>6}ms]",
            result.test_case.number(),
            result.test_case.name(),
            self.paint(color, label),
            result.duration_ms
        )
    }

    fn result_csv_row(&self, result: &TestResult) -> String {
        // Quotes in messages get doubled, CSV style
        let message = result.message.as_deref().unwrap_or("").replace('"', "\"\"");
        format!(
            "{},{},{},{},{},\"{message}\"",
            result.test_case.number(),
            result.test_case.name(),
            result.test_case.category(),
            result.status,
            result.duration_ms,
        )
    }

    /// One round in the configured format
    pub fn format_summary(&self, summary: &TestRoundSummary) -> String {
        match self.format {
            OutputFormat::Table => self.round_table(summary),
            OutputFormat::Json => serde_json::to_string(summary).unwrap_or_default(),
            OutputFormat::JsonPretty => serde_json::to_string_pretty(summary).unwrap_or_default(),
            OutputFormat::Csv => self.round_csv(summary),
            OutputFormat::Summary => format!(
                "{} - Round {}: {}/{} passed ({:.1}%) in {}ms",
                summary.target,
                summary.round,
                summary.passed,
                summary.total,
                summary.pass_rate(),
                summary.total_duration_ms
            ),
        }
    }

    fn round_table(&self, summary: &TestRoundSummary) -> String {
        let mut out = String::new();
        let rule = "═".repeat(62);

        out.push_str(&format!("\n╔{rule}╗\n"));
        out.push_str(&format!(
            "║  Round {:3} - {:40} ║\n",
            summary.round, summary.target
        ));
        out.push_str(&format!("╠{rule}╣\n"));

        // One separator row per category, catalogue order
        let mut current_category = "";
        for result in &summary.results {
            let category = result.test_case.category();
            if category != current_category {
                out.push_str(&format!("║  -- {category:55} ║\n"));
                current_category = category;
            }
            out.push_str(&format!("║  {}  ║\n", self.result_line(result)));
        }

        out.push_str(&format!("╠{rule}╣\n"));

        let passed = self.paint(GREEN, &summary.passed.to_string());
        let failed = if summary.failed > 0 {
            self.paint(RED, &summary.failed.to_string())
        } else {
            summary.failed.to_string()
        };

        out.push_str(&format!(
            "║  Total: {:2} | Pass: {} | Fail: {} | Skip: {:2} | Error: {:2}     ║\n",
            summary.total, passed, failed, summary.skipped, summary.errors
        ));
        out.push_str(&format!(
            "║  Pass Rate: {:5.1}% | Duration: {:6}ms                      ║\n",
            summary.pass_rate(),
            summary.total_duration_ms
        ));
        out.push_str(&format!("╚{rule}╝\n"));

        out
    }

    fn round_csv(&self, summary: &TestRoundSummary) -> String {
        let mut out = String::from("check_num,check_name,category,status,duration_ms,message\n");
        for result in &summary.results {
            out.push_str(&self.result_csv_row(result));
            out.push('\n');
        }
        out
    }

    /// Several rounds at once: JSON formats dump them all, everything else
    /// renders the aggregate table with per-check pass rates.
    pub fn format_rounds(&self, summaries: &[TestRoundSummary]) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string(summaries).unwrap_or_default(),
            OutputFormat::JsonPretty => {
                serde_json::to_string_pretty(summaries).unwrap_or_default()
            }
            _ => self.rounds_table(summaries),
        }
    }

    fn rounds_table(&self, summaries: &[TestRoundSummary]) -> String {
        let mut out = String::new();
        let rule = "═".repeat(63);
        let thin_rule = format!(" {}\n", "─".repeat(59));

        let target = summaries
            .first()
            .map(|s| s.target.as_str())
            .unwrap_or("unknown");

        out.push_str(&format!("\n{rule}\n"));
        out.push_str(&format!(
            " Aggregate Results: {target} ({} rounds)\n",
            summaries.len()
        ));
        out.push_str(&format!("{rule}\n"));

        let attempted: usize = summaries.iter().map(|s| s.total).sum();
        let passed: usize = summaries.iter().map(|s| s.passed).sum();
        let overall = if attempted == 0 {
            0.0
        } else {
            (passed as f64 / attempted as f64) * 100.0
        };
        out.push_str(&format!(" Overall Pass Rate: {overall:.1}%\n\n"));

        out.push_str(" Check Pass Rates:\n");
        out.push_str(&thin_rule);

        // Catalogue order comes from the first round
        let cases: Vec<_> = summaries
            .first()
            .map(|s| s.results.iter().map(|r| r.test_case).collect())
            .unwrap_or_default();

        for test_case in cases {
            let runs: Vec<_> = summaries
                .iter()
                .flat_map(|s| s.results.iter().filter(|r| r.test_case == test_case))
                .collect();
            let executed = runs
                .iter()
                .filter(|r| r.status != TestStatus::Skip)
                .count();
            let hits = runs
                .iter()
                .filter(|r| r.status == TestStatus::Pass)
                .count();
            let rate = if executed == 0 {
                0.0
            } else {
                (hits as f64 / executed as f64) * 100.0
            };

            let filled = (rate / 5.0) as usize;
            let bar = format!("{}{}", "█".repeat(filled), "░".repeat(20 - filled));

            let color = if rate >= 90.0 {
                GREEN
            } else if rate >= 50.0 {
                YELLOW
            } else {
                RED
            };
            let rate_cell = self.paint(color, &format!("{rate:5.1}%"));

            out.push_str(&format!(
                " {:2}. {:20} {bar} {rate_cell}\n",
                test_case.number(),
                test_case.name(),
            ));
        }

        out.push_str(&thin_rule);
        out
    }
}

impl Default for ResultFormatter {
    fn default() -> Self {
        Self::new(OutputFormat::Table)
    }
}

/// Render a round summary into a file, colors off
pub fn write_results_to_file(
    path: &str,
    summary: &TestRoundSummary,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let rendered = ResultFormatter::new(format).no_color().format_summary(summary);

    let mut file = std::fs::File::create(path)?;
    file.write_all(rendered.as_bytes())?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TestCase;

    #[test]
    fn format_names_parse() {
        assert_eq!(OutputFormat::from_str("json"), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::from_str("TABLE"), Some(OutputFormat::Table));
        assert_eq!(OutputFormat::from_str("unknown"), None);
    }

    #[test]
    fn no_color_strips_ansi() {
        let result = TestResult::pass(TestCase::Login, 100);
        let line = ResultFormatter::new(OutputFormat::Table)
            .no_color()
            .format_result(&result);
        assert!(line.contains("✓ PASS"));
        assert!(!line.contains("\x1b["));
    }

    #[test]
    fn summary_line_names_the_check() {
        let result = TestResult::pass(TestCase::Login, 100);
        let formatter = ResultFormatter::new(OutputFormat::Summary);
        assert!(formatter.format_result(&result).contains("Login"));
    }

    #[test]
    fn csv_doubles_embedded_quotes() {
        let result = TestResult::fail(TestCase::Login, 10, "said \"no\"");
        let row = ResultFormatter::new(OutputFormat::Csv)
            .no_color()
            .format_result(&result);
        assert!(row.contains("\"said \"\"no\"\"\""));
    }

    #[test]
    fn rounds_table_shows_per_check_rates() {
        let summaries = vec![
            TestRoundSummary::new(1, "shop.example.com", vec![TestResult::pass(TestCase::Login, 5)]),
            TestRoundSummary::new(2, "shop.example.com", vec![TestResult::fail(TestCase::Login, 5, "500")]),
        ];
        let output = ResultFormatter::new(OutputFormat::Table)
            .no_color()
            .format_rounds(&summaries);
        assert!(output.contains("2 rounds"));
        assert!(output.contains(" 50.0%"));
    }
}
