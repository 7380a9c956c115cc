//! Run reporting
//!
//! Turns orchestrator observations into per-object lines, per-batch progress
//! lines and the final summary.

use std::fmt;
use std::time::Duration;

use bc_core::{RunObserver, RunTotals, TransferOutcome, TransferResult};
use serde::Serialize;

use super::{Formatter, OutputConfig, ProgressBar};

/// One JSON output line
#[derive(Debug, Serialize)]
#[serde(tag = "event", rename_all = "lowercase")]
enum Event<'a> {
    Item(&'a TransferResult),
    Progress(&'a RunTotals),
    Summary(&'a RunSummary),
}

/// Final report for a run
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub status: &'static str,
    pub dry_run: bool,
    pub processed: u64,
    #[serde(flatten)]
    pub totals: RunTotals,
    pub size_human: String,
    pub elapsed_ms: u128,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RunSummary {
    pub fn completed(totals: RunTotals, elapsed: Duration, dry_run: bool) -> Self {
        Self::build("completed", totals, elapsed, dry_run, None)
    }

    pub fn aborted(totals: RunTotals, elapsed: Duration, dry_run: bool, error: String) -> Self {
        Self::build("aborted", totals, elapsed, dry_run, Some(error))
    }

    fn build(
        status: &'static str,
        totals: RunTotals,
        elapsed: Duration,
        dry_run: bool,
        error: Option<String>,
    ) -> Self {
        Self {
            status,
            dry_run,
            processed: totals.processed(),
            totals,
            size_human: humansize::format_size(totals.bytes, humansize::BINARY),
            elapsed_ms: elapsed.as_millis(),
            error,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == "completed"
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = if self.dry_run {
            "would transfer"
        } else {
            "transferred"
        };
        write!(
            f,
            "{}: {} objects processed, {} {verb} ({}), {} skipped, {} failed in {:.1}s",
            if self.is_completed() { "Completed" } else { "Aborted" },
            self.processed,
            self.totals.transferred,
            self.size_human,
            self.totals.skipped,
            self.totals.failed,
            self.elapsed_ms as f64 / 1000.0
        )
    }
}

/// Prints progress for a running copy
pub struct Reporter {
    formatter: Formatter,
    progress: ProgressBar,
    dry_run: bool,
}

impl Reporter {
    pub fn new(config: OutputConfig, dry_run: bool) -> Self {
        Self {
            progress: ProgressBar::spinner(&config, "listing objects..."),
            formatter: Formatter::new(config),
            dry_run,
        }
    }

    /// Clear the spinner and print the summary
    pub fn finish(&self, summary: &RunSummary) {
        self.progress.finish_and_clear();

        if self.formatter.is_json() {
            self.formatter.json_line(&Event::Summary(summary));
        } else if summary.is_completed() {
            self.formatter.success(&summary.to_string());
        } else {
            self.formatter.println(&summary.to_string());
        }
    }

    fn item_line(&self, result: &TransferResult) -> String {
        match result.outcome {
            TransferOutcome::Transferred if self.dry_run => format!("would transfer {}", result.key),
            TransferOutcome::Transferred => format!(
                "transferred {} ({})",
                result.key,
                humansize::format_size(result.bytes, humansize::BINARY)
            ),
            TransferOutcome::Skipped => format!("skipped {}", result.key),
            TransferOutcome::Failed => format!(
                "failed {}: {}",
                result.key,
                result.error.as_deref().unwrap_or("unknown error")
            ),
        }
    }
}

fn progress_line(totals: &RunTotals) -> String {
    format!(
        "processed {} objects ({} transferred, {} skipped, {} failed)",
        totals.processed(),
        totals.transferred,
        totals.skipped,
        totals.failed
    )
}

impl RunObserver for Reporter {
    fn on_item(&self, result: &TransferResult) {
        if self.formatter.is_json() {
            self.formatter.json_line(&Event::Item(result));
            return;
        }

        let line = self.item_line(result);
        self.progress.suspend(|| {
            if result.outcome == TransferOutcome::Failed {
                self.formatter.warning(&line);
            } else {
                self.formatter.println(&line);
            }
        });
    }

    fn on_batch(&self, totals: &RunTotals) {
        if self.formatter.is_json() {
            self.formatter.json_line(&Event::Progress(totals));
            return;
        }

        let line = progress_line(totals);
        self.progress.set_message(&line);
        self.progress.suspend(|| self.formatter.println(&line));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bc_core::Error;

    fn quiet_reporter(dry_run: bool) -> Reporter {
        Reporter::new(
            OutputConfig {
                quiet: true,
                ..Default::default()
            },
            dry_run,
        )
    }

    fn totals() -> RunTotals {
        RunTotals {
            transferred: 3,
            skipped: 2,
            failed: 1,
            bytes: 2048,
        }
    }

    #[test]
    fn test_item_lines() {
        let reporter = quiet_reporter(false);
        assert_eq!(
            reporter.item_line(&TransferResult::transferred("production/a", 1024)),
            "transferred production/a (1 KiB)"
        );
        assert_eq!(
            reporter.item_line(&TransferResult::skipped("production/b")),
            "skipped production/b"
        );
        assert_eq!(
            reporter.item_line(&TransferResult::failed(
                "production/c",
                &Error::Fetch("HTTP 404".into())
            )),
            "failed production/c: Fetch failed: HTTP 404"
        );
    }

    #[test]
    fn test_dry_run_item_line() {
        let reporter = quiet_reporter(true);
        assert_eq!(
            reporter.item_line(&TransferResult::transferred("production/a", 0)),
            "would transfer production/a"
        );
    }

    #[test]
    fn test_progress_line() {
        assert_eq!(
            progress_line(&totals()),
            "processed 6 objects (3 transferred, 2 skipped, 1 failed)"
        );
    }

    #[test]
    fn test_summary_display() {
        let summary = RunSummary::completed(totals(), Duration::from_millis(1500), false);
        assert_eq!(
            summary.to_string(),
            "Completed: 6 objects processed, 3 transferred (2 KiB), 2 skipped, 1 failed in 1.5s"
        );

        let summary =
            RunSummary::aborted(totals(), Duration::from_secs(2), false, "bucket gone".into());
        assert!(summary.to_string().starts_with("Aborted: 6 objects processed"));
        assert!(!summary.is_completed());
    }

    #[test]
    fn test_summary_json() {
        let summary =
            RunSummary::aborted(totals(), Duration::from_millis(10), false, "bucket gone".into());
        let value = serde_json::to_value(Event::Summary(&summary)).unwrap();
        assert_eq!(value["event"], "summary");
        assert_eq!(value["status"], "aborted");
        assert_eq!(value["processed"], 6);
        assert_eq!(value["transferred"], 3);
        assert_eq!(value["bytes"], 2048);
        assert_eq!(value["error"], "bucket gone");
    }

    #[test]
    fn test_item_json() {
        let result = TransferResult::skipped("production/b");
        let value = serde_json::to_value(Event::Item(&result)).unwrap();
        assert_eq!(value["event"], "item");
        assert_eq!(value["key"], "production/b");
        assert_eq!(value["outcome"], "skipped");
        assert!(value.get("error").is_none());
    }
}
