//! Colored terminal output utilities.
//!
//! Status lines go to stderr; results go to stdout so they can be piped.

use std::io::{self, Write};

use console::{Style, Term};
use microb_pipeline::RunReport;

/// Terminal output formatter.
pub(crate) struct Output {
    term: Term,
    green: Style,
    yellow: Style,
    red: Style,
    cyan_bold: Style,
}

impl Output {
    /// Create a new output formatter.
    #[must_use]
    pub(crate) fn new() -> Self {
        Self {
            term: Term::stderr(),
            green: Style::new().green(),
            yellow: Style::new().yellow(),
            red: Style::new().red(),
            cyan_bold: Style::new().cyan().bold(),
        }
    }

    /// Print an info message.
    pub(crate) fn info(&self, msg: &str) {
        let _ = self.term.write_line(msg);
    }

    /// Print a success message (green).
    pub(crate) fn success(&self, msg: &str) {
        let _ = self.term.write_line(&self.green.apply_to(msg).to_string());
    }

    /// Print a warning message (yellow).
    pub(crate) fn warning(&self, msg: &str) {
        let _ = self.term.write_line(&self.yellow.apply_to(msg).to_string());
    }

    /// Print an error message (red).
    pub(crate) fn error(&self, msg: &str) {
        let _ = self.term.write_line(&self.red.apply_to(msg).to_string());
    }

    /// Print a highlighted message (cyan bold).
    pub(crate) fn highlight(&self, msg: &str) {
        let _ = self
            .term
            .write_line(&self.cyan_bold.apply_to(msg).to_string());
    }

    /// Print the counters of a finished run.
    pub(crate) fn report(&self, service: &str, report: &RunReport) {
        self.highlight(&format!("{service}: {} lines processed", report.processed));
        self.info(&format!(
            "  fetched: {}, cached: {}, duplicates: {}, empty: {}",
            report.fetched, report.cached, report.duplicates, report.empty
        ));

        let failed = report.failed + report.panicked;
        if failed == 0 {
            self.success("  failed: 0");
        } else {
            self.error(&format!(
                "  failed: {failed} ({:.1}%)",
                report.failure_rate() * 100.0
            ));
        }
        if report.cancelled > 0 {
            self.warning(&format!(
                "  cancelled: {} lines dropped after the runtime limit",
                report.cancelled
            ));
        }
    }
}

/// Write one result line to stdout.
///
/// Called from worker threads; the stdout lock keeps lines whole. Write
/// errors (such as a closed pipe) are ignored.
pub(crate) fn emit(line: &str) {
    let mut out = io::stdout().lock();
    let _ = writeln!(out, "{line}");
}
