//! Output formatting and display system
//!
//! Renders suite reports as colored or plain text tables.

mod formatter;
mod colored;

pub use formatter::{
    OutputFormatter,
    PlainFormatter,
    FormattingOptions,
    Alignment,
    Column,
    RowData,
    format_duration,
};
pub use colored::{ColoredFormatter, ColorScheme};

use crate::{
    error::Result,
    suite::{CheckOutcome, SuiteReport},
};

/// Output formatting factory for creating appropriate formatters
pub struct OutputFormatterFactory;

impl OutputFormatterFactory {
    /// Create a formatter based on color support and preferences
    pub fn create_formatter(enable_color: bool, verbose: bool) -> Box<dyn OutputFormatter> {
        let options = FormattingOptions {
            enable_color,
            verbose_mode: verbose,
            ..FormattingOptions::default()
        };

        if enable_color {
            Box::new(ColoredFormatter::new(options))
        } else {
            Box::new(PlainFormatter::new(options))
        }
    }

    /// Create a plain text formatter for scripts/logs
    pub fn create_plain_formatter() -> Box<dyn OutputFormatter> {
        Self::create_formatter(false, false)
    }
}

/// Main output coordinator that handles all result display
pub struct OutputCoordinator {
    formatter: Box<dyn OutputFormatter>,
}

impl OutputCoordinator {
    /// Create a new output coordinator with the specified formatter
    pub fn new(formatter: Box<dyn OutputFormatter>) -> Self {
        Self { formatter }
    }

    /// Display a complete suite report
    pub fn display_report(&self, report: &SuiteReport) -> Result<String> {
        let mut output = String::new();

        output.push_str(&self.formatter.format_header("TCP Route Verification Results")?);
        output.push('\n');
        output.push_str(&self.formatter.format_run_info(report)?);
        output.push_str("\n\n");

        output.push_str(&self.formatter.format_results_table(report)?);
        output.push_str("\n\n");

        output.push_str(&self.formatter.format_summary(report)?);
        output.push_str("\n\n");

        if report.is_success() {
            output.push_str(&self.formatter.format_success(&format!(
                "backend '{}' answered through all {} router(s)",
                report.backend_id,
                report.total()
            ))?);
        } else {
            output.push_str(&self.formatter.format_error(&format!(
                "{} of {} route check(s) did not pass",
                report.total() - report.passed(),
                report.total()
            ))?);
        }

        Ok(output)
    }

    /// Display one outcome as it completes
    pub fn display_outcome(&self, outcome: &CheckOutcome) -> Result<String> {
        self.formatter.format_outcome(outcome)
    }
}
