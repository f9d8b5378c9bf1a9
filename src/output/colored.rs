//! Colored formatter implementation with terminal color support
//!
//! Cells are padded before coloring so ANSI escapes never skew column widths.

use crate::{
    error::{AppError, Result},
    suite::{CheckOutcome, SuiteReport},
    types::CheckStatus,
};
use super::formatter::{
    align_text, column_widths, format_duration, is_pass, outcome_detail, outcome_row,
    results_columns, FormattingOptions, OutputFormatter, RowData,
};
use std::fmt::Write as _;
use colored::*;

/// Color scheme configuration
#[derive(Debug, Clone)]
pub struct ColorScheme {
    pub header: Color,
    pub success: Color,
    pub warning: Color,
    pub error: Color,
    pub info: Color,
    pub muted: Color,
    pub border: Color,
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self {
            header: Color::Blue,
            success: Color::Green,
            warning: Color::Yellow,
            error: Color::Red,
            info: Color::Cyan,
            muted: Color::BrightBlack,
            border: Color::BrightBlack,
        }
    }
}

/// Colored formatter implementation
pub struct ColoredFormatter {
    options: FormattingOptions,
    color_scheme: ColorScheme,
}

impl ColoredFormatter {
    /// Create a new colored formatter with options
    pub fn new(options: FormattingOptions) -> Self {
        Self {
            options,
            color_scheme: ColorScheme::default(),
        }
    }

    /// Create a colored formatter with custom color scheme
    pub fn with_color_scheme(options: FormattingOptions, color_scheme: ColorScheme) -> Self {
        Self { options, color_scheme }
    }

    /// Apply color to text if colors are enabled
    fn colorize(&self, text: &str, color: Color) -> ColoredString {
        if self.options.enable_color {
            text.color(color)
        } else {
            text.normal()
        }
    }

    fn bold(&self, text: &str) -> ColoredString {
        if self.options.enable_color {
            text.bold()
        } else {
            text.normal()
        }
    }

    /// Bold and colored, or plain when colors are disabled
    fn emphasize(&self, text: &str, color: Color) -> ColoredString {
        if self.options.enable_color {
            text.bold().color(color)
        } else {
            text.normal()
        }
    }

    fn status_color(&self, status: CheckStatus) -> Color {
        match status {
            CheckStatus::Passed => self.color_scheme.success,
            CheckStatus::Failed => self.color_scheme.error,
            CheckStatus::TimedOut => self.color_scheme.warning,
        }
    }

    fn status_symbol(status: CheckStatus) -> &'static str {
        match status {
            CheckStatus::Passed => "✓",
            CheckStatus::Failed => "✗",
            CheckStatus::TimedOut => "⏱",
        }
    }

    /// Colored count line that stays muted when the count is zero
    fn count_line(&self, label: &str, count: usize, color: Color) -> String {
        let value = count.to_string();
        let value = if count == 0 {
            self.colorize(&value, self.color_scheme.muted)
        } else {
            self.colorize(&value, color)
        };
        format!("{:<17} {}", label, value)
    }
}

impl OutputFormatter for ColoredFormatter {
    fn format_header(&self, title: &str) -> Result<String> {
        let mut output = String::new();
        let border = "═".repeat(title.chars().count() + 4);

        writeln!(output, "{}", self.colorize(&border, self.color_scheme.border))
            .map_err(|e| AppError::io(format!("Failed to format header: {}", e)))?;
        writeln!(output, "  {}  ", self.emphasize(title, self.color_scheme.header))
            .map_err(|e| AppError::io(format!("Failed to format header: {}", e)))?;
        write!(output, "{}", self.colorize(&border, self.color_scheme.border))
            .map_err(|e| AppError::io(format!("Failed to format header: {}", e)))?;

        Ok(output)
    }

    fn format_run_info(&self, report: &SuiteReport) -> Result<String> {
        Ok(format!(
            "Backend: {}  External port: {}  Routers: {}",
            self.colorize(&report.backend_id, self.color_scheme.info),
            self.colorize(&report.external_port.to_string(), self.color_scheme.info),
            report.total()
        ))
    }

    fn format_results_table(&self, report: &SuiteReport) -> Result<String> {
        if report.outcomes.is_empty() {
            return Ok(self.colorize("No router addresses were checked.", self.color_scheme.muted).to_string());
        }

        let columns = results_columns();
        let rows: Vec<RowData> = report.outcomes.iter().map(outcome_row).collect();
        let widths = column_widths(&columns, &rows);
        let rule_width = widths.iter().sum::<usize>() + 2 * widths.len();
        let rule = self.colorize(&"─".repeat(rule_width), self.color_scheme.border);

        let mut output = String::new();

        let header: Vec<String> = columns
            .iter()
            .zip(&widths)
            .map(|(col, &w)| align_text(col.header, w, &col.alignment))
            .collect();
        writeln!(output, "{}", self.bold(header.join("  ").trim_end()))
            .map_err(|e| AppError::io(format!("Failed to format table: {}", e)))?;
        writeln!(output, "{}", rule)
            .map_err(|e| AppError::io(format!("Failed to format table: {}", e)))?;

        for (outcome, row) in report.outcomes.iter().zip(&rows) {
            let color = self.status_color(outcome.status());
            let cells: Vec<String> = row
                .iter()
                .zip(&widths)
                .zip(&columns)
                .enumerate()
                .map(|(idx, ((cell, &w), col))| {
                    let padded = align_text(cell, w, &col.alignment);
                    match idx {
                        1 => self.emphasize(&padded, color).to_string(),
                        4 if !is_pass(outcome) => self.colorize(&padded, color).to_string(),
                        _ => padded,
                    }
                })
                .collect();

            writeln!(output, "{}", cells.join("  ").trim_end())
                .map_err(|e| AppError::io(format!("Failed to format table: {}", e)))?;

            if self.options.verbose_mode {
                if let Ok(probe) = &outcome.result {
                    writeln!(
                        output,
                        "  {} sent [{}] received [{}]",
                        self.colorize("↳", self.color_scheme.muted),
                        probe.message,
                        probe.response
                    )
                    .map_err(|e| AppError::io(format!("Failed to format table: {}", e)))?;
                }
            }
        }

        write!(output, "{}", rule)
            .map_err(|e| AppError::io(format!("Failed to format table: {}", e)))?;

        Ok(output)
    }

    fn format_outcome(&self, outcome: &CheckOutcome) -> Result<String> {
        let status = outcome.status();
        let label = format!("{} {}", Self::status_symbol(status), status.as_str());

        Ok(format!(
            "{} {} in {}: {}",
            self.emphasize(&label, self.status_color(status)),
            self.bold(&outcome.address()),
            format_duration(outcome.elapsed),
            outcome_detail(outcome)
        ))
    }

    fn format_summary(&self, report: &SuiteReport) -> Result<String> {
        let mut output = String::new();

        writeln!(output, "{}", self.emphasize("Summary", self.color_scheme.header))
            .map_err(|e| AppError::io(format!("Failed to format summary: {}", e)))?;
        writeln!(output, "{:<17} {}", "Total Duration:", format_duration(report.total_duration))
            .map_err(|e| AppError::io(format!("Failed to format summary: {}", e)))?;
        writeln!(output, "{:<17} {}", "Routers Checked:", report.total())
            .map_err(|e| AppError::io(format!("Failed to format summary: {}", e)))?;
        writeln!(output, "{}", self.count_line("Passed:", report.passed(), self.color_scheme.success))
            .map_err(|e| AppError::io(format!("Failed to format summary: {}", e)))?;
        writeln!(output, "{}", self.count_line("Failed:", report.failed(), self.color_scheme.error))
            .map_err(|e| AppError::io(format!("Failed to format summary: {}", e)))?;
        write!(output, "{}", self.count_line("Timed Out:", report.timed_out(), self.color_scheme.warning))
            .map_err(|e| AppError::io(format!("Failed to format summary: {}", e)))?;

        Ok(output)
    }

    fn format_error(&self, error: &str) -> Result<String> {
        Ok(format!("{} {}", self.emphasize("✗ ERROR:", self.color_scheme.error), error))
    }

    fn format_warning(&self, warning: &str) -> Result<String> {
        Ok(format!("{} {}", self.emphasize("⚠ WARNING:", self.color_scheme.warning), warning))
    }

    fn format_success(&self, message: &str) -> Result<String> {
        Ok(format!("{} {}", self.emphasize("✓ SUCCESS:", self.color_scheme.success), message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::formatter::test_support::*;

    fn uncolored() -> ColoredFormatter {
        ColoredFormatter::new(FormattingOptions { enable_color: false, ..FormattingOptions::default() })
    }

    #[test]
    fn test_table_without_colors_has_aligned_rows() {
        let report = report(vec![passed("10.0.0.1"), mismatched("10.0.0.22")]);
        let table = uncolored().format_results_table(&report).unwrap();
        let lines: Vec<&str> = table.lines().collect();

        // header, rule, two rows, rule
        assert_eq!(lines.len(), 5);
        assert!(lines[0].starts_with("Router"));
        let status_col = lines[0].find("Status").unwrap();
        assert_eq!(lines[2].find("PASS"), Some(status_col));
        assert_eq!(lines[3].find("FAIL"), Some(status_col));
    }

    #[test]
    fn test_outcome_symbols() {
        let formatter = uncolored();

        assert!(formatter.format_outcome(&passed("10.0.0.1")).unwrap().starts_with("✓ PASS"));
        assert!(formatter.format_outcome(&mismatched("10.0.0.1")).unwrap().starts_with("✗ FAIL"));
        assert!(formatter.format_outcome(&timed_out("10.0.0.1")).unwrap().starts_with("⏱ TIMEOUT"));
    }

    #[test]
    fn test_summary_counts() {
        let report = report(vec![passed("10.0.0.1"), timed_out("10.0.0.2")]);
        let summary = uncolored().format_summary(&report).unwrap();

        assert!(summary.contains("Routers Checked:  2"));
        assert!(summary.contains("Passed:           1"));
        assert!(summary.contains("Failed:           0"));
        assert!(summary.contains("Timed Out:        1"));
    }

    #[test]
    fn test_colored_output_contains_escapes() {
        colored::control::set_override(true);
        let formatter = ColoredFormatter::new(FormattingOptions::default());
        let line = formatter.format_error("boom").unwrap();
        colored::control::unset_override();

        assert!(line.contains("\u{1b}["));
        assert!(line.ends_with("boom"));
    }
}
