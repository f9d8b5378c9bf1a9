//! Core formatting traits and implementations
//!
//! This module defines the output formatting interface and provides
//! a plain text implementation with table formatting capabilities.

use crate::{
    error::{AppError, Result},
    suite::{CheckFailure, CheckOutcome, SuiteReport},
    types::CheckStatus,
};
use std::fmt::Write as _;
use std::time::Duration;

/// Main trait for output formatting
pub trait OutputFormatter {
    /// Format a header section
    fn format_header(&self, title: &str) -> Result<String>;

    /// Format what was checked: backend, port and router count
    fn format_run_info(&self, report: &SuiteReport) -> Result<String>;

    /// Format one row per router address
    fn format_results_table(&self, report: &SuiteReport) -> Result<String>;

    /// Format one check as a single line
    fn format_outcome(&self, outcome: &CheckOutcome) -> Result<String>;

    /// Format pass/fail counts
    fn format_summary(&self, report: &SuiteReport) -> Result<String>;

    /// Format error messages
    fn format_error(&self, error: &str) -> Result<String>;

    /// Format warning messages
    fn format_warning(&self, warning: &str) -> Result<String>;

    /// Format success messages
    fn format_success(&self, message: &str) -> Result<String>;
}

/// Configuration options for formatting
#[derive(Debug, Clone)]
pub struct FormattingOptions {
    /// Enable colored output
    pub enable_color: bool,
    /// Show sent and received payloads for each check
    pub verbose_mode: bool,
    /// Show table borders
    pub table_borders: bool,
}

impl Default for FormattingOptions {
    fn default() -> Self {
        Self {
            enable_color: true,
            verbose_mode: false,
            table_borders: true,
        }
    }
}

/// Text alignment options
#[derive(Debug, Clone)]
pub enum Alignment {
    Left,
    Right,
}

/// Column definition for table formatting
#[derive(Debug, Clone)]
pub struct Column {
    pub header: &'static str,
    pub alignment: Alignment,
    pub max_width: usize,
}

/// Row data for table formatting
pub type RowData = Vec<String>;

/// Detail is last and never truncated
pub(crate) fn results_columns() -> Vec<Column> {
    vec![
        Column { header: "Router", alignment: Alignment::Left, max_width: 48 },
        Column { header: "Status", alignment: Alignment::Left, max_width: 7 },
        Column { header: "Connect", alignment: Alignment::Right, max_width: 10 },
        Column { header: "Round Trip", alignment: Alignment::Right, max_width: 10 },
        Column { header: "Detail", alignment: Alignment::Left, max_width: usize::MAX },
    ]
}

/// Table cells for one outcome, in `results_columns` order
pub(crate) fn outcome_row(outcome: &CheckOutcome) -> RowData {
    let (connect, round_trip) = match &outcome.result {
        Ok(report) => (format_duration(report.connect_time), format_duration(report.round_trip)),
        Err(_) => ("-".to_string(), format_duration(outcome.elapsed)),
    };

    vec![
        outcome.address(),
        outcome.status().as_str().to_string(),
        connect,
        round_trip,
        outcome_detail(outcome),
    ]
}

/// Short human description of why a check ended the way it did
pub(crate) fn outcome_detail(outcome: &CheckOutcome) -> String {
    match &outcome.result {
        Ok(report) => report.response.clone(),
        Err(CheckFailure::Probe(e)) => format!("{} ({})", e, e.kind()),
        Err(CheckFailure::TimedOut(limit)) => format!("no result within {}", format_duration(*limit)),
    }
}

/// Column widths fitted to headers and content, capped per column
pub(crate) fn column_widths(columns: &[Column], rows: &[RowData]) -> Vec<usize> {
    columns
        .iter()
        .enumerate()
        .map(|(idx, col)| {
            let content = rows
                .iter()
                .filter_map(|row| row.get(idx))
                .map(|cell| cell.chars().count())
                .max()
                .unwrap_or(0);
            content.max(col.header.len()).min(col.max_width)
        })
        .collect()
}

/// Pad or truncate text to exactly `width` characters
pub(crate) fn align_text(text: &str, width: usize, alignment: &Alignment) -> String {
    let len = text.chars().count();
    if len >= width {
        return text.chars().take(width).collect();
    }

    let padding = " ".repeat(width - len);
    match alignment {
        Alignment::Left => format!("{}{}", text, padding),
        Alignment::Right => format!("{}{}", padding, text),
    }
}

/// Format duration in human-readable format
pub fn format_duration(duration: Duration) -> String {
    let ms = duration.as_secs_f64() * 1000.0;
    if ms < 1.0 {
        format!("{:.0}us", ms * 1000.0)
    } else if ms < 1000.0 {
        format!("{:.1}ms", ms)
    } else if ms < 60000.0 {
        format!("{:.2}s", ms / 1000.0)
    } else {
        let minutes = (ms / 60000.0) as u32;
        let seconds = (ms % 60000.0) / 1000.0;
        format!("{}m{:.1}s", minutes, seconds)
    }
}

/// Plain text formatter implementation
pub struct PlainFormatter {
    options: FormattingOptions,
}

impl PlainFormatter {
    /// Create a new plain formatter with options
    pub fn new(options: FormattingOptions) -> Self {
        Self { options }
    }

    /// Create a table with the given columns and data
    fn create_table(&self, columns: &[Column], rows: &[RowData]) -> String {
        let widths = column_widths(columns, rows);
        let mut lines = Vec::new();

        if self.options.table_borders {
            lines.push(self.create_horizontal_border(&widths));
        }
        let headers: RowData = columns.iter().map(|c| c.header.to_string()).collect();
        lines.push(self.create_row(&headers, &widths, columns));
        if self.options.table_borders {
            lines.push(self.create_horizontal_border(&widths));
        }

        for row in rows {
            lines.push(self.create_row(row, &widths, columns));
        }

        if self.options.table_borders {
            lines.push(self.create_horizontal_border(&widths));
        }

        lines.join("\n")
    }

    fn create_row(&self, data: &[String], widths: &[usize], columns: &[Column]) -> String {
        let mut row = String::new();

        if self.options.table_borders {
            row.push('|');
        }

        for ((cell, &width), column) in data.iter().zip(widths).zip(columns) {
            let padded = align_text(cell, width, &column.alignment);
            if self.options.table_borders {
                row.push(' ');
                row.push_str(&padded);
                row.push_str(" |");
            } else {
                row.push_str(&padded);
                row.push_str("  ");
            }
        }

        row.trim_end().to_string()
    }

    fn create_horizontal_border(&self, widths: &[usize]) -> String {
        let mut border = String::from("+");
        for &width in widths {
            border.push_str(&"-".repeat(width + 2));
            border.push('+');
        }
        border
    }
}

impl OutputFormatter for PlainFormatter {
    fn format_header(&self, title: &str) -> Result<String> {
        let mut output = String::new();
        let border = "=".repeat(title.len() + 4);

        writeln!(output, "{}", border)
            .map_err(|e| AppError::io(format!("Failed to format header: {}", e)))?;
        writeln!(output, "  {}  ", title)
            .map_err(|e| AppError::io(format!("Failed to format header: {}", e)))?;
        write!(output, "{}", border)
            .map_err(|e| AppError::io(format!("Failed to format header: {}", e)))?;

        Ok(output)
    }

    fn format_run_info(&self, report: &SuiteReport) -> Result<String> {
        Ok(format!(
            "Backend: {}  External port: {}  Routers: {}",
            report.backend_id,
            report.external_port,
            report.total()
        ))
    }

    fn format_results_table(&self, report: &SuiteReport) -> Result<String> {
        if report.outcomes.is_empty() {
            return Ok("No router addresses were checked.".to_string());
        }

        let rows: Vec<RowData> = report.outcomes.iter().map(outcome_row).collect();
        let mut output = self.create_table(&results_columns(), &rows);

        if self.options.verbose_mode {
            for outcome in &report.outcomes {
                if let Ok(probe) = &outcome.result {
                    write!(output, "\n  {} sent [{}] received [{}]", outcome.address(), probe.message, probe.response)
                        .map_err(|e| AppError::io(format!("Failed to format table: {}", e)))?;
                }
            }
        }

        Ok(output)
    }

    fn format_outcome(&self, outcome: &CheckOutcome) -> Result<String> {
        Ok(format!(
            "[{}] {} in {}: {}",
            outcome.status().as_str(),
            outcome.address(),
            format_duration(outcome.elapsed),
            outcome_detail(outcome)
        ))
    }

    fn format_summary(&self, report: &SuiteReport) -> Result<String> {
        let mut output = String::new();

        writeln!(output, "Summary:")
            .map_err(|e| AppError::io(format!("Failed to format summary: {}", e)))?;
        writeln!(output, "--------")
            .map_err(|e| AppError::io(format!("Failed to format summary: {}", e)))?;
        writeln!(output, "Total Duration:   {}", format_duration(report.total_duration))
            .map_err(|e| AppError::io(format!("Failed to format summary: {}", e)))?;
        writeln!(output, "Routers Checked:  {}", report.total())
            .map_err(|e| AppError::io(format!("Failed to format summary: {}", e)))?;
        writeln!(output, "Passed:           {}", report.passed())
            .map_err(|e| AppError::io(format!("Failed to format summary: {}", e)))?;
        writeln!(output, "Failed:           {}", report.failed())
            .map_err(|e| AppError::io(format!("Failed to format summary: {}", e)))?;
        write!(output, "Timed Out:        {}", report.timed_out())
            .map_err(|e| AppError::io(format!("Failed to format summary: {}", e)))?;

        Ok(output)
    }

    fn format_error(&self, error: &str) -> Result<String> {
        Ok(format!("ERROR: {}", error))
    }

    fn format_warning(&self, warning: &str) -> Result<String> {
        Ok(format!("WARNING: {}", warning))
    }

    fn format_success(&self, message: &str) -> Result<String> {
        Ok(format!("SUCCESS: {}", message))
    }
}

/// Whether an outcome should be rendered as a pass
pub(crate) fn is_pass(outcome: &CheckOutcome) -> bool {
    outcome.status() == CheckStatus::Passed
}
