//! Error handling for the TCP routing acceptance checks
//!
//! Failures of individual route checks are not errors here; they are carried
//! in the suite report and only become `TestExecution` once the run is over.

use thiserror::Error;

/// Errors that end a run
#[derive(Error, Debug)]
pub enum AppError {
    /// Bad or missing settings from the config file, environment or flags
    #[error("Configuration error: {0}")]
    Config(String),

    /// A route mapping that cannot describe a reachable route
    #[error("Validation error: {0}")]
    Validation(String),

    /// Files, sockets outside a check, and output rendering
    #[error("I/O error: {0}")]
    Io(String),

    /// Malformed JSON in a config or mapping file
    #[error("Parsing error: {0}")]
    Parse(String),

    /// At least one route check failed or timed out
    #[error("Test execution error: {0}")]
    TestExecution(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }

    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation(message.into())
    }

    pub fn io<S: Into<String>>(message: S) -> Self {
        Self::Io(message.into())
    }

    pub fn test_execution<S: Into<String>>(message: S) -> Self {
        Self::TestExecution(message.into())
    }

    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal(message.into())
    }

    /// Short tag printed in front of the message
    pub fn category(&self) -> &'static str {
        match self {
            Self::Config(_) => "CONFIG",
            Self::Validation(_) => "VALIDATION",
            Self::Io(_) => "IO",
            Self::Parse(_) => "PARSE",
            Self::TestExecution(_) => "TEST",
            Self::Internal(_) => "INTERNAL",
        }
    }

    /// Message plus a hint on what to look at next
    pub fn user_friendly_message(&self) -> String {
        let hint = match self {
            Self::Config(_) => "Check the file $CONFIG points to, your .env file, or command line arguments.",
            Self::Validation(_) => "A route mapping needs a router group guid, a backend IP and non-zero ports.",
            Self::Io(_) => "Check file paths and permissions.",
            Self::Parse(_) => "Check the JSON syntax of your configuration or mapping file.",
            Self::TestExecution(_) => "Re-run with --verbose to see what every router address returned.",
            Self::Internal(_) => "This is likely a bug. Please report it with the error details.",
        };
        format!("{}\n\nSuggestion: {}", self, hint)
    }

    /// Process exit status for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Validation(_) | Self::Parse(_) => 1,
            Self::Io(_) => 5,
            Self::TestExecution(_) => 6,
            Self::Internal(_) => 99,
        }
    }

    /// `[CATEGORY] message`, colored by severity when `use_color` is set
    pub fn format_for_console(&self, use_color: bool) -> String {
        let category = self.category();
        let message = self.to_string();

        if !use_color {
            return format!("[{}] {}", category, message);
        }

        use colored::{Color, Colorize};
        let color = match self {
            Self::Config(_) | Self::Validation(_) | Self::Parse(_) => Color::Red,
            Self::TestExecution(_) => Color::Yellow,
            Self::Io(_) => Color::Cyan,
            Self::Internal(_) => Color::BrightRed,
        };
        format!("[{}] {}", category.color(color).bold(), message.color(color))
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::io(error.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        Self::Parse(format!("JSON parse error: {}", error))
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

/// Prefix an error with what was being attempted, keeping its category
pub trait ErrorContext<T> {
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;

    fn context(self, message: &'static str) -> Result<T>;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: Into<AppError>,
{
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| {
            let context = f();
            match e.into() {
                AppError::Config(msg) => AppError::Config(format!("{}: {}", context, msg)),
                AppError::Validation(msg) => AppError::Validation(format!("{}: {}", context, msg)),
                AppError::Io(msg) => AppError::Io(format!("{}: {}", context, msg)),
                AppError::Parse(msg) => AppError::Parse(format!("{}: {}", context, msg)),
                other => AppError::internal(format!("{}: {}", context, other)),
            }
        })
    }

    fn context(self, message: &'static str) -> Result<T> {
        self.with_context(|| message.to_string())
    }
}

/// Prints errors to stderr, with hints in verbose mode
pub struct ErrorReporter {
    pub use_color: bool,
    pub verbose: bool,
}

impl ErrorReporter {
    pub fn new(use_color: bool, verbose: bool) -> Self {
        Self { use_color, verbose }
    }

    pub fn report_error(&self, error: &AppError) {
        eprintln!("{}", error.format_for_console(self.use_color));

        if self.verbose {
            eprintln!();
            eprintln!("{}", error.user_friendly_message());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_error_categories() {
        assert_eq!(AppError::config("x").category(), "CONFIG");
        assert_eq!(AppError::validation("x").category(), "VALIDATION");
        assert_eq!(AppError::test_execution("x").category(), "TEST");
        assert_eq!(AppError::internal("x").category(), "INTERNAL");
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(AppError::config("bad").exit_code(), 1);
        assert_eq!(AppError::validation("bad").exit_code(), 1);
        assert_eq!(AppError::io("disk").exit_code(), 5);
        assert_eq!(AppError::test_execution("failed").exit_code(), 6);
        assert_eq!(AppError::internal("bug").exit_code(), 99);
    }

    #[test]
    fn test_io_conversion() {
        let err: AppError = io::Error::new(io::ErrorKind::NotFound, "missing").into();
        assert!(matches!(err, AppError::Io(_)));
    }

    #[test]
    fn test_json_conversion_is_parse_error() {
        let err: AppError = serde_json::from_str::<serde_json::Value>("{").unwrap_err().into();
        assert!(matches!(err, AppError::Parse(_)));
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_context_keeps_category() {
        let result: std::result::Result<(), AppError> = Err(AppError::Parse("unexpected token".to_string()));
        let err = result.context("Failed to read config.json").unwrap_err();
        match err {
            AppError::Parse(msg) => {
                assert!(msg.starts_with("Failed to read config.json"));
                assert!(msg.contains("unexpected token"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_user_friendly_message_has_hint() {
        let message = AppError::test_execution("1 of 2 route checks failed").user_friendly_message();
        assert!(message.starts_with("Test execution error: 1 of 2 route checks failed"));
        assert!(message.contains("Suggestion: Re-run with --verbose"));
    }

    #[test]
    fn test_plain_console_format() {
        let err = AppError::config("no router addresses configured");
        assert_eq!(
            err.format_for_console(false),
            "[CONFIG] Configuration error: no router addresses configured"
        );
    }
}
