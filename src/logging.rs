//! Structured logging for the route checks
//!
//! Entries carry a level, the component that wrote them, an optional
//! correlation id and free-form fields. Correlation ids are always set by the
//! caller on the entry itself; loggers only share the run's session id.

use crate::models::Config;
use crate::probe::ProbeError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::{self, Write};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Log level enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LogLevel {
    /// Probe state transitions
    Trace = 0,
    /// Operation boundaries and failure details
    Debug = 1,
    /// Run progress
    Info = 2,
    /// Failed checks and accept errors
    Warn = 3,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "TRACE",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
        }
    }

    /// ANSI color used for the level column
    pub fn color_code(&self) -> &'static str {
        match self {
            LogLevel::Trace => "\x1b[37m",
            LogLevel::Debug => "\x1b[36m",
            LogLevel::Info => "\x1b[32m",
            LogLevel::Warn => "\x1b[33m",
        }
    }

    pub fn reset_code() -> &'static str {
        "\x1b[0m"
    }
}

/// Log entry structure for structured logging
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
    /// Component that wrote the entry
    pub logger: String,
    /// Ties the entries of one route check together
    pub correlation_id: Option<String>,
    pub fields: HashMap<String, serde_json::Value>,
}

/// Log output format options
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LogFormat {
    /// Human-readable console format
    Console,
    /// One JSON object per line
    Json,
}

/// State shared by a logger and every logger derived from it with `named`
#[derive(Debug, Default)]
struct LogContext {
    session_id: Option<String>,
}

/// Logger with console and JSON output
#[derive(Clone)]
pub struct Logger {
    min_level: LogLevel,
    use_color: bool,
    format: LogFormat,
    name: String,
    context: Arc<RwLock<LogContext>>,
    #[cfg(test)]
    sink: Option<Arc<std::sync::Mutex<Vec<LogEntry>>>>,
}

impl Logger {
    /// Console logger at Info level
    pub fn new(name: String) -> Self {
        Self {
            min_level: LogLevel::Info,
            use_color: true,
            format: LogFormat::Console,
            name,
            context: Arc::new(RwLock::new(LogContext::default())),
            #[cfg(test)]
            sink: None,
        }
    }

    /// Level and format follow `--debug` and `--verbose`
    pub fn with_config(name: String, config: &Config) -> Self {
        let (min_level, format) = if config.debug {
            (LogLevel::Debug, LogFormat::Json)
        } else if config.verbose {
            (LogLevel::Info, LogFormat::Console)
        } else {
            (LogLevel::Warn, LogFormat::Console)
        };

        Self {
            min_level,
            use_color: config.enable_color,
            format,
            ..Self::new(name)
        }
    }

    /// Same settings and shared context under a different component name
    pub fn named(&self, name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..self.clone()
        }
    }

    /// Tag every entry written through this logger or its `named` siblings
    pub async fn set_session_id(&self, session_id: String) {
        self.context.write().await.session_id = Some(session_id);
    }

    /// Log the start of an operation and return its fresh correlation id
    pub async fn start_operation(&self, operation_name: &str) -> String {
        let correlation_id = Uuid::new_v4().to_string();

        self.debug(&format!("Started operation: {}", operation_name))
            .correlation_id(&correlation_id)
            .field("operation", operation_name)
            .field("operation_type", "start")
            .log()
            .await;

        correlation_id
    }

    pub async fn end_operation(&self, correlation_id: &str, operation_name: &str, success: bool) {
        let level = if success { LogLevel::Info } else { LogLevel::Warn };
        self.log(level, &format!("Completed operation: {} (success: {})", operation_name, success))
            .correlation_id(correlation_id)
            .field("operation", operation_name)
            .field("operation_type", "end")
            .field("success", success)
            .log()
            .await;
    }

    pub fn log(&self, level: LogLevel, message: &str) -> LogEntryBuilder<'_> {
        LogEntryBuilder::new(self, level, message.to_string())
    }

    pub fn trace(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Trace, message)
    }

    pub fn debug(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Debug, message)
    }

    pub fn info(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Info, message)
    }

    pub fn warn(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Warn, message)
    }

    pub fn would_log(&self, level: LogLevel) -> bool {
        level >= self.min_level
    }

    async fn write_entry(&self, mut entry: LogEntry) {
        if !self.would_log(entry.level) {
            return;
        }

        if let Some(session_id) = &self.context.read().await.session_id {
            entry.fields.insert("session_id".to_string(), serde_json::Value::String(session_id.clone()));
        }

        #[cfg(test)]
        {
            if let Some(sink) = &self.sink {
                sink.lock().unwrap().push(entry);
                return;
            }
        }

        let output = self.render(&entry);
        if entry.level >= LogLevel::Warn {
            let _ = writeln!(io::stderr(), "{}", output);
        } else {
            let _ = writeln!(io::stdout(), "{}", output);
        }
    }

    fn render(&self, entry: &LogEntry) -> String {
        match self.format {
            LogFormat::Console => self.format_console(entry),
            LogFormat::Json => self.format_json(entry),
        }
    }

    fn format_console(&self, entry: &LogEntry) -> String {
        let level = if self.use_color {
            format!("{}{:>5}{}", entry.level.color_code(), entry.level.as_str(), LogLevel::reset_code())
        } else {
            format!("{:>5}", entry.level.as_str())
        };

        let mut output = format!(
            "{} {} [{}] {}",
            entry.timestamp.format("%Y-%m-%d %H:%M:%S%.3f"),
            level,
            entry.logger,
            entry.message
        );

        if let Some(correlation_id) = &entry.correlation_id {
            let short = correlation_id.get(..8).unwrap_or(correlation_id);
            output.push_str(&format!(" [{}]", short));
        }

        if !entry.fields.is_empty() {
            let mut fields: Vec<String> = entry.fields.iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect();
            fields.sort();
            output.push_str(&format!(" {{{}}}", fields.join(", ")));
        }

        output
    }

    fn format_json(&self, entry: &LogEntry) -> String {
        serde_json::to_string(entry).unwrap_or_else(|e| {
            format!("{{\"message\": {:?}, \"serialize_error\": {:?}}}", entry.message, e.to_string())
        })
    }

    /// Trace-level logger that keeps entries in memory instead of printing
    #[cfg(test)]
    pub(crate) fn capturing(name: &str) -> (Self, Arc<std::sync::Mutex<Vec<LogEntry>>>) {
        let sink = Arc::new(std::sync::Mutex::new(Vec::new()));
        let logger = Self {
            min_level: LogLevel::Trace,
            sink: Some(Arc::clone(&sink)),
            ..Self::new(name.to_string())
        };
        (logger, sink)
    }
}

/// Builder for one log entry, written by `log()`
pub struct LogEntryBuilder<'a> {
    logger: &'a Logger,
    entry: LogEntry,
}

impl<'a> LogEntryBuilder<'a> {
    fn new(logger: &'a Logger, level: LogLevel, message: String) -> Self {
        Self {
            logger,
            entry: LogEntry {
                timestamp: Utc::now(),
                level,
                message,
                logger: logger.name.clone(),
                correlation_id: None,
                fields: HashMap::new(),
            },
        }
    }

    pub fn correlation_id(mut self, id: &str) -> Self {
        self.entry.correlation_id = Some(id.to_string());
        self
    }

    /// Set the correlation id when there is one
    pub fn maybe_correlation_id(mut self, id: Option<&str>) -> Self {
        self.entry.correlation_id = id.map(str::to_string);
        self
    }

    pub fn field<T: Serialize>(mut self, key: &str, value: T) -> Self {
        if let Ok(json_value) = serde_json::to_value(value) {
            self.entry.fields.insert(key.to_string(), json_value);
        }
        self
    }

    /// Where and how a probe failed
    pub fn probe_error(self, error: &ProbeError) -> Self {
        self.field("probe_error", error.kind())
            .field("failed_in", error.state().as_str())
            .field("error", error.to_string())
    }

    pub async fn log(self) {
        self.logger.write_entry(self.entry).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(level: LogLevel) -> LogEntry {
        LogEntry {
            timestamp: Utc::now(),
            level,
            message: "route 127.0.0.1:61000 -> connecting".to_string(),
            logger: "PROBE".to_string(),
            correlation_id: Some("0123456789abcdef".to_string()),
            fields: HashMap::from([("state".to_string(), serde_json::json!("Connecting"))]),
        }
    }

    #[test]
    fn test_log_level_ordering() {
        assert!(LogLevel::Trace < LogLevel::Debug);
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Warn);
    }

    #[test]
    fn test_logger_levels_from_config() {
        let quiet = Logger::with_config("SUITE".to_string(), &Config::default());
        assert!(!quiet.would_log(LogLevel::Info));
        assert!(quiet.would_log(LogLevel::Warn));
        assert_eq!(quiet.format, LogFormat::Console);

        let verbose = Logger::with_config("SUITE".to_string(), &Config { verbose: true, ..Config::default() });
        assert!(verbose.would_log(LogLevel::Info));
        assert!(!verbose.would_log(LogLevel::Debug));

        let debug = Logger::with_config("SUITE".to_string(), &Config { debug: true, ..Config::default() });
        assert!(debug.would_log(LogLevel::Debug));
        assert!(!debug.would_log(LogLevel::Trace));
        assert_eq!(debug.format, LogFormat::Json);
    }

    #[test]
    fn test_console_format() {
        let config = Config { verbose: true, enable_color: false, ..Config::default() };
        let line = Logger::with_config("PROBE".to_string(), &config).render(&entry(LogLevel::Info));

        assert!(line.contains(" INFO [PROBE] route 127.0.0.1:61000 -> connecting"));
        assert!(line.contains("[01234567]"));
        assert!(line.contains("state=\"Connecting\""));
        assert!(!line.contains('\u{1b}'));
    }

    #[test]
    fn test_json_format() {
        let config = Config { debug: true, ..Config::default() };
        let line = Logger::with_config("PROBE".to_string(), &config).render(&entry(LogLevel::Warn));

        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["level"], "Warn");
        assert_eq!(value["logger"], "PROBE");
        assert_eq!(value["correlation_id"], "0123456789abcdef");
        assert_eq!(value["fields"]["state"], "Connecting");
    }

    #[test]
    fn test_named_shares_context() {
        let logger = Logger::new("SUITE".to_string());
        let probe_logger = logger.named("PROBE");
        assert_eq!(probe_logger.name, "PROBE");
        assert!(Arc::ptr_eq(&logger.context, &probe_logger.context));
    }

    #[tokio::test]
    async fn test_operations_do_not_leak_ids() {
        let (logger, sink) = Logger::capturing("SUITE");
        let first = logger.start_operation("route check 10.0.0.1:61000").await;
        let second = logger.start_operation("route check 10.0.0.2:61000").await;
        assert!(Uuid::parse_str(&first).is_ok());
        assert_ne!(first, second);

        // An entry without an explicit id must not pick up either operation's id
        logger.named("PROBE").trace("unrelated").log().await;
        logger.end_operation(&first, "route check 10.0.0.1:61000", true).await;

        let entries = sink.lock().unwrap();
        let ids: Vec<Option<&str>> = entries.iter().map(|e| e.correlation_id.as_deref()).collect();
        assert_eq!(ids, vec![Some(first.as_str()), Some(second.as_str()), None, Some(first.as_str())]);
        assert_eq!(entries[3].fields["operation_type"], "end");
    }

    #[tokio::test]
    async fn test_session_id_is_shared() {
        let (logger, sink) = Logger::capturing("APP");
        logger.set_session_id("run-1".to_string()).await;
        logger.named("PROBE").debug("connected").log().await;

        let entries = sink.lock().unwrap();
        assert_eq!(entries[0].logger, "PROBE");
        assert_eq!(entries[0].fields["session_id"], "run-1");
    }

    #[tokio::test]
    async fn test_maybe_correlation_id() {
        let (logger, sink) = Logger::capturing("PROBE");
        logger.trace("a").maybe_correlation_id(Some("abc")).log().await;
        logger.trace("b").maybe_correlation_id(None).log().await;

        let entries = sink.lock().unwrap();
        assert_eq!(entries[0].correlation_id.as_deref(), Some("abc"));
        assert!(entries[1].correlation_id.is_none());
    }
}
