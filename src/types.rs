//! Type definitions and aliases

use std::time::Duration;
use serde::{Deserialize, Serialize};

// Re-export commonly used types
pub use crate::error::{AppError, Result};

/// What a probe does with bytes that arrive after the expected response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrailingBytePolicy {
    /// Read exactly the expected length and ignore anything after it
    Ignore,
    /// Wait up to `grace` for more bytes and fail the probe if any arrive
    Reject { grace: Duration },
}

impl Default for TrailingBytePolicy {
    fn default() -> Self {
        Self::Ignore
    }
}

impl TrailingBytePolicy {
    /// Human-readable name for summaries
    pub fn name(&self) -> String {
        match self {
            Self::Ignore => "ignore".to_string(),
            Self::Reject { grace } => format!("reject (grace {}ms)", grace.as_millis()),
        }
    }
}

/// Final status of a single route check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CheckStatus {
    /// The backend echoed the probe with the expected identity
    Passed,
    /// The probe reported an error
    Failed,
    /// The probe did not finish within the suite's time limit
    TimedOut,
}

impl CheckStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Passed => "PASS",
            Self::Failed => "FAIL",
            Self::TimedOut => "TIMEOUT",
        }
    }
}
