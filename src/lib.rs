//! TCP Routing Acceptance Tests
//!
//! Verifies that a TCP router forwards an external port to the intended
//! backend. A probe connects through each router address, sends a
//! timestamped message and expects the backend to echo it back prefixed
//! with its identity. The crate also ships the identity echo server used
//! as that backend.

pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod output;
pub mod probe;
pub mod receiver;
pub mod suite;
pub mod types;

// Re-export commonly used types
pub use error::{AppError, Result};
pub use models::{Config, RouteMapping, validate_tcp_route_mapping};
pub use probe::{ProbeConfig, ProbeError, ProbeMessage, ProbeReport, ProbeRequest, ProbeState, RouteProbe, RouteVerifier};
pub use receiver::IdentityEchoServer;
pub use suite::{CheckFailure, CheckOutcome, RouteCheckSuite, SuiteReport};
pub use types::{CheckStatus, TrailingBytePolicy};

/// Application version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");

/// Default configuration values
pub mod defaults {
    use std::time::Duration;

    pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(3);
    pub const DEFAULT_CHECK_TIMEOUT: Duration = Duration::from_secs(120);
    pub const DEFAULT_BACKEND_ID: &str = "server1";
    pub const DEFAULT_TRAILING_GRACE: Duration = Duration::from_millis(100);
    pub const DEFAULT_ENABLE_COLOR: bool = true;
    pub const DEFAULT_RECEIVER_ADDRESS: &str = "0.0.0.0:3333";
}
