//! TCP route verification probe
//!
//! A probe opens one TCP connection through a router, writes a timestamped
//! message and expects the backend behind the route to answer with the same
//! message prefixed by its own identity (`<backend_id>:<message>`). Any other
//! answer means the route is missing or wired to the wrong instance.

pub mod message;

pub use message::ProbeMessage;

use crate::{
    logging::Logger,
    types::TrailingBytePolicy,
};
use async_trait::async_trait;
use serde::Serialize;
use std::io;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

/// Stages a single probe moves through. A probe never goes backwards and is
/// not reused once it reaches `Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ProbeState {
    Idle,
    Connecting,
    Sending,
    AwaitingResponse,
    Comparing,
    Success,
    Failure,
    Closed,
}

impl ProbeState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::Sending => "sending",
            Self::AwaitingResponse => "awaiting-response",
            Self::Comparing => "comparing",
            Self::Success => "success",
            Self::Failure => "failure",
            Self::Closed => "closed",
        }
    }
}

/// Ways a probe can fail
#[derive(Error, Debug)]
pub enum ProbeError {
    /// Refused, unreachable and timed-out connects all land here
    #[error("connection to {address} failed: {reason}")]
    Connection { address: String, reason: String },

    #[error("failed to write probe message to {address}: {source}")]
    Write {
        address: String,
        #[source]
        source: io::Error,
    },

    /// Includes the backend closing before the full response arrived
    #[error("failed to read response from {address}: {source}")]
    Read {
        address: String,
        #[source]
        source: io::Error,
    },

    #[error("Message mismatch. Actual=[{actual}], Expected=[{expected}]")]
    Mismatch { actual: String, expected: String },

    #[error("unexpected bytes after response from {address}: [{trailing}]")]
    TrailingBytes { address: String, trailing: String },

    #[error("failed to close connection to {address}: {source}")]
    Close {
        address: String,
        #[source]
        source: io::Error,
    },
}

impl ProbeError {
    /// State the probe was in when it failed
    pub fn state(&self) -> ProbeState {
        match self {
            Self::Connection { .. } => ProbeState::Connecting,
            Self::Write { .. } => ProbeState::Sending,
            Self::Read { .. } => ProbeState::AwaitingResponse,
            Self::Mismatch { .. } | Self::TrailingBytes { .. } => ProbeState::Comparing,
            Self::Close { .. } => ProbeState::Closed,
        }
    }

    /// Short label for reports
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Connection { .. } => "connection",
            Self::Write { .. } => "write",
            Self::Read { .. } => "read",
            Self::Mismatch { .. } => "mismatch",
            Self::TrailingBytes { .. } => "trailing-bytes",
            Self::Close { .. } => "close",
        }
    }
}

/// One route to verify. Built fresh per check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeRequest {
    pub backend_id: String,
    pub router_address: String,
    pub external_port: u16,
    /// Id of the check this request belongs to, stamped on every log entry
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
}

impl ProbeRequest {
    pub fn new(backend_id: impl Into<String>, router_address: impl Into<String>, external_port: u16) -> Self {
        Self {
            backend_id: backend_id.into(),
            router_address: router_address.into(),
            external_port,
            correlation_id: None,
        }
    }

    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }

    /// `router_address:external_port`
    pub fn target_address(&self) -> String {
        join_host_port(&self.router_address, self.external_port)
    }
}

/// Join a host and port, bracketing bare IPv6 literals
pub fn join_host_port(host: &str, port: u16) -> String {
    if host.contains(':') && !host.starts_with('[') {
        format!("[{}]:{}", host, port)
    } else {
        format!("{}:{}", host, port)
    }
}

/// Probe settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeConfig {
    pub connect_timeout: Duration,
    pub trailing_bytes: TrailingBytePolicy,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            connect_timeout: crate::defaults::DEFAULT_CONNECT_TIMEOUT,
            trailing_bytes: TrailingBytePolicy::Ignore,
        }
    }
}

/// What a successful probe observed
#[derive(Debug, Clone, Serialize)]
pub struct ProbeReport {
    pub address: String,
    pub backend_id: String,
    pub message: String,
    pub response: String,
    pub connect_time: Duration,
    pub round_trip: Duration,
}

/// Verifies that a route reaches the expected backend
#[async_trait]
pub trait RouteVerifier: Send + Sync {
    async fn verify(&self, request: &ProbeRequest) -> Result<ProbeReport, ProbeError>;
}

/// TCP probe speaking the identity echo protocol
#[derive(Clone)]
pub struct RouteProbe {
    config: ProbeConfig,
    logger: Logger,
}

impl RouteProbe {
    pub fn new(config: ProbeConfig) -> Self {
        Self {
            config,
            logger: Logger::new("PROBE".to_string()),
        }
    }

    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = logger;
        self
    }

    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }

    /// Verify `router_address:external_port` reaches `backend_id`
    pub async fn verify_route(
        &self,
        backend_id: &str,
        router_address: &str,
        external_port: u16,
    ) -> Result<ProbeReport, ProbeError> {
        let request = ProbeRequest::new(backend_id, router_address, external_port);
        self.verify_with_message(&request, ProbeMessage::now()).await
    }

    /// Run the probe with a caller-built message
    pub async fn verify_with_message(
        &self,
        request: &ProbeRequest,
        message: ProbeMessage,
    ) -> Result<ProbeReport, ProbeError> {
        let address = request.target_address();
        let result = self.exchange(request, &address, &message).await;

        let final_state = match &result {
            Ok(_) => ProbeState::Success,
            Err(_) => ProbeState::Failure,
        };
        self.trace_state(request, final_state, &address).await;
        // The stream was shut down on success and dropped on any failure
        self.trace_state(request, ProbeState::Closed, &address).await;

        if let Err(e) = &result {
            self.logger.debug(&format!("Probe to {} failed: {}", address, e))
                .maybe_correlation_id(request.correlation_id.as_deref())
                .field("address", &address)
                .field("failed_in", e.state().as_str())
                .field("kind", e.kind())
                .log()
                .await;
        }

        result
    }

    async fn exchange(
        &self,
        request: &ProbeRequest,
        address: &str,
        message: &ProbeMessage,
    ) -> Result<ProbeReport, ProbeError> {
        let backend_id = request.backend_id.as_str();
        let started = Instant::now();

        self.trace_state(request, ProbeState::Connecting, address).await;
        let mut stream = self.connect(address).await?;
        let connect_time = started.elapsed();

        self.trace_state(request, ProbeState::Sending, address).await;
        stream.write_all(message.as_bytes()).await.map_err(|source| ProbeError::Write {
            address: address.to_string(),
            source,
        })?;

        self.trace_state(request, ProbeState::AwaitingResponse, address).await;
        let expected = message.expected_response(backend_id);
        let mut buff = vec![0u8; expected.len()];
        stream.read_exact(&mut buff).await.map_err(|source| ProbeError::Read {
            address: address.to_string(),
            source,
        })?;

        self.trace_state(request, ProbeState::Comparing, address).await;
        if buff != expected {
            return Err(ProbeError::Mismatch {
                actual: String::from_utf8_lossy(&buff).into_owned(),
                expected: String::from_utf8_lossy(&expected).into_owned(),
            });
        }
        self.check_trailing_bytes(&mut stream, address).await?;
        let round_trip = started.elapsed();

        stream.shutdown().await.map_err(|source| ProbeError::Close {
            address: address.to_string(),
            source,
        })?;

        Ok(ProbeReport {
            address: address.to_string(),
            backend_id: backend_id.to_string(),
            message: message.to_string(),
            response: String::from_utf8_lossy(&buff).into_owned(),
            connect_time,
            round_trip,
        })
    }

    async fn connect(&self, address: &str) -> Result<TcpStream, ProbeError> {
        match timeout(self.config.connect_timeout, TcpStream::connect(address)).await {
            Ok(Ok(stream)) => Ok(stream),
            Ok(Err(e)) => Err(ProbeError::Connection {
                address: address.to_string(),
                reason: e.to_string(),
            }),
            Err(_) => Err(ProbeError::Connection {
                address: address.to_string(),
                reason: format!("timed out after {}ms", self.config.connect_timeout.as_millis()),
            }),
        }
    }

    async fn check_trailing_bytes(&self, stream: &mut TcpStream, address: &str) -> Result<(), ProbeError> {
        let grace = match self.config.trailing_bytes {
            TrailingBytePolicy::Ignore => return Ok(()),
            TrailingBytePolicy::Reject { grace } => grace,
        };

        let mut extra = [0u8; 256];
        match timeout(grace, stream.read(&mut extra)).await {
            // EOF or silence
            Ok(Ok(0)) | Err(_) => Ok(()),
            Ok(Ok(n)) => Err(ProbeError::TrailingBytes {
                address: address.to_string(),
                trailing: String::from_utf8_lossy(&extra[..n]).into_owned(),
            }),
            Ok(Err(source)) => Err(ProbeError::Read {
                address: address.to_string(),
                source,
            }),
        }
    }

    async fn trace_state(&self, request: &ProbeRequest, state: ProbeState, address: &str) {
        self.logger.trace(&format!("probe {} -> {}", address, state.as_str()))
            .maybe_correlation_id(request.correlation_id.as_deref())
            .field("state", state)
            .log()
            .await;
    }
}

#[async_trait]
impl RouteVerifier for RouteProbe {
    async fn verify(&self, request: &ProbeRequest) -> Result<ProbeReport, ProbeError> {
        self.verify_with_message(request, ProbeMessage::now()).await
    }
}
