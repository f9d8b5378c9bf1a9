//! Configuration data model and validation

use crate::types::{AppError, Result, TrailingBytePolicy};
use crate::probe::ProbeConfig;
use crate::models::route::RouteMapping;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// OAuth client used by the rest of the acceptance suite to reach the routing API
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OAuthConfig {
    #[serde(default)]
    pub token_endpoint: String,
    #[serde(default)]
    pub client_name: String,
    #[serde(default)]
    pub client_secret: String,
    #[serde(default)]
    pub port: u16,
    #[serde(default)]
    pub skip_oauth_tls_verification: bool,
}

impl OAuthConfig {
    /// Token URL in the `endpoint:port` form the UAA client expects
    pub fn token_url(&self) -> String {
        format!("{}:{}", self.token_endpoint, self.port)
    }
}

/// Main application configuration
///
/// Field names follow the integration config JSON shared with the rest of
/// the routing acceptance suite, so the same file can be passed via `$CONFIG`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Router (or load balancer) addresses to probe
    #[serde(default)]
    pub addresses: Vec<String>,

    #[serde(default)]
    pub system_domain: String,

    #[serde(default)]
    pub routing_api_url: String,

    /// Use plain HTTP when deriving the routing API URL
    #[serde(default)]
    pub use_http: bool,

    #[serde(default)]
    pub oauth: Option<OAuthConfig>,

    /// Overall limit per route check, in seconds (0 means the default)
    #[serde(default)]
    pub default_timeout: u64,

    /// Identity the backend echoes back
    #[serde(default = "default_backend_id")]
    pub backend_id: String,

    /// External port mapped on the router group
    #[serde(default)]
    pub external_port: Option<u16>,

    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_seconds: u64,

    /// Fail a probe when the backend sends more than the expected response
    #[serde(default)]
    pub reject_trailing_bytes: bool,

    #[serde(default = "default_trailing_grace_ms")]
    pub trailing_grace_ms: u64,

    #[serde(default = "default_enable_color")]
    pub enable_color: bool,

    #[serde(default)]
    pub verbose: bool,

    #[serde(default)]
    pub debug: bool,

    /// Route mapping the external port came from, if one was supplied
    #[serde(skip)]
    pub route_mapping: Option<RouteMapping>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            addresses: Vec::new(),
            system_domain: String::new(),
            routing_api_url: String::new(),
            use_http: false,
            oauth: None,
            default_timeout: 0,
            backend_id: default_backend_id(),
            external_port: None,
            connect_timeout_seconds: default_connect_timeout_secs(),
            reject_trailing_bytes: false,
            trailing_grace_ms: default_trailing_grace_ms(),
            enable_color: default_enable_color(),
            verbose: false,
            debug: false,
            route_mapping: None,
        }
    }
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Scheme prefix for URLs derived from the system domain
    pub fn protocol(&self) -> &'static str {
        if self.use_http {
            "http://"
        } else {
            "https://"
        }
    }

    /// Fill in the routing API URL from the system domain when it is unset
    pub fn derive_routing_api_url(&mut self) {
        if self.routing_api_url.is_empty() && !self.system_domain.is_empty() {
            self.routing_api_url = format!("{}api.{}", self.protocol(), self.system_domain);
        }
    }

    /// Overall time limit for one route check
    pub fn check_timeout(&self) -> Duration {
        if self.default_timeout > 0 {
            Duration::from_secs(self.default_timeout)
        } else {
            crate::defaults::DEFAULT_CHECK_TIMEOUT
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_seconds)
    }

    pub fn trailing_byte_policy(&self) -> TrailingBytePolicy {
        if self.reject_trailing_bytes {
            TrailingBytePolicy::Reject {
                grace: Duration::from_millis(self.trailing_grace_ms),
            }
        } else {
            TrailingBytePolicy::Ignore
        }
    }

    /// Probe settings derived from this configuration
    pub fn probe_config(&self) -> ProbeConfig {
        ProbeConfig {
            connect_timeout: self.connect_timeout(),
            trailing_bytes: self.trailing_byte_policy(),
        }
    }

    /// Validate the configuration and return the first hard error
    pub fn validate(&self) -> Result<()> {
        if self.addresses.is_empty() {
            return Err(AppError::config("missing configuration 'addresses'"));
        }

        for address in &self.addresses {
            if address.trim().is_empty() {
                return Err(AppError::config("Router address cannot be empty"));
            }
        }

        match self.external_port {
            None => return Err(AppError::config("External port is not set (use --port, EXTERNAL_PORT or --mapping)")),
            Some(0) => return Err(AppError::config("External port must be greater than 0")),
            Some(_) => {}
        }

        if self.backend_id.is_empty() {
            return Err(AppError::config("Backend id cannot be empty"));
        }

        if self.connect_timeout_seconds == 0 {
            return Err(AppError::config("Connect timeout must be greater than 0"));
        }

        if self.connect_timeout_seconds > 60 {
            return Err(AppError::config("Connect timeout cannot exceed 60 seconds"));
        }

        if !self.routing_api_url.is_empty() {
            url::Url::parse(&self.routing_api_url).map_err(|e| {
                AppError::config(format!("Invalid routing_api_url '{}': {}", self.routing_api_url, e))
            })?;
        }

        Ok(())
    }

    /// Merge environment variables into this configuration
    pub fn merge_from_env(&mut self) -> Result<()> {
        if let Ok(addresses) = std::env::var("ROUTER_ADDRESSES") {
            self.addresses = split_list(&addresses);
        }

        if let Ok(port) = std::env::var("EXTERNAL_PORT") {
            let port = port.parse()
                .map_err(|e| AppError::config(format!("Invalid EXTERNAL_PORT value '{}': {}", port, e)))?;
            self.external_port = Some(port);
        }

        if let Ok(backend_id) = std::env::var("BACKEND_ID") {
            self.backend_id = backend_id;
        }

        if let Ok(timeout) = std::env::var("CONNECT_TIMEOUT_SECONDS") {
            self.connect_timeout_seconds = timeout.parse()
                .map_err(|e| AppError::config(format!("Invalid CONNECT_TIMEOUT_SECONDS value '{}': {}", timeout, e)))?;
        }

        if let Ok(timeout) = std::env::var("DEFAULT_TIMEOUT_SECONDS") {
            self.default_timeout = timeout.parse()
                .map_err(|e| AppError::config(format!("Invalid DEFAULT_TIMEOUT_SECONDS value '{}': {}", timeout, e)))?;
        }

        if let Ok(enable_color) = std::env::var("ENABLE_COLOR") {
            self.enable_color = enable_color.parse()
                .map_err(|e| AppError::config(format!("Invalid ENABLE_COLOR value '{}': {}", enable_color, e)))?;
        }

        Ok(())
    }
}

/// Split a comma-separated list, dropping empty entries
pub(crate) fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

// Default value functions for serde
fn default_backend_id() -> String {
    crate::defaults::DEFAULT_BACKEND_ID.to_string()
}

fn default_connect_timeout_secs() -> u64 {
    crate::defaults::DEFAULT_CONNECT_TIMEOUT.as_secs()
}

fn default_trailing_grace_ms() -> u64 {
    crate::defaults::DEFAULT_TRAILING_GRACE.as_millis() as u64
}

fn default_enable_color() -> bool {
    crate::defaults::DEFAULT_ENABLE_COLOR
}
