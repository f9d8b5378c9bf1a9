//! Command-line interface

use clap::{ArgAction, Parser};
use std::path::PathBuf;

/// TCP Routing Acceptance Tests - verify router ports reach the right backend
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "tcp-routing-ats")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Integration config JSON file
    #[arg(long, env = "CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Router address to probe (can be used multiple times)
    #[arg(short, long = "address", action = ArgAction::Append)]
    pub addresses: Vec<String>,

    /// External port mapped on the router group
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Identity the backend is expected to echo back
    #[arg(short, long)]
    pub backend_id: Option<String>,

    /// Route mapping JSON (routing API shape) supplying the external port
    #[arg(short, long, value_name = "FILE")]
    pub mapping: Option<PathBuf>,

    /// Connect timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub connect_timeout: Option<u64>,

    /// Overall time limit per route check in seconds
    #[arg(short, long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Fail when a backend sends bytes after the expected response
    #[arg(long)]
    pub reject_trailing_bytes: bool,

    /// How long to wait for trailing bytes, in milliseconds
    #[arg(long, value_name = "MS", requires = "reject_trailing_bytes")]
    pub trailing_grace: Option<u64>,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Enable verbose output
    #[arg(long)]
    pub verbose: bool,

    /// Enable debug output
    #[arg(long)]
    pub debug: bool,

    /// Describe supported environment variables and exit
    #[arg(long)]
    pub env_help: bool,
}

impl Cli {
    /// Validate CLI arguments for conflicts
    pub fn validate(&self) -> Result<(), String> {
        if self.port == Some(0) {
            return Err("--port must be greater than 0".to_string());
        }

        if self.connect_timeout == Some(0) {
            return Err("--connect-timeout must be greater than 0".to_string());
        }

        if let Some(id) = &self.backend_id {
            if id.is_empty() {
                return Err("--backend-id cannot be empty".to_string());
            }
        }

        if self.addresses.iter().any(|a| a.trim().is_empty()) {
            return Err("--address cannot be empty".to_string());
        }

        Ok(())
    }

    /// Check if colors should be enabled
    pub fn use_colors(&self) -> bool {
        !self.no_color
    }
}
