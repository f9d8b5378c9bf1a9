//! Data models and structures for the TCP routing checks

pub mod config;
pub mod route;

// Re-export main model types
pub use config::{Config, OAuthConfig};
pub use route::{RouteMapping, validate_tcp_route_mapping};
