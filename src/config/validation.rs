//! Configuration validation rules beyond the hard errors in `Config::validate`

use crate::{
    error::Result,
    models::Config,
};
use std::net::IpAddr;

/// Configuration validator producing advisory warnings
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate configuration with comprehensive checks
    pub fn validate_comprehensive(config: &Config) -> Result<Vec<ValidationWarning>> {
        let mut warnings = Vec::new();

        config.validate()?;

        warnings.extend(Self::validate_addresses(&config.addresses));
        warnings.extend(Self::validate_routing_api(config));
        warnings.extend(Self::validate_timeouts(config));

        if let Some(port) = config.external_port {
            if port < 1024 {
                warnings.push(ValidationWarning::new(
                    ValidationLevel::Warning,
                    format!("External port {} is privileged; TCP router groups normally reserve ports from 1024 up", port)
                ));
            }
        }

        Ok(warnings)
    }

    fn validate_addresses(addresses: &[String]) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();

        for address in addresses {
            let ip = match address.trim_matches(|c| c == '[' || c == ']').parse::<IpAddr>() {
                Ok(ip) => ip,
                // Hostnames are resolved at connect time
                Err(_) => continue,
            };

            if ip.is_loopback() {
                warnings.push(ValidationWarning::new(
                    ValidationLevel::Info,
                    format!("Router address {} is loopback; only a local backend can answer", address)
                ));
            } else if let IpAddr::V4(v4) = ip {
                if v4.is_private() {
                    warnings.push(ValidationWarning::new(
                        ValidationLevel::Info,
                        format!("Router address {} is in a private range, ensure it is reachable from here", address)
                    ));
                }
            }

            if ip.is_unspecified() {
                warnings.push(ValidationWarning::new(
                    ValidationLevel::Warning,
                    format!("Router address {} is unspecified and cannot be dialed", address)
                ));
            }
        }

        warnings
    }

    fn validate_routing_api(config: &Config) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();

        if config.oauth.is_none() {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Info,
                "missing configuration oauth; routing API clients sharing this file will not authenticate".to_string()
            ));
        }

        if config.routing_api_url.is_empty() && config.system_domain.is_empty() {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Info,
                "Neither routing_api_url nor system_domain is set".to_string()
            ));
        }

        warnings
    }

    fn validate_timeouts(config: &Config) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();

        if config.connect_timeout() >= config.check_timeout() {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Warning,
                format!(
                    "Connect timeout of {}s is not shorter than the check timeout of {}s; slow connects will be reported as timeouts",
                    config.connect_timeout().as_secs(),
                    config.check_timeout().as_secs()
                )
            ));
        }

        if config.reject_trailing_bytes && config.trailing_grace_ms == 0 {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Warning,
                "Trailing byte grace of 0ms only catches bytes that already arrived".to_string()
            ));
        }

        warnings
    }
}

/// Validation warning levels
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationLevel {
    Info,
    Warning,
    Error,
}

impl ValidationLevel {
    /// Get display string for level
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
        }
    }
}

/// Configuration validation warning
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub level: ValidationLevel,
    pub message: String,
}

impl ValidationWarning {
    /// Create a new validation warning
    pub fn new(level: ValidationLevel, message: String) -> Self {
        Self { level, message }
    }

    /// Format warning for display
    pub fn format(&self, use_color: bool) -> String {
        if use_color {
            use colored::Colorize;
            let level = match self.level {
                ValidationLevel::Info => self.level.as_str().blue(),
                ValidationLevel::Warning => self.level.as_str().yellow(),
                ValidationLevel::Error => self.level.as_str().red(),
            };
            format!("[{}] {}", level, self.message)
        } else {
            format!("[{}] {}", self.level.as_str(), self.message)
        }
    }
}

/// Convenience function for comprehensive configuration validation
pub fn validate_config(config: &Config) -> Result<Vec<ValidationWarning>> {
    ConfigValidator::validate_comprehensive(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OAuthConfig;

    fn base_config() -> Config {
        Config {
            addresses: vec!["203.0.113.5".to_string()],
            external_port: Some(61000),
            system_domain: "bosh-lite.com".to_string(),
            oauth: Some(OAuthConfig::default()),
            ..Config::default()
        }
    }

    #[test]
    fn test_clean_config_has_no_warnings() {
        let warnings = validate_config(&base_config()).unwrap();
        assert!(warnings.is_empty(), "unexpected warnings: {:?}", warnings);
    }

    #[test]
    fn test_hard_errors_propagate() {
        let config = Config { addresses: vec![], ..base_config() };
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_missing_oauth_and_api() {
        let config = Config { oauth: None, system_domain: String::new(), ..base_config() };
        let warnings = validate_config(&config).unwrap();

        assert_eq!(warnings.len(), 2);
        assert!(warnings.iter().any(|w| w.message.contains("oauth")));
        assert!(warnings.iter().any(|w| w.message.contains("routing_api_url")));
    }

    #[test]
    fn test_address_warnings() {
        let config = Config {
            addresses: vec![
                "127.0.0.1".to_string(),
                "10.0.0.5".to_string(),
                "tcp.bosh-lite.com".to_string(),
                "0.0.0.0".to_string(),
            ],
            ..base_config()
        };
        let warnings = validate_config(&config).unwrap();

        assert!(warnings.iter().any(|w| w.message.contains("127.0.0.1") && w.message.contains("loopback")));
        assert!(warnings.iter().any(|w| w.message.contains("10.0.0.5") && w.message.contains("private")));
        assert!(warnings.iter().any(|w| w.level == ValidationLevel::Warning && w.message.contains("0.0.0.0")));
        assert!(!warnings.iter().any(|w| w.message.contains("tcp.bosh-lite.com")));
    }

    #[test]
    fn test_privileged_port() {
        let config = Config { external_port: Some(80), ..base_config() };
        let warnings = validate_config(&config).unwrap();
        assert!(warnings.iter().any(|w| w.message.contains("privileged")));
    }

    #[test]
    fn test_connect_timeout_longer_than_check() {
        let config = Config { connect_timeout_seconds: 10, default_timeout: 5, ..base_config() };
        let warnings = validate_config(&config).unwrap();
        assert!(warnings.iter().any(|w| w.message.contains("Connect timeout")));
    }

    #[test]
    fn test_plain_format() {
        let warning = ValidationWarning::new(ValidationLevel::Warning, "careful".to_string());
        assert_eq!(warning.format(false), "[WARNING] careful");
    }
}
