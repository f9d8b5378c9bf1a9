//! Environment variable handling and .env file management

use crate::error::{AppError, Result};
use std::path::Path;

/// Environment variable configuration manager
pub struct EnvManager;

impl EnvManager {
    /// Load .env file if it exists
    pub fn load_env_file(debug: bool) -> Result<()> {
        if Path::new(".env").exists() {
            dotenv::from_filename(".env")
                .map_err(|e| AppError::config(format!("Failed to load .env file: {}", e)))?;

            if debug {
                println!("Loaded configuration from .env file");
            }
        } else if debug {
            println!("No .env file found, using config file, environment and CLI arguments");
        }

        Ok(())
    }

    /// Validate environment variable format before parsing
    pub fn validate_env_var(key: &str, value: &str) -> Result<()> {
        match key {
            "CONFIG" => {
                if value.trim().is_empty() {
                    return Err(AppError::config("CONFIG must point to an integration config .json file"));
                }
            }
            "ROUTER_ADDRESSES" => {
                if crate::models::config::split_list(value).is_empty() {
                    return Err(AppError::config("ROUTER_ADDRESSES must list at least one address"));
                }
            }
            "EXTERNAL_PORT" => {
                let port: u16 = value.parse()
                    .map_err(|e| AppError::config(format!("Invalid EXTERNAL_PORT value '{}': {}", value, e)))?;
                if port == 0 {
                    return Err(AppError::config("EXTERNAL_PORT must be between 1 and 65535"));
                }
            }
            "BACKEND_ID" => {
                if value.is_empty() {
                    return Err(AppError::config("BACKEND_ID cannot be empty"));
                }
            }
            "CONNECT_TIMEOUT_SECONDS" => {
                let timeout: u64 = value.parse()
                    .map_err(|e| AppError::config(format!("Invalid CONNECT_TIMEOUT_SECONDS value '{}': {}", value, e)))?;
                if timeout == 0 || timeout > 60 {
                    return Err(AppError::config(format!("CONNECT_TIMEOUT_SECONDS must be between 1 and 60, got: {}", timeout)));
                }
            }
            "DEFAULT_TIMEOUT_SECONDS" => {
                value.parse::<u64>()
                    .map_err(|e| AppError::config(format!("Invalid DEFAULT_TIMEOUT_SECONDS value '{}': {}", value, e)))?;
            }
            "ENABLE_COLOR" => {
                value.parse::<bool>()
                    .map_err(|e| AppError::config(format!("Invalid ENABLE_COLOR value '{}': {}", value, e)))?;
            }
            _ => {
                // Unknown environment variable, ignore
            }
        }

        Ok(())
    }

    /// Get list of all supported environment variables with descriptions
    pub fn get_supported_env_vars() -> Vec<(&'static str, &'static str, &'static str)> {
        vec![
            ("CONFIG", "Path to the integration config JSON", "/tmp/integration_config.json"),
            ("ROUTER_ADDRESSES", "Comma-separated router addresses to probe", "10.24.14.261,10.24.14.262"),
            ("EXTERNAL_PORT", "External port mapped on the router group", "61000"),
            ("BACKEND_ID", "Identity the backend echoes back", "server1"),
            ("CONNECT_TIMEOUT_SECONDS", "TCP connect timeout (1-60)", "3"),
            ("DEFAULT_TIMEOUT_SECONDS", "Overall limit per route check (0 = 120)", "120"),
            ("ENABLE_COLOR", "Enable colored output", "true"),
        ]
    }

    /// Display environment variable help
    pub fn display_env_help() -> String {
        let mut help = String::new();
        help.push_str("Supported Environment Variables:\n\n");

        for (var, description, example) in Self::get_supported_env_vars() {
            help.push_str(&format!("  {:<24} {}\n", var, description));
            help.push_str(&format!("  {:<24} Example: {}\n\n", "", example));
        }

        help.push_str("Configuration Priority (highest to lowest):\n");
        help.push_str("  1. Command-line arguments\n");
        help.push_str("  2. Environment variables and .env file values\n");
        help.push_str("  3. Integration config file ($CONFIG)\n");
        help.push_str("  4. Default values\n");

        help
    }

    /// Validate all currently set environment variables
    pub fn validate_current_env() -> Vec<String> {
        let mut warnings = Vec::new();

        for (var_name, _, _) in Self::get_supported_env_vars() {
            if let Ok(value) = std::env::var(var_name) {
                if let Err(e) = Self::validate_env_var(var_name, &value) {
                    warnings.push(format!("Warning: {}", e));
                }
            }
        }

        warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_env_var() {
        assert!(EnvManager::validate_env_var("CONFIG", "/tmp/config.json").is_ok());
        assert!(EnvManager::validate_env_var("ROUTER_ADDRESSES", "10.0.0.1, 10.0.0.2").is_ok());
        assert!(EnvManager::validate_env_var("EXTERNAL_PORT", "61000").is_ok());
        assert!(EnvManager::validate_env_var("BACKEND_ID", "server1").is_ok());
        assert!(EnvManager::validate_env_var("CONNECT_TIMEOUT_SECONDS", "3").is_ok());
        assert!(EnvManager::validate_env_var("DEFAULT_TIMEOUT_SECONDS", "0").is_ok());
        assert!(EnvManager::validate_env_var("ENABLE_COLOR", "false").is_ok());

        assert!(EnvManager::validate_env_var("CONFIG", " ").is_err());
        assert!(EnvManager::validate_env_var("ROUTER_ADDRESSES", ",,").is_err());
        assert!(EnvManager::validate_env_var("EXTERNAL_PORT", "0").is_err());
        assert!(EnvManager::validate_env_var("EXTERNAL_PORT", "65536").is_err());
        assert!(EnvManager::validate_env_var("BACKEND_ID", "").is_err());
        assert!(EnvManager::validate_env_var("CONNECT_TIMEOUT_SECONDS", "61").is_err());
        assert!(EnvManager::validate_env_var("DEFAULT_TIMEOUT_SECONDS", "-1").is_err());
        assert!(EnvManager::validate_env_var("ENABLE_COLOR", "maybe").is_err());
    }

    #[test]
    fn test_unknown_var_is_ignored() {
        assert!(EnvManager::validate_env_var("SOMETHING_ELSE", "whatever").is_ok());
    }

    #[test]
    fn test_get_supported_env_vars() {
        let vars = EnvManager::get_supported_env_vars();

        assert_eq!(vars.len(), 7);
        assert!(vars.iter().any(|(name, _, _)| *name == "CONFIG"));
        assert!(vars.iter().any(|(name, _, _)| *name == "EXTERNAL_PORT"));
    }

    #[test]
    fn test_display_env_help() {
        let help = EnvManager::display_env_help();

        assert!(help.contains("Supported Environment Variables:"));
        assert!(help.contains("ROUTER_ADDRESSES"));
        assert!(help.contains("Configuration Priority"));
        assert!(help.contains("Integration config file"));
    }

    #[test]
    fn test_validate_current_env() {
        let _guard = crate::config::ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        for (var_name, _, _) in EnvManager::get_supported_env_vars() {
            std::env::remove_var(var_name);
        }
        assert!(EnvManager::validate_current_env().is_empty());

        std::env::set_var("CONNECT_TIMEOUT_SECONDS", "0");
        let warnings = EnvManager::validate_current_env();
        std::env::remove_var("CONNECT_TIMEOUT_SECONDS");

        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("CONNECT_TIMEOUT_SECONDS"));
    }
}
