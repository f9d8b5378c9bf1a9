//! Configuration parsing from the integration config file, environment and CLI

use crate::{
    cli::Cli,
    config::env::EnvManager,
    error::{AppError, ErrorContext, Result},
    models::{Config, RouteMapping},
};
use std::path::{Path, PathBuf};

/// Configuration parser that layers config file, environment and CLI arguments
pub struct ConfigParser {
    cli: Cli,
}

impl ConfigParser {
    /// Create a new configuration parser with CLI arguments
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Parse and build the complete configuration
    pub fn parse(&self) -> Result<Config> {
        // .env may itself point CONFIG at the integration file
        self.load_env_file()?;

        let mut config = match self.config_path() {
            Some(path) => Self::load_file(&path)?,
            None => Config::default(),
        };

        config.merge_from_env()?;
        self.apply_cli_overrides(&mut config)?;
        self.apply_route_mapping(&mut config)?;
        config.derive_routing_api_url();

        config.validate()?;

        Ok(config)
    }

    fn load_env_file(&self) -> Result<()> {
        EnvManager::load_env_file(self.cli.debug)
    }

    fn config_path(&self) -> Option<PathBuf> {
        self.cli
            .config
            .clone()
            .or_else(|| std::env::var_os("CONFIG").map(PathBuf::from))
            .filter(|path| !path.as_os_str().is_empty())
    }

    /// Load the integration config JSON
    pub fn load_file(path: &Path) -> Result<Config> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    /// Apply CLI argument overrides to configuration
    fn apply_cli_overrides(&self, config: &mut Config) -> Result<()> {
        self.cli.validate().map_err(AppError::config)?;

        if !self.cli.addresses.is_empty() {
            config.addresses = self.cli.addresses.clone();
        }

        if let Some(port) = self.cli.port {
            config.external_port = Some(port);
        }

        if let Some(ref backend_id) = self.cli.backend_id {
            config.backend_id = backend_id.clone();
        }

        if let Some(secs) = self.cli.connect_timeout {
            config.connect_timeout_seconds = secs;
        }

        if let Some(secs) = self.cli.timeout {
            config.default_timeout = secs;
        }

        if self.cli.reject_trailing_bytes {
            config.reject_trailing_bytes = true;
        }

        if let Some(ms) = self.cli.trailing_grace {
            config.trailing_grace_ms = ms;
        }

        if self.cli.no_color {
            config.enable_color = false;
        }

        // CLI-only flags
        config.verbose = self.cli.verbose;
        config.debug = self.cli.debug;

        if config.debug {
            println!("Applied CLI overrides to configuration");
        }

        Ok(())
    }

    /// A mapping from the routing control plane supplies the external port
    fn apply_route_mapping(&self, config: &mut Config) -> Result<()> {
        let path = match &self.cli.mapping {
            Some(path) => path,
            None => return Ok(()),
        };

        let mapping = RouteMapping::load(path)?;
        match config.external_port {
            None => config.external_port = Some(mapping.external_port),
            Some(port) if port != mapping.external_port => {
                return Err(AppError::config(format!(
                    "External port {} conflicts with route mapping port {}",
                    port, mapping.external_port
                )));
            }
            Some(_) => {}
        }
        config.route_mapping = Some(mapping);

        Ok(())
    }
}

/// Convenience function to load complete configuration from CLI arguments
pub fn load_config(cli: Cli) -> Result<Config> {
    ConfigParser::new(cli).parse()
}

/// Display configuration summary for debug purposes
pub fn display_config_summary(config: &Config) -> String {
    let mut summary = Vec::new();

    summary.push(format!("Router addresses: {}", config.addresses.join(", ")));
    summary.push(format!(
        "External port: {}",
        config.external_port.map_or("unset".to_string(), |p| p.to_string())
    ));
    summary.push(format!("Backend id: {}", config.backend_id));
    if let Some(mapping) = &config.route_mapping {
        summary.push(format!("Route mapping: {}", mapping));
    }
    summary.push(format!("Connect timeout: {}s", config.connect_timeout_seconds));
    summary.push(format!("Check timeout: {}s", config.check_timeout().as_secs()));
    summary.push(format!("Trailing bytes: {}", config.trailing_byte_policy().name()));
    if !config.routing_api_url.is_empty() {
        summary.push(format!("Routing API: {}", config.routing_api_url));
    }
    summary.push(format!("Color Output: {}", config.enable_color));
    summary.push(format!("Verbose: {}", config.verbose));
    summary.push(format!("Debug: {}", config.debug));

    summary.join("\n")
}
