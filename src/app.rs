//! Main application orchestration and execution

use crate::{
    cli::Cli,
    config::{display_config_summary, load_config, validate_config},
    error::Result,
    logging::Logger,
    models::Config,
    output::{OutputCoordinator, OutputFormatterFactory},
    suite::{RouteCheckSuite, SuiteReport},
};
use uuid::Uuid;

/// Main application struct that coordinates all components
pub struct App {
    config: Config,
    logger: Logger,
}

impl App {
    /// Load configuration from the CLI, config file and environment
    pub fn new(cli: Cli) -> Result<Self> {
        let config = load_config(cli)?;
        Ok(Self::with_config(config))
    }

    /// Create an application around an already-built configuration
    pub fn with_config(config: Config) -> Self {
        let logger = Logger::with_config("APP".to_string(), &config);
        Self { config, logger }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Check every router and print the report
    ///
    /// Returns an error when any route check did not pass.
    pub async fn run(self) -> Result<SuiteReport> {
        let config = &self.config;
        let warnings = validate_config(config)?;

        if config.debug {
            println!("Configuration Summary:");
            println!("{}", display_config_summary(config));
            println!();
        }

        let formatter = OutputFormatterFactory::create_formatter(config.enable_color, config.verbose);
        let coordinator = OutputCoordinator::new(formatter);

        if !warnings.is_empty() {
            eprintln!("Configuration Warnings:");
            for warning in &warnings {
                eprintln!("  {}", warning.format(config.enable_color));
            }
            eprintln!();
        }

        self.logger.set_session_id(Uuid::new_v4().to_string()).await;

        self.logger.info("Starting route checks")
            .field("addresses", &config.addresses)
            .field("backend_id", &config.backend_id)
            .field("trailing_bytes", config.trailing_byte_policy())
            .log()
            .await;

        let suite = RouteCheckSuite::from_config(config, &self.logger);
        let report = suite.run_config(config).await?;

        if config.verbose {
            for outcome in &report.outcomes {
                println!("{}", coordinator.display_outcome(outcome)?);
            }
            println!();
        }

        println!("{}", coordinator.display_report(&report)?);

        self.logger.info("Route checks completed")
            .field("passed", report.passed())
            .field("total", report.total())
            .field("duration_ms", report.total_duration.as_millis() as u64)
            .log()
            .await;

        report.into_result()
    }
}
