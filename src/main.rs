//! TCP Routing Acceptance Tests - Main CLI Application
//!
//! Probes every configured router address on the external port and checks
//! that the expected backend answers.

use clap::Parser;
use tcp_routing_ats::{
    app::App,
    cli::Cli,
    config::EnvManager,
    error::{AppError, ErrorReporter, Result},
    VERSION, PKG_NAME,
};
use std::process;

#[tokio::main]
async fn main() {
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("Application panic: {}", panic_info);
        process::exit(AppError::internal("panic").exit_code());
    }));

    let cli = Cli::parse();

    if cli.env_help {
        println!("{}", EnvManager::display_env_help());
        return;
    }

    let reporter = ErrorReporter::new(cli.use_colors(), cli.verbose || cli.debug);

    if let Err(e) = run_application(cli).await {
        reporter.report_error(&e);
        print_error_suggestions(&e);
        process::exit(e.exit_code());
    }
}

async fn run_application(cli: Cli) -> Result<()> {
    if cli.debug {
        println!("{} v{}", PKG_NAME, VERSION);
        if let Some(build_time) = option_env!("BUILD_TIME") {
            println!("Built: {}", build_time);
        }
        if let Some(commit) = option_env!("GIT_COMMIT") {
            println!("Commit: {}", commit);
        }
        if let Some(target) = option_env!("TARGET_TRIPLE") {
            println!("Target: {}", target);
        }
        println!("Debug mode enabled");
        println!();

        for warning in EnvManager::validate_current_env() {
            println!("{}", warning);
        }
    }

    let app = App::new(cli)?;
    app.run().await?;

    Ok(())
}

/// Print helpful suggestions for common errors
fn print_error_suggestions(error: &AppError) {
    match error {
        AppError::Config(_) | AppError::Validation(_) => {
            eprintln!();
            eprintln!("Configuration help:");
            eprintln!("  - Pass router addresses with --address or ROUTER_ADDRESSES");
            eprintln!("  - Set the external port with --port, EXTERNAL_PORT or --mapping");
            eprintln!("  - Run with --env-help to list supported environment variables");
        }
        AppError::TestExecution(_) => {
            eprintln!();
            eprintln!("Route troubleshooting:");
            eprintln!("  - A mismatch means the port reaches a different backend than expected");
            eprintln!("  - Connection failures point at the router address or a missing route");
            eprintln!("  - Rerun with --verbose to see what each router returned");
        }
        _ => {}
    }
}
