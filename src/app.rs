//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - loads credentials and settings
//! - runs the fetch pipeline or prints an endpoint

use std::time::Duration;

use clap::Parser;

use crate::cli::{Command, EndpointArgs, FetchArgs};
use crate::config::{Credentials, Settings};
use crate::data::{OctopusClient, RetryPolicy};
use crate::domain::DateRange;
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `octo` binary.
pub fn run() -> Result<(), AppError> {
    let cli = crate::cli::Cli::parse();

    match cli.command {
        Command::Fetch(args) => handle_fetch(args),
        Command::Endpoint(args) => handle_endpoint(args),
    }
}

fn handle_fetch(args: FetchArgs) -> Result<(), AppError> {
    // Validate inputs before touching the network.
    let range = DateRange::parse(&args.start, &args.end)?;
    let credentials = Credentials::from_env()?;
    let settings = Settings::from_env();

    let client = client_from(credentials, &settings)?
        .with_concurrency(usize::from(args.concurrency))
        .with_retry(RetryPolicy {
            max_retries: args.retries,
            base_delay: Duration::from_millis(args.retry_delay_ms),
        });

    let plan = pipeline::FetchPlan {
        fuels: args.fuel.fuels(),
        range,
        out_dir: args.out_dir.unwrap_or(settings.data_folder),
        strict: args.strict,
    };

    for summary in pipeline::run_fetch(&client, &plan)? {
        let missing = if summary.failed_days.is_empty() {
            String::new()
        } else {
            format!(" ({} day(s) missing)", summary.failed_days.len())
        };
        println!(
            "{}: {} record(s) -> {}{missing}",
            summary.fuel_type,
            summary.record_count,
            summary.path.display()
        );
    }

    Ok(())
}

fn handle_endpoint(args: EndpointArgs) -> Result<(), AppError> {
    let credentials = Credentials::from_env()?;
    let settings = Settings::from_env();
    let client = client_from(credentials, &settings)?;

    println!("{}", client.build_endpoint(&args.fuel)?);
    Ok(())
}

fn client_from(credentials: Credentials, settings: &Settings) -> Result<OctopusClient, AppError> {
    Ok(OctopusClient::new(credentials)?.with_base_url(settings.base_url.clone()))
}
