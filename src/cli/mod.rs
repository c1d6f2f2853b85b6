//! Command-line parsing for the consumption downloader.
//!
//! Parsing stays here; `app` turns the parsed arguments into a `FetchPlan`.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::domain::FuelType;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "octo", version, about = "Download Octopus Energy consumption readings to CSV")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch readings for a date range and write one CSV per fuel.
    Fetch(FetchArgs),
    /// Print the consumption URL for a fuel without calling the API.
    Endpoint(EndpointArgs),
}

/// Fuel selector; `all` means electricity then gas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FuelSelection {
    Electricity,
    Gas,
    All,
}

impl FuelSelection {
    pub fn fuels(self) -> Vec<FuelType> {
        match self {
            FuelSelection::Electricity => vec![FuelType::Electricity],
            FuelSelection::Gas => vec![FuelType::Gas],
            FuelSelection::All => FuelType::ALL.to_vec(),
        }
    }
}

#[derive(Debug, Parser, Clone)]
pub struct FetchArgs {
    #[arg(short = 'f', long, value_enum, default_value_t = FuelSelection::All)]
    pub fuel: FuelSelection,

    /// First day to fetch (YYYY-MM-DD).
    #[arg(long)]
    pub start: String,

    /// Last day to fetch, inclusive (YYYY-MM-DD).
    #[arg(long)]
    pub end: String,

    /// Output directory. Defaults to `DATA_FOLDER`, else the current directory.
    #[arg(short = 'o', long)]
    pub out_dir: Option<PathBuf>,

    /// Days fetched in parallel.
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u16).range(1..=32))]
    pub concurrency: u16,

    /// Extra attempts for transient failures (network errors, 5xx, 429).
    #[arg(long, default_value_t = 0)]
    pub retries: u32,

    /// Initial backoff between retries; doubles on each attempt.
    #[arg(long, default_value_t = 500)]
    pub retry_delay_ms: u64,

    /// Exit with an error if any day could not be fetched.
    #[arg(long)]
    pub strict: bool,
}

#[derive(Debug, Parser, Clone)]
pub struct EndpointArgs {
    /// `electricity` or `gas`.
    #[arg(short = 'f', long)]
    pub fuel: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_defaults_to_all_fuels_sequentially() {
        let cli = Cli::parse_from(["octo", "fetch", "--start", "2024-01-01", "--end", "2024-01-11"]);
        let Command::Fetch(args) = cli.command else {
            panic!("expected fetch");
        };
        assert_eq!(args.fuel.fuels(), vec![FuelType::Electricity, FuelType::Gas]);
        assert_eq!(args.concurrency, 1);
        assert_eq!(args.retries, 0);
        assert!(!args.strict);
        assert!(args.out_dir.is_none());
    }

    #[test]
    fn concurrency_must_be_positive() {
        let res = Cli::try_parse_from([
            "octo", "fetch", "--start", "2024-01-01", "--end", "2024-01-01", "--concurrency", "0",
        ]);
        assert!(res.is_err());
    }
}
