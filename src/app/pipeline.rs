//! Shared "fetch pipeline" logic used by the `fetch` command.
//!
//! For each requested fuel: fetch the range day by day, then write one CSV.

use std::fs::create_dir_all;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::{info, warn};

use crate::data::OctopusClient;
use crate::domain::{DATE_FORMAT, DateRange, FuelType};
use crate::error::{AppError, AppResult};
use crate::io::export::write_consumption_csv;

/// What to fetch and where to put it.
#[derive(Debug, Clone)]
pub struct FetchPlan {
    pub fuels: Vec<FuelType>,
    pub range: DateRange,
    pub out_dir: PathBuf,
    /// Fail the run when any day could not be fetched, after all files are written.
    pub strict: bool,
}

/// Outcome of one fuel's fetch + write.
#[derive(Debug, Clone)]
pub struct FetchSummary {
    pub fuel_type: FuelType,
    pub path: PathBuf,
    pub record_count: usize,
    pub failed_days: Vec<NaiveDate>,
}

/// Output file for a fuel/range pair, e.g. `electricity_2024-01-01_2024-01-11.csv`.
pub fn output_path(out_dir: &Path, fuel: FuelType, range: &DateRange) -> PathBuf {
    out_dir.join(format!(
        "{}_{}_{}.csv",
        fuel,
        range.start().format(DATE_FORMAT),
        range.end().format(DATE_FORMAT)
    ))
}

/// Execute the plan, one fuel at a time in the given order.
pub fn run_fetch(client: &OctopusClient, plan: &FetchPlan) -> AppResult<Vec<FetchSummary>> {
    create_dir_all(&plan.out_dir).map_err(|e| {
        AppError::io(format!(
            "Failed to create output directory '{}': {e}",
            plan.out_dir.display()
        ))
    })?;

    let mut summaries = Vec::with_capacity(plan.fuels.len());
    for &fuel in &plan.fuels {
        let fetched = client.fetch_range(fuel, &plan.range);
        let path = output_path(&plan.out_dir, fuel, &plan.range);
        write_consumption_csv(&path, &fetched.records)?;

        let failed_days: Vec<NaiveDate> = fetched.failed_days().iter().map(|d| d.day).collect();
        info!(
            fuel = %fuel,
            records = fetched.records.len(),
            path = %path.display(),
            "Saved consumption data"
        );
        for report in fetched.failed_days() {
            if let Some(failure) = &report.failure {
                warn!(fuel = %fuel, day = %report.day, "No data for day: {failure}");
            }
        }

        summaries.push(FetchSummary {
            fuel_type: fuel,
            path,
            record_count: fetched.records.len(),
            failed_days,
        });
    }

    // Strict mode still writes every fuel's file before failing.
    if plan.strict {
        let missing: Vec<String> = summaries
            .iter()
            .filter(|s| !s.failed_days.is_empty())
            .map(|s| {
                let days: Vec<String> = s.failed_days.iter().map(|d| d.to_string()).collect();
                format!("{} ({})", s.fuel_type, days.join(", "))
            })
            .collect();
        if !missing.is_empty() {
            return Err(AppError::remote(format!(
                "Some days could not be fetched: {}",
                missing.join("; ")
            )));
        }
    }

    Ok(summaries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_path_names_fuel_and_range() {
        let range = DateRange::parse("2024-01-01", "2024-01-11").unwrap();
        let path = output_path(Path::new("/data"), FuelType::Gas, &range);
        assert_eq!(path, PathBuf::from("/data/gas_2024-01-01_2024-01-11.csv"));
    }
}
