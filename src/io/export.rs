//! Export normalized consumption records to CSV.
//!
//! Column order is fixed; see [`CSV_HEADER`]. Field values are escaped by the
//! `csv` encoder, so embedded commas, quotes or newlines survive a round trip.

use std::fs::File;
use std::path::Path;

use crate::domain::ConsumptionRecord;
use crate::error::{AppError, AppResult};

pub const CSV_HEADER: [&str; 7] = [
    "date",
    "mpan",
    "serial_number",
    "customer_id",
    "fuel_type",
    "consumption",
    "request_time",
];

/// Create (or truncate) `path` and write the header plus one row per record.
///
/// A failure part-way through leaves a truncated file behind.
pub fn write_consumption_csv(path: &Path, records: &[ConsumptionRecord]) -> AppResult<()> {
    let file = File::create(path)
        .map_err(|e| AppError::io(format!("Failed to create output CSV '{}': {e}", path.display())))?;

    let mut wtr = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(file);

    wtr.write_record(CSV_HEADER)
        .map_err(|e| AppError::io(format!("Failed to write output CSV header: {e}")))?;

    for r in records {
        let consumption = r.consumption.to_string();
        let request_time = r.request_time_string();
        wtr.write_record([
            r.interval_start.as_str(),
            r.meter_point_id.as_str(),
            r.serial_number.as_str(),
            r.customer_id.as_str(),
            r.fuel_type.as_str(),
            consumption.as_str(),
            request_time.as_str(),
        ])
        .map_err(|e| AppError::io(format!("Failed to write output CSV row: {e}")))?;
    }

    wtr.flush()
        .map_err(|e| AppError::io(format!("Failed to flush output CSV '{}': {e}", path.display())))?;

    Ok(())
}
