//! Shared domain types.
//!
//! Raw API readings come in as [`RawRecord`], get stamped with the client's
//! meter identity, and leave as [`ConsumptionRecord`] for the CSV writer.

use std::fmt;
use std::str::FromStr;

use chrono::{Days, NaiveDate, NaiveDateTime};
use clap::ValueEnum;
use serde::Deserialize;
use serde_json::Number;

use crate::error::{AppError, AppResult};

/// Date format used for CLI input, API query parameters and file names.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Format of [`ConsumptionRecord::request_time`] in the output file.
pub const REQUEST_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Which meter a request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum FuelType {
    Electricity,
    Gas,
}

impl FuelType {
    pub const ALL: [FuelType; 2] = [FuelType::Electricity, FuelType::Gas];

    pub fn as_str(self) -> &'static str {
        match self {
            FuelType::Electricity => "electricity",
            FuelType::Gas => "gas",
        }
    }

    /// Path segment of the meter-point collection for this fuel.
    pub fn meter_points_segment(self) -> &'static str {
        match self {
            FuelType::Electricity => "electricity-meter-points",
            FuelType::Gas => "gas-meter-points",
        }
    }
}

impl fmt::Display for FuelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FuelType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "electricity" => Ok(FuelType::Electricity),
            "gas" => Ok(FuelType::Gas),
            other => Err(AppError::invalid_argument(format!(
                "Invalid fuel type '{other}'. Fuel type must be either 'electricity' or 'gas'."
            ))),
        }
    }
}

/// Inclusive calendar-day range. `start <= end` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> AppResult<Self> {
        if start > end {
            return Err(AppError::config(format!(
                "Start date {start} is after end date {end}."
            )));
        }
        Ok(Self { start, end })
    }

    /// Parse a `YYYY-MM-DD` pair.
    pub fn parse(start: &str, end: &str) -> AppResult<Self> {
        Self::new(parse_date(start)?, parse_date(end)?)
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Number of calendar days covered, counting both ends.
    pub fn len_days(&self) -> usize {
        (self.end - self.start).num_days() as usize + 1
    }

    /// Every day from start to end, ascending.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.start.iter_days().take_while(move |d| *d <= self.end)
    }
}

pub fn parse_date(raw: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
        .map_err(|e| AppError::config(format!("Invalid date '{raw}' (expected YYYY-MM-DD): {e}")))
}

/// The day after `day`, used as the exclusive `period_to` bound.
pub fn next_day(day: NaiveDate) -> NaiveDate {
    day.checked_add_days(Days::new(1)).unwrap_or(NaiveDate::MAX)
}

/// One reading as returned in the API's `results` array.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawRecord {
    /// Kept as the number token the API sent.
    pub consumption: Number,
    pub interval_start: String,
    #[serde(default)]
    pub interval_end: String,
}

/// A reading stamped with the identity of the meter it was fetched for.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsumptionRecord {
    pub interval_start: String,
    pub interval_end: String,
    pub consumption: Number,
    pub request_time: NaiveDateTime,
    pub fuel_type: FuelType,
    /// MPAN for electricity, MPRN for gas.
    pub meter_point_id: String,
    pub serial_number: String,
    pub customer_id: String,
}

impl ConsumptionRecord {
    pub fn request_time_string(&self) -> String {
        self.request_time.format(REQUEST_TIME_FORMAT).to_string()
    }
}

/// Why a day produced no data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFailure {
    /// HTTP status, when a response was received at all.
    pub status: Option<u16>,
    pub message: String,
    pub attempts: u32,
}

impl fmt::Display for RemoteFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "status {status}: {}", self.message)?,
            None => write!(f, "{}", self.message)?,
        }
        write!(f, " (after {} attempt(s))", self.attempts)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DayOutcome {
    Ok,
    Failed(RemoteFailure),
}

/// Result of fetching a single day window.
#[derive(Debug, Clone)]
pub struct DayFetch {
    pub day: NaiveDate,
    pub outcome: DayOutcome,
    pub records: Vec<RawRecord>,
}

impl DayFetch {
    pub fn ok(day: NaiveDate, records: Vec<RawRecord>) -> Self {
        Self {
            day,
            outcome: DayOutcome::Ok,
            records,
        }
    }

    pub fn failed(day: NaiveDate, failure: RemoteFailure) -> Self {
        Self {
            day,
            outcome: DayOutcome::Failed(failure),
            records: Vec::new(),
        }
    }

    pub fn failure(&self) -> Option<&RemoteFailure> {
        match &self.outcome {
            DayOutcome::Ok => None,
            DayOutcome::Failed(f) => Some(f),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DayReport {
    pub day: NaiveDate,
    pub record_count: usize,
    pub failure: Option<RemoteFailure>,
}

/// Flattened, ordered output of a range fetch plus per-day bookkeeping.
#[derive(Debug, Clone)]
pub struct RangeFetch {
    pub fuel_type: FuelType,
    pub records: Vec<ConsumptionRecord>,
    pub days: Vec<DayReport>,
}

impl RangeFetch {
    pub fn failed_days(&self) -> Vec<&DayReport> {
        self.days.iter().filter(|d| d.failure.is_some()).collect()
    }

    pub fn is_complete(&self) -> bool {
        self.days.iter().all(|d| d.failure.is_none())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn fuel_type_parses_only_known_values() {
        assert_eq!("electricity".parse::<FuelType>().unwrap(), FuelType::Electricity);
        assert_eq!("gas".parse::<FuelType>().unwrap(), FuelType::Gas);

        for bad in ["", "Gas", "water", "electricity "] {
            let err = bad.parse::<FuelType>().unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidArgument, "input {bad:?}");
        }
    }

    #[test]
    fn range_days_are_inclusive_and_ascending() {
        let range = DateRange::new(d(2020, 2, 27), d(2020, 3, 1)).unwrap();
        let days: Vec<_> = range.days().collect();
        assert_eq!(days, vec![d(2020, 2, 27), d(2020, 2, 28), d(2020, 2, 29), d(2020, 3, 1)]);
        assert_eq!(range.len_days(), 4);
    }

    #[test]
    fn single_day_range_yields_one_day() {
        let range = DateRange::parse("2024-01-01", "2024-01-01").unwrap();
        assert_eq!(range.days().count(), 1);
    }

    #[test]
    fn inverted_range_is_a_configuration_error() {
        let err = DateRange::parse("2024-01-02", "2024-01-01").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn malformed_date_is_a_configuration_error() {
        let err = DateRange::parse("2024/01/01", "2024-01-02").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn next_day_rolls_over_month_end() {
        assert_eq!(next_day(d(2023, 12, 31)), d(2024, 1, 1));
    }

    #[test]
    fn raw_record_tolerates_missing_interval_end() {
        let raw: RawRecord =
            serde_json::from_str(r#"{"consumption": 0.25, "interval_start": "2020-01-01T00:00:00Z"}"#)
                .unwrap();
        assert_eq!(raw.interval_end, "");
        assert_eq!(raw.consumption.to_string(), "0.25");
    }
}
