//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - request inputs (`FuelType`, `DateRange`)
//! - API readings before and after normalization (`RawRecord`, `ConsumptionRecord`)
//! - per-day fetch outcomes (`DayFetch`, `RangeFetch`)

pub mod types;

pub use types::*;
