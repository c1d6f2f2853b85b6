//! Octopus Energy consumption API client.
//!
//! One GET per calendar day (`period_from=D`, `period_to=D+1`); each day's
//! readings are stamped with the account's meter identity and concatenated
//! in day order.

use std::thread;
use std::time::Duration;

use chrono::{Local, NaiveDate, NaiveDateTime, Timelike};
use rayon::prelude::*;
use reqwest::StatusCode;
use reqwest::blocking::Client;
use serde::Deserialize;
use tracing::{Span, debug, error, info, info_span, warn};

use crate::config::{Credentials, DEFAULT_BASE_URL};
use crate::domain::{
    ConsumptionRecord, DATE_FORMAT, DateRange, DayFetch, DayReport, FuelType, RangeFetch, RawRecord,
    RemoteFailure, next_day,
};
use crate::error::{AppError, AppResult};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const USER_AGENT: &str = concat!("octopus-consumption/", env!("CARGO_PKG_VERSION"));

/// Bounded retry with exponential backoff for transient failures
/// (transport errors, HTTP 5xx and 429).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Extra attempts after the first one.
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub const NONE: RetryPolicy = RetryPolicy {
        max_retries: 0,
        base_delay: Duration::from_millis(500),
    };
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::NONE
    }
}

pub struct OctopusClient {
    client: Client,
    base_url: String,
    credentials: Credentials,
    retry: RetryPolicy,
    concurrency: usize,
    span: Span,
}

impl OctopusClient {
    pub fn new(credentials: Credentials) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| AppError::remote(format!("Failed to build HTTP client: {e}")))?;
        let span = info_span!("octopus_client", customer_id = %credentials.customer_id);

        Ok(Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            credentials,
            retry: RetryPolicy::NONE,
            concurrency: 1,
            span,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Number of days fetched in parallel by [`fetch_range`](Self::fetch_range).
    /// `1` keeps fetching strictly sequential.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Replace the span all of this client's events are recorded under.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Resolve the consumption URL for a fuel given by name.
    ///
    /// Anything other than `electricity` or `gas` is rejected before any I/O.
    pub fn build_endpoint(&self, fuel_type: &str) -> AppResult<String> {
        let fuel: FuelType = fuel_type.parse()?;
        Ok(self.endpoint(fuel))
    }

    pub fn endpoint(&self, fuel: FuelType) -> String {
        let (meter_point_id, serial_number) = self.meter_identity(fuel);
        format!(
            "{}/v1/{}/{}/meters/{}/consumption/",
            self.base_url,
            fuel.meter_points_segment(),
            meter_point_id,
            serial_number
        )
    }

    /// `(mpan, electricity serial)` or `(mprn, gas serial)`.
    fn meter_identity(&self, fuel: FuelType) -> (&str, &str) {
        match fuel {
            FuelType::Electricity => (
                self.credentials.mpan.as_str(),
                self.credentials.electricity_serial_no.as_str(),
            ),
            FuelType::Gas => (self.credentials.mprn.as_str(), self.credentials.gas_serial_no.as_str()),
        }
    }

    /// Fetch one day window. Never fails: remote problems come back as a
    /// `Failed` outcome with no records.
    pub fn fetch_day(&self, fuel: FuelType, day: NaiveDate) -> DayFetch {
        self.span.in_scope(|| self.fetch_day_inner(fuel, day))
    }

    fn fetch_day_inner(&self, fuel: FuelType, day: NaiveDate) -> DayFetch {
        let url = self.endpoint(fuel);
        let period_from = day.format(DATE_FORMAT).to_string();
        let period_to = next_day(day).format(DATE_FORMAT).to_string();

        info!(day = %period_from, fuel = %fuel, "Getting consumption data");

        let mut attempts = 0;
        let mut delay = self.retry.base_delay;

        loop {
            attempts += 1;
            let result = self
                .client
                .get(&url)
                .basic_auth(&self.credentials.api_key, Some(""))
                .query(&[("period_from", &period_from), ("period_to", &period_to)])
                .send();

            let (failure, retryable) = match result {
                Ok(resp) if resp.status() == StatusCode::OK => match resp.json::<ConsumptionPage>() {
                    Ok(page) => {
                        debug!(day = %period_from, records = page.results.len(), "Received consumption page");
                        return DayFetch::ok(day, page.results);
                    }
                    Err(e) => (
                        RemoteFailure {
                            status: Some(StatusCode::OK.as_u16()),
                            message: format!("Failed to parse consumption response: {e}"),
                            attempts,
                        },
                        false,
                    ),
                },
                Ok(resp) => {
                    let status = resp.status();
                    let retryable = status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS;
                    let body = resp.text().unwrap_or_default();
                    (
                        RemoteFailure {
                            status: Some(status.as_u16()),
                            message: if body.is_empty() {
                                status.canonical_reason().unwrap_or("unexpected status").to_string()
                            } else {
                                body
                            },
                            attempts,
                        },
                        retryable,
                    )
                }
                Err(e) => (
                    RemoteFailure {
                        status: e.status().map(|s| s.as_u16()),
                        message: format!("Request failed: {e}"),
                        attempts,
                    },
                    true,
                ),
            };

            if retryable && attempts <= self.retry.max_retries {
                warn!(
                    day = %period_from,
                    attempt = attempts,
                    max_attempts = self.retry.max_retries + 1,
                    "Consumption request failed ({failure}), retrying in {delay:?}"
                );
                thread::sleep(delay);
                delay = next_delay(delay);
                continue;
            }

            match failure.status {
                Some(status) => error!(day = %period_from, status, "Error: Received status code {status}"),
                None => error!(day = %period_from, "Error: {}", failure.message),
            }
            return DayFetch::failed(day, failure);
        }
    }

    /// Fetch every day of `range` and return the normalized records in day
    /// order, API order within a day.
    pub fn fetch_range(&self, fuel: FuelType, range: &DateRange) -> RangeFetch {
        let mut days = Vec::with_capacity(range.len_days());
        days.extend(range.days());
        let fetched = self.fetch_days(fuel, &days);

        let mut records = Vec::new();
        let mut reports = Vec::with_capacity(fetched.len());
        for day in fetched {
            let failure = day.failure().cloned();
            reports.push(DayReport {
                day: day.day,
                record_count: day.records.len(),
                failure,
            });
            records.extend(day.records.into_iter().map(|raw| self.normalize(fuel, raw)));
        }

        let out = RangeFetch {
            fuel_type: fuel,
            records,
            days: reports,
        };
        self.span.in_scope(|| {
            info!(
                fuel = %fuel,
                days = out.days.len(),
                records = out.records.len(),
                failed_days = out.failed_days().len(),
                "Fetched consumption range"
            );
        });
        out
    }

    fn fetch_days(&self, fuel: FuelType, days: &[NaiveDate]) -> Vec<DayFetch> {
        if self.concurrency <= 1 || days.len() <= 1 {
            return days.iter().map(|&day| self.fetch_day(fuel, day)).collect();
        }

        match rayon::ThreadPoolBuilder::new().num_threads(self.concurrency).build() {
            // Indexed parallel collect keeps input order.
            Ok(pool) => pool.install(|| {
                days.par_iter()
                    .map(|&day| self.fetch_day(fuel, day))
                    .collect::<Vec<_>>()
            }),
            Err(e) => {
                self.span.in_scope(|| warn!("Failed to start fetch pool ({e}), fetching sequentially"));
                days.iter().map(|&day| self.fetch_day(fuel, day)).collect()
            }
        }
    }

    /// Stamp a raw reading with the current local time and this client's identity.
    pub fn normalize(&self, fuel: FuelType, raw: RawRecord) -> ConsumptionRecord {
        self.normalize_at(fuel, raw, Local::now().naive_local())
    }

    pub fn normalize_at(&self, fuel: FuelType, raw: RawRecord, now: NaiveDateTime) -> ConsumptionRecord {
        let (meter_point_id, serial_number) = self.meter_identity(fuel);
        ConsumptionRecord {
            interval_start: raw.interval_start,
            interval_end: raw.interval_end,
            consumption: raw.consumption,
            // Second precision, matching the rendered output.
            request_time: now.with_nanosecond(0).unwrap_or(now),
            fuel_type: fuel,
            meter_point_id: meter_point_id.to_string(),
            serial_number: serial_number.to_string(),
            customer_id: self.credentials.customer_id.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ConsumptionPage {
    results: Vec<RawRecord>,
}

/// Exponential backoff step; saturates instead of overflowing.
fn next_delay(delay: Duration) -> Duration {
    delay.saturating_mul(2)
}
