//! Credentials and runtime settings sourced from the environment (and `.env`).

use std::fmt;
use std::path::PathBuf;

use crate::error::{AppError, AppResult};

pub const DEFAULT_BASE_URL: &str = "https://api.octopus.energy";

const ENV_MPAN: &str = "MPAN";
const ENV_MPRN: &str = "MPRN";
const ENV_ELECTRICITY_SERIAL_NO: &str = "ELECTRICITY_SERIAL_NO";
const ENV_GAS_SERIAL_NO: &str = "GAS_SERIAL_NO";
const ENV_API_KEY: &str = "API_KEY";
const ENV_CUSTOMER_ID: &str = "CUSTOMER_ID";
const ENV_BASE_URL: &str = "OCTOPUS_BASE_URL";
const ENV_DATA_FOLDER: &str = "DATA_FOLDER";

/// Meter identity and API key for one customer account.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub mpan: String,
    pub mprn: String,
    pub electricity_serial_no: String,
    pub gas_serial_no: String,
    pub api_key: String,
    pub customer_id: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("mpan", &self.mpan)
            .field("mprn", &self.mprn)
            .field("electricity_serial_no", &self.electricity_serial_no)
            .field("gas_serial_no", &self.gas_serial_no)
            .field("api_key", &"<redacted>")
            .field("customer_id", &self.customer_id)
            .finish()
    }
}

impl Credentials {
    /// Load from the process environment, reading `.env` first if present.
    pub fn from_env() -> AppResult<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load through an arbitrary key lookup. Blank values count as missing.
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |key: &str| -> AppResult<String> {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| AppError::config(format!("Missing {key} in environment (.env).")))
        };

        Ok(Self {
            mpan: require(ENV_MPAN)?,
            mprn: require(ENV_MPRN)?,
            electricity_serial_no: require(ENV_ELECTRICITY_SERIAL_NO)?,
            gas_serial_no: require(ENV_GAS_SERIAL_NO)?,
            api_key: require(ENV_API_KEY)?,
            customer_id: require(ENV_CUSTOMER_ID)?,
        })
    }
}

/// Optional settings that have sensible defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub base_url: String,
    pub data_folder: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            data_folder: PathBuf::from("."),
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let non_blank = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            base_url: non_blank(ENV_BASE_URL)
                .map(|v| v.trim().trim_end_matches('/').to_string())
                .unwrap_or(defaults.base_url),
            data_folder: non_blank(ENV_DATA_FOLDER)
                .map(PathBuf::from)
                .unwrap_or(defaults.data_folder),
        }
    }
}
