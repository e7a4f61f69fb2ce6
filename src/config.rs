//! Configuration loader for the `covid-riskmap` backend service.
//!
//! This module centralizes all runtime configuration values and their defaults,
//! loading from environment variables (with optional `.env` file support
//! provided by the caller). The six public source tables the pipeline reads
//! were hardcoded URLs in earlier incarnations of this tool; they are
//! configuration here so deployments can point at mirrors or fixtures.
use std::env;

use anyhow::{anyhow, Result};

/// Parse an optional integer environment variable with a default value.
macro_rules! parse_env_u64 {
    ($var_name:expr, $default:expr) => {
        env::var($var_name)
            .ok()
            .map(|v| v.parse::<u64>())
            .transpose()
            .map_err(|e| anyhow!("Invalid {}: {}", $var_name, e))?
            .unwrap_or($default)
    };
}

/// Read an optional string environment variable with a default value.
macro_rules! env_or {
    ($var_name:expr, $default:expr) => {
        env::var($var_name).unwrap_or_else(|_| $default.to_string())
    };
}

const CENSUS_URL: &str = "https://raw.githubusercontent.com/robdinh/covid19/master/census.csv";
const BED_UTIL_URL: &str = "https://raw.githubusercontent.com/robdinh/covid19/master/bed_util.csv";
const COUNTY_CASES_URL: &str =
    "https://raw.githubusercontent.com/nytimes/covid-19-data/master/us-counties.csv";
const STATES_CURRENT_URL: &str = "https://raw.githubusercontent.com/COVID19Tracking/covid-tracking-data/master/data/states_current.csv";
const STATES_DAILY_URL: &str = "https://raw.githubusercontent.com/COVID19Tracking/covid-tracking-data/master/data/states_daily_4pm_et.csv";
const SIP_DATES_URL: &str =
    "https://raw.githubusercontent.com/robdinh/covid19/master/sip_dates.csv";

/// Strongly typed application configuration.
///
/// All fields are immutable after loading, ensuring a consistent configuration
/// snapshot for the lifetime of the application.
#[derive(Debug, Clone)]
pub struct Config {
    // ---
    /// County census/population table URL.
    pub census_url: String,

    /// County hospital bed utilization table URL.
    pub bed_util_url: String,

    /// Daily county case/death counts table URL.
    pub county_cases_url: String,

    /// Per-state current testing/hospitalization snapshot URL.
    pub states_current_url: String,

    /// Per-state daily case increments table URL.
    pub states_daily_url: String,

    /// Shelter-in-place schedule dates table URL.
    pub sip_dates_url: String,

    /// Per-fetch timeout in seconds (safety limit for upstream stalls).
    pub source_timeout_secs: u64,
}

/// Load configuration from environment variables with defaults.
///
/// All source URLs default to the public datasets and may be overridden
/// individually (`CENSUS_URL`, `BED_UTIL_URL`, `COUNTY_CASES_URL`,
/// `STATES_CURRENT_URL`, `STATES_DAILY_URL`, `SIP_DATES_URL`).
///
/// Optional:
/// - `SOURCE_TIMEOUT_SECS` – per-fetch timeout in seconds (default: 60)
///
/// Returns an error if a numeric variable is present but invalid.
pub fn load_from_env() -> Result<Config> {
    // ---
    Ok(Config {
        census_url: env_or!("CENSUS_URL", CENSUS_URL),
        bed_util_url: env_or!("BED_UTIL_URL", BED_UTIL_URL),
        county_cases_url: env_or!("COUNTY_CASES_URL", COUNTY_CASES_URL),
        states_current_url: env_or!("STATES_CURRENT_URL", STATES_CURRENT_URL),
        states_daily_url: env_or!("STATES_DAILY_URL", STATES_DAILY_URL),
        sip_dates_url: env_or!("SIP_DATES_URL", SIP_DATES_URL),
        source_timeout_secs: parse_env_u64!("SOURCE_TIMEOUT_SECS", 60),
    })
}

impl Config {
    /// Log the loaded configuration for debugging purposes.
    pub fn log_config(&self) {
        // ---
        tracing::info!("Configuration loaded:");
        tracing::info!("  CENSUS_URL          : {}", self.census_url);
        tracing::info!("  BED_UTIL_URL        : {}", self.bed_util_url);
        tracing::info!("  COUNTY_CASES_URL    : {}", self.county_cases_url);
        tracing::info!("  STATES_CURRENT_URL  : {}", self.states_current_url);
        tracing::info!("  STATES_DAILY_URL    : {}", self.states_daily_url);
        tracing::info!("  SIP_DATES_URL       : {}", self.sip_dates_url);
        tracing::info!("  SOURCE_TIMEOUT_SECS : {}", self.source_timeout_secs);
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[test]
    fn defaults_point_at_public_datasets() {
        // ---
        let cfg = load_from_env().unwrap();
        assert!(cfg.county_cases_url.contains("us-counties.csv"));
        assert!(cfg.sip_dates_url.contains("sip_dates.csv"));
        assert_eq!(cfg.source_timeout_secs, 60);
    }
}
