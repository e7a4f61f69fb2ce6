//! Dataset loading: fetch the public source tables and decode them.
//!
//! Fetching and decoding are split so the decoders stay pure and testable
//! from in-memory bytes. Decoding is lenient: a malformed row is logged at
//! debug level and skipped, never failing the whole table, since upstream
//! CSVs routinely carry stray rows (counties without a fips code, blank
//! numeric cells, unparseable dates).

use std::time::Duration;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::config::Config;
use crate::models::{
    BedUtilizationRow, CensusRow, CountyCaseRow, SipScheduleRow, SourceTables, StateDailyRow,
    StateSnapshotRow,
};

// ---

/// Fetch and decode all six source tables.
///
/// Tables are fetched sequentially with one shared client; an HTTP failure
/// on any table fails the load (there is no partial dataset to serve).
pub async fn load_tables(cfg: &Config) -> Result<SourceTables> {
    // ---
    let client = Client::builder()
        .timeout(Duration::from_secs(cfg.source_timeout_secs))
        .build()
        .context("failed to build HTTP client")?;

    let census = decode_census(fetch_csv(&client, &cfg.census_url).await?.as_bytes());
    let beds = decode_bed_utilization(fetch_csv(&client, &cfg.bed_util_url).await?.as_bytes());
    let county_cases =
        decode_county_cases(fetch_csv(&client, &cfg.county_cases_url).await?.as_bytes());
    let states_current =
        decode_state_snapshots(fetch_csv(&client, &cfg.states_current_url).await?.as_bytes());
    let states_daily =
        decode_state_daily(fetch_csv(&client, &cfg.states_daily_url).await?.as_bytes());
    let sip = decode_sip_schedule(fetch_csv(&client, &cfg.sip_dates_url).await?.as_bytes());

    Ok(SourceTables {
        census,
        beds,
        county_cases,
        states_current,
        states_daily,
        sip,
    })
}

async fn fetch_csv(client: &Client, url: &str) -> Result<String> {
    // ---
    tracing::debug!("Fetching {url}");

    let response = client
        .get(url)
        .send()
        .await
        .and_then(|r| r.error_for_status())
        .with_context(|| format!("request for {url} failed"))?;

    let body = response
        .text()
        .await
        .with_context(|| format!("reading body of {url} failed"))?;

    tracing::debug!("Fetched {} bytes from {url}", body.len());
    Ok(body)
}

/// Shared lenient decode loop: bad rows are logged and skipped.
fn decode_rows<T: DeserializeOwned>(data: &[u8], table: &str) -> Vec<T> {
    // ---
    let mut reader = csv::Reader::from_reader(data);
    let mut rows = Vec::new();
    for (i, result) in reader.deserialize::<T>().enumerate() {
        match result {
            Ok(row) => rows.push(row),
            Err(e) => tracing::debug!("Skipping {table} row {i}: {e}"),
        }
    }
    rows
}

/// County ids join everything; normalize them to the standard 5-digit
/// zero-padded form so integer-typed and string-typed sources agree.
fn zero_pad_fips(raw: &str) -> String {
    format!("{:0>5}", raw.trim())
}

// ---

pub fn decode_census(data: &[u8]) -> Vec<CensusRow> {
    // ---
    let mut rows = decode_rows::<CensusRow>(data, "census");
    for row in &mut rows {
        row.county_id = zero_pad_fips(&row.county_id);
    }
    tracing::info!("Decoded {} census rows", rows.len());
    rows
}

pub fn decode_bed_utilization(data: &[u8]) -> Vec<BedUtilizationRow> {
    // ---
    let mut rows = decode_rows::<BedUtilizationRow>(data, "bed utilization");
    for row in &mut rows {
        row.county_id = zero_pad_fips(&row.county_id);
    }
    tracing::info!("Decoded {} bed utilization rows", rows.len());
    rows
}

/// Daily county case table. The `fips` column is blank for the "Unknown"
/// county rows; those cannot participate in any join and are skipped.
#[derive(Debug, Deserialize)]
struct RawCountyCaseRow {
    // ---
    date: NaiveDate,
    fips: Option<String>,
    cases: Option<f64>,
    deaths: Option<f64>,
}

pub fn decode_county_cases(data: &[u8]) -> Vec<CountyCaseRow> {
    // ---
    let raw = decode_rows::<RawCountyCaseRow>(data, "county case");
    let total = raw.len();

    let rows: Vec<CountyCaseRow> = raw
        .into_iter()
        .filter_map(|r| {
            let fips = r.fips.as_deref().filter(|f| !f.trim().is_empty())?;
            Some(CountyCaseRow {
                date: r.date,
                county_id: zero_pad_fips(fips),
                cases: r.cases,
                deaths: r.deaths,
            })
        })
        .collect();

    tracing::info!(
        "Decoded {} county case rows ({} without a county id)",
        rows.len(),
        total - rows.len()
    );
    rows
}

pub fn decode_state_snapshots(data: &[u8]) -> Vec<StateSnapshotRow> {
    // ---
    let rows = decode_rows::<StateSnapshotRow>(data, "state snapshot");
    tracing::info!("Decoded {} state snapshot rows", rows.len());
    rows
}

/// Daily state table; its `date` column is compact `yyyymmdd`.
#[derive(Debug, Deserialize)]
struct RawStateDailyRow {
    // ---
    date: u32,
    state: String,
    #[serde(rename = "positiveIncrease")]
    positive_increase: Option<f64>,
}

pub fn decode_state_daily(data: &[u8]) -> Vec<StateDailyRow> {
    // ---
    let raw = decode_rows::<RawStateDailyRow>(data, "state daily");

    let mut rows = Vec::with_capacity(raw.len());
    for r in raw {
        match NaiveDate::parse_from_str(&r.date.to_string(), "%Y%m%d") {
            Ok(date) => rows.push(StateDailyRow {
                date,
                state_code: r.state,
                new_cases: r.positive_increase,
            }),
            Err(e) => tracing::debug!("Skipping state daily row dated {}: {e}", r.date),
        }
    }
    tracing::info!("Decoded {} state daily rows", rows.len());
    rows
}

pub fn decode_sip_schedule(data: &[u8]) -> Vec<SipScheduleRow> {
    // ---
    let rows = decode_rows::<SipScheduleRow>(data, "SIP schedule");
    tracing::info!("Decoded {} SIP schedule rows", rows.len());
    rows
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[test]
    fn census_fips_codes_are_zero_padded() {
        // ---
        let data = b"fips,county_name,state_abbrev,pop\n1001,Autauga,AL,55869\n36061,New York,NY,1628706\n";
        let rows = decode_census(data);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].county_id, "01001");
        assert_eq!(rows[0].county_name, "Autauga");
        assert_eq!(rows[0].state_code, "AL");
        assert_eq!(rows[0].population, 55869);
        assert_eq!(rows[1].county_id, "36061");
    }

    #[test]
    fn malformed_census_row_is_skipped_not_fatal() {
        // ---
        let data = b"fips,county_name,state_abbrev,pop\n1001,Autauga,AL,55869\n1003,Baldwin,AL,not-a-number\n";
        let rows = decode_census(data);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].county_id, "01001");
    }

    #[test]
    fn bed_utilization_blanks_decode_as_none() {
        // ---
        let data = b"fips,bed_util,num_beds\n1001,0.55,250\n1003,,\n";
        let rows = decode_bed_utilization(data);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].bed_utilization, Some(0.55));
        assert_eq!(rows[0].bed_capacity, Some(250));
        assert_eq!(rows[1].bed_utilization, None);
        assert_eq!(rows[1].bed_capacity, None);
    }

    #[test]
    fn county_cases_skip_rows_without_fips() {
        // ---
        let data = b"date,county,state,fips,cases,deaths\n2020-05-20,Autauga,Alabama,01001,150,4\n2020-05-20,Unknown,Alabama,,99,1\n";
        let rows = decode_county_cases(data);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].county_id, "01001");
        assert_eq!(rows[0].date, NaiveDate::from_ymd_opt(2020, 5, 20).unwrap());
        assert_eq!(rows[0].cases, Some(150.0));
        assert_eq!(rows[0].deaths, Some(4.0));
    }

    #[test]
    fn state_daily_decodes_compact_dates() {
        // ---
        let data = b"date,state,positive,positiveIncrease\n20200520,NY,356458,1525\n20200519,NY,354933,\n";
        let rows = decode_state_daily(data);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].date, NaiveDate::from_ymd_opt(2020, 5, 20).unwrap());
        assert_eq!(rows[0].state_code, "NY");
        assert_eq!(rows[0].new_cases, Some(1525.0));
        assert_eq!(rows[1].new_cases, None);
    }

    #[test]
    fn state_daily_skips_impossible_dates() {
        // ---
        let data = b"date,state,positiveIncrease\n20200532,NY,10\n20200520,NY,12\n";
        let rows = decode_state_daily(data);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].new_cases, Some(12.0));
    }

    #[test]
    fn sip_schedule_blank_dates_decode_as_none() {
        // ---
        let data = b"state_abbrev,effective_date,end_date\nAL,4/4/20,4/30/20\nAR,,\nCA,3/19/20,\n";
        let rows = decode_sip_schedule(data);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].end_date.as_deref(), Some("4/30/20"));
        assert_eq!(rows[1].effective_date, None);
        assert_eq!(rows[1].end_date, None);
        assert_eq!(rows[2].effective_date.as_deref(), Some("3/19/20"));
        assert_eq!(rows[2].end_date, None);
    }
}
