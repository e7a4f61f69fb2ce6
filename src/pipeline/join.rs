//! Left-joins the source tables into one county-indexed table.
//!
//! The census table is the spine: every county with a population record
//! survives the join, and a missing bed, case, or hospitalization-rate
//! match leaves the corresponding fields `None` for the metrics stage to
//! resolve. The daily case table is consulted twice, once filtered to the
//! "now" date and once to the prior-week date.

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::models::{BedUtilizationRow, CensusRow, CountyCaseRow, CountyRecord, StateSnapshot};

use super::ReferenceDates;

// ---

pub fn join_tables(
    census: &[CensusRow],
    beds: &[BedUtilizationRow],
    county_cases: &[CountyCaseRow],
    snapshots: &[StateSnapshot],
    dates: &ReferenceDates,
) -> Vec<CountyRecord> {
    // ---
    let beds_by_county: HashMap<&str, &BedUtilizationRow> =
        beds.iter().map(|b| (b.county_id.as_str(), b)).collect();
    let cases_now = cases_on(county_cases, dates.today);
    let cases_prior = cases_on(county_cases, dates.last_week);
    let rate_by_state: HashMap<&str, Option<f64>> = snapshots
        .iter()
        .map(|s| (s.state_code.as_str(), s.hospitalization_rate))
        .collect();

    census
        .iter()
        .map(|county| {
            let bed = beds_by_county.get(county.county_id.as_str());
            let now = cases_now.get(county.county_id.as_str());
            let prior = cases_prior.get(county.county_id.as_str());

            CountyRecord {
                county_id: county.county_id.clone(),
                county_name: county.county_name.clone(),
                state_code: county.state_code.clone(),
                population: county.population,
                bed_utilization: bed.and_then(|b| b.bed_utilization),
                bed_capacity: bed.and_then(|b| b.bed_capacity),
                cases: now.and_then(|r| r.cases),
                deaths: now.and_then(|r| r.deaths),
                cases_last_week: prior.and_then(|r| r.cases),
                deaths_last_week: prior.and_then(|r| r.deaths),
                state_hospitalization_rate: rate_by_state
                    .get(county.state_code.as_str())
                    .copied()
                    .flatten(),
                case_growth_ratio: 1.0,
                case_growth_absolute: 1.0,
                per_capita_case_growth: None,
                hospitalized_estimate: None,
                bed_load: None,
            }
        })
        .collect()
}

/// Index the case rows carrying the given observation date by county id.
fn cases_on(rows: &[CountyCaseRow], date: NaiveDate) -> HashMap<&str, &CountyCaseRow> {
    // ---
    rows.iter()
        .filter(|r| r.date == date)
        .map(|r| (r.county_id.as_str(), r))
        .collect()
}
