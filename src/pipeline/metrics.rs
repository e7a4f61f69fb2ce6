//! Row-wise derivation of the county risk metrics, plus the state-level
//! hospitalization-rate fill the county join inherits from.
//!
//! Every guard here resolves a data anomaly into a value rather than an
//! error: undefined or shrinking week-over-week growth floors at 1, the
//! per-capita figure is withheld below the metro population cutoff, and the
//! bed-load estimate is clamped into its displayable band.

use std::collections::HashMap;

use crate::models::{CountyRecord, SipScheduleRow, StateSnapshot, StateSnapshotRow};

// ---

/// Counties below this population are excluded from the per-capita figure;
/// small denominators make the rate meaningless for the map.
const METRO_POPULATION_MIN: u64 = 50_000;

/// Per-capita growth is expressed per 10,000 residents.
const PER_CAPITA_BASIS: f64 = 10_000.0;

/// Display band for the bed-load estimate. The upper bound is saturation;
/// the lower bound is a color-scale floor, not a utilization claim.
const BED_LOAD_MIN: f64 = 0.4;
const BED_LOAD_MAX: f64 = 1.0;

// ---

/// Build the per-state snapshots: compute each state's hospitalization
/// rate, fill undefined rates with the cross-state mean (computed once over
/// the full table, before any county sees it), and attach the state's
/// shelter-in-place window by left join.
pub fn build_state_snapshots(
    states: &[StateSnapshotRow],
    sip: &[SipScheduleRow],
) -> Vec<StateSnapshot> {
    // ---
    let raw_rates: Vec<Option<f64>> = states.iter().map(raw_hospitalization_rate).collect();

    let defined: Vec<f64> = raw_rates.iter().flatten().copied().collect();
    let mean_rate = if defined.is_empty() {
        None
    } else {
        Some(defined.iter().sum::<f64>() / defined.len() as f64)
    };

    let sip_by_state: HashMap<&str, &SipScheduleRow> =
        sip.iter().map(|r| (r.state_code.as_str(), r)).collect();

    states
        .iter()
        .zip(raw_rates)
        .map(|(row, rate)| {
            let schedule = sip_by_state.get(row.state_code.as_str());
            StateSnapshot {
                state_code: row.state_code.clone(),
                positive: row.positive,
                death: row.death,
                hospitalized_currently: row.hospitalized_currently,
                hospitalization_rate: rate.or(mean_rate),
                sip_effective: schedule.and_then(|s| s.effective_date.clone()),
                sip_end: schedule.and_then(|s| s.end_date.clone()),
            }
        })
        .collect()
}

/// `hospitalized_currently / positive`; undefined when the positive count
/// is zero or either input is missing.
fn raw_hospitalization_rate(row: &StateSnapshotRow) -> Option<f64> {
    // ---
    match (row.hospitalized_currently, row.positive) {
        (Some(hospitalized), Some(positive)) if positive > 0.0 => Some(hospitalized / positive),
        _ => None,
    }
}

// ---

/// Derive the risk metrics for every joined county record.
pub fn derive(records: &mut [CountyRecord]) {
    // ---
    for record in records.iter_mut() {
        derive_row(record);
    }
}

fn derive_row(r: &mut CountyRecord) {
    // ---
    // A zero prior count is as degenerate a denominator as a missing one:
    // both growth figures fall back to their floor of 1 ("no change").
    let prior = r.cases_last_week.filter(|&lw| lw > 0.0);

    if let (Some(now), Some(lw)) = (r.cases, prior) {
        r.case_growth_ratio = f64::max(now / lw, 1.0);
        r.case_growth_absolute = f64::max(now - lw, 1.0);
    } else {
        r.case_growth_ratio = 1.0;
        r.case_growth_absolute = 1.0;
    }

    // The metro filter takes precedence over every other per-capita rule.
    r.per_capita_case_growth = if r.population < METRO_POPULATION_MIN {
        None
    } else {
        Some(r.case_growth_absolute / r.population as f64 * PER_CAPITA_BASIS)
    };

    r.hospitalized_estimate = match (r.cases, r.state_hospitalization_rate) {
        (Some(cases), Some(rate)) => Some(cases * rate),
        _ => None,
    };

    r.bed_load = match (r.bed_utilization, r.hospitalized_estimate, r.bed_capacity) {
        (Some(utilization), Some(hospitalized), Some(capacity)) => {
            let load = utilization + hospitalized / capacity as f64;
            // 0/0 capacity arithmetic yields NaN; that is a join-quality
            // problem, not a saturated hospital, so it stays undefined.
            if load.is_nan() {
                None
            } else {
                Some(load.clamp(BED_LOAD_MIN, BED_LOAD_MAX))
            }
        }
        _ => None,
    };
}
