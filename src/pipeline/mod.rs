//! The merge-and-derive core: joins the source tables by geographic key,
//! derives normalized risk ratios, and classifies each state's peak and
//! shelter-in-place rollback status.
//!
//! The core is a pure, single-pass batch computation. It never touches the
//! network or the clock; the calendar anchors arrive as [`ReferenceDates`]
//! and every anomaly in the data (join misses, degenerate arithmetic,
//! unparseable dates) resolves locally into the sentinel values the
//! individual modules document. Identical inputs produce identical output,
//! which is what makes rerunning the pipeline safe.
//!
//! Gateway module (EMBP): `run` is the one entry point; the stage modules
//! are siblings below it.

use std::collections::BTreeSet;

use chrono::{Datelike, Duration, NaiveDate};

use crate::models::{CountyRiskRow, RiskDataset, SourceTables, StateStatusRow};

mod join;
mod metrics;
mod peak;
mod sip;

pub use join::join_tables;
pub use metrics::{build_state_snapshots, derive};
pub use peak::{classify_peak_ratio, peak_status, StatePeak};
pub use sip::{classify_week_diff, sip_status};

// ---

/// Calendar anchors for one pipeline run, injected by the caller so the
/// core itself never reads the system clock.
#[derive(Debug, Clone, Copy)]
pub struct ReferenceDates {
    // ---
    /// Date whose county case rows count as "now".
    pub today: NaiveDate,
    /// Date whose county case rows count as the prior-week baseline.
    pub last_week: NaiveDate,
    /// ISO week number the SIP week offsets are measured against.
    pub current_week: u32,
}

impl ReferenceDates {
    /// Anchor a run to a wall-clock date: "now" is the last complete
    /// reporting day (`now - 1`), the baseline sits a week before that
    /// (`now - 8`), and SIP offsets are measured from `now`'s ISO week.
    pub fn anchored_to(now: NaiveDate) -> Self {
        // ---
        Self {
            today: now - Duration::days(1),
            last_week: now - Duration::days(8),
            current_week: now.iso_week().week(),
        }
    }
}

// ---

/// Run the full pipeline over one set of source tables.
pub fn run(tables: &SourceTables, dates: &ReferenceDates) -> RiskDataset {
    // ---
    let snapshots = metrics::build_state_snapshots(&tables.states_current, &tables.sip);

    let mut counties = join::join_tables(
        &tables.census,
        &tables.beds,
        &tables.county_cases,
        &snapshots,
        dates,
    );
    metrics::derive(&mut counties);

    let peaks = peak::peak_status(&tables.states_daily);
    let sip_labels = sip::sip_status(&snapshots, dates.current_week);

    let county_rows = counties
        .iter()
        .map(|c| CountyRiskRow {
            county_id: c.county_id.clone(),
            state_code: c.state_code.clone(),
            case_growth_absolute: c.case_growth_absolute,
            per_capita_case_growth: c.per_capita_case_growth,
            bed_load: c.bed_load,
        })
        .collect();

    // One output row per state seen in either state-level table. A state
    // with no daily history has never had a defined rolling average; one
    // with no snapshot has no SIP dates on record.
    let mut codes: BTreeSet<&str> = snapshots.iter().map(|s| s.state_code.as_str()).collect();
    codes.extend(peaks.keys().map(String::as_str));

    let state_rows = codes
        .into_iter()
        .map(|code| {
            let (peak_ratio, peak_label) = match peaks.get(code) {
                Some(p) => (p.peak_ratio, p.status),
                None => (0.0, peak::classify_peak_ratio(0.0)),
            };
            let sip_label = sip_labels
                .get(code)
                .copied()
                .unwrap_or_else(|| sip::classify_week_diff(sip::NO_DATES));
            StateStatusRow {
                state_code: code.to_string(),
                peak_ratio,
                peak_status: peak_label,
                sip_status: sip_label,
            }
        })
        .collect();

    RiskDataset {
        counties: county_rows,
        states: state_rows,
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[test]
    fn reference_dates_anchor_behind_the_wall_clock() {
        // ---
        let dates = ReferenceDates::anchored_to(NaiveDate::from_ymd_opt(2020, 5, 21).unwrap());
        assert_eq!(dates.today, NaiveDate::from_ymd_opt(2020, 5, 20).unwrap());
        assert_eq!(dates.last_week, NaiveDate::from_ymd_opt(2020, 5, 13).unwrap());
        assert_eq!(dates.current_week, 21);
    }

    #[test]
    fn reference_dates_cross_month_boundaries() {
        // ---
        let dates = ReferenceDates::anchored_to(NaiveDate::from_ymd_opt(2020, 6, 3).unwrap());
        assert_eq!(dates.today, NaiveDate::from_ymd_opt(2020, 6, 2).unwrap());
        assert_eq!(dates.last_week, NaiveDate::from_ymd_opt(2020, 5, 26).unwrap());
    }
}
