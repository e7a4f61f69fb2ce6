//! Data models for the risk map pipeline.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ---

/// County census/population row (`census.csv`).
#[derive(Debug, Clone, Deserialize)]
pub struct CensusRow {
    // ---
    #[serde(rename = "fips")]
    pub county_id: String,
    pub county_name: String,
    #[serde(rename = "state_abbrev")]
    pub state_code: String,
    #[serde(rename = "pop")]
    pub population: u64,
}

/// County hospital bed utilization row (`bed_util.csv`).
#[derive(Debug, Clone, Deserialize)]
pub struct BedUtilizationRow {
    // ---
    #[serde(rename = "fips")]
    pub county_id: String,
    #[serde(rename = "bed_util")]
    pub bed_utilization: Option<f64>,
    #[serde(rename = "num_beds")]
    pub bed_capacity: Option<u64>,
}

/// One county/date observation from the daily case table. Rows without a
/// county id cannot join anything and are dropped at decode time.
#[derive(Debug, Clone)]
pub struct CountyCaseRow {
    // ---
    pub date: NaiveDate,
    pub county_id: String,
    pub cases: Option<f64>,
    pub deaths: Option<f64>,
}

/// Per-state current testing/hospitalization snapshot row
/// (`states_current.csv`).
#[derive(Debug, Clone, Deserialize)]
pub struct StateSnapshotRow {
    // ---
    #[serde(rename = "state")]
    pub state_code: String,
    pub positive: Option<f64>,
    pub death: Option<f64>,
    #[serde(rename = "hospitalizedCurrently")]
    pub hospitalized_currently: Option<f64>,
}

/// One state/date new-case increment from the daily state table.
#[derive(Debug, Clone)]
pub struct StateDailyRow {
    // ---
    pub date: NaiveDate,
    pub state_code: String,
    pub new_cases: Option<f64>,
}

/// Shelter-in-place schedule row (`sip_dates.csv`). Dates are kept as raw
/// `%m/%d/%y` strings; the classifier decides what an unparseable or absent
/// value means.
#[derive(Debug, Clone, Deserialize)]
pub struct SipScheduleRow {
    // ---
    #[serde(rename = "state_abbrev")]
    pub state_code: String,
    pub effective_date: Option<String>,
    pub end_date: Option<String>,
}

/// The six immutable source tables one pipeline run consumes.
#[derive(Debug, Clone, Default)]
pub struct SourceTables {
    // ---
    pub census: Vec<CensusRow>,
    pub beds: Vec<BedUtilizationRow>,
    pub county_cases: Vec<CountyCaseRow>,
    pub states_current: Vec<StateSnapshotRow>,
    pub states_daily: Vec<StateDailyRow>,
    pub sip: Vec<SipScheduleRow>,
}

// ---

/// One county after the geographic join, with room for the derived metrics.
///
/// Join misses leave the corresponding inputs `None`; no county with a
/// census row is ever dropped. The derived fields are populated by
/// `pipeline::metrics::derive`; the two growth figures start at 1.0, which
/// is also their floor/fill value.
#[derive(Debug, Clone)]
pub struct CountyRecord {
    // ---
    pub county_id: String,
    pub county_name: String,
    pub state_code: String,
    pub population: u64,
    pub bed_utilization: Option<f64>,
    pub bed_capacity: Option<u64>,
    pub cases: Option<f64>,
    pub deaths: Option<f64>,
    pub cases_last_week: Option<f64>,
    pub deaths_last_week: Option<f64>,
    pub state_hospitalization_rate: Option<f64>,

    /// Week-over-week multiplier, floored at 1. Internal; not served.
    pub case_growth_ratio: f64,
    /// Week-over-week absolute growth, floored at 1.
    pub case_growth_absolute: f64,
    /// Growth per 10,000 residents; `None` below the metro population cutoff.
    pub per_capita_case_growth: Option<f64>,
    /// `cases * state_hospitalization_rate`.
    pub hospitalized_estimate: Option<f64>,
    /// Capacity pressure estimate, clamped to `[0.4, 1.0]` when defined.
    pub bed_load: Option<f64>,
}

/// Per-state snapshot enriched with the filled hospitalization rate and the
/// state's shelter-in-place window.
#[derive(Debug, Clone)]
pub struct StateSnapshot {
    // ---
    pub state_code: String,
    pub positive: Option<f64>,
    pub death: Option<f64>,
    pub hospitalized_currently: Option<f64>,
    /// `hospitalized_currently / positive`, or the cross-state mean when that
    /// quotient is undefined for this state. `None` only when no state has a
    /// defined rate.
    pub hospitalization_rate: Option<f64>,
    pub sip_effective: Option<String>,
    pub sip_end: Option<String>,
}

// ---

/// Where a state's 7-day case average sits relative to its own history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PeakStatus {
    // ---
    #[serde(rename = "peaking")]
    Peaking,
    #[serde(rename = "high risk")]
    HighRisk,
    #[serde(rename = "past peak")]
    PastPeak,
}

/// Shelter-in-place rollback timing label.
///
/// `Weeks(n)` renders as the literal `"<n> weeks"` the map legend expects
/// for small n; offsets above a month collapse to `OnePlusMonth`, and an
/// effective order with no scheduled end is `Tbd`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SipStatus {
    // ---
    Open,
    ThisWeek,
    NextWeek,
    Weeks(i64),
    OnePlusMonth,
    Tbd,
}

impl fmt::Display for SipStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // ---
        match self {
            Self::Open => f.write_str("open"),
            Self::ThisWeek => f.write_str("this week"),
            Self::NextWeek => f.write_str("next week"),
            Self::Weeks(n) => write!(f, "{n} weeks"),
            Self::OnePlusMonth => f.write_str("1+ month"),
            Self::Tbd => f.write_str("TBD"),
        }
    }
}

impl Serialize for SipStatus {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// ---

/// County output row consumed by the map frontend.
#[derive(Debug, Clone, Serialize)]
pub struct CountyRiskRow {
    // ---
    pub county_id: String,
    pub state_code: String,
    pub case_growth_absolute: f64,
    pub per_capita_case_growth: Option<f64>,
    pub bed_load: Option<f64>,
}

/// State output row consumed by the map frontend. `peak_status` is `null`
/// for the one ratio value no classification rule covers.
#[derive(Debug, Clone, Serialize)]
pub struct StateStatusRow {
    // ---
    pub state_code: String,
    pub peak_ratio: f64,
    pub peak_status: Option<PeakStatus>,
    pub sip_status: SipStatus,
}

/// The full dataset one pipeline run produces.
#[derive(Debug, Clone, Serialize)]
pub struct RiskDataset {
    // ---
    pub counties: Vec<CountyRiskRow>,
    pub states: Vec<StateStatusRow>,
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[test]
    fn sip_status_renders_legend_labels() {
        // ---
        assert_eq!(SipStatus::Open.to_string(), "open");
        assert_eq!(SipStatus::ThisWeek.to_string(), "this week");
        assert_eq!(SipStatus::NextWeek.to_string(), "next week");
        assert_eq!(SipStatus::Weeks(2).to_string(), "2 weeks");
        assert_eq!(SipStatus::Weeks(3).to_string(), "3 weeks");
        assert_eq!(SipStatus::OnePlusMonth.to_string(), "1+ month");
        assert_eq!(SipStatus::Tbd.to_string(), "TBD");
    }

    #[test]
    fn status_labels_serialize_as_plain_strings() {
        // ---
        assert_eq!(
            serde_json::to_string(&PeakStatus::HighRisk).unwrap(),
            "\"high risk\""
        );
        assert_eq!(
            serde_json::to_string(&PeakStatus::PastPeak).unwrap(),
            "\"past peak\""
        );
        assert_eq!(
            serde_json::to_string(&SipStatus::Weeks(5)).unwrap(),
            "\"5 weeks\""
        );
        assert_eq!(serde_json::to_string(&SipStatus::Tbd).unwrap(), "\"TBD\"");
    }

    #[test]
    fn unclassified_peak_status_serializes_as_null() {
        // ---
        let row = StateStatusRow {
            state_code: "VT".to_string(),
            peak_ratio: 0.8,
            peak_status: None,
            sip_status: SipStatus::Open,
        };
        let json = serde_json::to_value(&row).unwrap();
        assert!(json["peak_status"].is_null());
    }
}
