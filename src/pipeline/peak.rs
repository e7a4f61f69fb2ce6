//! Peak-status classification over the per-state daily case series.
//!
//! Each state's daily new-case increments become a date-ordered series; a
//! trailing 7-day simple moving average is compared against that state's
//! own historical maximum average, and the resulting ratio is classified by
//! an ordered rule list.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::models::{PeakStatus, StateDailyRow};

// ---

/// Trailing window length, in observations, for the rolling average.
const WINDOW: usize = 7;

/// Ordered rule list, evaluated top to bottom with the last match winning:
/// "peaking" deliberately overrides "high risk" above 0.95. A ratio of
/// exactly 0.8 matches no rule and stays unclassified.
const RULES: &[(fn(f64) -> bool, PeakStatus)] = &[
    (|ratio| ratio > 0.8, PeakStatus::HighRisk),
    (|ratio| ratio > 0.95, PeakStatus::Peaking),
    (|ratio| ratio < 0.8, PeakStatus::PastPeak),
];

/// Peak summary for one state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatePeak {
    // ---
    /// Latest defined rolling average over the state's own maximum, in
    /// `[0, 1]`; 0 when the state has no defined rolling average yet.
    pub peak_ratio: f64,
    pub status: Option<PeakStatus>,
}

// ---

/// Classify every state observed in the daily series.
pub fn peak_status(rows: &[StateDailyRow]) -> BTreeMap<String, StatePeak> {
    // ---
    let mut series: BTreeMap<&str, Vec<(NaiveDate, Option<f64>)>> = BTreeMap::new();
    for row in rows {
        series
            .entry(row.state_code.as_str())
            .or_default()
            .push((row.date, row.new_cases));
    }

    series
        .into_iter()
        .map(|(state, mut points)| {
            points.sort_by_key(|(date, _)| *date);
            let increments: Vec<Option<f64>> = points.into_iter().map(|(_, v)| v).collect();
            let rolling = rolling_mean(&increments, WINDOW);
            let ratio = peak_ratio(&rolling);
            (
                state.to_string(),
                StatePeak {
                    peak_ratio: ratio,
                    status: classify_peak_ratio(ratio),
                },
            )
        })
        .collect()
}

/// Trailing simple moving average. The first `window - 1` positions are
/// undefined, as is any window containing a missing increment.
fn rolling_mean(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    // ---
    if values.len() < window {
        return vec![None; values.len()];
    }

    let mut averages = vec![None; window - 1];
    averages.extend(values.windows(window).map(|w| {
        let mut sum = 0.0;
        for value in w {
            sum += (*value)?;
        }
        Some(sum / window as f64)
    }));
    averages
}

/// Latest defined rolling average over the historical maximum.
///
/// Undefined or non-positive maxima map to 0, and the quotient is clamped
/// into `[0, 1]`; upstream data corrections produce negative increments
/// that would otherwise leak out of the ratio's range.
fn peak_ratio(rolling: &[Option<f64>]) -> f64 {
    // ---
    let defined: Vec<f64> = rolling.iter().flatten().copied().collect();
    let Some(&latest) = defined.last() else {
        return 0.0;
    };
    let max = defined.iter().copied().fold(f64::MIN, f64::max);
    if max <= 0.0 {
        return 0.0;
    }
    (latest / max).clamp(0.0, 1.0)
}

/// Apply the ordered rule list to a peak ratio.
pub fn classify_peak_ratio(ratio: f64) -> Option<PeakStatus> {
    // ---
    let mut status = None;
    for (matches, label) in RULES {
        if matches(ratio) {
            status = Some(*label);
        }
    }
    status
}
