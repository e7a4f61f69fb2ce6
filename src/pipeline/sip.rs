//! Shelter-in-place rollback timing classification.
//!
//! Each state's scheduled SIP end date is converted to a signed ISO-week
//! offset from the injected current week, with sentinel offsets standing in
//! for the two "no date" shapes, and the offset is classified by an ordered
//! rule list.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};

use crate::models::{SipStatus, StateSnapshot};

// ---

/// Week-diff sentinel for an effective order with no scheduled end.
pub(crate) const EFFECTIVE_OPEN_ENDED: i64 = 1000;

/// Week-diff sentinel for a state with no order dates on record.
pub(crate) const NO_DATES: i64 = -1000;

/// Schedule dates arrive as `%m/%d/%y` strings.
const DATE_FORMAT: &str = "%m/%d/%y";

/// Ordered rule list, evaluated top to bottom with the last match winning.
/// The ordering carries two deliberate overrides: offsets above a month
/// collapse the literal week count into "1+ month", and the open-ended
/// sentinel collapses "1+ month" into "TBD".
const RULES: &[(fn(i64) -> bool, fn(i64) -> SipStatus)] = &[
    (|wd| wd < 0, |_| SipStatus::Open),
    (|wd| wd == 0, |_| SipStatus::ThisWeek),
    (|wd| wd == 1, |_| SipStatus::NextWeek),
    (|wd| wd > 1, SipStatus::Weeks),
    (|wd| wd > 3, |_| SipStatus::OnePlusMonth),
    (|wd| wd == EFFECTIVE_OPEN_ENDED, |_| SipStatus::Tbd),
];

// ---

/// Classify every state in the snapshot table.
pub fn sip_status(snapshots: &[StateSnapshot], current_week: u32) -> BTreeMap<String, SipStatus> {
    // ---
    snapshots
        .iter()
        .map(|s| (s.state_code.clone(), classify_snapshot(s, current_week)))
        .collect()
}

fn classify_snapshot(snapshot: &StateSnapshot, current_week: u32) -> SipStatus {
    classify_week_diff(week_diff(snapshot, current_week))
}

/// Signed ISO-week offset between the SIP end date and the current week.
///
/// An unparseable end date counts as missing, so it flows through the same
/// sentinels: an effective order without a usable end date is open-ended,
/// and a state with neither date takes the no-dates sentinel.
fn week_diff(snapshot: &StateSnapshot, current_week: u32) -> i64 {
    // ---
    let end_week = snapshot.sip_end.as_deref().and_then(parse_end_week);
    match end_week {
        Some(week) => i64::from(week) - i64::from(current_week),
        None if snapshot.sip_effective.is_some() => EFFECTIVE_OPEN_ENDED,
        None => NO_DATES,
    }
}

fn parse_end_week(raw: &str) -> Option<u32> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
        .ok()
        .map(|date| date.iso_week().week())
}

/// Apply the ordered rule list to a week offset. The first four rules
/// partition the integers, so every offset gets a label.
pub fn classify_week_diff(week_diff: i64) -> SipStatus {
    // ---
    let mut status = None;
    for (matches, label) in RULES {
        if matches(week_diff) {
            status = Some(label(week_diff));
        }
    }
    status.unwrap_or(SipStatus::Open)
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    fn snapshot(state: &str, effective: Option<&str>, end: Option<&str>) -> StateSnapshot {
        // ---
        StateSnapshot {
            state_code: state.to_string(),
            positive: None,
            death: None,
            hospitalized_currently: None,
            hospitalization_rate: None,
            sip_effective: effective.map(str::to_string),
            sip_end: end.map(str::to_string),
        }
    }

    #[test]
    fn offsets_classify_through_the_ordered_rules() {
        // ---
        assert_eq!(classify_week_diff(-3), SipStatus::Open);
        assert_eq!(classify_week_diff(0), SipStatus::ThisWeek);
        assert_eq!(classify_week_diff(1), SipStatus::NextWeek);
        assert_eq!(classify_week_diff(2), SipStatus::Weeks(2));
        assert_eq!(classify_week_diff(3), SipStatus::Weeks(3));
    }

    #[test]
    fn offsets_above_a_month_override_the_literal_week_count() {
        // ---
        assert_eq!(classify_week_diff(4), SipStatus::OnePlusMonth);
        assert_eq!(classify_week_diff(5), SipStatus::OnePlusMonth);
        assert_eq!(classify_week_diff(12), SipStatus::OnePlusMonth);
    }

    #[test]
    fn sentinels_take_their_reserved_labels() {
        // ---
        assert_eq!(classify_week_diff(EFFECTIVE_OPEN_ENDED), SipStatus::Tbd);
        assert_eq!(classify_week_diff(NO_DATES), SipStatus::Open);
    }

    #[test]
    fn an_effective_order_without_an_end_date_is_tbd_not_a_month_out() {
        // ---
        let s = snapshot("CA", Some("3/19/20"), None);
        assert_eq!(classify_snapshot(&s, 21), SipStatus::Tbd);
    }

    #[test]
    fn a_state_with_no_dates_is_open() {
        // ---
        let s = snapshot("AR", None, None);
        assert_eq!(classify_snapshot(&s, 21), SipStatus::Open);
    }

    #[test]
    fn an_unparseable_end_date_counts_as_missing() {
        // ---
        let effective = snapshot("UT", Some("4/1/20"), Some("until further notice"));
        assert_eq!(classify_snapshot(&effective, 21), SipStatus::Tbd);

        let bare = snapshot("ND", None, Some("n/a"));
        assert_eq!(classify_snapshot(&bare, 21), SipStatus::Open);
    }

    #[test]
    fn end_dates_classify_by_iso_week_offset() {
        // ---
        // Week 21 of 2020 runs May 18-24.
        assert_eq!(classify_snapshot(&snapshot("A", None, Some("5/15/20")), 21), SipStatus::Open);
        assert_eq!(
            classify_snapshot(&snapshot("B", Some("4/1/20"), Some("5/21/20")), 21),
            SipStatus::ThisWeek
        );
        assert_eq!(
            classify_snapshot(&snapshot("C", Some("4/1/20"), Some("5/28/20")), 21),
            SipStatus::NextWeek
        );
        assert_eq!(
            classify_snapshot(&snapshot("D", Some("4/1/20"), Some("6/4/20")), 21),
            SipStatus::Weeks(2)
        );
        assert_eq!(
            classify_snapshot(&snapshot("E", Some("4/1/20"), Some("6/26/20")), 21),
            SipStatus::OnePlusMonth
        );
    }

    #[test]
    fn every_snapshot_state_gets_a_label() {
        // ---
        let snapshots = vec![
            snapshot("AL", Some("4/4/20"), Some("4/30/20")),
            snapshot("AR", None, None),
        ];
        let labels = sip_status(&snapshots, 21);
        assert_eq!(labels.len(), 2);
        // April 30 sits in week 18, well behind week 21.
        assert_eq!(labels["AL"], SipStatus::Open);
        assert_eq!(labels["AR"], SipStatus::Open);
    }
}
