// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::{Days, NaiveDate};
use spendlog::models::Frequency;
use spendlog::schedule::{first_due, next_due};

fn d(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

#[test]
fn monthly_anchor_overrides_day() {
    assert_eq!(
        next_due(d("2024-01-20"), Frequency::Monthly, Some(15), None),
        d("2024-02-15")
    );
}

#[test]
fn monthly_without_anchor_keeps_day_and_clamps() {
    assert_eq!(
        next_due(d("2024-03-10"), Frequency::Monthly, None, None),
        d("2024-04-10")
    );
    assert_eq!(
        next_due(d("2024-01-31"), Frequency::Monthly, None, None),
        d("2024-02-29")
    );
    assert_eq!(
        next_due(d("2023-01-31"), Frequency::Monthly, None, None),
        d("2023-02-28")
    );
}

#[test]
fn monthly_anchor_outside_1_to_28_is_ignored() {
    for anchor in [0, 29, 31, -3] {
        assert_eq!(
            next_due(d("2024-01-20"), Frequency::Monthly, Some(anchor), None),
            d("2024-02-20"),
            "anchor {}",
            anchor
        );
    }
}

#[test]
fn weekly_ignores_weekday_anchor() {
    assert_eq!(
        next_due(d("2024-01-01"), Frequency::Weekly, None, Some(3)),
        d("2024-01-08")
    );
    assert_eq!(
        next_due(d("2024-01-01"), Frequency::Weekly, None, None),
        d("2024-01-08")
    );
}

#[test]
fn daily_adds_one_day_across_year_end() {
    assert_eq!(
        next_due(d("2024-12-31"), Frequency::Daily, None, None),
        d("2025-01-01")
    );
}

#[test]
fn yearly_from_leap_day_lands_on_feb_28() {
    assert_eq!(
        next_due(d("2024-02-29"), Frequency::Yearly, None, None),
        d("2025-02-28")
    );
    assert_eq!(
        next_due(d("2024-06-15"), Frequency::Yearly, None, None),
        d("2025-06-15")
    );
}

#[test]
fn next_due_strictly_increases() {
    let freqs = [
        Frequency::Daily,
        Frequency::Weekly,
        Frequency::Monthly,
        Frequency::Yearly,
    ];
    let anchors = [None, Some(1), Some(15), Some(28), Some(31)];
    let mut day = d("2023-12-25");
    let last = d("2025-03-05");
    while day <= last {
        for f in freqs {
            for a in anchors {
                let next = next_due(day, f, a, Some(2));
                assert!(next > day, "{} {:?} {:?} -> {}", day, f, a, next);
            }
        }
        day = day.checked_add_days(Days::new(1)).unwrap();
    }
}

#[test]
fn first_due_aligns_weekly_to_anchor() {
    // 2024-01-01 is a Monday; 3 = Wednesday
    assert_eq!(
        first_due(d("2024-01-01"), Frequency::Weekly, None, Some(3)),
        d("2024-01-03")
    );
    // same weekday as the start moves a full week ahead
    assert_eq!(
        first_due(d("2024-01-01"), Frequency::Weekly, None, Some(1)),
        d("2024-01-08")
    );
    // 0 = Sunday
    assert_eq!(
        first_due(d("2024-01-01"), Frequency::Weekly, None, Some(0)),
        d("2024-01-07")
    );
}

#[test]
fn first_due_matches_next_due_otherwise() {
    let start = d("2024-05-31");
    assert_eq!(
        first_due(start, Frequency::Monthly, Some(10), None),
        next_due(start, Frequency::Monthly, Some(10), None)
    );
    assert_eq!(
        first_due(start, Frequency::Weekly, None, Some(9)),
        d("2024-06-07")
    );
    assert_eq!(first_due(start, Frequency::Daily, None, None), d("2024-06-01"));
}

#[test]
fn unknown_stored_frequency_schedules_monthly() {
    assert_eq!(Frequency::from_stored("fortnightly"), Frequency::Monthly);
    assert_eq!(Frequency::from_stored("weekly"), Frequency::Weekly);
    assert!("fortnightly".parse::<Frequency>().is_err());
    assert_eq!(" Yearly ".parse::<Frequency>().unwrap(), Frequency::Yearly);
}
