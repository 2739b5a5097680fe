//! Review scheduler: pure interval logic.
//!
//! Maps `(next_review_date, today, action)` to a new `next_review_date`.
//! Nothing here touches storage; callers persist the result.

use chrono::{Duration, NaiveDate};

use super::model::ReviewAction;

/// `(days_since_last_review <= threshold, next interval in days)`, checked in order.
pub const INTERVALS: &[(i64, i64)] = &[(1, 3), (3, 7), (7, 14), (14, 30), (30, 60)];

/// Interval used once every threshold in [`INTERVALS`] is exceeded.
pub const MAX_INTERVAL_DAYS: i64 = 90;

/// Days since the topic was last scheduled.
///
/// Absent dates count as 1. Future dates (reviewed early) go negative and
/// are clamped to 1.
pub fn days_since_last_review(next_review_date: Option<NaiveDate>, today: NaiveDate) -> i64 {
    match next_review_date {
        Some(next) => (today - next).num_days().max(1),
        None => 1,
    }
}

/// Look up the next interval for a given number of elapsed days.
pub fn interval_for(days_since: i64) -> i64 {
    INTERVALS
        .iter()
        .find(|(threshold, _)| days_since <= *threshold)
        .map(|(_, interval)| *interval)
        .unwrap_or(MAX_INTERVAL_DAYS)
}

/// Initial `next_review_date` for a new topic.
///
/// Topics added today are due tomorrow. Back-dated topics are pulled
/// forward: up to three days old → tomorrow, four to seven → in two days,
/// older → due today.
pub fn on_create(date_added: NaiveDate, today: NaiveDate) -> NaiveDate {
    if date_added == today {
        return today + Duration::days(1);
    }
    let offset = match (today - date_added).num_days() {
        elapsed if elapsed <= 3 => 1,
        elapsed if elapsed <= 7 => 2,
        _ => 0,
    };
    today + Duration::days(offset)
}

/// Next date after a successful review.
pub fn on_review_good(next_review_date: Option<NaiveDate>, today: NaiveDate) -> NaiveDate {
    let days_since = days_since_last_review(next_review_date, today);
    today + Duration::days(interval_for(days_since))
}

/// Next date after a failed review: always tomorrow.
pub fn on_review_again(today: NaiveDate) -> NaiveDate {
    today + Duration::days(1)
}

/// Dispatch on the review outcome.
pub fn next_review(
    action: ReviewAction,
    next_review_date: Option<NaiveDate>,
    today: NaiveDate,
) -> NaiveDate {
    match action {
        ReviewAction::Good => on_review_good(next_review_date, today),
        ReviewAction::Again => on_review_again(today),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 5, 20).unwrap()
    }

    fn days_ago(n: i64) -> NaiveDate {
        today() - Duration::days(n)
    }

    #[test]
    fn interval_table_boundaries() {
        assert_eq!(interval_for(-5), 3);
        assert_eq!(interval_for(1), 3);
        assert_eq!(interval_for(2), 7);
        assert_eq!(interval_for(3), 7);
        assert_eq!(interval_for(4), 14);
        assert_eq!(interval_for(7), 14);
        assert_eq!(interval_for(8), 30);
        assert_eq!(interval_for(14), 30);
        assert_eq!(interval_for(15), 60);
        assert_eq!(interval_for(30), 60);
        assert_eq!(interval_for(31), 90);
        assert_eq!(interval_for(365), 90);
    }

    #[test]
    fn thresholds_are_strictly_increasing() {
        assert!(INTERVALS.windows(2).all(|w| w[0].0 < w[1].0 && w[0].1 < w[1].1));
        assert!(INTERVALS.last().unwrap().1 < MAX_INTERVAL_DAYS);
    }

    #[test]
    fn days_since_defaults_to_one() {
        assert_eq!(days_since_last_review(None, today()), 1);
    }

    #[test]
    fn days_since_clamps_early_reviews() {
        assert_eq!(days_since_last_review(Some(today()), today()), 1);
        assert_eq!(days_since_last_review(Some(today() + Duration::days(10)), today()), 1);
    }

    #[test]
    fn good_one_day_late_gives_three() {
        assert_eq!(on_review_good(Some(days_ago(1)), today()), today() + Duration::days(3));
    }

    #[test]
    fn good_ten_days_late_falls_in_fourteen_day_bucket() {
        assert_eq!(on_review_good(Some(days_ago(10)), today()), today() + Duration::days(30));
    }

    #[test]
    fn good_without_history_gives_three() {
        assert_eq!(on_review_good(None, today()), today() + Duration::days(3));
    }

    #[test]
    fn good_on_future_date_never_fails() {
        let next = today() + Duration::days(40);
        assert_eq!(on_review_good(Some(next), today()), today() + Duration::days(3));
    }

    #[test]
    fn good_long_overdue_caps_at_ninety() {
        assert_eq!(on_review_good(Some(days_ago(200)), today()), today() + Duration::days(90));
    }

    #[test]
    fn again_always_resets_to_tomorrow() {
        for next in [None, Some(days_ago(100)), Some(today()), Some(today() + Duration::days(30))] {
            assert_eq!(next_review(ReviewAction::Again, next, today()), today() + Duration::days(1));
        }
    }

    #[test]
    fn identical_state_gives_identical_result() {
        let a = next_review(ReviewAction::Good, Some(days_ago(5)), today());
        let b = next_review(ReviewAction::Good, Some(days_ago(5)), today());
        assert_eq!(a, b);
    }

    #[test]
    fn create_today_is_due_tomorrow() {
        assert_eq!(on_create(today(), today()), today() + Duration::days(1));
    }

    #[test]
    fn create_backdated_buckets() {
        assert_eq!(on_create(days_ago(1), today()), today() + Duration::days(1));
        assert_eq!(on_create(days_ago(3), today()), today() + Duration::days(1));
        assert_eq!(on_create(days_ago(4), today()), today() + Duration::days(2));
        assert_eq!(on_create(days_ago(7), today()), today() + Duration::days(2));
        assert_eq!(on_create(days_ago(8), today()), today());
        assert_eq!(on_create(days_ago(90), today()), today());
    }

    #[test]
    fn create_never_predates_date_added() {
        for n in 0..60 {
            let added = days_ago(n);
            assert!(on_create(added, today()) >= added);
        }
    }
}
