//! Time-windowed views over coding logs, shared by matching and readiness.

use std::collections::HashSet;

use chrono::{Duration, NaiveDate};

use crate::models::student::CodingLog;

/// Problems solved in the `days`-day window ending at `today` (inclusive),
/// shifted back by `offset_days`.
pub fn solved_in_window(logs: &[CodingLog], today: NaiveDate, offset_days: i64, days: i64) -> u64 {
    let end = today - Duration::days(offset_days);
    let start = end - Duration::days(days - 1);
    logs.iter()
        .filter(|log| log.date >= start && log.date <= end)
        .map(|log| u64::from(log.problems_solved))
        .sum()
}

/// Distinct dates with at least one solved problem in the last `days` days.
pub fn active_days(logs: &[CodingLog], today: NaiveDate, days: i64) -> usize {
    let start = today - Duration::days(days - 1);
    logs.iter()
        .filter(|log| log.problems_solved > 0 && log.date >= start && log.date <= today)
        .map(|log| log.date)
        .collect::<HashSet<_>>()
        .len()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log(date: NaiveDate, solved: u32) -> CodingLog {
        CodingLog {
            date,
            platform: "leetcode".to_string(),
            problems_solved: solved,
        }
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_solved_in_window_bounds_are_inclusive() {
        let today = day(2025, 3, 31);
        let logs = vec![log(day(2025, 3, 31), 2), log(day(2025, 3, 2), 3), log(day(2025, 3, 1), 7)];
        // 30-day window: Mar 2 ..= Mar 31
        assert_eq!(solved_in_window(&logs, today, 0, 30), 5);
        // previous window: Jan 31 ..= Mar 1
        assert_eq!(solved_in_window(&logs, today, 30, 30), 7);
    }

    #[test]
    fn test_active_days_counts_distinct_dates() {
        let today = day(2025, 3, 31);
        let logs = vec![
            log(day(2025, 3, 30), 1),
            log(day(2025, 3, 30), 4),
            log(day(2025, 3, 29), 0),
            log(day(2025, 3, 10), 1),
            log(day(2025, 1, 1), 9),
        ];
        assert_eq!(active_days(&logs, today, 30), 2);
    }
}
