//! Daily trigger for the market refresher.

use std::sync::Arc;

use chrono::{DateTime, Duration, FixedOffset, NaiveTime, Offset, TimeZone, Utc};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::market::refresher::{MarketRefresher, RefreshTrigger};

/// Next instant strictly after `now` whose wall-clock time in `offset` is `at`.
pub fn next_run_after(now: DateTime<Utc>, at: NaiveTime, offset: FixedOffset) -> DateTime<Utc> {
    let local_now = now.with_timezone(&offset);
    let mut date = local_now.date_naive();
    loop {
        // Fixed offsets have no gaps, so `single` always resolves.
        if let Some(candidate) = offset.from_local_datetime(&date.and_time(at)).single() {
            let candidate = candidate.with_timezone(&Utc);
            if candidate > now {
                return candidate;
            }
        }
        date += Duration::days(1);
    }
}

/// Offset in minutes east of UTC. Out-of-range values fall back to UTC.
pub fn offset_from_minutes(minutes: i32) -> FixedOffset {
    FixedOffset::east_opt(minutes.saturating_mul(60)).unwrap_or_else(|| {
        warn!("Invalid market timezone offset {minutes} minutes, using UTC");
        Utc.fix()
    })
}

/// Spawns the scheduler loop. The task runs for the life of the process.
pub fn spawn_market_schedule(
    refresher: Arc<MarketRefresher>,
    at: NaiveTime,
    offset: FixedOffset,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let now = Utc::now();
            let next = next_run_after(now, at, offset);
            let wait = (next - now).to_std().unwrap_or_default();
            info!("Next market refresh at {} ({}s)", next.with_timezone(&offset), wait.as_secs());
            tokio::time::sleep(wait).await;

            let report = refresher.run(RefreshTrigger::Scheduled).await;
            if report.failed > 0 || report.error.is_some() {
                warn!(
                    "Scheduled market refresh finished with {} failed skills{}",
                    report.failed,
                    report.error.map(|e| format!(": {e}")).unwrap_or_default()
                );
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ist() -> FixedOffset {
        offset_from_minutes(330)
    }

    fn utc(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn test_next_run_later_today() {
        // 2025-03-01 18:00 UTC = 23:30 IST; 02:00 IST next day = 20:30 UTC
        let next = next_run_after(
            utc("2025-03-01T18:00:00Z"),
            NaiveTime::from_hms_opt(2, 0, 0).unwrap(),
            ist(),
        );
        assert_eq!(next, utc("2025-03-01T20:30:00Z"));
    }

    #[test]
    fn test_next_run_rolls_to_tomorrow() {
        // 2025-03-01 21:00 UTC = 02:30 IST on the 2nd, already past 02:00
        let next = next_run_after(
            utc("2025-03-01T21:00:00Z"),
            NaiveTime::from_hms_opt(2, 0, 0).unwrap(),
            ist(),
        );
        assert_eq!(next, utc("2025-03-02T20:30:00Z"));
    }

    #[test]
    fn test_next_run_is_strictly_after_now() {
        let now = utc("2025-03-01T20:30:00Z");
        let next = next_run_after(now, NaiveTime::from_hms_opt(2, 0, 0).unwrap(), ist());
        assert_eq!(next, utc("2025-03-02T20:30:00Z"));
    }

    #[test]
    fn test_invalid_offset_falls_back_to_utc() {
        assert_eq!(offset_from_minutes(100_000).local_minus_utc(), 0);
        assert_eq!(offset_from_minutes(-300).local_minus_utc(), -18_000);
    }
}
