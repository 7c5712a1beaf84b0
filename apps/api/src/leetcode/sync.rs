//! LeetCode sync: solved counts plus the submission calendar as daily coding logs.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::activity::active_days;
use crate::leetcode::client::{LeetcodeApi, LeetcodeStats};
use crate::models::student::CodingLog;
use crate::students::repo::{get_student, refresh_readiness, save_coding_logs};

pub const PLATFORM: &str = "leetcode";

const RECENT_WINDOW_DAYS: i64 = 30;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LeetcodeSyncRequest {
    /// Overrides and stores the username; otherwise the stored one is used.
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LeetcodeSyncStats {
    pub username: String,
    pub total_solved: u32,
    /// Calendar days with submissions across the whole LeetCode history.
    pub days_logged: usize,
    /// Active days on any platform in the last 30 days.
    pub recent_active_days: usize,
    pub readiness_score: Option<i32>,
}

impl LeetcodeSyncStats {
    fn new(
        username: String,
        stats: &LeetcodeStats,
        fresh: &[CodingLog],
        merged: &[CodingLog],
        today: NaiveDate,
    ) -> Self {
        Self {
            username,
            total_solved: stats.total_solved,
            days_logged: fresh.len(),
            recent_active_days: active_days(merged, today, RECENT_WINDOW_DAYS),
            readiness_score: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LeetcodeSyncOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<LeetcodeSyncStats>,
}

impl LeetcodeSyncOutcome {
    fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            stats: None,
        }
    }
}

/// Decodes LeetCode's `submissionCalendar` string into daily logs (UTC dates),
/// sorted by date. Non-numeric keys, zero counts and out-of-range timestamps are skipped.
pub fn parse_submission_calendar(raw: &str) -> Vec<CodingLog> {
    let entries: BTreeMap<String, serde_json::Value> = match serde_json::from_str(raw) {
        Ok(map) => map,
        Err(e) => {
            warn!("Unparseable LeetCode submission calendar: {e}");
            return Vec::new();
        }
    };

    let mut per_day: BTreeMap<chrono::NaiveDate, u32> = BTreeMap::new();
    for (timestamp, count) in entries {
        let Ok(secs) = timestamp.parse::<i64>() else {
            continue;
        };
        let Some(date) = DateTime::from_timestamp(secs, 0).map(|dt| dt.date_naive()) else {
            continue;
        };
        let count = count
            .as_u64()
            .or_else(|| count.as_str().and_then(|s| s.parse().ok()))
            .unwrap_or(0);
        if count == 0 {
            continue;
        }
        let slot = per_day.entry(date).or_insert(0);
        *slot = slot.saturating_add(count.min(u64::from(u32::MAX)) as u32);
    }

    per_day
        .into_iter()
        .map(|(date, problems_solved)| CodingLog {
            date,
            platform: PLATFORM.to_string(),
            problems_solved,
        })
        .collect()
}

/// Replaces every LeetCode-platform log, keeping other platforms, sorted by date.
pub fn merge_coding_logs(existing: &[CodingLog], fresh: Vec<CodingLog>) -> Vec<CodingLog> {
    let mut merged: Vec<CodingLog> = existing
        .iter()
        .filter(|l| l.platform != PLATFORM)
        .cloned()
        .chain(fresh)
        .collect();
    merged.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.platform.cmp(&b.platform)));
    merged
}

pub async fn sync_leetcode(
    pool: &PgPool,
    api: &dyn LeetcodeApi,
    student_id: Uuid,
    request: &LeetcodeSyncRequest,
) -> LeetcodeSyncOutcome {
    match run_sync(pool, api, student_id, request).await {
        Ok(outcome) => outcome,
        Err(e) => {
            warn!("LeetCode sync for student {student_id} failed: {e:?}");
            LeetcodeSyncOutcome::failed(format!("LeetCode sync failed: {e}"))
        }
    }
}

async fn run_sync(
    pool: &PgPool,
    api: &dyn LeetcodeApi,
    student_id: Uuid,
    request: &LeetcodeSyncRequest,
) -> anyhow::Result<LeetcodeSyncOutcome> {
    let Some(student) = get_student(pool, student_id).await? else {
        return Ok(LeetcodeSyncOutcome::failed("Student not found"));
    };
    let username = request
        .username
        .as_deref()
        .or(student.leetcode_username.as_deref())
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .map(str::to_string);
    let Some(username) = username else {
        return Ok(LeetcodeSyncOutcome::failed("LeetCode username not set"));
    };

    let user = match api.profile(&username).await {
        Ok(Some(user)) => user,
        Ok(None) => return Ok(LeetcodeSyncOutcome::failed("LeetCode user not found")),
        Err(e) => {
            warn!("LeetCode profile fetch for {username} failed: {e}");
            return Ok(LeetcodeSyncOutcome::failed(format!(
                "Failed to fetch LeetCode profile: {e}"
            )));
        }
    };

    let stats = LeetcodeStats::from_user(&user);
    let fresh = user
        .user_calendar
        .as_ref()
        .and_then(|c| c.submission_calendar.as_deref())
        .map(parse_submission_calendar)
        .unwrap_or_default();
    let logs = merge_coding_logs(&student.coding_log_list(), fresh.clone());
    let mut sync_stats = LeetcodeSyncStats::new(
        username,
        &stats,
        &fresh,
        &logs,
        Utc::now().date_naive(),
    );

    save_coding_logs(pool, student_id, &logs).await?;
    sqlx::query(
        "UPDATE students SET leetcode_username = $1, leetcode_stats = $2, updated_at = NOW() \
         WHERE id = $3",
    )
    .bind(&sync_stats.username)
    .bind(serde_json::to_value(&stats)?)
    .bind(student_id)
    .execute(pool)
    .await?;

    sync_stats.readiness_score = refresh_readiness(pool, student_id).await?;
    info!(
        "LeetCode sync for student {student_id}: {} solved, {} days logged, {} active recently",
        sync_stats.total_solved, sync_stats.days_logged, sync_stats.recent_active_days
    );

    Ok(LeetcodeSyncOutcome {
        success: true,
        error: None,
        stats: Some(sync_stats),
    })
}
