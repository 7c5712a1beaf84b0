//! Talent-pool ranking and job recommendations on top of the scorer.
//!
//! `job_matches` and `jobs.match_count` are written only by the recruiter-side ranking,
//! which covers verified students. Student recommendations are computed on read.

use anyhow::Result;
use serde::Serialize;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::matching::scorer::{JobRequirements, MatchResult, MatchScorer, StudentProfile};
use crate::models::job::JobRow;
use crate::students::repo::{load_profile, load_verified_profiles};

#[derive(Debug, Clone, Serialize)]
pub struct JobRecommendation {
    pub job: JobRow,
    pub result: MatchResult,
}

/// Scores every verified student against `job`, caches the results and refreshes
/// `jobs.match_count`. Returned best first; equal scores are ordered by student id.
pub async fn rank_students_for_job(
    pool: &PgPool,
    scorer: &dyn MatchScorer,
    job: &JobRow,
    threshold: u32,
) -> Result<Vec<MatchResult>> {
    let requirements = JobRequirements::from(job);
    let profiles = load_verified_profiles(pool).await?;

    let mut results = score_all(scorer, &requirements, &profiles).await;
    sort_results(&mut results);

    let mut tx = pool.begin().await?;
    for result in &results {
        upsert_match(&mut tx, job.id, result).await?;
    }
    let match_count = count_at_or_above(&results, threshold);
    sqlx::query("UPDATE jobs SET match_count = $1, updated_at = NOW() WHERE id = $2")
        .bind(match_count as i32)
        .bind(job.id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    info!(
        "Ranked {} students for job {} ({} at or above {threshold})",
        results.len(),
        job.id,
        match_count
    );
    Ok(results)
}

/// Scores all open jobs for one student without touching the match cache.
/// `None` when the student does not exist.
pub async fn recommend_jobs_for_student(
    pool: &PgPool,
    scorer: &dyn MatchScorer,
    student_id: Uuid,
) -> Result<Option<Vec<JobRecommendation>>> {
    let Some(profile) = load_profile(pool, student_id).await? else {
        return Ok(None);
    };

    let jobs = sqlx::query_as::<_, JobRow>(
        "SELECT * FROM jobs WHERE status = 'open' ORDER BY created_at DESC",
    )
    .fetch_all(pool)
    .await?;

    Ok(Some(score_jobs(scorer, jobs, &profile).await))
}

/// Best score first. Stable, so the incoming order (newest job first) breaks ties.
async fn score_jobs(
    scorer: &dyn MatchScorer,
    jobs: Vec<JobRow>,
    profile: &StudentProfile,
) -> Vec<JobRecommendation> {
    let mut recommendations = Vec::with_capacity(jobs.len());
    for job in jobs {
        let result = scorer.score(&JobRequirements::from(&job), profile).await;
        recommendations.push(JobRecommendation { job, result });
    }
    recommendations.sort_by(|a, b| b.result.score.cmp(&a.result.score));
    recommendations
}

async fn score_all(
    scorer: &dyn MatchScorer,
    requirements: &JobRequirements,
    profiles: &[StudentProfile],
) -> Vec<MatchResult> {
    let mut results = Vec::with_capacity(profiles.len());
    for profile in profiles {
        results.push(scorer.score(requirements, profile).await);
    }
    results
}

async fn upsert_match(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    job_id: Uuid,
    result: &MatchResult,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO job_matches (job_id, student_id, score, breakdown, computed_at)
        VALUES ($1, $2, $3, $4, NOW())
        ON CONFLICT (job_id, student_id)
        DO UPDATE SET score = EXCLUDED.score,
                      breakdown = EXCLUDED.breakdown,
                      computed_at = EXCLUDED.computed_at
        "#,
    )
    .bind(job_id)
    .bind(result.student_id)
    .bind(result.score as i32)
    .bind(serde_json::to_value(result)?)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

pub fn sort_results(results: &mut [MatchResult]) {
    results.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| a.student_id.cmp(&b.student_id))
    });
}

pub fn count_at_or_above(results: &[MatchResult], threshold: u32) -> usize {
    results.iter().filter(|r| r.score >= threshold).count()
}
