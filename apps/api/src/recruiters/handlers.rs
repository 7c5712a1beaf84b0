//! Axum route handlers for the recruiter API. Recruiters only see their own jobs.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::auth::RecruiterAuth;
use crate::errors::AppError;
use crate::matching::pool::{count_at_or_above, rank_students_for_job};
use crate::matching::scorer::MatchResult;
use crate::models::job::{JobRow, RecruiterRow};
use crate::models::student::StudentRow;
use crate::recruiters::talent::{
    clean_skills, search_talent, CreateJobRequest, TalentEntry, TalentQuery,
    UpdateJobStatusRequest,
};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct JobMatchesResponse {
    pub job_id: Uuid,
    pub match_count: usize,
    pub threshold: u32,
    pub matches: Vec<MatchResult>,
}

async fn require_recruiter(state: &AppState, recruiter_id: Uuid) -> Result<RecruiterRow, AppError> {
    sqlx::query_as::<_, RecruiterRow>("SELECT * FROM recruiters WHERE id = $1")
        .bind(recruiter_id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Recruiter not found".to_string()))
}

async fn owned_job(state: &AppState, recruiter_id: Uuid, job_id: Uuid) -> Result<JobRow, AppError> {
    sqlx::query_as::<_, JobRow>("SELECT * FROM jobs WHERE id = $1 AND recruiter_id = $2")
        .bind(job_id)
        .bind(recruiter_id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {job_id} not found")))
}

/// GET /api/recruiters/jobs
pub async fn handle_list_jobs(
    State(state): State<AppState>,
    RecruiterAuth(recruiter_id): RecruiterAuth,
) -> Result<Json<Vec<JobRow>>, AppError> {
    let jobs = sqlx::query_as::<_, JobRow>(
        "SELECT * FROM jobs WHERE recruiter_id = $1 ORDER BY created_at DESC",
    )
    .bind(recruiter_id)
    .fetch_all(&state.db)
    .await?;
    Ok(Json(jobs))
}

/// POST /api/recruiters/jobs
pub async fn handle_create_job(
    State(state): State<AppState>,
    RecruiterAuth(recruiter_id): RecruiterAuth,
    Json(req): Json<CreateJobRequest>,
) -> Result<(StatusCode, Json<JobRow>), AppError> {
    req.validate().map_err(AppError::Validation)?;
    let recruiter = require_recruiter(&state, recruiter_id).await?;
    let company = req
        .company
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or(recruiter.company.as_str());

    let job = sqlx::query_as::<_, JobRow>(
        r#"
        INSERT INTO jobs
            (id, recruiter_id, title, company, description, required_skills,
             preferred_skills, min_cgpa, min_readiness, min_projects)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(recruiter_id)
    .bind(req.title.trim())
    .bind(company)
    .bind(req.description.trim())
    .bind(clean_skills(&req.required_skills))
    .bind(clean_skills(&req.preferred_skills))
    .bind(req.min_cgpa)
    .bind(req.min_readiness)
    .bind(req.min_projects)
    .fetch_one(&state.db)
    .await?;

    info!("Recruiter {recruiter_id} posted job {} ({})", job.id, job.title);
    Ok((StatusCode::CREATED, Json(job)))
}

/// GET /api/recruiters/jobs/:id
pub async fn handle_get_job(
    State(state): State<AppState>,
    RecruiterAuth(recruiter_id): RecruiterAuth,
    Path(job_id): Path<Uuid>,
) -> Result<Json<JobRow>, AppError> {
    Ok(Json(owned_job(&state, recruiter_id, job_id).await?))
}

/// PATCH /api/recruiters/jobs/:id/status
pub async fn handle_update_job_status(
    State(state): State<AppState>,
    RecruiterAuth(recruiter_id): RecruiterAuth,
    Path(job_id): Path<Uuid>,
    Json(req): Json<UpdateJobStatusRequest>,
) -> Result<Json<JobRow>, AppError> {
    let status = req.parsed().map_err(AppError::Validation)?;
    let job = sqlx::query_as::<_, JobRow>(
        r#"
        UPDATE jobs SET status = $1, updated_at = NOW()
        WHERE id = $2 AND recruiter_id = $3
        RETURNING *
        "#,
    )
    .bind(status)
    .bind(job_id)
    .bind(recruiter_id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Job {job_id} not found")))?;
    Ok(Json(job))
}

/// GET /api/recruiters/jobs/:id/matches
/// Recomputes the talent pool for the job and refreshes its match count.
pub async fn handle_job_matches(
    State(state): State<AppState>,
    RecruiterAuth(recruiter_id): RecruiterAuth,
    Path(job_id): Path<Uuid>,
) -> Result<Json<JobMatchesResponse>, AppError> {
    let job = owned_job(&state, recruiter_id, job_id).await?;
    let threshold = state.config.match_threshold;
    let matches =
        rank_students_for_job(&state.db, state.matcher.as_ref(), &job, threshold).await?;
    Ok(Json(JobMatchesResponse {
        job_id,
        match_count: count_at_or_above(&matches, threshold),
        threshold,
        matches,
    }))
}

/// GET /api/recruiters/talent?skills=a,b&min_cgpa=7
pub async fn handle_talent_search(
    State(state): State<AppState>,
    RecruiterAuth(_recruiter_id): RecruiterAuth,
    Query(query): Query<TalentQuery>,
) -> Result<Json<Vec<TalentEntry>>, AppError> {
    if let Some(cgpa) = query.min_cgpa {
        if !(0.0..=10.0).contains(&cgpa) {
            return Err(AppError::Validation(
                "min_cgpa must be between 0 and 10".to_string(),
            ));
        }
    }
    let students = sqlx::query_as::<_, StudentRow>(
        "SELECT * FROM students WHERE status = 'verified'",
    )
    .fetch_all(&state.db)
    .await?;
    Ok(Json(search_talent(&students, &query)))
}
