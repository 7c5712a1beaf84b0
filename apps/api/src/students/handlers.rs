//! Axum route handlers for the student API (`/api/students/me/...`).

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::auth::StudentAuth;
use crate::errors::AppError;
use crate::github::sync::{sync_github, SyncOptions, SyncOutcome};
use crate::leetcode::sync::{sync_leetcode, LeetcodeSyncOutcome, LeetcodeSyncRequest};
use crate::matching::pool::{recommend_jobs_for_student, JobRecommendation};
use crate::models::engagement::{NotificationRow, RoadmapRow};
use crate::models::student::StudentRow;
use crate::models::submission::{CertificationRow, ProjectRow};
use crate::notifications::{list_notifications, mark_read};
use crate::skills::detect_skills_in_text;
use crate::state::AppState;
use crate::storage::{extract_resume_text, resume_key, upload_resume, validate_resume};
use crate::students::profile::{
    apply_manual_skills, merge_resume_skills, CreateCertificationRequest, CreateProjectRequest,
    UpdateProfileRequest,
};
use crate::students::repo::{
    get_student, insert_projects, list_certifications, list_projects, refresh_readiness,
    save_skills,
};
use crate::students::roadmaps::{
    build_steps, decode_steps, get_roadmap, insert_roadmap, list_roadmaps, save_steps, set_step,
    CreateRoadmapRequest, ToggleStepRequest,
};

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct StudentDetailResponse {
    pub student: StudentRow,
    pub projects: Vec<ProjectRow>,
    pub certifications: Vec<CertificationRow>,
}

#[derive(Debug, Serialize)]
pub struct ResumeUploadResponse {
    pub resume_key: String,
    pub skills_detected: Vec<String>,
    pub skills_added: usize,
    pub readiness_score: Option<i32>,
}

async fn require_student(state: &AppState, student_id: Uuid) -> Result<StudentRow, AppError> {
    get_student(&state.db, student_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Student not found".to_string()))
}

async fn student_detail(
    state: &AppState,
    student_id: Uuid,
) -> Result<StudentDetailResponse, AppError> {
    let student = require_student(state, student_id).await?;
    Ok(StudentDetailResponse {
        student,
        projects: list_projects(&state.db, student_id).await?,
        certifications: list_certifications(&state.db, student_id).await?,
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Profile
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/students/me
pub async fn handle_get_me(
    State(state): State<AppState>,
    StudentAuth(student_id): StudentAuth,
) -> Result<Json<StudentDetailResponse>, AppError> {
    Ok(Json(student_detail(&state, student_id).await?))
}

/// PUT /api/students/me
pub async fn handle_update_me(
    State(state): State<AppState>,
    StudentAuth(student_id): StudentAuth,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<StudentDetailResponse>, AppError> {
    req.validate().map_err(AppError::Validation)?;
    let student = require_student(&state, student_id).await?;

    let skills = match &req.skills {
        Some(inputs) => Some(apply_manual_skills(&student.skill_list(), inputs)),
        None => None,
    };

    sqlx::query(
        r#"
        UPDATE students SET
            name = COALESCE($1, name),
            branch = COALESCE($2, branch),
            cgpa = COALESCE($3, cgpa),
            graduation_year = COALESCE($4, graduation_year),
            skills = COALESCE($5, skills),
            github_username = COALESCE($6, github_username),
            github_token = COALESCE($7, github_token),
            leetcode_username = COALESCE($8, leetcode_username),
            updated_at = NOW()
        WHERE id = $9
        "#,
    )
    .bind(req.name.as_deref().map(str::trim))
    .bind(req.branch.as_deref().map(str::trim))
    .bind(req.cgpa)
    .bind(req.graduation_year)
    .bind(
        skills
            .map(serde_json::to_value)
            .transpose()
            .map_err(anyhow::Error::from)?,
    )
    .bind(req.github_username.as_deref().map(str::trim))
    .bind(req.github_token.as_deref())
    .bind(req.leetcode_username.as_deref().map(str::trim))
    .bind(student_id)
    .execute(&state.db)
    .await?;

    refresh_readiness(&state.db, student_id).await?;
    Ok(Json(student_detail(&state, student_id).await?))
}

// ────────────────────────────────────────────────────────────────────────────
// Submissions
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/students/me/projects
pub async fn handle_create_project(
    State(state): State<AppState>,
    StudentAuth(student_id): StudentAuth,
    Json(req): Json<CreateProjectRequest>,
) -> Result<(StatusCode, Json<ProjectRow>), AppError> {
    let project = req.into_new_project().map_err(AppError::Validation)?;
    require_student(&state, student_id).await?;

    let mut inserted = insert_projects(&state.db, student_id, &[project]).await?;
    let row = inserted
        .pop()
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("project insert returned no row")))?;
    refresh_readiness(&state.db, student_id).await?;

    info!("Student {student_id} submitted project {}", row.id);
    Ok((StatusCode::CREATED, Json(row)))
}

/// DELETE /api/students/me/projects/:id
pub async fn handle_delete_project(
    State(state): State<AppState>,
    StudentAuth(student_id): StudentAuth,
    Path(project_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let result = sqlx::query("DELETE FROM projects WHERE id = $1 AND student_id = $2")
        .bind(project_id)
        .bind(student_id)
        .execute(&state.db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Project {project_id} not found")));
    }
    refresh_readiness(&state.db, student_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/students/me/certifications
pub async fn handle_create_certification(
    State(state): State<AppState>,
    StudentAuth(student_id): StudentAuth,
    Json(req): Json<CreateCertificationRequest>,
) -> Result<(StatusCode, Json<CertificationRow>), AppError> {
    req.validate().map_err(AppError::Validation)?;
    require_student(&state, student_id).await?;

    let row = sqlx::query_as::<_, CertificationRow>(
        r#"
        INSERT INTO certifications (id, student_id, name, issuer, issued_on, credential_url)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(student_id)
    .bind(req.name.trim())
    .bind(req.issuer.trim())
    .bind(req.issued_on)
    .bind(req.credential_url.as_deref())
    .fetch_one(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(row)))
}

/// POST /api/students/me/resume (multipart field `resume`)
pub async fn handle_upload_resume(
    State(state): State<AppState>,
    StudentAuth(student_id): StudentAuth,
    mut multipart: Multipart,
) -> Result<Json<ResumeUploadResponse>, AppError> {
    let mut upload: Option<(Vec<u8>, Option<String>)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
    {
        if field.name() != Some("resume") {
            continue;
        }
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Failed to read resume: {e}")))?;
        upload = Some((bytes.to_vec(), content_type));
        break;
    }
    let (bytes, content_type) =
        upload.ok_or_else(|| AppError::Validation("Missing multipart field 'resume'".to_string()))?;
    validate_resume(&bytes, content_type.as_deref()).map_err(AppError::Validation)?;

    let student = require_student(&state, student_id).await?;

    let text = {
        let bytes = bytes.clone();
        tokio::task::spawn_blocking(move || extract_resume_text(&bytes))
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("resume parsing task failed: {e}")))?
    };
    let detected = detect_skills_in_text(&text);

    let key = resume_key(student_id);
    upload_resume(&state.s3, &state.config.s3_bucket, &key, bytes)
        .await
        .map_err(|e| AppError::S3(e.to_string()))?;

    let (skills, added) = merge_resume_skills(&student.skill_list(), &detected);
    save_skills(&state.db, student_id, &skills).await?;
    sqlx::query("UPDATE students SET resume_key = $1, updated_at = NOW() WHERE id = $2")
        .bind(&key)
        .bind(student_id)
        .execute(&state.db)
        .await?;
    let readiness_score = refresh_readiness(&state.db, student_id).await?;

    info!(
        "Student {student_id} uploaded resume {key}: {} skills detected, {added} added",
        detected.len()
    );
    Ok(Json(ResumeUploadResponse {
        resume_key: key,
        skills_detected: detected,
        skills_added: added,
        readiness_score,
    }))
}

// ────────────────────────────────────────────────────────────────────────────
// External syncs
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/students/me/github/sync
pub async fn handle_github_sync(
    State(state): State<AppState>,
    StudentAuth(student_id): StudentAuth,
    options: Option<Json<SyncOptions>>,
) -> Json<SyncOutcome> {
    let options = options.map(|Json(o)| o).unwrap_or_default();
    Json(sync_github(&state.db, state.github.as_ref(), student_id, &options).await)
}

/// POST /api/students/me/leetcode/sync
pub async fn handle_leetcode_sync(
    State(state): State<AppState>,
    StudentAuth(student_id): StudentAuth,
    request: Option<Json<LeetcodeSyncRequest>>,
) -> Json<LeetcodeSyncOutcome> {
    let request = request.map(|Json(r)| r).unwrap_or_default();
    Json(sync_leetcode(&state.db, state.leetcode.as_ref(), student_id, &request).await)
}

// ────────────────────────────────────────────────────────────────────────────
// Jobs, notifications, roadmaps
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/students/me/jobs
pub async fn handle_my_jobs(
    State(state): State<AppState>,
    StudentAuth(student_id): StudentAuth,
) -> Result<Json<Vec<JobRecommendation>>, AppError> {
    let recommendations = recommend_jobs_for_student(&state.db, state.matcher.as_ref(), student_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Student not found".to_string()))?;
    Ok(Json(recommendations))
}

/// GET /api/students/me/notifications
pub async fn handle_list_notifications(
    State(state): State<AppState>,
    StudentAuth(student_id): StudentAuth,
) -> Result<Json<Vec<NotificationRow>>, AppError> {
    Ok(Json(list_notifications(&state.db, student_id).await?))
}

/// PATCH /api/students/me/notifications/:id/read
pub async fn handle_mark_notification_read(
    State(state): State<AppState>,
    StudentAuth(student_id): StudentAuth,
    Path(id): Path<Uuid>,
) -> Result<Json<NotificationRow>, AppError> {
    mark_read(&state.db, student_id, id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Notification {id} not found")))
}

/// GET /api/students/me/roadmaps
pub async fn handle_list_roadmaps(
    State(state): State<AppState>,
    StudentAuth(student_id): StudentAuth,
) -> Result<Json<Vec<RoadmapRow>>, AppError> {
    Ok(Json(list_roadmaps(&state.db, student_id).await?))
}

/// POST /api/students/me/roadmaps
pub async fn handle_create_roadmap(
    State(state): State<AppState>,
    StudentAuth(student_id): StudentAuth,
    Json(req): Json<CreateRoadmapRequest>,
) -> Result<(StatusCode, Json<RoadmapRow>), AppError> {
    let steps = build_steps(&req).map_err(AppError::Validation)?;
    require_student(&state, student_id).await?;
    let row = insert_roadmap(&state.db, student_id, &req.title, &steps).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

/// PATCH /api/students/me/roadmaps/:id/steps/:index
pub async fn handle_toggle_roadmap_step(
    State(state): State<AppState>,
    StudentAuth(student_id): StudentAuth,
    Path((id, index)): Path<(Uuid, usize)>,
    Json(req): Json<ToggleStepRequest>,
) -> Result<Json<RoadmapRow>, AppError> {
    let roadmap = get_roadmap(&state.db, student_id, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Roadmap {id} not found")))?;
    let steps = set_step(decode_steps(&roadmap), index, req.done)
        .ok_or_else(|| AppError::Validation(format!("Roadmap has no step {index}")))?;
    Ok(Json(save_steps(&state.db, id, &steps).await?))
}
