//! Axum route handlers for the admin API: submission review and market data control.

use axum::{
    extract::{Path, State},
    Json,
};
use tracing::info;
use uuid::Uuid;

use crate::admin::review::{ensure_transition, PendingSubmissions, ReviewOutcome, ReviewRequest};
use crate::auth::AdminAuth;
use crate::errors::AppError;
use crate::market::refresher::{RefreshReport, RefreshTrigger, RefresherStatus};
use crate::models::student::StudentRow;
use crate::models::submission::{CertificationRow, ProjectRow};
use crate::notifications::{notify, review_message};
use crate::state::AppState;
use crate::students::repo::refresh_readiness;

// ────────────────────────────────────────────────────────────────────────────
// Submissions
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/admin/submissions/pending
pub async fn handle_pending_submissions(
    State(state): State<AppState>,
    AdminAuth(_admin_id): AdminAuth,
) -> Result<Json<PendingSubmissions>, AppError> {
    let students = sqlx::query_as::<_, StudentRow>(
        "SELECT * FROM students WHERE status = 'pending' ORDER BY created_at",
    )
    .fetch_all(&state.db)
    .await?;
    let projects = sqlx::query_as::<_, ProjectRow>(
        "SELECT * FROM projects WHERE status = 'pending' ORDER BY created_at",
    )
    .fetch_all(&state.db)
    .await?;
    let certifications = sqlx::query_as::<_, CertificationRow>(
        "SELECT * FROM certifications WHERE status = 'pending' ORDER BY created_at",
    )
    .fetch_all(&state.db)
    .await?;

    Ok(Json(PendingSubmissions {
        students,
        projects,
        certifications,
    }))
}

/// PATCH /api/admin/projects/:id/review
pub async fn handle_review_project(
    State(state): State<AppState>,
    AdminAuth(admin_id): AdminAuth,
    Path(id): Path<Uuid>,
    Json(req): Json<ReviewRequest>,
) -> Result<Json<ReviewOutcome<ProjectRow>>, AppError> {
    let decision = req.decision()?;
    let mut tx = state.db.begin().await?;

    let current = sqlx::query_as::<_, ProjectRow>("SELECT * FROM projects WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Project {id} not found")))?;
    ensure_transition(&current.status, decision)?;

    let item = sqlx::query_as::<_, ProjectRow>(
        "UPDATE projects SET status = $1, review_note = $2 WHERE id = $3 RETURNING *",
    )
    .bind(decision.as_str())
    .bind(req.note())
    .bind(id)
    .fetch_one(&mut *tx)
    .await?;

    let (kind, message) = review_message("project", &item.title, decision, req.note());
    let notification = notify(&mut *tx, item.student_id, &kind, &message).await?;
    tx.commit().await?;

    refresh_readiness(&state.db, item.student_id).await?;
    info!("Admin {admin_id} marked project {id} {}", decision.as_str());
    Ok(Json(ReviewOutcome { item, notification }))
}

/// PATCH /api/admin/certifications/:id/review
pub async fn handle_review_certification(
    State(state): State<AppState>,
    AdminAuth(admin_id): AdminAuth,
    Path(id): Path<Uuid>,
    Json(req): Json<ReviewRequest>,
) -> Result<Json<ReviewOutcome<CertificationRow>>, AppError> {
    let decision = req.decision()?;
    let mut tx = state.db.begin().await?;

    let current = sqlx::query_as::<_, CertificationRow>(
        "SELECT * FROM certifications WHERE id = $1 FOR UPDATE",
    )
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Certification {id} not found")))?;
    ensure_transition(&current.status, decision)?;

    let item = sqlx::query_as::<_, CertificationRow>(
        "UPDATE certifications SET status = $1, review_note = $2 WHERE id = $3 RETURNING *",
    )
    .bind(decision.as_str())
    .bind(req.note())
    .bind(id)
    .fetch_one(&mut *tx)
    .await?;

    let (kind, message) = review_message("certification", &item.name, decision, req.note());
    let notification = notify(&mut *tx, item.student_id, &kind, &message).await?;
    tx.commit().await?;

    refresh_readiness(&state.db, item.student_id).await?;
    info!("Admin {admin_id} marked certification {id} {}", decision.as_str());
    Ok(Json(ReviewOutcome { item, notification }))
}

/// PATCH /api/admin/students/:id/review
/// Only verified students enter talent pools.
pub async fn handle_review_student(
    State(state): State<AppState>,
    AdminAuth(admin_id): AdminAuth,
    Path(id): Path<Uuid>,
    Json(req): Json<ReviewRequest>,
) -> Result<Json<ReviewOutcome<StudentRow>>, AppError> {
    let decision = req.decision()?;
    let mut tx = state.db.begin().await?;

    let current = sqlx::query_as::<_, StudentRow>("SELECT * FROM students WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Student {id} not found")))?;
    ensure_transition(&current.status, decision)?;

    let item = sqlx::query_as::<_, StudentRow>(
        "UPDATE students SET status = $1, updated_at = NOW() WHERE id = $2 RETURNING *",
    )
    .bind(decision.as_str())
    .bind(id)
    .fetch_one(&mut *tx)
    .await?;

    let (kind, message) = review_message("profile", &item.name, decision, req.note());
    let notification = notify(&mut *tx, item.id, &kind, &message).await?;
    tx.commit().await?;

    info!("Admin {admin_id} marked student {id} {}", decision.as_str());
    Ok(Json(ReviewOutcome { item, notification }))
}

// ────────────────────────────────────────────────────────────────────────────
// Market data
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/admin/market/refresh
/// Runs inline; returns a `skipped` report if a run is already in progress.
pub async fn handle_market_refresh(
    State(state): State<AppState>,
    AdminAuth(admin_id): AdminAuth,
) -> Json<RefreshReport> {
    info!("Admin {admin_id} triggered a market refresh");
    Json(state.market.run(RefreshTrigger::Manual).await)
}

/// GET /api/admin/market/status
pub async fn handle_market_status(
    State(state): State<AppState>,
    AdminAuth(_admin_id): AdminAuth,
) -> Json<RefresherStatus> {
    Json(state.market.status().await)
}
