//! Axum route handlers for mock interviews. Sessions are visible to their owner only.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::StudentAuth;
use crate::errors::AppError;
use crate::interviews::session::{
    evaluate_answers, generate_questions, validate_answers, CreateInterviewRequest, Evaluation,
    InterviewQuestion,
};
use crate::models::engagement::InterviewSessionRow;
use crate::state::AppState;
use crate::students::repo::get_student;

#[derive(Debug, Deserialize)]
pub struct SubmitAnswersRequest {
    pub answers: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct SubmitAnswersResponse {
    pub session: InterviewSessionRow,
    pub evaluation: Evaluation,
}

async fn owned_session(
    state: &AppState,
    student_id: Uuid,
    id: Uuid,
) -> Result<InterviewSessionRow, AppError> {
    sqlx::query_as::<_, InterviewSessionRow>(
        "SELECT * FROM interview_sessions WHERE id = $1 AND student_id = $2",
    )
    .bind(id)
    .bind(student_id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Interview {id} not found")))
}

/// GET /api/interviews
pub async fn handle_list_interviews(
    State(state): State<AppState>,
    StudentAuth(student_id): StudentAuth,
) -> Result<Json<Vec<InterviewSessionRow>>, AppError> {
    let sessions = sqlx::query_as::<_, InterviewSessionRow>(
        "SELECT * FROM interview_sessions WHERE student_id = $1 ORDER BY created_at DESC",
    )
    .bind(student_id)
    .fetch_all(&state.db)
    .await?;
    Ok(Json(sessions))
}

/// POST /api/interviews
pub async fn handle_create_interview(
    State(state): State<AppState>,
    StudentAuth(student_id): StudentAuth,
    Json(req): Json<CreateInterviewRequest>,
) -> Result<(StatusCode, Json<InterviewSessionRow>), AppError> {
    let (role, difficulty) = req.normalized().map_err(AppError::Validation)?;

    let student = get_student(&state.db, student_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Student not found".to_string()))?;
    let skills: Vec<String> = student.skill_list().into_iter().map(|s| s.name).collect();

    let questions = generate_questions(&state.llm, &role, &difficulty, &skills)
        .await
        .map_err(|e| AppError::Llm(format!("Interview question generation failed: {e}")))?;

    let session = sqlx::query_as::<_, InterviewSessionRow>(
        r#"
        INSERT INTO interview_sessions (id, student_id, role, difficulty, questions, status)
        VALUES ($1, $2, $3, $4, $5, 'in_progress')
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(student_id)
    .bind(&role)
    .bind(&difficulty)
    .bind(serde_json::to_value(&questions).map_err(anyhow::Error::from)?)
    .fetch_one(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(session)))
}

/// GET /api/interviews/:id
pub async fn handle_get_interview(
    State(state): State<AppState>,
    StudentAuth(student_id): StudentAuth,
    Path(id): Path<Uuid>,
) -> Result<Json<InterviewSessionRow>, AppError> {
    Ok(Json(owned_session(&state, student_id, id).await?))
}

/// POST /api/interviews/:id/answers
pub async fn handle_submit_answers(
    State(state): State<AppState>,
    StudentAuth(student_id): StudentAuth,
    Path(id): Path<Uuid>,
    Json(req): Json<SubmitAnswersRequest>,
) -> Result<Json<SubmitAnswersResponse>, AppError> {
    let session = owned_session(&state, student_id, id).await?;
    if session.status == "completed" {
        return Err(AppError::Conflict(format!(
            "Interview {id} has already been submitted"
        )));
    }

    let questions: Vec<InterviewQuestion> = serde_json::from_value(session.questions.clone())
        .map_err(|e| AppError::Internal(anyhow::anyhow!("stored questions are malformed: {e}")))?;
    validate_answers(&questions, &req.answers).map_err(AppError::Validation)?;

    let evaluation = evaluate_answers(
        &state.llm,
        &session.role,
        &session.difficulty,
        &questions,
        &req.answers,
    )
    .await
    .map_err(|e| AppError::Llm(format!("Interview evaluation failed: {e}")))?;

    // The status guard makes a concurrent resubmission lose the race cleanly.
    let updated = sqlx::query_as::<_, InterviewSessionRow>(
        r#"
        UPDATE interview_sessions
        SET answers = $1, score = $2, feedback = $3, status = 'completed', completed_at = NOW()
        WHERE id = $4 AND student_id = $5 AND status = 'in_progress'
        RETURNING *
        "#,
    )
    .bind(serde_json::to_value(&req.answers).map_err(anyhow::Error::from)?)
    .bind(evaluation.score as i32)
    .bind(&evaluation.feedback)
    .bind(id)
    .bind(student_id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::Conflict(format!("Interview {id} has already been submitted")))?;

    Ok(Json(SubmitAnswersResponse {
        session: updated,
        evaluation,
    }))
}
