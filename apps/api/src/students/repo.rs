//! Student persistence helpers shared by the student, recruiter and admin APIs.

use std::collections::HashMap;

use anyhow::Result;
use sqlx::PgPool;
use uuid::Uuid;

use crate::matching::scorer::StudentProfile;
use crate::models::student::{CodingLog, StudentRow, StudentSkill};
use crate::models::submission::{CertificationRow, NewProject, ProjectRow};
use crate::readiness::compute_readiness;

pub async fn get_student(pool: &PgPool, student_id: Uuid) -> Result<Option<StudentRow>> {
    Ok(
        sqlx::query_as::<_, StudentRow>("SELECT * FROM students WHERE id = $1")
            .bind(student_id)
            .fetch_optional(pool)
            .await?,
    )
}

pub async fn list_projects(pool: &PgPool, student_id: Uuid) -> Result<Vec<ProjectRow>> {
    Ok(sqlx::query_as::<_, ProjectRow>(
        "SELECT * FROM projects WHERE student_id = $1 ORDER BY created_at DESC",
    )
    .bind(student_id)
    .fetch_all(pool)
    .await?)
}

pub async fn list_certifications(pool: &PgPool, student_id: Uuid) -> Result<Vec<CertificationRow>> {
    Ok(sqlx::query_as::<_, CertificationRow>(
        "SELECT * FROM certifications WHERE student_id = $1 ORDER BY created_at DESC",
    )
    .bind(student_id)
    .fetch_all(pool)
    .await?)
}

/// Builds the scoring view of every verified student in three queries.
pub async fn load_verified_profiles(pool: &PgPool) -> Result<Vec<StudentProfile>> {
    let students = sqlx::query_as::<_, StudentRow>(
        "SELECT * FROM students WHERE status = 'verified' ORDER BY id",
    )
    .fetch_all(pool)
    .await?;

    let projects = sqlx::query_as::<_, ProjectRow>(
        r#"
        SELECT p.* FROM projects p
        JOIN students s ON s.id = p.student_id
        WHERE s.status = 'verified'
        "#,
    )
    .fetch_all(pool)
    .await?;

    let certifications = sqlx::query_as::<_, CertificationRow>(
        r#"
        SELECT c.* FROM certifications c
        JOIN students s ON s.id = c.student_id
        WHERE s.status = 'verified'
        "#,
    )
    .fetch_all(pool)
    .await?;

    let mut projects_by_student: HashMap<Uuid, Vec<ProjectRow>> = HashMap::new();
    for project in projects {
        projects_by_student
            .entry(project.student_id)
            .or_default()
            .push(project);
    }
    let mut certs_by_student: HashMap<Uuid, Vec<CertificationRow>> = HashMap::new();
    for cert in certifications {
        certs_by_student.entry(cert.student_id).or_default().push(cert);
    }

    Ok(students
        .iter()
        .map(|s| {
            StudentProfile::from_rows(
                s,
                projects_by_student.get(&s.id).map(Vec::as_slice).unwrap_or(&[]),
                certs_by_student.get(&s.id).map(Vec::as_slice).unwrap_or(&[]),
            )
        })
        .collect())
}

pub async fn load_profile(pool: &PgPool, student_id: Uuid) -> Result<Option<StudentProfile>> {
    let Some(student) = get_student(pool, student_id).await? else {
        return Ok(None);
    };
    let projects = list_projects(pool, student_id).await?;
    let certifications = list_certifications(pool, student_id).await?;
    Ok(Some(StudentProfile::from_rows(
        &student,
        &projects,
        &certifications,
    )))
}

pub async fn save_skills(pool: &PgPool, student_id: Uuid, skills: &[StudentSkill]) -> Result<()> {
    sqlx::query("UPDATE students SET skills = $1, updated_at = NOW() WHERE id = $2")
        .bind(serde_json::to_value(skills)?)
        .bind(student_id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn save_coding_logs(pool: &PgPool, student_id: Uuid, logs: &[CodingLog]) -> Result<()> {
    sqlx::query("UPDATE students SET coding_logs = $1, updated_at = NOW() WHERE id = $2")
        .bind(serde_json::to_value(logs)?)
        .bind(student_id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn insert_projects(
    pool: &PgPool,
    student_id: Uuid,
    projects: &[NewProject],
) -> Result<Vec<ProjectRow>> {
    let mut tx = pool.begin().await?;
    let mut inserted = Vec::with_capacity(projects.len());
    for project in projects {
        let row = sqlx::query_as::<_, ProjectRow>(
            r#"
            INSERT INTO projects
                (id, student_id, title, description, tech_stack, github_link, live_link, source)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(student_id)
        .bind(&project.title)
        .bind(&project.description)
        .bind(&project.tech_stack)
        .bind(&project.github_link)
        .bind(&project.live_link)
        .bind(&project.source)
        .fetch_one(&mut *tx)
        .await?;
        inserted.push(row);
    }
    tx.commit().await?;
    Ok(inserted)
}

/// Recomputes and stores the readiness score. Returns the new value.
pub async fn refresh_readiness(pool: &PgPool, student_id: Uuid) -> Result<Option<i32>> {
    let Some(student) = get_student(pool, student_id).await? else {
        return Ok(None);
    };
    let projects = list_projects(pool, student_id).await?;
    let certifications = list_certifications(pool, student_id).await?;
    let today = chrono::Utc::now().date_naive();
    let score = compute_readiness(&student, &projects, &certifications, today);

    sqlx::query("UPDATE students SET readiness_score = $1, updated_at = NOW() WHERE id = $2")
        .bind(score as i32)
        .bind(student_id)
        .execute(pool)
        .await?;
    Ok(Some(score as i32))
}
