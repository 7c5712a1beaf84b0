//! Learning roadmaps: ordered steps with a derived completion percentage.

use anyhow::Result;
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::engagement::{RoadmapRow, RoadmapStep};

const MAX_STEPS: usize = 50;

#[derive(Debug, Deserialize)]
pub struct CreateRoadmapRequest {
    pub title: String,
    pub steps: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct ToggleStepRequest {
    pub done: bool,
}

/// Percentage of completed steps, rounded. An empty roadmap is 0.
pub fn roadmap_progress(steps: &[RoadmapStep]) -> i32 {
    if steps.is_empty() {
        return 0;
    }
    let done = steps.iter().filter(|s| s.done).count() as f64;
    (done / steps.len() as f64 * 100.0).round() as i32
}

pub fn build_steps(req: &CreateRoadmapRequest) -> Result<Vec<RoadmapStep>, String> {
    if req.title.trim().is_empty() {
        return Err("title cannot be empty".to_string());
    }
    let steps: Vec<RoadmapStep> = req
        .steps
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|title| RoadmapStep {
            title: title.to_string(),
            done: false,
        })
        .collect();
    if steps.len() > MAX_STEPS {
        return Err(format!("a roadmap can have at most {MAX_STEPS} steps"));
    }
    Ok(steps)
}

/// Sets one step's flag. `None` when the index is out of range.
pub fn set_step(mut steps: Vec<RoadmapStep>, index: usize, done: bool) -> Option<Vec<RoadmapStep>> {
    steps.get_mut(index)?.done = done;
    Some(steps)
}

pub fn decode_steps(row: &RoadmapRow) -> Vec<RoadmapStep> {
    serde_json::from_value(row.steps.clone()).unwrap_or_default()
}

pub async fn list_roadmaps(pool: &PgPool, student_id: Uuid) -> Result<Vec<RoadmapRow>> {
    Ok(sqlx::query_as::<_, RoadmapRow>(
        "SELECT * FROM roadmaps WHERE student_id = $1 ORDER BY created_at DESC",
    )
    .bind(student_id)
    .fetch_all(pool)
    .await?)
}

pub async fn insert_roadmap(
    pool: &PgPool,
    student_id: Uuid,
    title: &str,
    steps: &[RoadmapStep],
) -> Result<RoadmapRow> {
    Ok(sqlx::query_as::<_, RoadmapRow>(
        r#"
        INSERT INTO roadmaps (id, student_id, title, steps, progress)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(student_id)
    .bind(title.trim())
    .bind(serde_json::to_value(steps)?)
    .bind(roadmap_progress(steps))
    .fetch_one(pool)
    .await?)
}

pub async fn get_roadmap(pool: &PgPool, student_id: Uuid, id: Uuid) -> Result<Option<RoadmapRow>> {
    Ok(sqlx::query_as::<_, RoadmapRow>(
        "SELECT * FROM roadmaps WHERE id = $1 AND student_id = $2",
    )
    .bind(id)
    .bind(student_id)
    .fetch_optional(pool)
    .await?)
}

pub async fn save_steps(pool: &PgPool, id: Uuid, steps: &[RoadmapStep]) -> Result<RoadmapRow> {
    Ok(sqlx::query_as::<_, RoadmapRow>(
        r#"
        UPDATE roadmaps SET steps = $1, progress = $2, updated_at = NOW()
        WHERE id = $3
        RETURNING *
        "#,
    )
    .bind(serde_json::to_value(steps)?)
    .bind(roadmap_progress(steps))
    .bind(id)
    .fetch_one(pool)
    .await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn steps(flags: &[bool]) -> Vec<RoadmapStep> {
        flags
            .iter()
            .enumerate()
            .map(|(i, done)| RoadmapStep {
                title: format!("step {i}"),
                done: *done,
            })
            .collect()
    }

    #[test]
    fn test_progress_rounds_percentage() {
        assert_eq!(roadmap_progress(&steps(&[true, false, false])), 33);
        assert_eq!(roadmap_progress(&steps(&[true, true, false])), 67);
        assert_eq!(roadmap_progress(&steps(&[true, true])), 100);
    }

    #[test]
    fn test_progress_of_empty_roadmap_is_zero() {
        assert_eq!(roadmap_progress(&[]), 0);
    }

    #[test]
    fn test_set_step_checks_bounds() {
        let updated = set_step(steps(&[false, false]), 1, true).unwrap();
        assert!(updated[1].done);
        assert!(set_step(steps(&[false]), 3, true).is_none());
    }

    #[test]
    fn test_build_steps_drops_blank_titles() {
        let req = CreateRoadmapRequest {
            title: "Backend".to_string(),
            steps: vec!["Learn SQL".to_string(), "  ".to_string(), " Build an API ".to_string()],
        };
        let built = build_steps(&req).unwrap();
        assert_eq!(built.len(), 2);
        assert_eq!(built[1].title, "Build an API");
        assert!(built.iter().all(|s| !s.done));
    }

    #[test]
    fn test_build_steps_requires_title() {
        let req = CreateRoadmapRequest {
            title: " ".to_string(),
            steps: vec![],
        };
        assert!(build_steps(&req).is_err());
    }
}
