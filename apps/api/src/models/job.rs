use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RecruiterRow {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub company: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JobRow {
    pub id: Uuid,
    pub recruiter_id: Uuid,
    pub title: String,
    pub company: String,
    pub description: String,
    pub required_skills: Vec<String>,
    pub preferred_skills: Vec<String>,
    pub min_cgpa: f64,
    pub min_readiness: i32,
    pub min_projects: i32,
    /// "open" | "closed"
    pub status: String,
    pub match_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MarketSkillRow {
    pub skill: String,
    pub demand_score: f64,
    pub job_postings: i32,
    pub avg_salary: Option<f64>,
    pub growth_rate: Option<f64>,
    pub source: String,
    pub updated_at: DateTime<Utc>,
}
