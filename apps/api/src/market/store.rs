//! Persistence for market data: Postgres for the `market_skills` table, Redis for
//! the per-skill freshness cache.

use std::collections::{BTreeSet, HashMap};

use anyhow::Result;
use async_trait::async_trait;
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::market::demand::SkillDemand;
use crate::models::job::MarketSkillRow;
use crate::models::student::StudentSkill;
use crate::skills::normalize_skill;

const CACHE_PREFIX: &str = "market:skill:";

/// Skills tracked even before any student or job mentions them.
pub const SEED_SKILLS: &[&str] = &[
    "javascript",
    "typescript",
    "python",
    "java",
    "cpp",
    "go",
    "rust",
    "react",
    "nodejs",
    "sql",
    "docker",
    "kubernetes",
    "aws",
    "machine-learning",
];

/// Aggregate view of `market_skills`, taken before and after a refresh.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub tracked_skills: i64,
    pub avg_demand: f64,
}

#[async_trait]
pub trait MarketStore: Send + Sync {
    /// Raw skill names from student profiles and open jobs.
    async fn mentioned_skills(&self) -> Result<Vec<String>>;
    /// Open jobs per normalised skill (required or preferred).
    async fn posting_counts(&self) -> Result<HashMap<String, u32>>;
    async fn snapshot(&self) -> Result<MarketSnapshot>;
    async fn is_cached(&self, skill: &str) -> Result<bool>;
    async fn save(&self, demand: &SkillDemand) -> Result<()>;
}

/// Normalised, deduplicated and sorted union of the seed list and mentioned skills.
pub fn tracked_skill_set(mentioned: &[String]) -> Vec<String> {
    SEED_SKILLS
        .iter()
        .map(|s| normalize_skill(s))
        .chain(mentioned.iter().map(|s| normalize_skill(s)))
        .filter(|s| !s.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Counts each normalised skill once per job.
pub fn count_postings<'a>(jobs: impl IntoIterator<Item = &'a [String]>) -> HashMap<String, u32> {
    let mut counts = HashMap::new();
    for skills in jobs {
        let unique: BTreeSet<String> = skills.iter().map(|s| normalize_skill(s)).collect();
        for skill in unique {
            *counts.entry(skill).or_insert(0) += 1;
        }
    }
    counts
}

pub async fn list_market_skills(pool: &PgPool) -> Result<Vec<MarketSkillRow>> {
    Ok(sqlx::query_as::<_, MarketSkillRow>(
        "SELECT * FROM market_skills ORDER BY demand_score DESC, skill ASC",
    )
    .fetch_all(pool)
    .await?)
}

#[derive(Clone)]
pub struct PgMarketStore {
    db: PgPool,
    redis: redis::Client,
    cache_ttl_secs: u64,
}

impl PgMarketStore {
    pub fn new(db: PgPool, redis: redis::Client, cache_ttl_secs: u64) -> Self {
        Self {
            db,
            redis,
            cache_ttl_secs,
        }
    }
}

#[async_trait]
impl MarketStore for PgMarketStore {
    async fn mentioned_skills(&self) -> Result<Vec<String>> {
        let student_skills: Vec<(serde_json::Value,)> =
            sqlx::query_as("SELECT skills FROM students")
                .fetch_all(&self.db)
                .await?;
        let job_skills: Vec<(String,)> = sqlx::query_as(
            r#"
            SELECT DISTINCT unnest(required_skills || preferred_skills)
            FROM jobs WHERE status = 'open'
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        let mut names: Vec<String> = student_skills
            .into_iter()
            .filter_map(|(v,)| serde_json::from_value::<Vec<StudentSkill>>(v).ok())
            .flatten()
            .map(|s| s.name)
            .collect();
        names.extend(job_skills.into_iter().map(|(s,)| s));
        Ok(names)
    }

    async fn posting_counts(&self) -> Result<HashMap<String, u32>> {
        let rows: Vec<(Vec<String>, Vec<String>)> = sqlx::query_as(
            "SELECT required_skills, preferred_skills FROM jobs WHERE status = 'open'",
        )
        .fetch_all(&self.db)
        .await?;
        let merged: Vec<Vec<String>> = rows
            .into_iter()
            .map(|(mut required, preferred)| {
                required.extend(preferred);
                required
            })
            .collect();
        Ok(count_postings(merged.iter().map(Vec::as_slice)))
    }

    async fn snapshot(&self) -> Result<MarketSnapshot> {
        let (tracked_skills, avg_demand): (i64, Option<f64>) =
            sqlx::query_as("SELECT COUNT(*), AVG(demand_score) FROM market_skills")
                .fetch_one(&self.db)
                .await?;
        Ok(MarketSnapshot {
            tracked_skills,
            avg_demand: avg_demand.map(|v| (v * 10.0).round() / 10.0).unwrap_or(0.0),
        })
    }

    async fn is_cached(&self, skill: &str) -> Result<bool> {
        let mut conn = self.redis.get_multiplexed_async_connection().await?;
        let exists: bool = conn.exists(format!("{CACHE_PREFIX}{skill}")).await?;
        Ok(exists)
    }

    async fn save(&self, demand: &SkillDemand) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO market_skills
                (skill, demand_score, job_postings, avg_salary, growth_rate, source, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, NOW())
            ON CONFLICT (skill)
            DO UPDATE SET demand_score = EXCLUDED.demand_score,
                          job_postings = EXCLUDED.job_postings,
                          avg_salary = EXCLUDED.avg_salary,
                          growth_rate = EXCLUDED.growth_rate,
                          source = EXCLUDED.source,
                          updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(&demand.skill)
        .bind(demand.demand_score)
        .bind(demand.job_postings as i32)
        .bind(demand.avg_salary)
        .bind(demand.growth_rate)
        .bind(&demand.source)
        .execute(&self.db)
        .await?;

        let mut conn = self.redis.get_multiplexed_async_connection().await?;
        let _: () = conn
            .set_ex(
                format!("{CACHE_PREFIX}{}", demand.skill),
                serde_json::to_string(demand)?,
                self.cache_ttl_secs,
            )
            .await?;
        Ok(())
    }
}
