//! Skill demand: the external feed and the blend with internal job postings.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

const USER_AGENT: &str = "placement-api";
const EXTERNAL_WEIGHT: f64 = 0.6;
const INTERNAL_WEIGHT: f64 = 0.4;
/// Each open posting mentioning a skill adds this much internal demand, capped at 100.
const POINTS_PER_POSTING: f64 = 10.0;

/// One skill's figures from the external market feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalDemand {
    /// 0–100.
    pub demand: f64,
    #[serde(default)]
    pub avg_salary: Option<f64>,
    #[serde(default)]
    pub growth_rate: Option<f64>,
}

/// A fully computed market row, ready to upsert and cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillDemand {
    pub skill: String,
    pub demand_score: f64,
    pub job_postings: u32,
    pub avg_salary: Option<f64>,
    pub growth_rate: Option<f64>,
    /// "external+internal" or "internal".
    pub source: String,
}

#[async_trait]
pub trait SkillDemandSource: Send + Sync {
    /// `Ok(None)` when no external feed is configured or it has no data for the skill.
    async fn external_demand(&self, skill: &str) -> anyhow::Result<Option<ExternalDemand>>;
}

/// Blends external demand with the internal posting signal, clamped to 0–100.
pub fn combine_demand(external: Option<f64>, job_postings: u32) -> f64 {
    let internal = (f64::from(job_postings) * POINTS_PER_POSTING).min(100.0);
    let score = match external {
        Some(ext) => EXTERNAL_WEIGHT * ext.clamp(0.0, 100.0) + INTERNAL_WEIGHT * internal,
        None => internal,
    };
    (score.clamp(0.0, 100.0) * 10.0).round() / 10.0
}

pub fn build_skill_demand(
    skill: &str,
    external: Option<ExternalDemand>,
    job_postings: u32,
) -> SkillDemand {
    let demand_score = combine_demand(external.as_ref().map(|e| e.demand), job_postings);
    SkillDemand {
        skill: skill.to_string(),
        demand_score,
        job_postings,
        avg_salary: external.as_ref().and_then(|e| e.avg_salary),
        growth_rate: external.as_ref().and_then(|e| e.growth_rate),
        source: if external.is_some() {
            "external+internal".to_string()
        } else {
            "internal".to_string()
        },
    }
}

/// HTTP feed at `MARKET_DATA_URL`: `GET {url}?skill=<name>` → `ExternalDemand`, 404 = no data.
#[derive(Clone)]
pub struct HttpDemandSource {
    client: Client,
    base_url: Option<String>,
}

impl HttpDemandSource {
    pub fn new(base_url: Option<String>) -> anyhow::Result<Self> {
        Ok(Self {
            client: Client::builder()
                .timeout(Duration::from_secs(10))
                .user_agent(USER_AGENT)
                .build()?,
            base_url,
        })
    }
}

#[async_trait]
impl SkillDemandSource for HttpDemandSource {
    async fn external_demand(&self, skill: &str) -> anyhow::Result<Option<ExternalDemand>> {
        let Some(base_url) = &self.base_url else {
            return Ok(None);
        };
        debug!("Market data GET {base_url} skill={skill}");
        let response = self
            .client
            .get(base_url)
            .query(&[("skill", skill)])
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("market data feed returned {status}: {body}");
        }
        Ok(Some(response.json::<ExternalDemand>().await?))
    }
}
