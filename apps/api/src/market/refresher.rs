//! Market data refresher.
//!
//! At most one run at a time per process: a second `run` while one is in flight
//! returns a `skipped` report immediately. Per-skill failures never abort a run.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use crate::market::demand::{build_skill_demand, SkillDemandSource};
use crate::market::store::{tracked_skill_set, MarketSnapshot, MarketStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshTrigger {
    Scheduled,
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshStatus {
    Completed,
    Skipped,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillFailure {
    pub skill: String,
    pub error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshReport {
    pub status: RefreshStatus,
    pub trigger: RefreshTrigger,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub success: usize,
    pub skipped: usize,
    pub failed: usize,
    pub errors: Vec<SkillFailure>,
    pub before: Option<MarketSnapshot>,
    pub after: Option<MarketSnapshot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RefreshReport {
    fn empty(status: RefreshStatus, trigger: RefreshTrigger, started_at: DateTime<Utc>) -> Self {
        Self {
            status,
            trigger,
            started_at,
            duration_ms: 0,
            success: 0,
            skipped: 0,
            failed: 0,
            errors: Vec::new(),
            before: None,
            after: None,
            error: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RefresherStatus {
    pub is_running: bool,
    pub last_run: Option<RefreshReport>,
}

/// Releases the run flag on every exit path, including panics inside the run.
struct RunGuard<'a>(&'a AtomicBool);

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct MarketRefresher {
    store: Arc<dyn MarketStore>,
    source: Arc<dyn SkillDemandSource>,
    is_running: AtomicBool,
    last_run: RwLock<Option<RefreshReport>>,
}

impl MarketRefresher {
    pub fn new(store: Arc<dyn MarketStore>, source: Arc<dyn SkillDemandSource>) -> Self {
        Self {
            store,
            source,
            is_running: AtomicBool::new(false),
            last_run: RwLock::new(None),
        }
    }

    pub fn is_running(&self) -> bool {
        self.is_running.load(Ordering::Acquire)
    }

    pub async fn status(&self) -> RefresherStatus {
        RefresherStatus {
            is_running: self.is_running(),
            last_run: self.last_run.read().await.clone(),
        }
    }

    pub async fn run(&self, trigger: RefreshTrigger) -> RefreshReport {
        let started_at = Utc::now();
        if self
            .is_running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            info!("Market refresh ({trigger:?}) skipped: a run is already in progress");
            return RefreshReport::empty(RefreshStatus::Skipped, trigger, started_at);
        }
        let _guard = RunGuard(&self.is_running);

        let clock = Instant::now();
        let mut report = self.refresh(trigger, started_at).await;
        report.duration_ms = clock.elapsed().as_millis() as u64;

        info!(
            "Market refresh ({trigger:?}) {:?} in {}ms: {} updated, {} cached, {} failed",
            report.status, report.duration_ms, report.success, report.skipped, report.failed
        );
        *self.last_run.write().await = Some(report.clone());
        report
    }

    async fn refresh(&self, trigger: RefreshTrigger, started_at: DateTime<Utc>) -> RefreshReport {
        let mut report = RefreshReport::empty(RefreshStatus::Completed, trigger, started_at);

        report.before = match self.store.snapshot().await {
            Ok(s) => Some(s),
            Err(e) => {
                warn!("Market snapshot before refresh failed: {e}");
                None
            }
        };

        let mentioned = match self.store.mentioned_skills().await {
            Ok(skills) => skills,
            Err(e) => {
                error!("Market refresh could not collect tracked skills: {e:?}");
                report.status = RefreshStatus::Failed;
                report.error = Some(format!("Failed to collect tracked skills: {e}"));
                return report;
            }
        };
        let skills = tracked_skill_set(&mentioned);

        let postings: HashMap<String, u32> = match self.store.posting_counts().await {
            Ok(counts) => counts,
            Err(e) => {
                warn!("Market refresh posting counts failed, using zero: {e}");
                HashMap::new()
            }
        };

        for skill in &skills {
            match self.store.is_cached(skill).await {
                Ok(true) => {
                    report.skipped += 1;
                    continue;
                }
                Ok(false) => {}
                Err(e) => warn!("Market cache lookup for {skill} failed, refreshing anyway: {e}"),
            }

            match self.refresh_skill(skill, postings.get(skill).copied().unwrap_or(0)).await {
                Ok(()) => report.success += 1,
                Err(e) => {
                    warn!("Market refresh for {skill} failed: {e}");
                    report.failed += 1;
                    report.errors.push(SkillFailure {
                        skill: skill.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        report.after = match self.store.snapshot().await {
            Ok(s) => Some(s),
            Err(e) => {
                warn!("Market snapshot after refresh failed: {e}");
                None
            }
        };
        report
    }

    async fn refresh_skill(&self, skill: &str, job_postings: u32) -> anyhow::Result<()> {
        let external = self.source.external_demand(skill).await?;
        let demand = build_skill_demand(skill, external, job_postings);
        self.store.save(&demand).await
    }
}
