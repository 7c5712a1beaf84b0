//! GitHub sync job.
//!
//! Flow: load student → fetch profile → page repositories → fetch languages →
//!       derive stats and skills → merge into the student → optional project import.
//!
//! Never returns an error to its caller: every outcome is a `SyncOutcome`.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::github::analysis::{
    analyze_languages, calculate_activity_score, convert_repos_to_projects,
    extract_skills_from_repos, top_repos, ExtractedSkill, GithubStats, RepoWithLanguages,
};
use crate::github::client::{GithubApi, GithubRepo, GithubUser, REPOS_PER_PAGE};
use crate::models::student::{SkillSource, StudentRow, StudentSkill};
use crate::models::submission::NewProject;
use crate::skills::normalize_skill;
use crate::students::repo::{
    get_student, insert_projects, list_projects, refresh_readiness, save_skills,
};

const MAX_REPO_PAGES: u32 = 3;
const LANGUAGE_FETCH_LIMIT: usize = 20;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SyncOptions {
    #[serde(default)]
    pub import_projects: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SyncStats {
    pub repos_fetched: usize,
    pub top_languages: Vec<String>,
    pub activity_score: u32,
    pub skills_extracted: usize,
    pub projects_imported: usize,
    pub readiness_score: Option<i32>,
}

/// Result shape of a sync. `success == false` always carries `error`.
#[derive(Debug, Clone, Serialize)]
pub struct SyncOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<SyncStats>,
}

impl SyncOutcome {
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            stats: None,
        }
    }

    pub fn succeeded(stats: SyncStats) -> Self {
        Self {
            success: true,
            error: None,
            stats: Some(stats),
        }
    }
}

/// Everything derived from the remote account in one pass.
#[derive(Debug, Clone)]
pub struct GithubSnapshot {
    pub user: GithubUser,
    pub repos: Vec<RepoWithLanguages>,
    pub stats: GithubStats,
    pub skills: Vec<ExtractedSkill>,
}

// ────────────────────────────────────────────────────────────────────────────
// Remote collection
// ────────────────────────────────────────────────────────────────────────────

/// Pages through the user's repositories, stopping at the first short page.
/// A failing page ends pagination with whatever was already collected.
pub async fn fetch_all_repos(api: &dyn GithubApi, token: &str) -> Vec<GithubRepo> {
    let mut repos = Vec::new();
    for page in 1..=MAX_REPO_PAGES {
        match api.repos_page(token, page).await {
            Ok(batch) => {
                let short_page = batch.len() < REPOS_PER_PAGE;
                repos.extend(batch);
                if short_page {
                    break;
                }
            }
            Err(e) => {
                warn!("GitHub repo page {page} failed, continuing with {} repos: {e}", repos.len());
                break;
            }
        }
    }
    repos
}

/// Fetches language maps for the first `LANGUAGE_FETCH_LIMIT` repositories.
/// The rest, and any that fail, get an empty map.
pub async fn attach_languages(
    api: &dyn GithubApi,
    token: &str,
    repos: Vec<GithubRepo>,
) -> Vec<RepoWithLanguages> {
    let mut out = Vec::with_capacity(repos.len());
    for (index, repo) in repos.into_iter().enumerate() {
        let languages = if index < LANGUAGE_FETCH_LIMIT {
            match api.languages(token, &repo.owner.login, &repo.name).await {
                Ok(map) => map,
                Err(e) => {
                    warn!("GitHub languages for {} failed: {e}", repo.full_name);
                    Default::default()
                }
            }
        } else {
            Default::default()
        };
        out.push(RepoWithLanguages { repo, languages });
    }
    out
}

/// Profile fetch is the only hard failure; everything after it degrades.
pub async fn collect_snapshot(
    api: &dyn GithubApi,
    token: &str,
) -> Result<GithubSnapshot, String> {
    let user = api
        .user(token)
        .await
        .map_err(|e| format!("Failed to fetch GitHub profile: {e}"))?;

    let repos = fetch_all_repos(api, token).await;
    let repos = attach_languages(api, token, repos).await;

    let plain: Vec<GithubRepo> = repos.iter().map(|r| r.repo.clone()).collect();
    let now = Utc::now();
    let activity = calculate_activity_score(&user, &plain, now);
    let total_stars = plain
        .iter()
        .map(|r| r.stargazers_count)
        .fold(0, u32::saturating_add);

    let stats = GithubStats {
        username: user.login.clone(),
        public_repos: user.public_repos,
        followers: user.followers,
        total_stars,
        repos_analyzed: repos.len(),
        top_languages: analyze_languages(&repos),
        top_repos: top_repos(&plain),
        activity_score: activity.total,
        activity,
        synced_at: now,
    };
    let skills = extract_skills_from_repos(&repos);

    Ok(GithubSnapshot {
        user,
        repos,
        stats,
        skills,
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Merge
// ────────────────────────────────────────────────────────────────────────────

/// Keeps every non-GitHub skill, drops previous GitHub-sourced ones, then adds
/// extracted skills not already present under another source.
pub fn merge_github_skills(
    existing: &[StudentSkill],
    extracted: &[ExtractedSkill],
) -> Vec<StudentSkill> {
    let mut merged: Vec<StudentSkill> = existing
        .iter()
        .filter(|s| s.source != SkillSource::Github)
        .cloned()
        .collect();

    for skill in extracted {
        let key = normalize_skill(&skill.name);
        if merged.iter().any(|s| normalize_skill(&s.name) == key) {
            continue;
        }
        merged.push(StudentSkill {
            name: skill.name.clone(),
            level: None,
            source: SkillSource::Github,
            confidence: skill.confidence,
            verified: false,
        });
    }
    merged
}

// ────────────────────────────────────────────────────────────────────────────
// Entry point
// ────────────────────────────────────────────────────────────────────────────

pub async fn sync_github(
    pool: &PgPool,
    api: &dyn GithubApi,
    student_id: Uuid,
    options: &SyncOptions,
) -> SyncOutcome {
    match run_sync(pool, api, student_id, options).await {
        Ok(outcome) => outcome,
        Err(e) => {
            warn!("GitHub sync for student {student_id} failed: {e:?}");
            SyncOutcome::failed(format!("GitHub sync failed: {e}"))
        }
    }
}

/// The student and their OAuth token, or the outcome reported when sync cannot start.
pub fn connected_student(student: Option<StudentRow>) -> Result<(StudentRow, String), SyncOutcome> {
    let Some(student) = student else {
        return Err(SyncOutcome::failed("Student not found"));
    };
    let token = student
        .github_token
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string);
    match token {
        Some(token) => Ok((student, token)),
        None => Err(SyncOutcome::failed("GitHub not connected")),
    }
}

async fn run_sync(
    pool: &PgPool,
    api: &dyn GithubApi,
    student_id: Uuid,
    options: &SyncOptions,
) -> anyhow::Result<SyncOutcome> {
    let (student, token) = match connected_student(get_student(pool, student_id).await?) {
        Ok(connected) => connected,
        Err(outcome) => return Ok(outcome),
    };

    let snapshot = match collect_snapshot(api, &token).await {
        Ok(s) => s,
        Err(message) => return Ok(SyncOutcome::failed(message)),
    };

    let skills = merge_github_skills(&student.skill_list(), &snapshot.skills);
    save_skills(pool, student_id, &skills).await?;

    sqlx::query(
        r#"
        UPDATE students
        SET github_stats = $1, github_username = $2, last_github_sync = NOW(), updated_at = NOW()
        WHERE id = $3
        "#,
    )
    .bind(serde_json::to_value(&snapshot.stats)?)
    .bind(&snapshot.user.login)
    .bind(student_id)
    .execute(pool)
    .await?;

    let imported = if options.import_projects {
        let existing: Vec<String> = list_projects(pool, student_id)
            .await?
            .into_iter()
            .filter_map(|p| p.github_link)
            .collect();
        let new_projects: Vec<NewProject> = convert_repos_to_projects(&snapshot.repos, &existing);
        insert_projects(pool, student_id, &new_projects).await?.len()
    } else {
        0
    };

    let readiness_score = refresh_readiness(pool, student_id).await?;

    info!(
        "GitHub sync for student {student_id}: {} repos, activity {}, {} skills, {} projects \
         imported",
        snapshot.repos.len(),
        snapshot.stats.activity_score,
        snapshot.skills.len(),
        imported
    );

    Ok(SyncOutcome::succeeded(SyncStats {
        repos_fetched: snapshot.repos.len(),
        top_languages: snapshot
            .stats
            .top_languages
            .iter()
            .map(|l| l.name.clone())
            .collect(),
        activity_score: snapshot.stats.activity_score,
        skills_extracted: snapshot.skills.len(),
        projects_imported: imported,
        readiness_score,
    }))
}
