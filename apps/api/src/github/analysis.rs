//! Pure derivations over fetched GitHub data: language shares, top repositories,
//! activity score, skill extraction and project import.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::github::client::{GithubRepo, GithubUser, LanguageBytes};
use crate::models::submission::NewProject;
use crate::skills::{canonical_skill, normalize_skill};

const TOP_LANGUAGES: usize = 10;
const TOP_REPOS: usize = 10;
const SUBSCORE_CAP: u32 = 20;
const RECENT_DAYS: i64 = 30;
const MAX_TECH_STACK: usize = 8;

/// A repository together with its language byte map (empty when not fetched).
#[derive(Debug, Clone)]
pub struct RepoWithLanguages {
    pub repo: GithubRepo,
    pub languages: LanguageBytes,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageStat {
    pub name: String,
    pub bytes: u64,
    /// Share of all bytes, floored to one decimal.
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepoSummary {
    pub name: String,
    pub url: String,
    pub description: Option<String>,
    pub stars: u32,
    pub forks: u32,
    pub language: Option<String>,
    pub pushed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivityBreakdown {
    pub repos: u32,
    pub stars: u32,
    pub recency: u32,
    pub followers: u32,
    pub originality: u32,
    pub total: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedSkill {
    pub name: String,
    pub confidence: f64,
    pub repo_count: usize,
}

/// Aggregate stored on the student record after a sync.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GithubStats {
    pub username: String,
    pub public_repos: u32,
    pub followers: u32,
    pub total_stars: u32,
    pub repos_analyzed: usize,
    pub top_languages: Vec<LanguageStat>,
    pub top_repos: Vec<RepoSummary>,
    pub activity: ActivityBreakdown,
    pub activity_score: u32,
    pub synced_at: DateTime<Utc>,
}

// ────────────────────────────────────────────────────────────────────────────
// Languages and repositories
// ────────────────────────────────────────────────────────────────────────────

/// Top languages by bytes across all repositories. Percentages are computed
/// against the grand total and floored, so they never sum past 100.
pub fn analyze_languages(repos: &[RepoWithLanguages]) -> Vec<LanguageStat> {
    let mut totals: HashMap<&str, u64> = HashMap::new();
    for entry in repos {
        for (language, bytes) in &entry.languages {
            *totals.entry(language.as_str()).or_insert(0) += bytes;
        }
    }
    let grand_total: u64 = totals.values().sum();
    if grand_total == 0 {
        return Vec::new();
    }

    let mut stats: Vec<LanguageStat> = totals
        .into_iter()
        .map(|(name, bytes)| LanguageStat {
            name: name.to_string(),
            bytes,
            percentage: (bytes as f64 * 1000.0 / grand_total as f64).floor() / 10.0,
        })
        .collect();
    stats.sort_by(|a, b| b.bytes.cmp(&a.bytes).then_with(|| a.name.cmp(&b.name)));
    stats.truncate(TOP_LANGUAGES);
    stats
}

/// Most-starred original (non-fork) repositories.
pub fn top_repos(repos: &[GithubRepo]) -> Vec<RepoSummary> {
    let mut originals: Vec<&GithubRepo> = repos.iter().filter(|r| !r.fork).collect();
    originals.sort_by(|a, b| {
        b.stargazers_count
            .cmp(&a.stargazers_count)
            .then_with(|| a.name.cmp(&b.name))
    });
    originals
        .into_iter()
        .take(TOP_REPOS)
        .map(|r| RepoSummary {
            name: r.name.clone(),
            url: r.html_url.clone(),
            description: r.description.clone(),
            stars: r.stargazers_count,
            forks: r.forks_count,
            language: r.language.clone(),
            pushed_at: r.pushed_at,
        })
        .collect()
}

/// Five sub-scores, each capped at 20: repository count, stars, 30-day recency,
/// followers and share of non-fork repositories.
pub fn calculate_activity_score(
    user: &GithubUser,
    repos: &[GithubRepo],
    now: DateTime<Utc>,
) -> ActivityBreakdown {
    let total_stars: u32 = repos.iter().map(|r| r.stargazers_count).fold(0, u32::saturating_add);
    let cutoff = now - Duration::days(RECENT_DAYS);
    let recent = repos
        .iter()
        .filter(|r| r.pushed_at.is_some_and(|p| p >= cutoff))
        .count() as u32;
    let originality = if repos.is_empty() {
        0
    } else {
        let originals = repos.iter().filter(|r| !r.fork).count() as f64;
        (originals / repos.len() as f64 * f64::from(SUBSCORE_CAP)).round() as u32
    };

    let breakdown = ActivityBreakdown {
        repos: user.public_repos.saturating_mul(2).min(SUBSCORE_CAP),
        stars: total_stars.min(SUBSCORE_CAP),
        recency: recent.saturating_mul(4).min(SUBSCORE_CAP),
        followers: user.followers.saturating_mul(2).min(SUBSCORE_CAP),
        originality: originality.min(SUBSCORE_CAP),
        total: 0,
    };
    let total = (breakdown.repos
        + breakdown.stars
        + breakdown.recency
        + breakdown.followers
        + breakdown.originality)
        .min(100);
    ActivityBreakdown { total, ..breakdown }
}

// ────────────────────────────────────────────────────────────────────────────
// Skills
// ────────────────────────────────────────────────────────────────────────────

/// Counts repositories per skill (from languages, primary language and topics).
/// Confidence is `0.7 + count/total * 0.25`, capped at 0.95.
pub fn extract_skills_from_repos(repos: &[RepoWithLanguages]) -> Vec<ExtractedSkill> {
    if repos.is_empty() {
        return Vec::new();
    }
    let total = repos.len() as f64;

    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for entry in repos {
        let mut repo_skills: BTreeSet<String> = BTreeSet::new();
        for language in entry.languages.keys().chain(entry.repo.language.iter()) {
            let skill = normalize_skill(language);
            if !skill.is_empty() {
                repo_skills.insert(skill);
            }
        }
        for topic in &entry.repo.topics {
            // Topics are free-form; only known skills are kept.
            let skill = canonical_skill(&topic.replace('-', " ")).or(canonical_skill(topic));
            if let Some(skill) = skill {
                repo_skills.insert(skill.to_string());
            }
        }
        for skill in repo_skills {
            *counts.entry(skill).or_insert(0) += 1;
        }
    }

    let mut skills: Vec<ExtractedSkill> = counts
        .into_iter()
        .map(|(name, count)| ExtractedSkill {
            name,
            confidence: (0.7 + count as f64 / total * 0.25).min(0.95),
            repo_count: count,
        })
        .collect();
    skills.sort_by(|a, b| {
        b.confidence
            .total_cmp(&a.confidence)
            .then_with(|| a.name.cmp(&b.name))
    });
    skills
}

// ────────────────────────────────────────────────────────────────────────────
// Project import
// ────────────────────────────────────────────────────────────────────────────

/// Canonical form for comparing GitHub links: no scheme, no `www.`, lowercase,
/// no trailing slash or `.git`.
pub fn normalize_github_link(link: &str) -> String {
    let lower = link.trim().to_lowercase();
    let without_scheme = lower
        .strip_prefix("https://")
        .or_else(|| lower.strip_prefix("http://"))
        .unwrap_or(&lower);
    let without_www = without_scheme.strip_prefix("www.").unwrap_or(without_scheme);
    let trimmed = without_www.trim_end_matches('/');
    trimmed
        .strip_suffix(".git")
        .unwrap_or(trimmed)
        .trim_end_matches('/')
        .to_string()
}

/// Public, non-fork repositories as pending projects, skipping any whose link is
/// already present in `existing_links` or earlier in `repos`.
pub fn convert_repos_to_projects(
    repos: &[RepoWithLanguages],
    existing_links: &[String],
) -> Vec<NewProject> {
    let mut seen: HashSet<String> = existing_links
        .iter()
        .map(|l| normalize_github_link(l))
        .collect();

    let mut projects = Vec::new();
    for entry in repos {
        let repo = &entry.repo;
        if repo.private || repo.fork {
            continue;
        }
        let key = normalize_github_link(&repo.html_url);
        if key.is_empty() || !seen.insert(key) {
            continue;
        }

        let mut languages: Vec<(&String, &u64)> = entry.languages.iter().collect();
        languages.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        let mut tech_stack: Vec<String> = languages.into_iter().map(|(l, _)| l.clone()).collect();
        if tech_stack.is_empty() {
            tech_stack.extend(repo.language.clone());
        }
        for topic in &repo.topics {
            if !tech_stack.iter().any(|t| t.eq_ignore_ascii_case(topic)) {
                tech_stack.push(topic.clone());
            }
        }
        tech_stack.truncate(MAX_TECH_STACK);

        projects.push(NewProject {
            title: repo.name.clone(),
            description: repo
                .description
                .clone()
                .filter(|d| !d.trim().is_empty())
                .unwrap_or_else(|| "Imported from GitHub".to_string()),
            tech_stack,
            github_link: Some(repo.html_url.clone()),
            live_link: repo.homepage.clone().filter(|h| !h.trim().is_empty()),
            source: "github".to_string(),
        });
    }
    projects
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::client::RepoOwner;

    fn repo(name: &str) -> GithubRepo {
        GithubRepo {
            name: name.to_string(),
            full_name: format!("asha/{name}"),
            owner: RepoOwner {
                login: "asha".to_string(),
            },
            html_url: format!("https://github.com/asha/{name}"),
            description: None,
            homepage: None,
            fork: false,
            private: false,
            stargazers_count: 0,
            forks_count: 0,
            language: None,
            topics: vec![],
            pushed_at: None,
        }
    }

    fn with_langs(repo: GithubRepo, langs: &[(&str, u64)]) -> RepoWithLanguages {
        RepoWithLanguages {
            repo,
            languages: langs.iter().map(|(l, b)| (l.to_string(), *b)).collect(),
        }
    }

    fn user(public_repos: u32, followers: u32) -> GithubUser {
        GithubUser {
            login: "asha".to_string(),
            name: None,
            public_repos,
            followers,
            following: 0,
            html_url: None,
        }
    }

    #[test]
    fn test_language_percentages_sorted_and_sum_at_most_100() {
        let repos = vec![
            with_langs(repo("a"), &[("Rust", 1000), ("Shell", 1)]),
            with_langs(repo("b"), &[("Python", 333), ("Rust", 333)]),
            with_langs(repo("c"), &[("Go", 333)]),
        ];
        let stats = analyze_languages(&repos);
        assert_eq!(stats[0].name, "Rust");
        assert!(stats.windows(2).all(|w| w[0].percentage >= w[1].percentage));
        let sum: f64 = stats.iter().map(|s| s.percentage).sum();
        assert!(sum <= 100.0 + 1e-9, "sum was {sum}");
    }

    #[test]
    fn test_languages_capped_at_ten() {
        let langs: Vec<(String, u64)> = (0..15).map(|i| (format!("L{i:02}"), 100 + i)).collect();
        let entry = RepoWithLanguages {
            repo: repo("poly"),
            languages: langs.into_iter().collect(),
        };
        let stats = analyze_languages(&[entry]);
        assert_eq!(stats.len(), 10);
        assert_eq!(stats[0].name, "L14");
    }

    #[test]
    fn test_no_language_bytes_yields_empty() {
        assert!(analyze_languages(&[with_langs(repo("a"), &[])]).is_empty());
    }

    #[test]
    fn test_top_repos_excludes_forks_and_sorts_by_stars() {
        let mut a = repo("a");
        a.stargazers_count = 5;
        let mut b = repo("b");
        b.stargazers_count = 50;
        b.fork = true;
        let mut c = repo("c");
        c.stargazers_count = 9;
        let top = top_repos(&[a, b, c]);
        let names: Vec<&str> = top.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["c", "a"]);
    }

    #[test]
    fn test_activity_score_subscores_are_capped() {
        let now = Utc::now();
        let mut repos: Vec<GithubRepo> = (0..30)
            .map(|i| {
                let mut r = repo(&format!("r{i}"));
                r.stargazers_count = 10;
                r.pushed_at = Some(now - Duration::days(1));
                r
            })
            .collect();
        repos[0].fork = true;
        let activity = calculate_activity_score(&user(300, 1000), &repos, now);
        assert_eq!(activity.repos, 20);
        assert_eq!(activity.stars, 20);
        assert_eq!(activity.recency, 20);
        assert_eq!(activity.followers, 20);
        assert_eq!(activity.originality, 19);
        assert_eq!(activity.total, 99);
    }

    #[test]
    fn test_activity_score_empty_account_is_zero() {
        let activity = calculate_activity_score(&user(0, 0), &[], Utc::now());
        assert_eq!(activity.total, 0);
    }

    #[test]
    fn test_recency_ignores_stale_pushes() {
        let now = Utc::now();
        let mut fresh = repo("fresh");
        fresh.pushed_at = Some(now - Duration::days(3));
        let mut stale = repo("stale");
        stale.pushed_at = Some(now - Duration::days(90));
        let activity = calculate_activity_score(&user(2, 0), &[fresh, stale], now);
        assert_eq!(activity.recency, 4);
        assert_eq!(activity.originality, 20);
        assert_eq!(activity.total, 4 + 4 + 20);
    }

    #[test]
    fn test_extracted_skill_confidence_bounds() {
        let mut topical = repo("web");
        topical.topics = vec![
            "react".to_string(),
            "machine-learning".to_string(),
            "hacktoberfest".to_string(),
        ];
        let repos = vec![
            with_langs(topical, &[("JavaScript", 10)]),
            with_langs(repo("b"), &[("JavaScript", 10), ("C++", 5)]),
            with_langs(repo("c"), &[("JavaScript", 10)]),
            with_langs(repo("d"), &[("Jupyter Notebook", 10)]),
            with_langs(repo("e"), &[("Go", 10)]),
        ];
        let skills = extract_skills_from_repos(&repos);
        assert!(skills.iter().all(|s| (0.7..=0.95).contains(&s.confidence)));
        assert_eq!(skills[0].name, "javascript");
        // 0.7 + 3/5 * 0.25
        assert_eq!(skills[0].confidence, 0.85);
        assert!(skills.iter().any(|s| s.name == "react"));
        assert!(skills.iter().any(|s| s.name == "machine-learning"));
        assert!(skills.iter().any(|s| s.name == "cpp"));
        assert!(skills.iter().any(|s| s.name == "jupyter"));
        assert!(!skills.iter().any(|s| s.name == "hacktoberfest"));
    }

    #[test]
    fn test_skill_in_every_repo_caps_at_095() {
        let repos = vec![
            with_langs(repo("a"), &[("Rust", 1)]),
            with_langs(repo("b"), &[("Rust", 1)]),
        ];
        let skills = extract_skills_from_repos(&repos);
        assert_eq!(skills[0].confidence, 0.95);
    }

    #[test]
    fn test_confidence_keeps_full_precision() {
        let repos = vec![
            with_langs(repo("a"), &[("Rust", 1)]),
            with_langs(repo("b"), &[("Go", 1)]),
            with_langs(repo("c"), &[("Go", 1)]),
        ];
        let skills = extract_skills_from_repos(&repos);
        assert_eq!(skills[0].name, "go");
        assert!((skills[0].confidence - (0.7 + 2.0 / 3.0 * 0.25)).abs() < 1e-12);
        assert_eq!(skills[1].name, "rust");
        assert!((skills[1].confidence - (0.7 + 1.0 / 3.0 * 0.25)).abs() < 1e-12);
        assert!(skills[1].confidence > 0.78);
    }

    #[test]
    fn test_normalize_github_link_variants() {
        let expected = "github.com/asha/app";
        assert_eq!(normalize_github_link("https://github.com/Asha/App"), expected);
        assert_eq!(normalize_github_link("https://github.com/asha/app/"), expected);
        assert_eq!(normalize_github_link("http://www.github.com/asha/app.git"), expected);
        assert_eq!(normalize_github_link(" https://GITHUB.com/asha/app.git/ "), expected);
    }

    #[test]
    fn test_convert_repos_excludes_private_and_dedupes_case_insensitively() {
        let mut private = repo("secret");
        private.private = true;
        let mut dup = repo("App");
        dup.html_url = "https://github.com/ASHA/app".to_string();
        let mut fork = repo("forked");
        fork.fork = true;
        let repos = vec![
            with_langs(repo("app"), &[("Rust", 10), ("Shell", 1)]),
            with_langs(dup, &[]),
            with_langs(private, &[]),
            with_langs(fork, &[]),
            with_langs(repo("existing"), &[]),
        ];
        let existing = vec!["https://github.com/asha/existing.git".to_string()];

        let projects = convert_repos_to_projects(&repos, &existing);
        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0].title, "app");
        assert_eq!(projects[0].tech_stack, vec!["Rust".to_string(), "Shell".to_string()]);
        assert_eq!(projects[0].source, "github");
        assert_eq!(projects[0].description, "Imported from GitHub");
    }
}
