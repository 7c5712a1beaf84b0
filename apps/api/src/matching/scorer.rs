//! Job-to-student match scoring behind a pluggable trait.
//!
//! Default: `WeightedMatchScorer` (pure Rust, deterministic, fully testable).
//! `AppState` holds an `Arc<dyn MatchScorer>`.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::activity::{active_days, solved_in_window};
use crate::models::job::JobRow;
use crate::models::student::{CodingLog, StudentRow};
use crate::models::submission::{CertificationRow, ProjectRow};
use crate::models::ReviewStatus;
use crate::skills::{normalize_skill, normalize_skill_set};

// ────────────────────────────────────────────────────────────────────────────
// Weights
// ────────────────────────────────────────────────────────────────────────────

/// Category weights in points. They sum to 100.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MatchWeights {
    pub required_skills: f64,
    pub preferred_skills: f64,
    pub projects: f64,
    pub readiness: f64,
    pub growth: f64,
    pub cgpa: f64,
    pub certifications: f64,
    pub coding_consistency: f64,
}

impl Default for MatchWeights {
    fn default() -> Self {
        Self {
            required_skills: 35.0,
            preferred_skills: 10.0,
            projects: 15.0,
            readiness: 10.0,
            growth: 5.0,
            cgpa: 10.0,
            certifications: 5.0,
            coding_consistency: 10.0,
        }
    }
}

impl MatchWeights {
    pub fn sum(&self) -> f64 {
        self.required_skills
            + self.preferred_skills
            + self.projects
            + self.readiness
            + self.growth
            + self.cgpa
            + self.certifications
            + self.coding_consistency
    }
}

const DEFAULT_PROJECT_TARGET: f64 = 3.0;
const CERTIFICATION_TARGET: f64 = 3.0;
const CONSISTENCY_TARGET_DAYS: f64 = 20.0;
const WINDOW_DAYS: i64 = 30;

// ────────────────────────────────────────────────────────────────────────────
// Inputs and outputs
// ────────────────────────────────────────────────────────────────────────────

/// What a job asks for, detached from storage.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobRequirements {
    pub required_skills: Vec<String>,
    pub preferred_skills: Vec<String>,
    pub min_cgpa: f64,
    pub min_readiness: u32,
    pub min_projects: u32,
}

impl From<&JobRow> for JobRequirements {
    fn from(job: &JobRow) -> Self {
        Self {
            required_skills: job.required_skills.clone(),
            preferred_skills: job.preferred_skills.clone(),
            min_cgpa: job.min_cgpa.max(0.0),
            min_readiness: job.min_readiness.max(0) as u32,
            min_projects: job.min_projects.max(0) as u32,
        }
    }
}

/// The parts of a student profile the scorer looks at.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StudentProfile {
    pub student_id: Uuid,
    pub skills: Vec<String>,
    pub cgpa: f64,
    pub readiness_score: u32,
    pub verified_projects: u32,
    pub pending_projects: u32,
    pub verified_certifications: u32,
    pub coding_logs: Vec<CodingLog>,
}

impl StudentProfile {
    pub fn from_rows(
        student: &StudentRow,
        projects: &[ProjectRow],
        certifications: &[CertificationRow],
    ) -> Self {
        Self {
            student_id: student.id,
            skills: student.skill_list().into_iter().map(|s| s.name).collect(),
            cgpa: student.cgpa.unwrap_or(0.0).clamp(0.0, 10.0),
            readiness_score: student.readiness_score.clamp(0, 100) as u32,
            verified_projects: count_status(
                projects.iter().map(|p| p.status.as_str()),
                ReviewStatus::Verified,
            ),
            pending_projects: count_status(
                projects.iter().map(|p| p.status.as_str()),
                ReviewStatus::Pending,
            ),
            verified_certifications: count_status(
                certifications.iter().map(|c| c.status.as_str()),
                ReviewStatus::Verified,
            ),
            coding_logs: student.coding_log_list(),
        }
    }
}

pub fn count_status<'a>(statuses: impl Iterator<Item = &'a str>, status: ReviewStatus) -> u32 {
    statuses.filter(|s| *s == status.as_str()).count() as u32
}

/// Points earned per category, rounded to one decimal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchBreakdown {
    pub required_skills: f64,
    pub preferred_skills: f64,
    pub projects: f64,
    pub readiness: f64,
    pub growth: f64,
    pub cgpa: f64,
    pub certifications: f64,
    pub coding_consistency: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub student_id: Uuid,
    pub score: u32, // 0 – 100
    pub breakdown: MatchBreakdown,
    pub skills_matched: Vec<String>,
    pub skills_missing: Vec<String>,
    pub eligible: bool,
    pub ineligibility_reasons: Vec<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Trait definition
// ────────────────────────────────────────────────────────────────────────────

/// Swap backends without touching the handlers that rank students.
#[async_trait]
pub trait MatchScorer: Send + Sync {
    async fn score(&self, job: &JobRequirements, student: &StudentProfile) -> MatchResult;
}

/// Weighted-sum scorer over fixed categories.
#[derive(Debug, Clone, Default)]
pub struct WeightedMatchScorer {
    pub weights: MatchWeights,
}

#[async_trait]
impl MatchScorer for WeightedMatchScorer {
    async fn score(&self, job: &JobRequirements, student: &StudentProfile) -> MatchResult {
        compute_match(job, student, &self.weights, Utc::now().date_naive())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Core scoring
// ────────────────────────────────────────────────────────────────────────────

pub fn compute_match(
    job: &JobRequirements,
    student: &StudentProfile,
    weights: &MatchWeights,
    today: NaiveDate,
) -> MatchResult {
    let student_skills = normalize_skill_set(&student.skills);

    let required_ratio = skill_ratio(&job.required_skills, &student.skills);
    let preferred_ratio = skill_ratio(&job.preferred_skills, &student.skills);

    let project_credit =
        f64::from(student.verified_projects) + 0.5 * f64::from(student.pending_projects);
    let project_target = if job.min_projects > 0 {
        f64::from(job.min_projects)
    } else {
        DEFAULT_PROJECT_TARGET
    };
    let projects_ratio = (project_credit / project_target).min(1.0);

    let readiness = f64::from(student.readiness_score.min(100));
    let readiness_ratio = if job.min_readiness > 0 {
        (readiness / f64::from(job.min_readiness)).min(1.0)
    } else {
        readiness / 100.0
    };

    let growth = growth_ratio(&student.coding_logs, today);

    let cgpa_ratio = if job.min_cgpa > 0.0 {
        if student.cgpa >= job.min_cgpa {
            1.0
        } else {
            0.5 * student.cgpa / job.min_cgpa
        }
    } else {
        student.cgpa / 10.0
    };

    let certifications_ratio =
        (f64::from(student.verified_certifications) / CERTIFICATION_TARGET).min(1.0);

    let consistency_ratio = (active_days(&student.coding_logs, today, WINDOW_DAYS) as f64
        / CONSISTENCY_TARGET_DAYS)
        .min(1.0);

    let raw = [
        weights.required_skills * required_ratio,
        weights.preferred_skills * preferred_ratio,
        weights.projects * projects_ratio,
        weights.readiness * readiness_ratio,
        weights.growth * growth,
        weights.cgpa * cgpa_ratio.clamp(0.0, 1.0),
        weights.certifications * certifications_ratio,
        weights.coding_consistency * consistency_ratio,
    ];
    let total: f64 = raw.iter().sum();
    let score = total.round().clamp(0.0, 100.0) as u32;

    let breakdown = MatchBreakdown {
        required_skills: round1(raw[0]),
        preferred_skills: round1(raw[1]),
        projects: round1(raw[2]),
        readiness: round1(raw[3]),
        growth: round1(raw[4]),
        cgpa: round1(raw[5]),
        certifications: round1(raw[6]),
        coding_consistency: round1(raw[7]),
    };

    let mut skills_matched: Vec<String> = Vec::new();
    for skill in job.required_skills.iter().chain(job.preferred_skills.iter()) {
        if student_skills.contains(&normalize_skill(skill))
            && !skills_matched
                .iter()
                .any(|m| normalize_skill(m) == normalize_skill(skill))
        {
            skills_matched.push(skill.clone());
        }
    }
    let skills_missing: Vec<String> = job
        .required_skills
        .iter()
        .filter(|s| !normalize_skill(s).is_empty())
        .filter(|s| !student_skills.contains(&normalize_skill(s)))
        .cloned()
        .collect();

    let ineligibility_reasons = eligibility_gaps(job, student);

    MatchResult {
        student_id: student.student_id,
        score,
        breakdown,
        skills_matched,
        skills_missing,
        eligible: ineligibility_reasons.is_empty(),
        ineligibility_reasons,
    }
}

/// Share of `wanted` skills present in `have`. No requirements means full credit.
fn skill_ratio(wanted: &[String], have: &[String]) -> f64 {
    let wanted = normalize_skill_set(wanted);
    if wanted.is_empty() {
        return 1.0;
    }
    let have = normalize_skill_set(have);
    wanted.intersection(&have).count() as f64 / wanted.len() as f64
}

/// Compares the last 30 days of solved problems against the 30 days before.
fn growth_ratio(logs: &[CodingLog], today: NaiveDate) -> f64 {
    let recent = solved_in_window(logs, today, 0, WINDOW_DAYS);
    let previous = solved_in_window(logs, today, WINDOW_DAYS, WINDOW_DAYS);
    if recent == 0 {
        0.0
    } else if previous == 0 {
        1.0
    } else {
        (recent as f64 / previous as f64).min(2.0) / 2.0
    }
}

fn eligibility_gaps(job: &JobRequirements, student: &StudentProfile) -> Vec<String> {
    let mut reasons = Vec::new();
    if job.min_cgpa > 0.0 && student.cgpa < job.min_cgpa {
        reasons.push(format!(
            "CGPA {:.2} is below the minimum {:.2}",
            student.cgpa, job.min_cgpa
        ));
    }
    if student.readiness_score < job.min_readiness {
        reasons.push(format!(
            "Readiness {} is below the minimum {}",
            student.readiness_score, job.min_readiness
        ));
    }
    let projects = student.verified_projects + student.pending_projects;
    if projects < job.min_projects {
        reasons.push(format!(
            "{} project(s) submitted, {} required",
            projects, job.min_projects
        ));
    }
    reasons
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 30).unwrap()
    }

    fn skills(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn daily_logs(days: i64, solved: u32) -> Vec<CodingLog> {
        (0..days)
            .map(|i| CodingLog {
                date: today() - Duration::days(i),
                platform: "leetcode".to_string(),
                problems_solved: solved,
            })
            .collect()
    }

    fn strong_student() -> StudentProfile {
        StudentProfile {
            student_id: Uuid::new_v4(),
            skills: skills(&["Rust", "React.js", "Docker"]),
            cgpa: 10.0,
            readiness_score: 100,
            verified_projects: 3,
            pending_projects: 0,
            verified_certifications: 3,
            coding_logs: daily_logs(20, 2),
        }
    }

    #[test]
    fn test_weights_sum_to_100() {
        assert!((MatchWeights::default().sum() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_saturated_profile_scores_100() {
        let result = compute_match(
            &JobRequirements::default(),
            &strong_student(),
            &MatchWeights::default(),
            today(),
        );
        assert_eq!(result.score, 100);
        assert!(result.eligible);
        assert!(result.skills_missing.is_empty());
    }

    #[test]
    fn test_empty_profile_scores_low_but_never_errors() {
        let job = JobRequirements {
            required_skills: skills(&["rust"]),
            ..Default::default()
        };
        let result = compute_match(
            &job,
            &StudentProfile::default(),
            &MatchWeights::default(),
            today(),
        );
        // Only the preferred-skills category (no requirements) earns points.
        assert_eq!(result.score, 10);
        assert_eq!(result.breakdown.required_skills, 0.0);
        assert_eq!(result.skills_missing, skills(&["rust"]));
    }

    #[test]
    fn test_skill_aliases_count_as_matches() {
        let job = JobRequirements {
            required_skills: skills(&["ReactJS", "Kubernetes"]),
            preferred_skills: skills(&["docker", "react"]),
            ..Default::default()
        };
        let mut student = strong_student();
        student.skills = skills(&["react", "K8s"]);
        let result = compute_match(&job, &student, &MatchWeights::default(), today());
        assert_eq!(result.breakdown.required_skills, 35.0);
        assert_eq!(result.breakdown.preferred_skills, 5.0);
        // "react" is listed twice across required/preferred but reported once.
        assert_eq!(result.skills_matched, skills(&["ReactJS", "Kubernetes"]));
        assert!(result.skills_missing.is_empty());
    }

    #[test]
    fn test_missing_required_skills_reported_in_job_order() {
        let job = JobRequirements {
            required_skills: skills(&["Go", "Rust", "SQL"]),
            ..Default::default()
        };
        let mut student = strong_student();
        student.skills = skills(&["rust"]);
        let result = compute_match(&job, &student, &MatchWeights::default(), today());
        assert_eq!(result.skills_missing, skills(&["Go", "SQL"]));
        assert!((result.breakdown.required_skills - 11.7).abs() < 1e-9);
    }

    #[test]
    fn test_cgpa_below_minimum_gets_half_scaled_credit_and_ineligible() {
        let job = JobRequirements {
            min_cgpa: 8.0,
            ..Default::default()
        };
        let mut student = strong_student();
        student.cgpa = 6.0;
        let result = compute_match(&job, &student, &MatchWeights::default(), today());
        // 10 * 0.5 * 6/8 = 3.75
        assert_eq!(result.breakdown.cgpa, 3.8);
        assert!(!result.eligible);
        assert_eq!(result.ineligibility_reasons.len(), 1);
        assert!(result.ineligibility_reasons[0].contains("CGPA"));
    }

    #[test]
    fn test_pending_projects_earn_half_credit() {
        let job = JobRequirements {
            min_projects: 2,
            ..Default::default()
        };
        let mut student = strong_student();
        student.verified_projects = 0;
        student.pending_projects = 2;
        let result = compute_match(&job, &student, &MatchWeights::default(), today());
        assert_eq!(result.breakdown.projects, 7.5);
        assert!(result.eligible);
    }

    #[test]
    fn test_growth_compares_consecutive_windows() {
        let mut logs = Vec::new();
        // recent window: 10 problems, previous window: 20 problems
        logs.push(CodingLog {
            date: today(),
            platform: "leetcode".to_string(),
            problems_solved: 10,
        });
        logs.push(CodingLog {
            date: today() - Duration::days(45),
            platform: "leetcode".to_string(),
            problems_solved: 20,
        });
        assert!((growth_ratio(&logs, today()) - 0.25).abs() < 1e-9);
        assert_eq!(growth_ratio(&[], today()), 0.0);
    }

    #[test]
    fn test_score_is_bounded() {
        let mut student = strong_student();
        student.readiness_score = 500;
        student.cgpa = 10.0;
        student.verified_projects = 50;
        student.verified_certifications = 50;
        let job = JobRequirements {
            min_readiness: 10,
            ..Default::default()
        };
        let result = compute_match(&job, &student, &MatchWeights::default(), today());
        assert!(result.score <= 100);
    }

    #[tokio::test]
    async fn test_weighted_scorer_trait_object() {
        let scorer: Box<dyn MatchScorer> = Box::new(WeightedMatchScorer::default());
        let result = scorer
            .score(&JobRequirements::default(), &StudentProfile::default())
            .await;
        assert!(result.score <= 100);
    }
}
