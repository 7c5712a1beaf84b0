//! Readiness score: a 0–100 composite of profile completeness, skills, submissions,
//! coding practice and GitHub activity.

use chrono::NaiveDate;

use crate::activity::active_days;
use crate::matching::scorer::count_status;
use crate::models::student::StudentRow;
use crate::models::submission::{CertificationRow, ProjectRow};
use crate::models::ReviewStatus;

const PROFILE_POINTS: f64 = 15.0;
const SKILL_POINTS: f64 = 20.0;
const PROJECT_POINTS: f64 = 20.0;
const CERTIFICATION_POINTS: f64 = 10.0;
const CODING_VOLUME_POINTS: f64 = 10.0;
const CODING_STREAK_POINTS: f64 = 10.0;
const GITHUB_POINTS: f64 = 15.0;

const SKILL_TARGET: f64 = 8.0;
const PROJECT_TARGET: f64 = 4.0;
const CERTIFICATION_TARGET: f64 = 2.0;
const SOLVED_TARGET: f64 = 200.0;
const ACTIVE_DAYS_TARGET: f64 = 15.0;

pub fn compute_readiness(
    student: &StudentRow,
    projects: &[ProjectRow],
    certifications: &[CertificationRow],
    today: NaiveDate,
) -> u32 {
    let profile_fields = [
        !student.name.trim().is_empty(),
        student.branch.as_deref().is_some_and(|b| !b.trim().is_empty()),
        student.cgpa.is_some(),
        student.graduation_year.is_some(),
        student.github_username.is_some(),
        student.leetcode_username.is_some(),
        student.resume_key.is_some(),
    ];
    let filled = profile_fields.iter().filter(|f| **f).count() as f64;
    let profile = PROFILE_POINTS * filled / profile_fields.len() as f64;

    let skills = SKILL_POINTS * (student.skill_list().len() as f64 / SKILL_TARGET).min(1.0);

    let project_credit = f64::from(count_status(
        projects.iter().map(|p| p.status.as_str()),
        ReviewStatus::Verified,
    )) + 0.5
        * f64::from(count_status(
            projects.iter().map(|p| p.status.as_str()),
            ReviewStatus::Pending,
        ));
    let project_points = PROJECT_POINTS * project_credit.min(PROJECT_TARGET) / PROJECT_TARGET;

    let verified_certs = f64::from(count_status(
        certifications.iter().map(|c| c.status.as_str()),
        ReviewStatus::Verified,
    ));
    let cert_points = CERTIFICATION_POINTS * (verified_certs / CERTIFICATION_TARGET).min(1.0);

    let logs = student.coding_log_list();
    let total_solved = match student.leetcode_total_solved() {
        0 => logs.iter().map(|l| f64::from(l.problems_solved)).sum(),
        n => f64::from(n),
    };
    let coding = CODING_VOLUME_POINTS * (total_solved / SOLVED_TARGET).min(1.0)
        + CODING_STREAK_POINTS
            * (active_days(&logs, today, 30) as f64 / ACTIVE_DAYS_TARGET).min(1.0);

    let github = GITHUB_POINTS * f64::from(student.github_activity_score()) / 100.0;

    (profile + skills + project_points + cert_points + coding + github)
        .round()
        .clamp(0.0, 100.0) as u32
}
