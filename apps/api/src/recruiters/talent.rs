//! Talent search over verified students and job posting validation.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::student::StudentRow;
use crate::skills::{normalize_skill, normalize_skill_set};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TalentQuery {
    /// Comma-separated; every listed skill must be on the profile.
    pub skills: Option<String>,
    pub min_cgpa: Option<f64>,
}

impl TalentQuery {
    pub fn skill_list(&self) -> Vec<String> {
        self.skills
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(normalize_skill)
            .filter(|s| !s.is_empty())
            .collect()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TalentEntry {
    pub student_id: Uuid,
    pub name: String,
    pub branch: Option<String>,
    pub cgpa: Option<f64>,
    pub graduation_year: Option<i32>,
    pub readiness_score: i32,
    pub github_activity_score: u32,
    pub skills: Vec<String>,
}

/// Students holding every wanted skill and meeting the CGPA floor, best readiness first.
pub fn search_talent(students: &[StudentRow], query: &TalentQuery) -> Vec<TalentEntry> {
    let wanted = query.skill_list();
    let min_cgpa = query.min_cgpa.unwrap_or(0.0);

    let mut entries: Vec<TalentEntry> = students
        .iter()
        .filter(|s| min_cgpa <= 0.0 || s.cgpa.is_some_and(|c| c >= min_cgpa))
        .filter_map(|s| {
            let names: Vec<String> = s.skill_list().into_iter().map(|k| k.name).collect();
            let have = normalize_skill_set(&names);
            if !wanted.iter().all(|w| have.contains(w)) {
                return None;
            }
            Some(TalentEntry {
                student_id: s.id,
                name: s.name.clone(),
                branch: s.branch.clone(),
                cgpa: s.cgpa,
                graduation_year: s.graduation_year,
                readiness_score: s.readiness_score,
                github_activity_score: s.github_activity_score(),
                skills: names,
            })
        })
        .collect();

    entries.sort_by(|a, b| {
        b.readiness_score
            .cmp(&a.readiness_score)
            .then_with(|| a.student_id.cmp(&b.student_id))
    });
    entries
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateJobRequest {
    pub title: String,
    /// Defaults to the recruiter's company.
    pub company: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub required_skills: Vec<String>,
    #[serde(default)]
    pub preferred_skills: Vec<String>,
    #[serde(default)]
    pub min_cgpa: f64,
    #[serde(default)]
    pub min_readiness: i32,
    #[serde(default)]
    pub min_projects: i32,
}

impl CreateJobRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("title cannot be empty".to_string());
        }
        if !(0.0..=10.0).contains(&self.min_cgpa) {
            return Err("min_cgpa must be between 0 and 10".to_string());
        }
        if !(0..=100).contains(&self.min_readiness) {
            return Err("min_readiness must be between 0 and 100".to_string());
        }
        if self.min_projects < 0 {
            return Err("min_projects cannot be negative".to_string());
        }
        Ok(())
    }
}

/// Trims and drops empty or duplicate (by normalised name) skills, keeping first spelling.
pub fn clean_skills(raw: &[String]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    raw.iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .filter(|s| seen.insert(normalize_skill(s)))
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateJobStatusRequest {
    pub status: String,
}

impl UpdateJobStatusRequest {
    pub fn parsed(&self) -> Result<&'static str, String> {
        match self.status.trim() {
            "open" => Ok("open"),
            "closed" => Ok("closed"),
            other => Err(format!("status must be 'open' or 'closed', got '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    use crate::models::student::fixtures::student_row;

    fn student(id: u128, cgpa: Option<f64>, readiness: i32, skills: &[&str]) -> StudentRow {
        let mut row = student_row();
        row.id = Uuid::from_u128(id);
        row.cgpa = cgpa;
        row.readiness_score = readiness;
        row.skills = json!(skills.iter().map(|s| json!({ "name": s })).collect::<Vec<_>>());
        row
    }

    #[test]
    fn test_talent_requires_all_skills_via_aliases() {
        let students = vec![
            student(1, Some(8.0), 50, &["ReactJS", "Node"]),
            student(2, Some(9.0), 80, &["react"]),
        ];
        let query = TalentQuery {
            skills: Some("react, nodejs".to_string()),
            min_cgpa: None,
        };
        let found = search_talent(&students, &query);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].student_id, Uuid::from_u128(1));
    }

    #[test]
    fn test_talent_applies_cgpa_floor_and_sorts() {
        let students = vec![
            student(1, Some(7.5), 40, &[]),
            student(2, None, 90, &[]),
            student(3, Some(6.9), 99, &[]),
            student(4, Some(8.1), 70, &[]),
        ];
        let query = TalentQuery {
            skills: None,
            min_cgpa: Some(7.0),
        };
        let ids: Vec<u128> = search_talent(&students, &query)
            .iter()
            .map(|e| e.student_id.as_u128())
            .collect();
        assert_eq!(ids, vec![4, 1]);
    }

    #[test]
    fn test_empty_skill_param_matches_everyone() {
        let query = TalentQuery {
            skills: Some(" , ".to_string()),
            min_cgpa: None,
        };
        assert!(query.skill_list().is_empty());
    }

    #[test]
    fn test_clean_skills_dedupes_aliases() {
        let raw = vec![
            "React".to_string(),
            " reactjs ".to_string(),
            "".to_string(),
            "Go".to_string(),
        ];
        assert_eq!(clean_skills(&raw), vec!["React".to_string(), "Go".to_string()]);
    }

    #[test]
    fn test_job_request_validation() {
        let mut req = CreateJobRequest {
            title: "SDE Intern".to_string(),
            company: None,
            description: String::new(),
            required_skills: vec![],
            preferred_skills: vec![],
            min_cgpa: 7.0,
            min_readiness: 50,
            min_projects: 1,
        };
        assert!(req.validate().is_ok());
        req.min_readiness = 120;
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_status_request_parsing() {
        let req = UpdateJobStatusRequest {
            status: "closed".to_string(),
        };
        assert_eq!(req.parsed().unwrap(), "closed");
        let bad = UpdateJobStatusRequest {
            status: "archived".to_string(),
        };
        assert!(bad.parsed().is_err());
    }
}
