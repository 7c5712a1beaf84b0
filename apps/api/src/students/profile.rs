//! Request validation and skill-list edits for the student profile endpoints.

use chrono::NaiveDate;
use serde::Deserialize;

use crate::models::student::{SkillSource, StudentSkill};
use crate::models::submission::NewProject;
use crate::skills::normalize_skill;

pub const RESUME_SKILL_CONFIDENCE: f64 = 0.6;
const MAX_SKILLS: usize = 100;

#[derive(Debug, Clone, Deserialize)]
pub struct SkillInput {
    pub name: String,
    #[serde(default)]
    pub level: Option<String>,
}

/// Partial update: absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub branch: Option<String>,
    pub cgpa: Option<f64>,
    pub graduation_year: Option<i32>,
    /// Replaces the manual skills; GitHub and resume skills are kept.
    pub skills: Option<Vec<SkillInput>>,
    pub github_username: Option<String>,
    pub github_token: Option<String>,
    pub leetcode_username: Option<String>,
}

impl UpdateProfileRequest {
    pub fn validate(&self) -> Result<(), String> {
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err("name cannot be empty".to_string());
            }
        }
        if let Some(cgpa) = self.cgpa {
            if !(0.0..=10.0).contains(&cgpa) || cgpa.is_nan() {
                return Err("cgpa must be between 0 and 10".to_string());
            }
        }
        if let Some(year) = self.graduation_year {
            if !(2000..=2100).contains(&year) {
                return Err("graduation_year is out of range".to_string());
            }
        }
        if let Some(skills) = &self.skills {
            if skills.len() > MAX_SKILLS {
                return Err(format!("at most {MAX_SKILLS} skills are allowed"));
            }
            if skills.iter().any(|s| s.name.trim().is_empty()) {
                return Err("skill names cannot be empty".to_string());
            }
        }
        Ok(())
    }
}

/// Replaces the manual skills with `inputs`, deduplicated by normalised name.
/// Derived skills survive unless a manual entry now covers them.
pub fn apply_manual_skills(existing: &[StudentSkill], inputs: &[SkillInput]) -> Vec<StudentSkill> {
    let mut merged: Vec<StudentSkill> = Vec::with_capacity(inputs.len() + existing.len());
    for input in inputs {
        let key = normalize_skill(&input.name);
        if merged.iter().any(|s| normalize_skill(&s.name) == key) {
            continue;
        }
        merged.push(StudentSkill::manual(input.name.trim(), input.level.clone()));
    }
    for skill in existing.iter().filter(|s| s.source != SkillSource::Manual) {
        let key = normalize_skill(&skill.name);
        if !merged.iter().any(|s| normalize_skill(&s.name) == key) {
            merged.push(skill.clone());
        }
    }
    merged
}

/// Adds resume-detected skills not already on the profile under any source.
pub fn merge_resume_skills(
    existing: &[StudentSkill],
    detected: &[String],
) -> (Vec<StudentSkill>, usize) {
    let mut merged = existing.to_vec();
    let mut added = 0;
    for name in detected {
        let key = normalize_skill(name);
        if key.is_empty() || merged.iter().any(|s| normalize_skill(&s.name) == key) {
            continue;
        }
        merged.push(StudentSkill {
            name: key,
            level: None,
            source: SkillSource::Resume,
            confidence: RESUME_SKILL_CONFIDENCE,
            verified: false,
        });
        added += 1;
    }
    (merged, added)
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateProjectRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tech_stack: Vec<String>,
    pub github_link: Option<String>,
    pub live_link: Option<String>,
}

impl CreateProjectRequest {
    pub fn into_new_project(self) -> Result<NewProject, String> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err("title cannot be empty".to_string());
        }
        for link in [&self.github_link, &self.live_link].into_iter().flatten() {
            if !is_http_url(link) {
                return Err(format!("'{link}' is not an http(s) URL"));
            }
        }
        Ok(NewProject {
            title: title.to_string(),
            description: self.description.trim().to_string(),
            tech_stack: self
                .tech_stack
                .iter()
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect(),
            github_link: self.github_link,
            live_link: self.live_link,
            source: "manual".to_string(),
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateCertificationRequest {
    pub name: String,
    pub issuer: String,
    pub issued_on: Option<NaiveDate>,
    pub credential_url: Option<String>,
}

impl CreateCertificationRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("name cannot be empty".to_string());
        }
        if self.issuer.trim().is_empty() {
            return Err("issuer cannot be empty".to_string());
        }
        if let Some(url) = &self.credential_url {
            if !is_http_url(url) {
                return Err(format!("'{url}' is not an http(s) URL"));
            }
        }
        Ok(())
    }
}

fn is_http_url(raw: &str) -> bool {
    let raw = raw.trim();
    raw.starts_with("https://") || raw.starts_with("http://")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(name: &str) -> SkillInput {
        SkillInput {
            name: name.to_string(),
            level: None,
        }
    }

    fn derived(name: &str, source: SkillSource) -> StudentSkill {
        StudentSkill {
            name: name.to_string(),
            level: None,
            source,
            confidence: 0.8,
            verified: false,
        }
    }

    #[test]
    fn test_update_validation() {
        let ok = UpdateProfileRequest {
            cgpa: Some(9.1),
            graduation_year: Some(2026),
            ..Default::default()
        };
        assert!(ok.validate().is_ok());

        let bad_cgpa = UpdateProfileRequest {
            cgpa: Some(10.5),
            ..Default::default()
        };
        assert!(bad_cgpa.validate().is_err());

        let blank_skill = UpdateProfileRequest {
            skills: Some(vec![input(" ")]),
            ..Default::default()
        };
        assert!(blank_skill.validate().is_err());
    }

    #[test]
    fn test_apply_manual_skills_keeps_derived_and_dedupes() {
        let existing = vec![
            StudentSkill::manual("PHP", None),
            derived("go", SkillSource::Github),
            derived("docker", SkillSource::Resume),
        ];
        let merged = apply_manual_skills(
            &existing,
            &[input("Golang"), input("React"), input("reactjs")],
        );
        let names: Vec<&str> = merged.iter().map(|s| s.name.as_str()).collect();
        // Golang covers the GitHub "go"; PHP was a manual skill and is dropped.
        assert_eq!(names, vec!["Golang", "React", "docker"]);
    }

    #[test]
    fn test_merge_resume_skills_adds_only_new() {
        let existing = vec![StudentSkill::manual("Python", None)];
        let detected = vec!["python".to_string(), "docker".to_string()];
        let (merged, added) = merge_resume_skills(&existing, &detected);
        assert_eq!(added, 1);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[1].source, SkillSource::Resume);
        assert_eq!(merged[1].confidence, RESUME_SKILL_CONFIDENCE);
    }

    #[test]
    fn test_project_request_validation() {
        let req = CreateProjectRequest {
            title: " Chat App ".to_string(),
            description: String::new(),
            tech_stack: vec!["Rust".to_string(), "".to_string()],
            github_link: Some("https://github.com/asha/chat".to_string()),
            live_link: None,
        };
        let project = req.into_new_project().unwrap();
        assert_eq!(project.title, "Chat App");
        assert_eq!(project.tech_stack, vec!["Rust".to_string()]);
        assert_eq!(project.source, "manual");

        let bad_link = CreateProjectRequest {
            title: "x".to_string(),
            description: String::new(),
            tech_stack: vec![],
            github_link: Some("javascript:alert(1)".to_string()),
            live_link: None,
        };
        assert!(bad_link.into_new_project().is_err());
    }

    #[test]
    fn test_certification_request_validation() {
        let req = CreateCertificationRequest {
            name: "AWS CCP".to_string(),
            issuer: " ".to_string(),
            issued_on: None,
            credential_url: None,
        };
        assert_eq!(req.validate().unwrap_err(), "issuer cannot be empty");
    }
}
