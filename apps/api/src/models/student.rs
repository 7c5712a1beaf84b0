use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use tracing::warn;
use uuid::Uuid;

/// Where a profile skill came from. GitHub and resume skills are re-derived on sync.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillSource {
    #[default]
    Manual,
    Github,
    Resume,
}

fn default_confidence() -> f64 {
    1.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentSkill {
    pub name: String,
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub source: SkillSource,
    #[serde(default = "default_confidence")]
    pub confidence: f64,
    #[serde(default)]
    pub verified: bool,
}

impl StudentSkill {
    pub fn manual(name: impl Into<String>, level: Option<String>) -> Self {
        Self {
            name: name.into(),
            level,
            source: SkillSource::Manual,
            confidence: 1.0,
            verified: false,
        }
    }
}

/// One day of problem-solving activity on a coding platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodingLog {
    pub date: NaiveDate,
    pub platform: String,
    pub problems_solved: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct StudentRow {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub branch: Option<String>,
    pub cgpa: Option<f64>,
    pub graduation_year: Option<i32>,
    pub skills: Value,
    pub readiness_score: i32,
    pub github_username: Option<String>,
    #[serde(skip_serializing, default)]
    pub github_token: Option<String>,
    pub github_stats: Option<Value>,
    pub last_github_sync: Option<DateTime<Utc>>,
    pub leetcode_username: Option<String>,
    pub leetcode_stats: Option<Value>,
    pub coding_logs: Value,
    pub resume_key: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StudentRow {
    /// Decodes the skills column. Malformed data yields an empty list rather than an error.
    pub fn skill_list(&self) -> Vec<StudentSkill> {
        decode_lenient(&self.skills, "skills", self.id)
    }

    /// Decodes the coding log column with the same leniency as `skill_list`.
    pub fn coding_log_list(&self) -> Vec<CodingLog> {
        decode_lenient(&self.coding_logs, "coding_logs", self.id)
    }

    pub fn github_activity_score(&self) -> u32 {
        self.github_stats
            .as_ref()
            .and_then(|s| s.get("activity_score"))
            .and_then(Value::as_u64)
            .map(|v| v.min(100) as u32)
            .unwrap_or(0)
    }

    pub fn leetcode_total_solved(&self) -> u32 {
        self.leetcode_stats
            .as_ref()
            .and_then(|s| s.get("total_solved"))
            .and_then(Value::as_u64)
            .map(|v| v.min(u64::from(u32::MAX)) as u32)
            .unwrap_or(0)
    }
}

fn decode_lenient<T: serde::de::DeserializeOwned>(value: &Value, field: &str, id: Uuid) -> Vec<T> {
    if value.is_null() {
        return Vec::new();
    }
    match serde_json::from_value::<Vec<T>>(value.clone()) {
        Ok(items) => items,
        Err(e) => {
            warn!("Student {id} has malformed {field}, treating as empty: {e}");
            Vec::new()
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use serde_json::json;

    pub fn student_row() -> StudentRow {
        StudentRow {
            id: Uuid::new_v4(),
            email: "asha@example.edu".to_string(),
            name: "Asha".to_string(),
            branch: Some("CSE".to_string()),
            cgpa: Some(8.2),
            graduation_year: Some(2026),
            skills: json!([]),
            readiness_score: 0,
            github_username: None,
            github_token: None,
            github_stats: None,
            last_github_sync: None,
            leetcode_username: None,
            leetcode_stats: None,
            coding_logs: json!([]),
            resume_key: None,
            status: "verified".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_skill_list_decodes_defaults() {
        let mut row = fixtures::student_row();
        row.skills = json!([
            { "name": "Rust" },
            { "name": "Go", "source": "github", "confidence": 0.8 }
        ]);
        let skills = row.skill_list();
        assert_eq!(skills.len(), 2);
        assert_eq!(skills[0].source, SkillSource::Manual);
        assert_eq!(skills[0].confidence, 1.0);
        assert_eq!(skills[1].source, SkillSource::Github);
    }

    #[test]
    fn test_malformed_skills_default_to_empty() {
        let mut row = fixtures::student_row();
        row.skills = json!({ "not": "a list" });
        assert!(row.skill_list().is_empty());

        row.skills = json!(["bare string instead of object"]);
        assert!(row.skill_list().is_empty());

        row.skills = Value::Null;
        assert!(row.skill_list().is_empty());
    }

    #[test]
    fn test_github_token_is_never_serialised() {
        let mut row = fixtures::student_row();
        row.github_token = Some("gho_secret".to_string());
        let out = serde_json::to_string(&row).unwrap();
        assert!(!out.contains("gho_secret"));
    }

    #[test]
    fn test_stat_accessors_read_json() {
        let mut row = fixtures::student_row();
        assert_eq!(row.github_activity_score(), 0);
        row.github_stats = Some(json!({ "activity_score": 64 }));
        row.leetcode_stats = Some(json!({ "total_solved": 150 }));
        assert_eq!(row.github_activity_score(), 64);
        assert_eq!(row.leetcode_total_solved(), 150);
    }
}
