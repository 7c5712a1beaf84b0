//! Review decisions on student submissions.

use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::engagement::NotificationRow;
use crate::models::student::StudentRow;
use crate::models::submission::{CertificationRow, ProjectRow};
use crate::models::ReviewStatus;

#[derive(Debug, Clone, Deserialize)]
pub struct ReviewRequest {
    pub status: String,
    #[serde(default)]
    pub note: Option<String>,
}

impl ReviewRequest {
    /// Only final decisions are accepted.
    pub fn decision(&self) -> Result<ReviewStatus, AppError> {
        match ReviewStatus::parse(self.status.trim()) {
            Some(status @ (ReviewStatus::Verified | ReviewStatus::Rejected)) => Ok(status),
            _ => Err(AppError::Validation(format!(
                "status must be 'verified' or 'rejected', got '{}'",
                self.status
            ))),
        }
    }

    pub fn note(&self) -> Option<&str> {
        self.note.as_deref().map(str::trim).filter(|n| !n.is_empty())
    }
}

/// 409 unless `current` is pending. Unknown stored values are treated as final.
pub fn ensure_transition(current: &str, next: ReviewStatus) -> Result<(), AppError> {
    let allowed = ReviewStatus::parse(current).is_some_and(|c| c.can_transition_to(next));
    if allowed {
        Ok(())
    } else {
        Err(AppError::Conflict(format!(
            "Cannot move a {current} submission to {}",
            next.as_str()
        )))
    }
}

#[derive(Debug, Serialize)]
pub struct PendingSubmissions {
    pub students: Vec<StudentRow>,
    pub projects: Vec<ProjectRow>,
    pub certifications: Vec<CertificationRow>,
}

#[derive(Debug, Serialize)]
pub struct ReviewOutcome<T> {
    pub item: T,
    pub notification: NotificationRow,
}
