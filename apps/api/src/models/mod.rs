pub mod engagement;
pub mod job;
pub mod student;
pub mod submission;

use serde::{Deserialize, Serialize};

/// Admin review state shared by students, projects and certifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    Pending,
    Verified,
    Rejected,
}

impl ReviewStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewStatus::Pending => "pending",
            ReviewStatus::Verified => "verified",
            ReviewStatus::Rejected => "rejected",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "pending" => Some(ReviewStatus::Pending),
            "verified" => Some(ReviewStatus::Verified),
            "rejected" => Some(ReviewStatus::Rejected),
            _ => None,
        }
    }

    /// Only pending submissions can be reviewed; a decision is final.
    pub fn can_transition_to(&self, next: ReviewStatus) -> bool {
        matches!(
            (self, next),
            (ReviewStatus::Pending, ReviewStatus::Verified)
                | (ReviewStatus::Pending, ReviewStatus::Rejected)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_review_status_round_trips_through_str() {
        for status in [
            ReviewStatus::Pending,
            ReviewStatus::Verified,
            ReviewStatus::Rejected,
        ] {
            assert_eq!(ReviewStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(ReviewStatus::parse("approved"), None);
    }

    #[test]
    fn test_only_pending_can_be_reviewed() {
        assert!(ReviewStatus::Pending.can_transition_to(ReviewStatus::Verified));
        assert!(ReviewStatus::Pending.can_transition_to(ReviewStatus::Rejected));
        assert!(!ReviewStatus::Verified.can_transition_to(ReviewStatus::Rejected));
        assert!(!ReviewStatus::Rejected.can_transition_to(ReviewStatus::Verified));
        assert!(!ReviewStatus::Pending.can_transition_to(ReviewStatus::Pending));
    }
}
