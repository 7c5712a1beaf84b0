//! In-app notifications. Written on admin review; delivery beyond the list endpoint
//! is handled by the frontend.

use anyhow::Result;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::models::engagement::NotificationRow;
use crate::models::ReviewStatus;

pub async fn notify<'e, E>(
    executor: E,
    student_id: Uuid,
    kind: &str,
    message: &str,
) -> Result<NotificationRow>
where
    E: Executor<'e, Database = Postgres>,
{
    Ok(sqlx::query_as::<_, NotificationRow>(
        r#"
        INSERT INTO notifications (id, student_id, kind, message)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(student_id)
    .bind(kind)
    .bind(message)
    .fetch_one(executor)
    .await?)
}

/// Kind and message for a review decision on a named item.
pub fn review_message(
    item_kind: &str,
    item_name: &str,
    status: ReviewStatus,
    note: Option<&str>,
) -> (String, String) {
    let verb = match status {
        ReviewStatus::Verified => "verified",
        ReviewStatus::Rejected => "rejected",
        ReviewStatus::Pending => "returned to pending",
    };
    let mut message = format!("Your {item_kind} \"{item_name}\" was {verb}.");
    if let Some(note) = note.map(str::trim).filter(|n| !n.is_empty()) {
        message.push_str(&format!(" Note: {note}"));
    }
    (format!("{item_kind}_{}", status.as_str()), message)
}

pub async fn list_notifications(pool: &PgPool, student_id: Uuid) -> Result<Vec<NotificationRow>> {
    Ok(sqlx::query_as::<_, NotificationRow>(
        "SELECT * FROM notifications WHERE student_id = $1 ORDER BY created_at DESC LIMIT 100",
    )
    .bind(student_id)
    .fetch_all(pool)
    .await?)
}

/// `None` when the notification does not exist or belongs to someone else.
pub async fn mark_read(
    pool: &PgPool,
    student_id: Uuid,
    id: Uuid,
) -> Result<Option<NotificationRow>> {
    Ok(sqlx::query_as::<_, NotificationRow>(
        "UPDATE notifications SET read = TRUE WHERE id = $1 AND student_id = $2 RETURNING *",
    )
    .bind(id)
    .bind(student_id)
    .fetch_optional(pool)
    .await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_review_message_includes_note() {
        let (kind, message) = review_message(
            "project",
            "Chat App",
            ReviewStatus::Rejected,
            Some(" Repository is private "),
        );
        assert_eq!(kind, "project_rejected");
        assert_eq!(
            message,
            "Your project \"Chat App\" was rejected. Note: Repository is private"
        );
    }

    #[test]
    fn test_review_message_skips_blank_note() {
        let (kind, message) =
            review_message("certification", "AWS CCP", ReviewStatus::Verified, Some("  "));
        assert_eq!(kind, "certification_verified");
        assert_eq!(message, "Your certification \"AWS CCP\" was verified.");
    }
}
