//! Reviews and support tickets under moderation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tigube_core::{ModerationStatus, ReviewId, SupportTicketId, TicketStatus, UserId};

/// A user review awaiting or past moderation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub id: ReviewId,
    #[serde(default)]
    pub user_id: Option<UserId>,
    #[serde(default)]
    pub caretaker_id: Option<UserId>,
    #[serde(default)]
    pub rating: Option<i32>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub moderation_status: Option<String>,
    #[serde(default)]
    pub moderated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Review {
    /// Parsed moderation status; unset rows count as pending.
    #[must_use]
    pub fn status(&self) -> ModerationStatus {
        self.moderation_status
            .as_deref()
            .and_then(|s| s.parse().ok())
            .unwrap_or(ModerationStatus::Pending)
    }

    /// Rating rendered as stars.
    #[must_use]
    pub fn stars(&self) -> String {
        let rating = self.rating.unwrap_or(0).clamp(0, 5);
        let filled = usize::try_from(rating).unwrap_or(0);
        format!("{}{}", "★".repeat(filled), "☆".repeat(5 - filled))
    }
}

/// Change set of a moderation decision.
#[derive(Debug, Clone, Serialize)]
pub struct ModerationUpdate {
    pub moderation_status: ModerationStatus,
    pub moderated_at: DateTime<Utc>,
    pub moderated_by: UserId,
}

/// A support request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupportTicket {
    pub id: SupportTicketId,
    #[serde(default)]
    pub user_id: Option<UserId>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl SupportTicket {
    /// Parsed status; unset rows count as open.
    #[must_use]
    pub fn status(&self) -> TicketStatus {
        self.status
            .as_deref()
            .and_then(|s| s.parse().ok())
            .unwrap_or(TicketStatus::Open)
    }

    /// Priority label, `normal` when unset.
    #[must_use]
    pub fn priority_label(&self) -> &str {
        self.priority.as_deref().unwrap_or("normal")
    }
}

/// Change set of a ticket status update.
#[derive(Debug, Clone, Serialize)]
pub struct TicketUpdate {
    pub status: TicketStatus,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_review_defaults() {
        let review: Review = serde_json::from_value(json!({
            "id": "67e55044-10b1-426f-9247-bb680e5fe0c8",
            "rating": 4
        }))
        .unwrap();
        assert_eq!(review.status(), ModerationStatus::Pending);
        assert_eq!(review.stars(), "★★★★☆");
    }

    #[test]
    fn test_ticket_defaults() {
        let ticket: SupportTicket = serde_json::from_value(json!({
            "id": "67e55044-10b1-426f-9247-bb680e5fe0c8",
            "status": "in_progress"
        }))
        .unwrap();
        assert_eq!(ticket.status(), TicketStatus::InProgress);
        assert_eq!(ticket.priority_label(), "normal");
    }

    #[test]
    fn test_moderation_update_payload() {
        let update = ModerationUpdate {
            moderation_status: tigube_core::ModerationAction::Flag.resulting_status(),
            moderated_at: Utc::now(),
            moderated_by: UserId::random(),
        };
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json["moderation_status"], "flagged");
    }
}
