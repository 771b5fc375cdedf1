//! Identity verification requests.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tigube_core::{UserId, VerificationRequestId, VerificationRequestStatus};

/// A submitted verification request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationRequest {
    pub id: VerificationRequestId,
    pub user_id: UserId,
    #[serde(default)]
    pub document_urls: Option<Vec<String>>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub admin_comment: Option<String>,
    #[serde(default)]
    pub reviewed_by: Option<UserId>,
    #[serde(default)]
    pub reviewed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl VerificationRequest {
    /// Parsed status; unset rows are pending.
    #[must_use]
    pub fn status(&self) -> VerificationRequestStatus {
        self.status
            .as_deref()
            .and_then(|s| s.parse().ok())
            .unwrap_or(VerificationRequestStatus::Pending)
    }

    /// Uploaded documents.
    #[must_use]
    pub fn documents(&self) -> &[String] {
        self.document_urls.as_deref().unwrap_or_default()
    }

    /// Whether a decision is still outstanding.
    #[must_use]
    pub fn is_open(&self) -> bool {
        matches!(
            self.status(),
            VerificationRequestStatus::Pending | VerificationRequestStatus::InReview
        )
    }
}

/// Change set of a review decision.
#[derive(Debug, Clone, Serialize)]
pub struct ReviewDecision {
    pub status: VerificationRequestStatus,
    pub admin_comment: Option<String>,
    pub reviewed_by: UserId,
    pub reviewed_at: DateTime<Utc>,
}

/// Mirror of the decision on `users.verification_status`.
#[derive(Debug, Clone, Serialize)]
pub struct UserVerificationUpdate {
    pub verification_status: tigube_core::VerificationStatus,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let request: VerificationRequest = serde_json::from_value(json!({
            "id": "67e55044-10b1-426f-9247-bb680e5fe0c8",
            "user_id": "11111111-10b1-426f-9247-bb680e5fe0c8",
            "document_urls": null
        }))
        .unwrap();
        assert_eq!(request.status(), VerificationRequestStatus::Pending);
        assert!(request.documents().is_empty());
        assert!(request.is_open());
    }
}
