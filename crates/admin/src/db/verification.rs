//! Verification request repository.

use chrono::Utc;
use tracing::instrument;

use tigube_core::{UserId, VerificationRequestId, VerificationRequestStatus, VerificationStatus};

use super::RepositoryError;
use crate::models::verification::{ReviewDecision, UserVerificationUpdate, VerificationRequest};
use crate::supabase::{Query, SupabaseClient};

const TABLE: &str = "verification_requests";

/// Rows shown per list.
pub const LIST_LIMIT: u64 = 50;

/// Repository for `verification_requests`.
pub struct VerificationRepository<'a> {
    client: &'a SupabaseClient,
}

impl<'a> VerificationRepository<'a> {
    /// Create a new verification repository.
    #[must_use]
    pub const fn new(client: &'a SupabaseClient) -> Self {
        Self { client }
    }

    /// Requests, optionally restricted to `status`, oldest first so the
    /// queue is worked in submission order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Backend` if the query fails.
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        status: Option<VerificationRequestStatus>,
    ) -> Result<Vec<VerificationRequest>, RepositoryError> {
        let mut query = Query::select("*");
        if let Some(status) = status {
            query = query.eq("status", status);
        }
        let query = query.order("created_at", true).limit(LIST_LIMIT);
        Ok(self.client.select(TABLE, &query).await?)
    }

    /// Approve a request and mark the user as verified.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no request has this ID.
    #[instrument(skip(self))]
    pub async fn approve(&self, id: VerificationRequestId, by: UserId) -> Result<(), RepositoryError> {
        let request = self
            .decide(id, VerificationRequestStatus::Approved, None, by)
            .await?;
        self.mirror_on_user(request.user_id, VerificationStatus::Approved)
            .await
    }

    /// Reject a request with an optional comment.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no request has this ID.
    #[instrument(skip(self, comment))]
    pub async fn reject(
        &self,
        id: VerificationRequestId,
        comment: Option<String>,
        by: UserId,
    ) -> Result<(), RepositoryError> {
        let request = self
            .decide(id, VerificationRequestStatus::Rejected, comment, by)
            .await?;
        self.mirror_on_user(request.user_id, VerificationStatus::Rejected)
            .await
    }

    async fn decide(
        &self,
        id: VerificationRequestId,
        status: VerificationRequestStatus,
        comment: Option<String>,
        by: UserId,
    ) -> Result<VerificationRequest, RepositoryError> {
        let decision = ReviewDecision {
            status,
            admin_comment: comment.filter(|c| !c.trim().is_empty()),
            reviewed_by: by,
            reviewed_at: Utc::now(),
        };
        let updated: Vec<VerificationRequest> = self
            .client
            .update(TABLE, &Query::new().eq("id", id), &decision)
            .await?;
        let request = updated.into_iter().next().ok_or(RepositoryError::NotFound)?;
        tracing::info!(request_id = %id, status = %status, "Verification request decided");
        Ok(request)
    }

    async fn mirror_on_user(
        &self,
        user_id: UserId,
        status: VerificationStatus,
    ) -> Result<(), RepositoryError> {
        let change = UserVerificationUpdate {
            verification_status: status,
            updated_at: Utc::now(),
        };
        let _: Vec<serde_json::Value> = self
            .client
            .update("users", &Query::new().eq("id", user_id), &change)
            .await?;
        Ok(())
    }
}
