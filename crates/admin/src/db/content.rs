//! Content moderation repository (reviews and support tickets).

use chrono::Utc;
use tracing::instrument;

use tigube_core::{ModerationAction, ModerationStatus, ReviewId, SupportTicketId, TicketStatus, UserId};

use super::RepositoryError;
use crate::models::content::{ModerationUpdate, Review, SupportTicket, TicketUpdate};
use crate::supabase::{Query, SupabaseClient};

/// Rows shown per moderation list.
pub const LIST_LIMIT: u64 = 50;

/// Repository for `reviews` and `support_tickets`.
pub struct ContentRepository<'a> {
    client: &'a SupabaseClient,
}

impl<'a> ContentRepository<'a> {
    /// Create a new content repository.
    #[must_use]
    pub const fn new(client: &'a SupabaseClient) -> Self {
        Self { client }
    }

    /// Reviews in `status`, newest first. Pending also covers rows that
    /// were never moderated.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Backend` if the query fails.
    #[instrument(skip(self))]
    pub async fn reviews(&self, status: ModerationStatus) -> Result<Vec<Review>, RepositoryError> {
        let query = Query::select("*");
        let query = if status == ModerationStatus::Pending {
            query.or("moderation_status.eq.pending,moderation_status.is.null")
        } else {
            query.eq("moderation_status", status)
        };
        let query = query.order("created_at", false).limit(LIST_LIMIT);
        Ok(self.client.select("reviews", &query).await?)
    }

    /// Apply a moderation decision to a review.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no review has this ID.
    #[instrument(skip(self))]
    pub async fn moderate(
        &self,
        id: ReviewId,
        action: ModerationAction,
        by: UserId,
    ) -> Result<(), RepositoryError> {
        let change = ModerationUpdate {
            moderation_status: action.resulting_status(),
            moderated_at: Utc::now(),
            moderated_by: by,
        };
        let updated: Vec<serde_json::Value> = self
            .client
            .update("reviews", &Query::new().eq("id", id), &change)
            .await?;
        if updated.is_empty() {
            return Err(RepositoryError::NotFound);
        }
        tracing::info!(review_id = %id, action = %action, "Review moderated");
        Ok(())
    }

    /// Support tickets, optionally restricted to `status`, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Backend` if the query fails.
    #[instrument(skip(self))]
    pub async fn tickets(&self, status: Option<TicketStatus>) -> Result<Vec<SupportTicket>, RepositoryError> {
        let mut query = Query::select("*");
        if let Some(status) = status {
            query = query.eq("status", status);
        }
        let query = query.order("created_at", false).limit(LIST_LIMIT);
        Ok(self.client.select("support_tickets", &query).await?)
    }

    /// Move a ticket to `status`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no ticket has this ID.
    #[instrument(skip(self))]
    pub async fn set_ticket_status(
        &self,
        id: SupportTicketId,
        status: TicketStatus,
    ) -> Result<(), RepositoryError> {
        let change = TicketUpdate {
            status,
            updated_at: Utc::now(),
        };
        let updated: Vec<serde_json::Value> = self
            .client
            .update("support_tickets", &Query::new().eq("id", id), &change)
            .await?;
        if updated.is_empty() {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
