//! Activity series for the analytics page.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::instrument;

use super::RepositoryError;
use crate::models::analytics::{AnalyticsOverview, TOP_FEATURES, Timeframe, daily_buckets};
use crate::supabase::{Query, SupabaseClient};

/// Rows fetched per request; a 90-day window of messages spans many batches.
const BATCH: u64 = 1000;

#[derive(Deserialize)]
struct CreatedAt {
    created_at: DateTime<Utc>,
}

/// Repository for per-day activity.
pub struct AnalyticsRepository<'a> {
    client: &'a SupabaseClient,
}

impl<'a> AnalyticsRepository<'a> {
    /// Create a new analytics repository.
    #[must_use]
    pub const fn new(client: &'a SupabaseClient) -> Self {
        Self { client }
    }

    /// Sign-ups and messages per day over `timeframe`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Backend` if either query fails.
    #[instrument(skip(self))]
    pub async fn overview(&self, timeframe: Timeframe) -> Result<AnalyticsOverview, RepositoryError> {
        let now = Utc::now();
        let start = timeframe.start(now).to_rfc3339();

        let (signups, messages) = tokio::try_join!(
            self.timestamps("users", &start),
            self.timestamps("messages", &start),
        )?;

        Ok(AnalyticsOverview {
            timeframe,
            user_growth: daily_buckets(&signups, timeframe.days(), now),
            message_activity: daily_buckets(&messages, timeframe.days(), now),
            top_features: TOP_FEATURES.to_vec(),
        })
    }

    async fn timestamps(&self, table: &str, start: &str) -> Result<Vec<DateTime<Utc>>, RepositoryError> {
        let query = Query::select("created_at")
            .gte("created_at", start)
            .order("created_at", true)
            .order("id", true);
        let rows: Vec<CreatedAt> = self.client.select_all(table, &query, BATCH).await?;
        Ok(rows.into_iter().map(|r| r.created_at).collect())
    }
}
