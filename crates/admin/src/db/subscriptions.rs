//! Subscription repository and plan synchronisation.
//!
//! Compares the billing rows in `subscriptions` with the plan columns on
//! `users` and, unless running dry, rewrites drifted users.

use std::collections::HashMap;

use chrono::Utc;
use tracing::instrument;

use tigube_core::UserId;

use super::RepositoryError;
use crate::models::subscription::{
    PlanDrift, PlanUpdate, SubscriptionRow, SyncReport, USER_PLAN_COLUMNS, UserPlan,
};
use crate::supabase::{Query, SupabaseClient};

/// Rows fetched per request when walking `users` and `subscriptions`.
const BATCH: u64 = 1000;

/// Repository for `subscriptions` and the plan columns of `users`.
pub struct SubscriptionRepository<'a> {
    client: &'a SupabaseClient,
}

impl<'a> SubscriptionRepository<'a> {
    /// Create a new subscription repository.
    #[must_use]
    pub const fn new(client: &'a SupabaseClient) -> Self {
        Self { client }
    }

    /// Plan columns of every user, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Backend` if any batch fails.
    #[instrument(skip(self))]
    pub async fn overview(&self) -> Result<Vec<UserPlan>, RepositoryError> {
        let query = Query::select(USER_PLAN_COLUMNS)
            .order("created_at", false)
            .order("id", true);
        Ok(self.client.select_all("users", &query, BATCH).await?)
    }

    /// All billing rows, latest per user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Backend` if any batch fails.
    #[instrument(skip(self))]
    pub async fn subscriptions(&self) -> Result<HashMap<UserId, SubscriptionRow>, RepositoryError> {
        let query = Query::select("user_id, status, plan_type, current_period_end, stripe_subscription_id")
            .order("created_at", true)
            .order("id", true);
        let rows: Vec<SubscriptionRow> =
            self.client.select_all("subscriptions", &query, BATCH).await?;
        // Ascending order: later rows overwrite earlier ones.
        Ok(rows.into_iter().map(|row| (row.user_id, row)).collect())
    }

    /// Users whose plan columns disagree with their subscription.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Backend` if either table cannot be read.
    #[instrument(skip(self))]
    pub async fn plan_drift(&self) -> Result<(usize, Vec<PlanDrift>), RepositoryError> {
        let (users, subscriptions) = tokio::try_join!(self.overview(), self.subscriptions())?;
        let drifts = detect_drifts(&users, &subscriptions);
        Ok((users.len(), drifts))
    }

    /// Bring drifted users in line with their subscription.
    ///
    /// A dry run only reports. Failed updates are logged and counted; they
    /// do not abort the run.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Backend` if the comparison data cannot be read.
    #[instrument(skip(self))]
    pub async fn sync(&self, dry_run: bool) -> Result<SyncReport, RepositoryError> {
        let (checked, drifts) = self.plan_drift().await?;
        let mut report = SyncReport {
            dry_run,
            checked,
            drifted: drifts.len(),
            ..SyncReport::default()
        };

        if !dry_run {
            for drift in &drifts {
                let update = PlanUpdate {
                    desired: &drift.desired,
                    updated_at: Utc::now(),
                };
                let result: Result<Vec<serde_json::Value>, _> = self
                    .client
                    .update("users", &Query::new().eq("id", drift.user.id), &update)
                    .await;
                match result {
                    Ok(rows) if !rows.is_empty() => report.updated += 1,
                    Ok(_) => {
                        tracing::warn!(user_id = %drift.user.id, "User vanished during plan sync");
                        report.failed += 1;
                    }
                    Err(e) => {
                        tracing::error!(user_id = %drift.user.id, "Plan sync update failed: {e}");
                        report.failed += 1;
                    }
                }
            }
        }

        report.drifts = drifts;
        tracing::info!(
            dry_run,
            checked = report.checked,
            drifted = report.drifted,
            updated = report.updated,
            failed = report.failed,
            "Subscription sync finished"
        );
        Ok(report)
    }
}

/// Pair each user with their subscription and keep the mismatches.
#[must_use]
pub fn detect_drifts(
    users: &[UserPlan],
    subscriptions: &HashMap<UserId, SubscriptionRow>,
) -> Vec<PlanDrift> {
    users
        .iter()
        .filter_map(|user| PlanDrift::detect(user, subscriptions.get(&user.id)))
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_detect_drifts_pairs_by_user() {
        let paid: UserPlan = serde_json::from_value(json!({
            "id": "11111111-10b1-426f-9247-bb680e5fe0c8",
            "subscription_status": "free",
            "plan_type": "free",
            "show_ads": true,
            "premium_badge": false,
            "max_contact_requests": 3,
            "max_bookings": 3,
            "search_priority": 0
        }))
        .unwrap();
        let mut unpaid = paid.clone();
        unpaid.id = "22222222-10b1-426f-9247-bb680e5fe0c8".parse().unwrap();

        let subscription: SubscriptionRow = serde_json::from_value(json!({
            "user_id": "11111111-10b1-426f-9247-bb680e5fe0c8",
            "status": "active",
            "plan_type": "basic"
        }))
        .unwrap();
        let subscriptions = HashMap::from([(subscription.user_id, subscription)]);

        let drifts = detect_drifts(&[paid.clone(), unpaid], &subscriptions);
        assert_eq!(drifts.len(), 1);
        assert_eq!(drifts[0].user.id, paid.id);
    }
}
