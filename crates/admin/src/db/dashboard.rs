//! Dashboard counters.

use std::time::Duration;

use chrono::Utc;
use tracing::instrument;

use tigube_core::{SubscriptionStatus, UserType};

use crate::models::dashboard::{DashboardCounts, DashboardStats};
use crate::supabase::{Query, SupabaseClient, SupabaseError};

/// Upper bound on loading all counters.
pub const STATS_TIMEOUT: Duration = Duration::from_secs(10);

/// Repository for the dashboard counters.
pub struct DashboardRepository<'a> {
    client: &'a SupabaseClient,
}

impl<'a> DashboardRepository<'a> {
    /// Create a new dashboard repository.
    #[must_use]
    pub const fn new(client: &'a SupabaseClient) -> Self {
        Self { client }
    }

    /// Load the platform counters.
    ///
    /// The eight counts run concurrently. A failing count is logged and
    /// reported as 0; if the whole load exceeds [`STATS_TIMEOUT`] every
    /// counter is 0.
    #[instrument(skip(self))]
    pub async fn stats(&self) -> DashboardStats {
        self.stats_within(STATS_TIMEOUT).await
    }

    /// [`Self::stats`] with an explicit time bound.
    pub async fn stats_within(&self, limit: Duration) -> DashboardStats {
        match tokio::time::timeout(limit, self.counts()).await {
            Ok(counts) => counts.into(),
            Err(_) => {
                tracing::error!(timeout = ?limit, "Dashboard stats timed out");
                DashboardStats::default()
            }
        }
    }

    async fn counts(&self) -> DashboardCounts {
        let thirty_days_ago = (Utc::now() - chrono::Duration::days(30)).to_rfc3339();

        let all_users = Query::new();
        let owners = Query::new().eq("user_type", UserType::Owner);
        let caretakers = Query::new().eq("user_type", UserType::Caretaker);
        let providers = Query::new().in_list("user_type", UserType::SERVICE_PROVIDERS.iter());
        let subscribed =
            Query::new().in_list("subscription_status", SubscriptionStatus::COUNTED_ACTIVE.iter());
        let everything = Query::new();
        let recent = Query::new().gte("created_at", &thirty_days_ago);

        let (users, owners, caretakers, providers, subscribed, conversations, messages, recent) = tokio::join!(
            self.count("users", "users", &all_users),
            self.count("users", "owners", &owners),
            self.count("users", "caretakers", &caretakers),
            self.count("users", "service providers", &providers),
            self.count("users", "active subscriptions", &subscribed),
            self.count("conversations", "conversations", &everything),
            self.count("messages", "messages", &everything),
            self.count("users", "users last 30 days", &recent),
        );

        DashboardCounts {
            users,
            owners,
            caretakers,
            service_providers: providers,
            active_subscriptions: subscribed,
            conversations,
            messages,
            users_last_30_days: recent,
        }
    }

    async fn count(&self, table: &str, label: &str, query: &Query) -> u64 {
        match self.client.count(table, query).await {
            Ok(count) => count,
            Err(e) => {
                log_count_failure(label, &e);
                0
            }
        }
    }
}

fn log_count_failure(label: &str, err: &SupabaseError) {
    tracing::warn!(counter = label, error = %err, "Dashboard count failed");
}
