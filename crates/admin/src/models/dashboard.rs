//! Platform counters shown on the dashboard.

use serde::Serialize;

/// Headline counters of the platform.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub total_users: u64,
    pub total_owners: u64,
    /// Caretakers plus service providers.
    pub total_caretakers: u64,
    pub active_subscriptions: u64,
    pub total_conversations: u64,
    pub total_messages: u64,
    /// Not tracked yet; always 0.
    pub total_revenue: u64,
    pub users_last_30_days: u64,
}

/// Raw counts as returned by the eight count queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DashboardCounts {
    pub users: u64,
    pub owners: u64,
    pub caretakers: u64,
    pub service_providers: u64,
    pub active_subscriptions: u64,
    pub conversations: u64,
    pub messages: u64,
    pub users_last_30_days: u64,
}

impl From<DashboardCounts> for DashboardStats {
    fn from(counts: DashboardCounts) -> Self {
        Self {
            total_users: counts.users,
            total_owners: counts.owners,
            total_caretakers: counts.caretakers + counts.service_providers,
            active_subscriptions: counts.active_subscriptions,
            total_conversations: counts.conversations,
            total_messages: counts.messages,
            total_revenue: 0,
            users_last_30_days: counts.users_last_30_days,
        }
    }
}
