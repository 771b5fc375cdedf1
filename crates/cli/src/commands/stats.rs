//! Dashboard counters on the command line.

use tigube_admin::db::DashboardRepository;
use tigube_admin::supabase::SupabaseClient;

/// Log the dashboard counters.
///
/// Counters that fail to load are reported as 0, as on the dashboard.
pub async fn print(client: &SupabaseClient) {
    let stats = DashboardRepository::new(client).stats().await;

    tracing::info!("Users:                {}", stats.total_users);
    tracing::info!("  last 30 days:       {}", stats.users_last_30_days);
    tracing::info!("Owners:               {}", stats.total_owners);
    tracing::info!("Caretakers/providers: {}", stats.total_caretakers);
    tracing::info!("Active subscriptions: {}", stats.active_subscriptions);
    tracing::info!("Conversations:        {}", stats.total_conversations);
    tracing::info!("Messages:             {}", stats.total_messages);
}
