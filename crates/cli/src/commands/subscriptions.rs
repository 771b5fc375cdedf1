//! Plan sync command.

use tigube_admin::db::SubscriptionRepository;
use tigube_admin::supabase::SupabaseClient;

use super::CliError;

/// Compare plan columns with billing and write the differences back.
///
/// # Errors
///
/// Returns `CliError::Repository` if the users or subscriptions cannot be
/// loaded. Individual failed updates are counted in the report instead.
pub async fn sync(client: &SupabaseClient, dry_run: bool) -> Result<(), CliError> {
    let report = SubscriptionRepository::new(client).sync(dry_run).await?;

    for drift in &report.drifts {
        tracing::info!(
            "{}: {} -> {} ({})",
            drift.user.display_name(),
            drift.user.plan_type.as_deref().unwrap_or("-"),
            drift.desired.entitlements.plan_type,
            drift.fields.join(", ")
        );
    }
    tracing::info!("{}", report.summary());

    if report.failed > 0 {
        tracing::warn!("{} updates failed", report.failed);
    }
    Ok(())
}
