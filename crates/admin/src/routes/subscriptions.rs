//! Subscription overview and plan sync handlers.
//!
//! The overview compares the plan columns on `users` with the billing rows in
//! `subscriptions`; the sync writes the billing state back onto the users.

use askama::Template;
use axum::{
    Form, Router,
    extract::State,
    response::{Html, Redirect},
    routing::{get, post},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::db::SubscriptionRepository;
use crate::db::subscriptions::detect_drifts;
use crate::filters;
use crate::middleware::{RequireAdminAuth, take_flash};
use crate::models::{Flash, PlanCounts, PlanDrift};
use crate::routes::{AdminUserView, redirect_with, render};
use crate::state::AppState;

/// Build the subscriptions router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/subscriptions", get(index))
        .route("/subscriptions/sync", post(sync))
}

/// Subscriptions page template.
#[derive(Template)]
#[template(path = "subscriptions/index.html")]
pub struct SubscriptionsTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub flash: Option<Flash>,
    pub counts: PlanCounts,
    pub total_users: usize,
    pub drifts: Vec<PlanDrift>,
    pub load_error: bool,
}

/// Sync form; a checked `dry_run` box only reports.
#[derive(Debug, Deserialize)]
pub struct SyncForm {
    pub dry_run: Option<String>,
}

/// Subscriptions page handler.
///
/// GET /subscriptions
#[instrument(skip(admin, state, session))]
pub async fn index(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
) -> Html<String> {
    let repo = SubscriptionRepository::new(state.supabase());
    let (users, subscriptions) = tokio::join!(repo.overview(), repo.subscriptions());

    let (counts, total_users, drifts, load_error) = match (users, subscriptions) {
        (Ok(users), Ok(subscriptions)) => (
            PlanCounts::tally(&users),
            users.len(),
            detect_drifts(&users, &subscriptions),
            false,
        ),
        (Err(e), _) | (_, Err(e)) => {
            tracing::error!("Failed to fetch subscription overview: {e}");
            (PlanCounts::default(), 0, vec![], true)
        }
    };

    render(&SubscriptionsTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: "/subscriptions".to_string(),
        flash: take_flash(&session).await,
        counts,
        total_users,
        drifts,
        load_error,
    })
}

/// Run the plan sync.
///
/// POST /subscriptions/sync
#[instrument(skip(admin, state, session, form), fields(admin_id = %admin.id))]
pub async fn sync(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<SyncForm>,
) -> Redirect {
    let dry_run = form.dry_run.is_some();
    let flash = match SubscriptionRepository::new(state.supabase())
        .sync(dry_run)
        .await
    {
        Ok(report) if report.failed > 0 => Flash::error(report.summary()),
        Ok(report) => Flash::success(report.summary()),
        Err(e) => {
            tracing::error!("Subscription sync failed: {e}");
            Flash::error("Synchronisierung fehlgeschlagen.")
        }
    };
    redirect_with(&session, "/subscriptions", flash).await
}
