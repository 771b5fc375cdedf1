//! Dashboard route handler.

use askama::Template;
use axum::{Router, extract::State, response::Html, routing::get};
use tower_sessions::Session;
use tracing::instrument;

use crate::db::{DashboardRepository, UserRepository};
use crate::filters;
use crate::middleware::{RequireAdminAuth, take_flash};
use crate::models::{DashboardStats, Flash, User};
use crate::routes::{AdminUserView, render};
use crate::state::AppState;

/// Approval requests listed on the dashboard.
const APPROVAL_PREVIEW: u64 = 5;

/// Dashboard page template.
#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub flash: Option<Flash>,
    pub greeting_name: String,
    pub stats: DashboardStats,
    pub pending_approvals: Vec<User>,
}

/// Build the dashboard router.
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(index))
}

/// Dashboard page handler.
///
/// GET /
#[instrument(skip(admin, state, session))]
pub async fn index(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
) -> Html<String> {
    let dashboard = DashboardRepository::new(state.supabase());
    let users = UserRepository::new(state.supabase());
    let (stats, profile, pending) = tokio::join!(
        dashboard.stats(),
        users.admin_profile(admin.id),
        users.pending_approvals(APPROVAL_PREVIEW),
    );

    let greeting_name = match profile {
        Ok(Some(profile)) => profile.greeting_name(),
        Ok(None) => admin.display_name().to_string(),
        Err(e) => {
            tracing::warn!("Failed to load admin profile: {e}");
            admin.display_name().to_string()
        }
    };
    let pending_approvals = pending.unwrap_or_else(|e| {
        tracing::error!("Failed to fetch pending approvals: {e}");
        vec![]
    });

    render(&DashboardTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: "/".to_string(),
        flash: take_flash(&session).await,
        greeting_name,
        stats,
        pending_approvals,
    })
}
