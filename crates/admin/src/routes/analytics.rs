//! Analytics route handler.

use askama::Template;
use axum::{
    Router,
    extract::{Query, State},
    response::Html,
    routing::get,
};
use chrono::Utc;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::db::AnalyticsRepository;
use crate::filters;
use crate::middleware::{RequireAdminAuth, take_flash};
use crate::models::{AnalyticsOverview, Flash, Timeframe};
use crate::routes::{AdminUserView, render};
use crate::state::AppState;

/// Build the analytics router.
pub fn router() -> Router<AppState> {
    Router::new().route("/analytics", get(index))
}

/// Analytics page template.
#[derive(Template)]
#[template(path = "analytics/index.html")]
pub struct AnalyticsTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub flash: Option<Flash>,
    pub overview: AnalyticsOverview,
    pub timeframes: Vec<Timeframe>,
    pub load_error: bool,
}

/// Query parameters of the analytics page.
#[derive(Debug, Deserialize)]
pub struct AnalyticsQuery {
    pub timeframe: Option<String>,
}

/// Analytics page handler.
///
/// GET /analytics
#[instrument(skip(admin, state, session))]
pub async fn index(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<AnalyticsQuery>,
) -> Html<String> {
    let timeframe = Timeframe::from_param(query.timeframe.as_deref());

    let (overview, load_error) = match AnalyticsRepository::new(state.supabase())
        .overview(timeframe)
        .await
    {
        Ok(overview) => (overview, false),
        Err(e) => {
            tracing::error!("Failed to fetch analytics: {e}");
            (AnalyticsOverview::empty(timeframe, Utc::now()), true)
        }
    };

    render(&AnalyticsTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: "/analytics".to_string(),
        flash: take_flash(&session).await,
        overview,
        timeframes: Timeframe::ALL.to_vec(),
        load_error,
    })
}
