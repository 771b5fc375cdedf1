//! Content moderation route handlers: reviews and support tickets.

use askama::Template;
use axum::{
    Form, Router,
    extract::{Path, Query, State},
    response::{Html, Redirect},
    routing::{get, post},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use tigube_core::{ModerationAction, ModerationStatus, ReviewId, SupportTicketId, TicketStatus};

use crate::db::ContentRepository;
use crate::filters;
use crate::middleware::{RequireAdminAuth, take_flash};
use crate::models::{Flash, Review, SupportTicket};
use crate::routes::{AdminUserView, redirect_with, render, return_path};
use crate::state::AppState;

/// Build the moderation router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/moderation", get(index))
        .route("/moderation/reviews/{id}", post(moderate_review))
        .route("/moderation/tickets/{id}", post(update_ticket))
}

/// Moderation page template.
#[derive(Template)]
#[template(path = "moderation/index.html")]
pub struct ModerationTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub flash: Option<Flash>,
    pub reviews: Vec<Review>,
    pub tickets: Vec<SupportTicket>,
    pub review_status: ModerationStatus,
    pub ticket_status: Option<TicketStatus>,
    pub review_statuses: Vec<ModerationStatus>,
    pub ticket_statuses: Vec<TicketStatus>,
    pub return_to: String,
}

/// Query parameters of the moderation page.
#[derive(Debug, Default, Deserialize)]
pub struct ModerationQuery {
    pub review_status: Option<String>,
    pub ticket_status: Option<String>,
}

/// Review moderation form.
#[derive(Debug, Deserialize)]
pub struct ReviewActionForm {
    pub action: String,
    pub return_to: Option<String>,
}

/// Ticket status form.
#[derive(Debug, Deserialize)]
pub struct TicketStatusForm {
    pub status: String,
    pub return_to: Option<String>,
}

/// Moderation page handler.
///
/// GET /moderation
#[instrument(skip(admin, state, session))]
pub async fn index(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<ModerationQuery>,
) -> Html<String> {
    let review_status = query
        .review_status
        .as_deref()
        .and_then(|s| s.parse().ok())
        .unwrap_or(ModerationStatus::Pending);
    let ticket_status = query
        .ticket_status
        .as_deref()
        .and_then(|s| s.parse::<TicketStatus>().ok());

    let repo = ContentRepository::new(state.supabase());
    let (reviews, tickets) = tokio::join!(repo.reviews(review_status), repo.tickets(ticket_status));

    let reviews = reviews.unwrap_or_else(|e| {
        tracing::error!("Failed to fetch reviews: {e}");
        vec![]
    });
    let tickets = tickets.unwrap_or_else(|e| {
        tracing::error!("Failed to fetch support tickets: {e}");
        vec![]
    });

    let mut return_to = format!("/moderation?review_status={review_status}");
    if let Some(status) = ticket_status {
        return_to.push_str(&format!("&ticket_status={status}"));
    }

    render(&ModerationTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: "/moderation".to_string(),
        flash: take_flash(&session).await,
        reviews,
        tickets,
        review_status,
        ticket_status,
        review_statuses: ModerationStatus::ALL.to_vec(),
        ticket_statuses: TicketStatus::ALL.to_vec(),
        return_to,
    })
}

/// Approve, reject or flag a review.
///
/// POST /moderation/reviews/{id}
#[instrument(skip(admin, state, session, form))]
pub async fn moderate_review(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<ReviewId>,
    Form(form): Form<ReviewActionForm>,
) -> Redirect {
    let to = return_path(form.return_to.as_deref(), "/moderation");
    let Ok(action) = form.action.parse::<ModerationAction>() else {
        return redirect_with(&session, to, Flash::error("Unbekannte Aktion.")).await;
    };

    let flash = match ContentRepository::new(state.supabase())
        .moderate(id, action, admin.id)
        .await
    {
        Ok(()) => Flash::success(format!(
            "Bewertung: {}.",
            action.resulting_status().label()
        )),
        Err(e) => {
            tracing::error!(review_id = %id, "Failed to moderate review: {e}");
            Flash::error("Fehler beim Moderieren der Bewertung.")
        }
    };
    redirect_with(&session, to, flash).await
}

/// Move a support ticket to another status.
///
/// POST /moderation/tickets/{id}
#[instrument(skip(_admin, state, session, form))]
pub async fn update_ticket(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<SupportTicketId>,
    Form(form): Form<TicketStatusForm>,
) -> Redirect {
    let to = return_path(form.return_to.as_deref(), "/moderation");
    let Ok(status) = form.status.parse::<TicketStatus>() else {
        return redirect_with(&session, to, Flash::error("Unbekannter Ticketstatus.")).await;
    };

    let flash = match ContentRepository::new(state.supabase())
        .set_ticket_status(id, status)
        .await
    {
        Ok(()) => Flash::success(format!("Ticket: {}.", status.label())),
        Err(e) => {
            tracing::error!(ticket_id = %id, "Failed to update ticket: {e}");
            Flash::error("Fehler beim Aktualisieren des Tickets.")
        }
    };
    redirect_with(&session, to, flash).await
}
