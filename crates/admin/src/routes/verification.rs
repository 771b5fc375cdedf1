//! Verification requests and provider approvals.
//!
//! Identity documents come in as `verification_requests`; caretakers and
//! service providers additionally need an approval before they are listed.

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

use tigube_core::{UserId, VerificationRequestId, VerificationRequestStatus};

use crate::db::{UserRepository, VerificationRepository};
use crate::filters;
use crate::middleware::{RequireAdminAuth, take_flash};
use crate::models::{Flash, User, VerificationRequest};
use crate::routes::{AdminUserView, non_empty, redirect_with, render};
use crate::state::AppState;

/// Approval requests listed on the page.
const APPROVAL_LIMIT: u64 = 50;

/// Build the verification router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/verification", get(index))
        .route("/verification/{id}/approve", post(approve_request))
        .route("/verification/{id}/reject", post(reject_request))
        .route("/verification/approvals/{user_id}", post(decide_approval))
}

/// Verification page template.
#[derive(Template)]
#[template(path = "verification/index.html")]
pub struct VerificationTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub flash: Option<Flash>,
    pub requests: Vec<VerificationRequest>,
    pub approvals: Vec<User>,
    pub status: Option<VerificationRequestStatus>,
    pub statuses: Vec<VerificationRequestStatus>,
}

/// Query parameters of the verification page.
#[derive(Debug, Deserialize)]
pub struct VerificationQuery {
    pub status: Option<String>,
}

/// Rejection form.
#[derive(Debug, Deserialize)]
pub struct RejectForm {
    pub comment: Option<String>,
}

/// Approval decision form.
#[derive(Debug, Deserialize)]
pub struct DecisionForm {
    /// `approve` or `reject`.
    pub decision: String,
    pub notes: Option<String>,
}

/// Verification page handler.
///
/// Without a `status` parameter, open requests (pending) are shown.
///
/// GET /verification
#[instrument(skip(admin, state, session))]
pub async fn index(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<VerificationQuery>,
) -> Html<String> {
    let status = match query.status.as_deref() {
        None | Some("") => Some(VerificationRequestStatus::Pending),
        Some("all") => None,
        Some(other) => other.parse().ok(),
    };

    let verification = VerificationRepository::new(state.supabase());
    let users = UserRepository::new(state.supabase());
    let (requests, approvals) = tokio::join!(
        verification.list(status),
        users.pending_approvals(APPROVAL_LIMIT),
    );
    let requests = requests.unwrap_or_else(|e| {
        tracing::error!("Failed to fetch verification requests: {e}");
        vec![]
    });
    let approvals = approvals.unwrap_or_else(|e| {
        tracing::error!("Failed to fetch pending approvals: {e}");
        vec![]
    });

    render(&VerificationTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: "/verification".to_string(),
        flash: take_flash(&session).await,
        requests,
        approvals,
        status,
        statuses: VerificationRequestStatus::ALL.to_vec(),
    })
}

/// Approve a verification request.
///
/// POST /verification/{id}/approve
#[instrument(skip(admin, state, session))]
pub async fn approve_request(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<VerificationRequestId>,
) -> Redirect {
    let flash = match VerificationRepository::new(state.supabase())
        .approve(id, admin.id)
        .await
    {
        Ok(()) => Flash::success("Verifizierung wurde genehmigt."),
        Err(e) => {
            tracing::error!(request_id = %id, "Failed to approve verification: {e}");
            Flash::error("Fehler beim Genehmigen der Verifizierung.")
        }
    };
    redirect_with(&session, "/verification", flash).await
}

/// Reject a verification request.
///
/// POST /verification/{id}/reject
#[instrument(skip(admin, state, session, form))]
pub async fn reject_request(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<VerificationRequestId>,
    Form(form): Form<RejectForm>,
) -> Redirect {
    let flash = match VerificationRepository::new(state.supabase())
        .reject(id, non_empty(form.comment), admin.id)
        .await
    {
        Ok(()) => Flash::success("Verifizierung wurde abgelehnt."),
        Err(e) => {
            tracing::error!(request_id = %id, "Failed to reject verification: {e}");
            Flash::error("Fehler beim Ablehnen der Verifizierung.")
        }
    };
    redirect_with(&session, "/verification", flash).await
}

/// Approve or reject a caretaker or service provider.
///
/// POST /verification/approvals/{user_id}
#[instrument(skip(admin, state, session, form))]
pub async fn decide_approval(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(user_id): Path<UserId>,
    Form(form): Form<DecisionForm>,
) -> Redirect {
    let users = UserRepository::new(state.supabase());
    let (result, success) = match form.decision.as_str() {
        "approve" => (
            users.approve(user_id, admin.id).await,
            "Benutzer wurde freigegeben.",
        ),
        "reject" => (
            users
                .reject(user_id, non_empty(form.notes), admin.id)
                .await,
            "Freigabe wurde abgelehnt.",
        ),
        _ => {
            return redirect_with(&session, "/verification", Flash::error("Unbekannte Aktion."))
                .await;
        }
    };

    let flash = match result {
        Ok(()) => Flash::success(success),
        Err(e) => {
            tracing::error!(user_id = %user_id, "Failed to record approval decision: {e}");
            Flash::error("Fehler beim Speichern der Entscheidung.")
        }
    };
    redirect_with(&session, "/verification", flash).await
}
