//! User management route handlers.
//!
//! The table loads one page from the backend and applies search and filter
//! to the loaded rows. Admin toggles post to `/users/{id}/...` and redirect
//! back.

use askama::Template;
use axum::{
    Form, Router,
    extract::{Path, Query, State},
    http::header,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use chrono::Utc;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use tigube_core::{ApprovalStatus, UserId};

use crate::components::{DataTableConfig, Pagination, users_table_config};
use crate::csv;
use crate::db::{RepositoryError, UserRepository};
use crate::error::AppError;
use crate::filters;
use crate::middleware::{RequireAdminAuth, take_flash};
use crate::models::user::filter_users;
use crate::models::{Flash, User, UserFilter};
use crate::routes::{AdminUserView, non_empty, redirect_with, render, return_path};
use crate::state::AppState;

/// Rows loaded per page.
pub const USERS_PER_PAGE: u64 = 50;

/// Build the users router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(index))
        .route("/users/export.csv", get(export_csv))
        .route("/users/{id}", get(show))
        .route("/users/{id}/verify", post(verify))
        .route("/users/{id}/suspend", post(suspend))
        .route("/users/{id}/unsuspend", post(unsuspend))
        .route("/users/{id}/admin", post(set_admin))
        .route("/users/{id}/approval", post(set_approval))
}

// =============================================================================
// Templates
// =============================================================================

/// Users list page template.
#[derive(Template)]
#[template(path = "users/index.html")]
pub struct UsersIndexTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub flash: Option<Flash>,
    pub table: DataTableConfig,
    pub users: Vec<User>,
    pub pagination: Pagination,
    pub search: String,
    pub filter: UserFilter,
    pub filter_options: Vec<UserFilter>,
    pub load_error: Option<String>,
    pub return_to: String,
}

/// User detail page template.
#[derive(Template)]
#[template(path = "users/show.html")]
pub struct UserShowTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub flash: Option<Flash>,
    pub user: User,
    pub is_self: bool,
    pub approval_statuses: Vec<ApprovalStatus>,
}

// =============================================================================
// Request Types
// =============================================================================

/// Query parameters of the user table.
#[derive(Debug, Default, Deserialize)]
pub struct UsersQuery {
    pub page: Option<u64>,
    pub q: Option<String>,
    pub filter: Option<String>,
}

impl UsersQuery {
    fn search(&self) -> String {
        self.q.clone().unwrap_or_default().trim().to_string()
    }

    fn user_filter(&self) -> UserFilter {
        UserFilter::from_param(self.filter.as_deref())
    }
}

/// Suspension form.
#[derive(Debug, Deserialize)]
pub struct SuspendForm {
    pub reason: Option<String>,
    pub return_to: Option<String>,
}

/// Plain action form carrying only the return path.
#[derive(Debug, Deserialize)]
pub struct ActionForm {
    pub return_to: Option<String>,
}

/// Admin toggle form.
#[derive(Debug, Deserialize)]
pub struct AdminForm {
    /// `true` grants, anything else revokes.
    pub grant: String,
    pub return_to: Option<String>,
}

/// Approval decision form.
#[derive(Debug, Deserialize)]
pub struct ApprovalForm {
    pub status: String,
    pub notes: Option<String>,
    pub return_to: Option<String>,
}

// =============================================================================
// Route Handlers
// =============================================================================

/// Users list page handler.
///
/// GET /users
#[instrument(skip(admin, state, session))]
pub async fn index(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<UsersQuery>,
) -> Html<String> {
    let page = query.page.unwrap_or(1).max(1);
    let search = query.search();
    let filter = query.user_filter();

    let (users, total, load_error) = match UserRepository::new(state.supabase())
        .list(page, USERS_PER_PAGE)
        .await
    {
        Ok(result) => (filter_users(result.rows, filter, &search), result.total, None),
        Err(e) => {
            tracing::error!("Failed to fetch users: {e}");
            (
                vec![],
                0,
                Some("Benutzer konnten nicht geladen werden.".to_string()),
            )
        }
    };

    render(&UsersIndexTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: "/users".to_string(),
        flash: take_flash(&session).await,
        table: users_table_config(),
        users,
        pagination: Pagination::new(page, USERS_PER_PAGE, total),
        return_to: list_url(page, &search, filter),
        search,
        filter,
        filter_options: UserFilter::ALL.to_vec(),
        load_error,
    })
}

/// CSV export of every user matching the current search and filter.
///
/// GET /users/export.csv
#[instrument(skip(_admin, state))]
pub async fn export_csv(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
    Query(query): Query<UsersQuery>,
) -> Result<Response, AppError> {
    let users = UserRepository::new(state.supabase()).list_all().await?;
    let users = filter_users(users, query.user_filter(), &query.search());

    tracing::info!(rows = users.len(), "User export generated");
    let file_name = csv::export_file_name(Utc::now().date_naive());
    Ok((
        [
            (header::CONTENT_TYPE, csv::CONTENT_TYPE.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{file_name}\""),
            ),
        ],
        csv::users_csv(&users),
    )
        .into_response())
}

/// User detail page handler.
///
/// GET /users/{id}
#[instrument(skip(admin, state, session))]
pub async fn show(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<UserId>,
) -> Response {
    match UserRepository::new(state.supabase()).get(id).await {
        Ok(user) => render(&UserShowTemplate {
            admin_user: AdminUserView::from(&admin),
            current_path: "/users".to_string(),
            flash: take_flash(&session).await,
            is_self: user.id == admin.id,
            user,
            approval_statuses: ApprovalStatus::ALL.to_vec(),
        })
        .into_response(),
        Err(RepositoryError::NotFound) => {
            redirect_with(&session, "/users", Flash::error("Benutzer nicht gefunden."))
                .await
                .into_response()
        }
        Err(e) => {
            tracing::error!("Failed to fetch user {id}: {e}");
            redirect_with(
                &session,
                "/users",
                Flash::error("Benutzer konnte nicht geladen werden."),
            )
            .await
            .into_response()
        }
    }
}

/// Mark the user as verified.
///
/// POST /users/{id}/verify
#[instrument(skip(_admin, state, session, form))]
pub async fn verify(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<UserId>,
    Form(form): Form<ActionForm>,
) -> Redirect {
    let result = UserRepository::new(state.supabase()).verify(id).await;
    finish(
        &session,
        form.return_to.as_deref(),
        id,
        result,
        "Benutzer wurde verifiziert.",
        "Fehler beim Verifizieren des Benutzers.",
    )
    .await
}

/// Suspend the user.
///
/// POST /users/{id}/suspend
#[instrument(skip(admin, state, session, form))]
pub async fn suspend(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<UserId>,
    Form(form): Form<SuspendForm>,
) -> Redirect {
    if id == admin.id {
        let to = return_path(form.return_to.as_deref(), "/users");
        return redirect_with(
            &session,
            to,
            Flash::error("Sie können Ihr eigenes Konto nicht sperren."),
        )
        .await;
    }
    let result = UserRepository::new(state.supabase())
        .set_suspended(id, true, non_empty(form.reason), Some(admin.id))
        .await;
    finish(
        &session,
        form.return_to.as_deref(),
        id,
        result,
        "Benutzer wurde gesperrt.",
        "Fehler beim Sperren des Benutzers.",
    )
    .await
}

/// Lift a suspension.
///
/// POST /users/{id}/unsuspend
#[instrument(skip(_admin, state, session, form))]
pub async fn unsuspend(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<UserId>,
    Form(form): Form<ActionForm>,
) -> Redirect {
    let result = UserRepository::new(state.supabase())
        .set_suspended(id, false, None, None)
        .await;
    finish(
        &session,
        form.return_to.as_deref(),
        id,
        result,
        "Sperrung wurde aufgehoben.",
        "Fehler beim Entsperren des Benutzers.",
    )
    .await
}

/// Grant or revoke admin privilege.
///
/// POST /users/{id}/admin
#[instrument(skip(admin, state, session, form))]
pub async fn set_admin(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<UserId>,
    Form(form): Form<AdminForm>,
) -> Redirect {
    let grant = form.grant == "true";
    if id == admin.id && !grant {
        let to = return_path(form.return_to.as_deref(), "/users");
        return redirect_with(
            &session,
            to,
            Flash::error("Sie können sich die Admin-Rechte nicht selbst entziehen."),
        )
        .await;
    }
    let result = UserRepository::new(state.supabase())
        .set_admin(id, grant)
        .await;
    let success = if grant {
        "Admin-Rechte wurden vergeben."
    } else {
        "Admin-Rechte wurden entzogen."
    };
    finish(
        &session,
        form.return_to.as_deref(),
        id,
        result,
        success,
        "Fehler beim Ändern der Admin-Rechte.",
    )
    .await
}

/// Record an approval decision for a caretaker or service provider.
///
/// POST /users/{id}/approval
#[instrument(skip(admin, state, session, form))]
pub async fn set_approval(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<UserId>,
    Form(form): Form<ApprovalForm>,
) -> Redirect {
    let Ok(status) = form.status.parse::<ApprovalStatus>() else {
        let to = return_path(form.return_to.as_deref(), "/users");
        return redirect_with(&session, to, Flash::error("Unbekannter Freigabestatus.")).await;
    };
    let result = UserRepository::new(state.supabase())
        .set_approval_status(id, status, non_empty(form.notes), Some(admin.id))
        .await;
    finish(
        &session,
        form.return_to.as_deref(),
        id,
        result,
        &format!("Freigabestatus: {}.", status.label()),
        "Fehler beim Ändern des Freigabestatus.",
    )
    .await
}

// =============================================================================
// Helpers
// =============================================================================

/// Flash the outcome of an action and redirect.
async fn finish(
    session: &Session,
    return_to: Option<&str>,
    id: UserId,
    result: Result<(), RepositoryError>,
    success: &str,
    failure: &str,
) -> Redirect {
    let fallback = format!("/users/{id}");
    let to = return_path(return_to, &fallback);
    let flash = match result {
        Ok(()) => Flash::success(success),
        Err(e) => {
            tracing::error!(user_id = %id, "{failure} {e}");
            Flash::error(failure)
        }
    };
    redirect_with(session, to, flash).await
}

/// Path of the list page with its current state.
fn list_url(page: u64, search: &str, filter: UserFilter) -> String {
    let query = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("page", &page.to_string())
        .append_pair("q", search)
        .append_pair("filter", filter.as_str())
        .finish();
    format!("/users?{query}")
}
