//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! /auth/login                  GET/POST  Password sign-in
//! /auth/logout                 POST      Sign out
//! /                            GET       Dashboard
//! /users                       GET       User table (page, q, filter)
//! /users/export.csv            GET       CSV of the filtered users
//! /users/{id}                  GET       User detail
//! /users/{id}/...              POST      verify, suspend, unsuspend, admin, approval
//! /moderation                  GET       Reviews and support tickets
//! /analytics                   GET       Daily signups and messages
//! /subscriptions               GET/POST  Plan drift and sync
//! /blog                        ...       Blog CMS
//! /advertisements              ...       Advertisement CRUD
//! /api/advertisements/images   POST      Creative upload (JSON)
//! /verification                ...       Verification requests and approvals
//! ```
//!
//! Every page is guarded by [`RequireAdminAuth`](crate::middleware::RequireAdminAuth).
//! Mutations follow Post/Redirect/Get with a flash message in the session.

pub mod advertisements;
pub mod analytics;
pub mod auth;
pub mod blog;
pub mod dashboard;
pub mod moderation;
pub mod subscriptions;
pub mod users;
pub mod verification;

use askama::Template;
use axum::{
    Router,
    response::{Html, Redirect},
};
use tower_sessions::Session;

use crate::middleware::push_flash;
use crate::models::{CurrentAdmin, Flash};
use crate::state::AppState;

/// Build the full page router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(auth::router())
        .merge(dashboard::router())
        .merge(users::router())
        .merge(moderation::router())
        .merge(analytics::router())
        .merge(subscriptions::router())
        .merge(blog::router())
        .merge(advertisements::router())
        .merge(verification::router())
}

/// Signed-in admin as shown in the layout header.
#[derive(Debug, Clone)]
pub struct AdminUserView {
    pub name: String,
    pub email: String,
    pub role: String,
}

impl From<&CurrentAdmin> for AdminUserView {
    fn from(admin: &CurrentAdmin) -> Self {
        Self {
            name: admin.display_name().to_string(),
            email: admin.email.clone().unwrap_or_default(),
            role: admin.role.clone(),
        }
    }
}

/// Render a template, logging failures.
pub(crate) fn render<T: Template>(template: &T) -> Html<String> {
    Html(template.render().unwrap_or_else(|e| {
        tracing::error!("Template render error: {}", e);
        "Internal Server Error".to_string()
    }))
}

/// Store `flash` and redirect to `to`.
pub(crate) async fn redirect_with(session: &Session, to: &str, flash: Flash) -> Redirect {
    push_flash(session, flash).await;
    Redirect::to(to)
}

/// A same-site path to return to after a form post, or `fallback`.
///
/// Only absolute paths are accepted so forms cannot redirect off-site.
pub(crate) fn return_path<'a>(requested: Option<&'a str>, fallback: &'a str) -> &'a str {
    requested
        .filter(|p| p.starts_with('/') && !p.starts_with("//") && !p.contains('\\'))
        .unwrap_or(fallback)
}

/// Trimmed, non-empty text.
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_return_path_rejects_foreign_targets() {
        assert_eq!(return_path(Some("/users?page=2"), "/users"), "/users?page=2");
        assert_eq!(return_path(Some("https://evil.example"), "/users"), "/users");
        assert_eq!(return_path(Some("//evil.example"), "/users"), "/users");
        assert_eq!(return_path(Some("/\\evil.example"), "/users"), "/users");
        assert_eq!(return_path(None, "/users"), "/users");
    }

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty(Some("  Grund ".to_string())), Some("Grund".to_string()));
        assert_eq!(non_empty(Some("   ".to_string())), None);
        assert_eq!(non_empty(None), None);
    }
}
