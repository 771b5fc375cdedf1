//! Authentication middleware and extractors for admin.
//!
//! [`RequireAdminAuth`] runs the session bootstrap on demand: it refreshes
//! tokens that are about to expire, re-checks the admin flag once the last
//! answer is stale, writes the updated [`AuthState`] back to the session and
//! only then decides whether the request may proceed.

use askama::Template;
use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{Html, IntoResponse, Redirect, Response},
};
use chrono::Utc;
use tower_sessions::Session;

use crate::auth::AuthState;
use crate::error::set_sentry_user;
use crate::middleware::session::{load_auth_state, save_auth_state};
use crate::models::CurrentAdmin;
use crate::state::AppState;

/// Tokens this close to expiry are refreshed before use.
const REFRESH_MARGIN_SECS: i64 = 60;

/// Extractor that requires admin authentication.
///
/// If the user is not logged in, returns a redirect to the login page
/// for HTML requests, or 401 Unauthorized for API requests. Signed-in users
/// without admin privilege get the access-denied page.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAdminAuth(admin): RequireAdminAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", admin.display_name())
/// }
/// ```
pub struct RequireAdminAuth(pub CurrentAdmin);

/// Error returned when admin authentication is required.
#[derive(Debug)]
pub enum AdminAuthRejection {
    /// Redirect to login page (for HTML requests).
    RedirectToLogin,
    /// Unauthorized response (for API requests).
    Unauthorized,
    /// Signed in, but not an admin.
    Forbidden { email: Option<String> },
}

/// Page shown to signed-in users without admin privilege.
#[derive(Template)]
#[template(path = "auth/denied.html")]
pub struct AccessDeniedTemplate {
    pub email: Option<String>,
}

impl IntoResponse for AdminAuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to("/auth/login").into_response(),
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
            Self::Forbidden { email } => {
                let body = AccessDeniedTemplate { email }.render().unwrap_or_else(|e| {
                    tracing::error!("Template render error: {}", e);
                    "Zugriff verweigert".to_string()
                });
                (StatusCode::FORBIDDEN, Html(body)).into_response()
            }
        }
    }
}

impl FromRequestParts<AppState> for RequireAdminAuth {
    type Rejection = AdminAuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let is_api = parts.uri.path().starts_with("/api/");
        let not_signed_in = || {
            if is_api {
                AdminAuthRejection::Unauthorized
            } else {
                AdminAuthRejection::RedirectToLogin
            }
        };

        // Get the session from extensions (set by SessionManagerLayer)
        let session = parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or(AdminAuthRejection::Unauthorized)?;

        let mut auth = load_auth_state(&session).await;
        if auth.tokens.is_none() {
            return Err(not_signed_in());
        }

        let before = auth.clone();
        ensure_fresh(state, &mut auth).await;
        if auth != before
            && let Err(e) = save_auth_state(&session, &auth).await
        {
            tracing::warn!(error = %e, "Failed to persist auth state");
        }

        if !auth.is_signed_in() {
            return Err(not_signed_in());
        }

        let admin = CurrentAdmin::from_state(&auth).ok_or_else(|| AdminAuthRejection::Forbidden {
            email: auth.user.as_ref().and_then(|u| u.email.clone()),
        })?;

        set_sentry_user(admin.id, admin.email.as_deref());

        Ok(Self(admin))
    }
}

/// Refresh expiring tokens and re-run the bootstrap when it is due.
pub async fn ensure_fresh(state: &AppState, auth: &mut AuthState) {
    let authenticator = state.authenticator();

    if auth
        .tokens
        .as_ref()
        .is_some_and(|t| t.expires_within(REFRESH_MARGIN_SECS))
    {
        authenticator.refresh(auth).await;
    }

    if auth.tokens.is_some()
        && auth.needs_bootstrap(Utc::now(), authenticator.timings().admin_recheck_interval)
    {
        authenticator.bootstrap(auth).await;
    }
}
