//! Authentication route handlers for admin.
//!
//! Password sign-in against the auth service. The resulting [`AuthState`]
//! (tokens plus the resolved admin flag) is stored in the cookie session.

use askama::Template;
use axum::{
    Form, Router,
    extract::State,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use secrecy::SecretString;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use tigube_core::Email;

use crate::auth::{AuthError, AuthState};
use crate::error::clear_sentry_user;
use crate::middleware::{clear_auth_state, load_auth_state, save_auth_state};
use crate::routes::render;
use crate::state::AppState;

/// Login page template.
#[derive(Template)]
#[template(path = "auth/login.html")]
struct LoginPageTemplate {
    email: String,
    error: Option<String>,
}

/// Submitted login form.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

/// Build the auth router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/login", get(login_page).post(login))
        .route("/auth/logout", post(logout))
}

/// Render the login page; signed-in admins go straight to the dashboard.
///
/// GET /auth/login
async fn login_page(session: Session) -> Response {
    if load_auth_state(&session).await.is_admin() {
        return Redirect::to("/").into_response();
    }
    render(&LoginPageTemplate {
        email: String::new(),
        error: None,
    })
    .into_response()
}

/// Validate the form and sign in.
///
/// POST /auth/login
#[instrument(skip_all)]
async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Response {
    let show_error = |email: &str, message: String| {
        render(&LoginPageTemplate {
            email: email.to_string(),
            error: Some(message),
        })
        .into_response()
    };

    let email = match Email::parse(&form.email) {
        Ok(email) => email,
        Err(e) => return show_error(&form.email, e.to_string()),
    };
    if form.password.is_empty() {
        return show_error(email.as_str(), "Bitte geben Sie Ihr Passwort ein".to_string());
    }

    let password = SecretString::from(form.password);
    let mut auth = AuthState::default();
    if let Err(e) = state
        .authenticator()
        .sign_in(&mut auth, email.as_str(), &password)
        .await
    {
        tracing::warn!(error = %e, "Sign-in failed");
        let message = match e {
            AuthError::InvalidCredentials(_) => "Ungültige E-Mail-Adresse oder Passwort",
            _ => "Anmeldung derzeit nicht möglich. Bitte versuchen Sie es später erneut.",
        };
        return show_error(email.as_str(), message.to_string());
    }

    // New identity, new session ID.
    if let Err(e) = session.cycle_id().await {
        tracing::warn!(error = %e, "Failed to rotate session ID");
    }
    if let Err(e) = save_auth_state(&session, &auth).await {
        tracing::error!("Failed to store auth state: {e}");
        return show_error(
            email.as_str(),
            "Sitzung konnte nicht gespeichert werden".to_string(),
        );
    }

    tracing::info!(is_admin = auth.is_admin(), "Signed in");
    Redirect::to("/").into_response()
}

/// Sign out remotely (best effort) and clear the session.
///
/// POST /auth/logout
#[instrument(skip(state, session))]
async fn logout(State(state): State<AppState>, session: Session) -> impl IntoResponse {
    let mut auth = load_auth_state(&session).await;
    state.authenticator().sign_out(&mut auth).await;

    if let Err(e) = clear_auth_state(&session).await {
        tracing::warn!(error = %e, "Failed to clear session");
    }
    clear_sentry_user();

    Redirect::to("/auth/login")
}
