//! Session middleware configuration for admin.
//!
//! Sessions live in process memory (tower-sessions `MemoryStore`) with
//! strict cookie settings (SameSite=Strict, 24hr inactivity expiry). The
//! only things stored are the per-browser [`AuthState`] and a one-shot
//! flash message.

use tower_sessions::{Expiry, MemoryStore, Session, SessionManagerLayer};

use crate::auth::AuthState;
use crate::config::AdminConfig;
use crate::models::{Flash, session_keys};

/// Session cookie name for admin.
pub const SESSION_COOKIE_NAME: &str = "tigube_admin_session";

/// Session expiry time in seconds (24 hours of inactivity).
const SESSION_EXPIRY_SECONDS: i64 = 24 * 60 * 60;

/// Create the session layer with an in-memory store.
#[must_use]
pub fn create_session_layer(config: &AdminConfig) -> SessionManagerLayer<MemoryStore> {
    SessionManagerLayer::new(MemoryStore::default())
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(config.is_https())
        .with_same_site(tower_sessions::cookie::SameSite::Strict)
        .with_http_only(true)
        .with_path("/")
}

/// Load the stored auth state; a missing or unreadable entry is signed out.
pub async fn load_auth_state(session: &Session) -> AuthState {
    match session.get::<AuthState>(session_keys::AUTH_STATE).await {
        Ok(state) => state.unwrap_or_default(),
        Err(e) => {
            tracing::warn!(error = %e, "Stored auth state unreadable, starting fresh");
            AuthState::default()
        }
    }
}

/// Persist the auth state.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn save_auth_state(
    session: &Session,
    state: &AuthState,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::AUTH_STATE, state).await
}

/// Drop the auth state and rotate the session ID (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_auth_state(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<AuthState>(session_keys::AUTH_STATE)
        .await?;
    session.cycle_id().await
}

/// Queue a message for the next rendered page.
pub async fn push_flash(session: &Session, flash: Flash) {
    if let Err(e) = session.insert(session_keys::FLASH, flash).await {
        tracing::warn!(error = %e, "Failed to store flash message");
    }
}

/// Take the queued message, if any.
pub async fn take_flash(session: &Session) -> Option<Flash> {
    session
        .remove::<Flash>(session_keys::FLASH)
        .await
        .ok()
        .flatten()
}
