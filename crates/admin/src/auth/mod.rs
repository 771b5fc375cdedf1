//! Admin session bootstrap.
//!
//! Every protected request carries an [`AuthState`] in its cookie session.
//! The [`Authenticator`] drives that state through:
//!
//! ```text
//! Initializing ─┬─ no session ──────────────▶ SignedOut
//!               └─ session found ─▶ AdminPending ─┬─▶ AdminResolved
//!                                                 └─▶ AdminRetained (lookup failed,
//!                                                     last known privilege kept)
//! ```
//!
//! The session fetch is raced against a timeout so a slow backend never
//! blocks a page. The admin lookup retries transient failures with capped
//! exponential backoff, and when all attempts fail the previously known
//! privilege is kept rather than silently downgraded.

mod authenticator;
mod backend;
mod backoff;
mod state;

pub use authenticator::Authenticator;
pub use backend::{AuthBackend, SupabaseAuthBackend};
pub use backoff::next_delay;
pub use state::{AdminStatus, AuthEvent, AuthPhase, AuthState, SessionTokens, SessionUser, UserSession};

use std::time::Duration;

use thiserror::Error;

use crate::supabase::SupabaseError;

/// Timing knobs for the bootstrap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthTimings {
    /// Upper bound on fetching the current session.
    pub session_timeout: Duration,
    /// Upper bound on a single admin lookup attempt.
    pub admin_check_timeout: Duration,
    /// Number of admin lookup attempts (including the first).
    pub admin_check_attempts: u32,
    /// Delay before the first retry.
    pub backoff_base: Duration,
    /// Maximum delay between retries.
    pub backoff_max: Duration,
    /// Re-run the bootstrap once the last admin lookup is this old.
    pub admin_recheck_interval: Duration,
}

impl Default for AuthTimings {
    fn default() -> Self {
        Self {
            session_timeout: Duration::from_secs(3),
            admin_check_timeout: Duration::from_secs(3),
            admin_check_attempts: 3,
            backoff_base: Duration::from_millis(250),
            backoff_max: Duration::from_secs(2),
            admin_recheck_interval: Duration::from_secs(5 * 60),
        }
    }
}

/// Errors surfaced by an [`AuthBackend`].
#[derive(Debug, Error)]
pub enum AuthError {
    /// The call did not finish in time.
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// Network or server trouble; retrying may help.
    #[error("backend unavailable: {0}")]
    Transient(String),

    /// Email/password rejected.
    #[error("invalid credentials: {0}")]
    InvalidCredentials(String),

    /// Access or refresh token no longer accepted.
    #[error("session rejected")]
    SessionRejected,

    /// Any other backend failure.
    #[error("backend error: {0}")]
    Backend(String),
}

impl AuthError {
    /// Whether the admin lookup should be retried after this error.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout(_) | Self::Transient(_))
    }
}

impl From<SupabaseError> for AuthError {
    fn from(err: SupabaseError) -> Self {
        if err.is_transient() {
            return Self::Transient(err.to_string());
        }
        match err {
            SupabaseError::AuthenticationFailed(message) => Self::InvalidCredentials(message),
            SupabaseError::Unauthorized => Self::SessionRejected,
            other => Self::Backend(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_timings() {
        let timings = AuthTimings::default();
        assert_eq!(timings.session_timeout, Duration::from_secs(3));
        assert_eq!(timings.admin_check_timeout, Duration::from_secs(3));
        assert_eq!(timings.admin_check_attempts, 3);
        assert_eq!(timings.admin_recheck_interval, Duration::from_secs(300));
    }

    #[test]
    fn test_supabase_error_mapping() {
        let transient = SupabaseError::Api {
            status: 503,
            code: None,
            message: "unavailable".to_string(),
        };
        assert!(AuthError::from(transient).is_retryable());

        assert!(matches!(
            AuthError::from(SupabaseError::Unauthorized),
            AuthError::SessionRejected
        ));
        assert!(matches!(
            AuthError::from(SupabaseError::AuthenticationFailed("nope".to_string())),
            AuthError::InvalidCredentials(_)
        ));

        let definitive = AuthError::from(SupabaseError::Parse("bad".to_string()));
        assert!(!definitive.is_retryable());
    }
}
