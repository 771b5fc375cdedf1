//! Per-browser authentication state, stored in the cookie session.

use std::time::Duration;

use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use tigube_core::UserId;

/// Clock skew tolerated when checking token expiry, in seconds.
const EXPIRY_SKEW_SECS: i64 = 60;

/// Where the bootstrap currently stands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthPhase {
    /// Nothing resolved yet.
    #[default]
    Initializing,
    /// No session.
    SignedOut,
    /// Session found, admin lookup running.
    AdminPending,
    /// Admin lookup answered definitively.
    AdminResolved,
    /// Admin lookup failed; last known privilege kept.
    AdminRetained,
}

/// The signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    /// User ID (`users.id`).
    pub id: UserId,
    /// Email address, if known.
    pub email: Option<String>,
}

/// Access and refresh tokens.
///
/// Serialized into the server-side session store only; never rendered.
/// `Debug` is redacted.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionTokens {
    access_token: String,
    refresh_token: String,
    /// Unix timestamp when the access token expires.
    pub expires_at: i64,
}

impl std::fmt::Debug for SessionTokens {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionTokens")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

impl SessionTokens {
    /// Create a token pair.
    #[must_use]
    pub fn new(access_token: String, refresh_token: String, expires_at: i64) -> Self {
        Self {
            access_token,
            refresh_token,
            expires_at,
        }
    }

    /// Access token as a secret.
    #[must_use]
    pub fn access_token(&self) -> SecretString {
        SecretString::from(self.access_token.clone())
    }

    /// Refresh token as a secret.
    #[must_use]
    pub fn refresh_token(&self) -> SecretString {
        SecretString::from(self.refresh_token.clone())
    }

    /// Check if the access token is expired (with clock skew).
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_within(EXPIRY_SKEW_SECS)
    }

    /// Check if the access token expires within `seconds`.
    #[must_use]
    pub fn expires_within(&self, seconds: i64) -> bool {
        Utc::now().timestamp() >= self.expires_at - seconds
    }
}

/// A session as reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserSession {
    /// The signed-in user.
    pub user: SessionUser,
    /// Current tokens.
    pub tokens: SessionTokens,
}

/// Answer of an admin lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminStatus {
    /// `users.is_admin`
    pub is_admin: bool,
    /// `users.admin_role`
    pub role: Option<String>,
}

impl AdminStatus {
    /// The user has no admin row or the flag is off.
    #[must_use]
    pub const fn not_admin() -> Self {
        Self {
            is_admin: false,
            role: None,
        }
    }
}

/// Session lifecycle notifications.
#[derive(Debug, Clone)]
pub enum AuthEvent {
    /// First session report after start-up.
    InitialSession(Option<UserSession>),
    /// A user signed in.
    SignedIn(Option<UserSession>),
    /// The session ended.
    SignedOut,
    /// Tokens were rotated for the same user.
    TokenRefreshed(UserSession),
    /// Profile data of the signed-in user changed.
    UserUpdated(Option<UserSession>),
}

impl AuthEvent {
    /// Event name for logging.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::InitialSession(_) => "INITIAL_SESSION",
            Self::SignedIn(_) => "SIGNED_IN",
            Self::SignedOut => "SIGNED_OUT",
            Self::TokenRefreshed(_) => "TOKEN_REFRESHED",
            Self::UserUpdated(_) => "USER_UPDATED",
        }
    }
}

/// Authentication state of one browser session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthState {
    /// Bootstrap phase.
    pub phase: AuthPhase,
    /// Signed-in user, if any.
    pub user: Option<SessionUser>,
    /// Tokens of the signed-in user.
    pub tokens: Option<SessionTokens>,
    /// Last known admin flag.
    pub is_admin: bool,
    /// Last known admin role.
    pub admin_role: Option<String>,
    /// When the admin flag was last answered definitively.
    pub admin_checked_at: Option<DateTime<Utc>>,
    /// When an admin lookup last ran, successful or not.
    pub admin_attempted_at: Option<DateTime<Utc>>,
    /// Whether the initial bootstrap has completed.
    pub bootstrapped: bool,
}

impl AuthState {
    /// State right after a successful password sign-in, before the admin lookup.
    #[must_use]
    pub fn signed_in(session: UserSession) -> Self {
        let mut state = Self::default();
        state.set_session(session);
        state
    }

    /// Whether a user is signed in.
    #[must_use]
    pub const fn is_signed_in(&self) -> bool {
        self.user.is_some()
    }

    /// Whether the signed-in user is (last known to be) an admin.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.user.is_some() && self.is_admin
    }

    /// Store a session. Admin data is reset when the user changes.
    pub fn set_session(&mut self, session: UserSession) {
        let same_user = self
            .user
            .as_ref()
            .is_some_and(|u| u.id == session.user.id);
        if !same_user {
            self.is_admin = false;
            self.admin_role = None;
            self.admin_checked_at = None;
            self.admin_attempted_at = None;
        }
        self.user = Some(session.user);
        self.tokens = Some(session.tokens);
    }

    /// Forget the user, tokens and privilege.
    pub fn clear(&mut self) {
        *self = Self {
            phase: AuthPhase::SignedOut,
            bootstrapped: self.bootstrapped,
            ..Self::default()
        };
    }

    /// Record a definitive admin answer.
    pub fn set_admin(&mut self, status: AdminStatus, now: DateTime<Utc>) {
        self.is_admin = status.is_admin;
        self.admin_role = status.role;
        self.admin_checked_at = Some(now);
        self.admin_attempted_at = Some(now);
        self.phase = AuthPhase::AdminResolved;
    }

    /// Whether the bootstrap should run (again) for this request.
    #[must_use]
    pub fn needs_bootstrap(&self, now: DateTime<Utc>, recheck_interval: Duration) -> bool {
        if !self.bootstrapped {
            return true;
        }
        if matches!(self.phase, AuthPhase::Initializing | AuthPhase::AdminPending) {
            return true;
        }
        self.admin_attempted_at.is_none_or(|at| {
            (now - at)
                .to_std()
                .map_or(true, |elapsed| elapsed >= recheck_interval)
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn session(id: UserId) -> UserSession {
        UserSession {
            user: SessionUser {
                id,
                email: Some("admin@tigube.de".to_string()),
            },
            tokens: SessionTokens::new(
                "access".to_string(),
                "refresh".to_string(),
                Utc::now().timestamp() + 3600,
            ),
        }
    }

    fn admin() -> AdminStatus {
        AdminStatus {
            is_admin: true,
            role: Some("admin".to_string()),
        }
    }

    #[test]
    fn test_tokens_debug_redacted() {
        let tokens = SessionTokens::new("abc.def".to_string(), "r-123".to_string(), 0);
        let output = format!("{tokens:?}");
        assert!(output.contains("[REDACTED]"));
        assert!(!output.contains("abc.def"));
        assert!(!output.contains("r-123"));
    }

    #[test]
    fn test_token_expiry() {
        let now = Utc::now().timestamp();
        assert!(SessionTokens::new(String::new(), String::new(), now + 30).is_expired());
        assert!(!SessionTokens::new(String::new(), String::new(), now + 3600).is_expired());
    }

    #[test]
    fn test_same_user_keeps_admin() {
        let id = UserId::random();
        let mut state = AuthState::signed_in(session(id));
        state.set_admin(admin(), Utc::now());

        state.set_session(session(id));
        assert!(state.is_admin());
    }

    #[test]
    fn test_other_user_resets_admin() {
        let mut state = AuthState::signed_in(session(UserId::random()));
        state.set_admin(admin(), Utc::now());

        state.set_session(session(UserId::random()));
        assert!(!state.is_admin());
        assert!(state.admin_checked_at.is_none());
    }

    #[test]
    fn test_clear_keeps_bootstrapped_flag() {
        let mut state = AuthState::signed_in(session(UserId::random()));
        state.bootstrapped = true;
        state.set_admin(admin(), Utc::now());

        state.clear();
        assert_eq!(state.phase, AuthPhase::SignedOut);
        assert!(state.bootstrapped);
        assert!(!state.is_signed_in());
        assert!(!state.is_admin);
        assert!(state.tokens.is_none());
    }

    #[test]
    fn test_needs_bootstrap() {
        let interval = Duration::from_secs(300);
        let now = Utc::now();
        let mut state = AuthState::signed_in(session(UserId::random()));
        assert!(state.needs_bootstrap(now, interval));

        state.bootstrapped = true;
        state.set_admin(admin(), now);
        assert!(!state.needs_bootstrap(now, interval));
        assert!(state.needs_bootstrap(now + chrono::Duration::seconds(301), interval));
    }

    #[test]
    fn test_serde_round_trip_in_session_store() {
        let mut state = AuthState::signed_in(session(UserId::random()));
        state.set_admin(admin(), Utc::now());
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["phase"], "admin_resolved");
        let back: AuthState = serde_json::from_value(json).unwrap();
        assert_eq!(back, state);
    }
}
