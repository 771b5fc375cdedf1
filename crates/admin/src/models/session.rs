//! Session-related types for admin authentication.
//!
//! Types stored in the session for authentication state.

use serde::{Deserialize, Serialize};

use tigube_core::UserId;

use crate::auth::AuthState;

/// The admin a protected request runs as.
///
/// Derived from the stored [`AuthState`] by the route guard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentAdmin {
    /// User ID (`users.id`).
    pub id: UserId,
    /// Email address, if known.
    pub email: Option<String>,
    /// Admin role (`admin` when unset).
    pub role: String,
}

impl CurrentAdmin {
    /// Build from a state that is signed in with admin privilege.
    #[must_use]
    pub fn from_state(state: &AuthState) -> Option<Self> {
        if !state.is_admin() {
            return None;
        }
        let user = state.user.as_ref()?;
        Some(Self {
            id: user.id,
            email: user.email.clone(),
            role: state
                .admin_role
                .clone()
                .unwrap_or_else(|| "admin".to_string()),
        })
    }

    /// Name shown in the header.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.email.as_deref().unwrap_or("Admin")
    }
}

/// Severity of a flash message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlashKind {
    Success,
    Error,
}

/// One-shot message shown after a redirect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub kind: FlashKind,
    pub message: String,
}

impl Flash {
    /// A success notice.
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Success,
            message: message.into(),
        }
    }

    /// An error notice.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Error,
            message: message.into(),
        }
    }

    /// Whether this is an error.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.kind == FlashKind::Error
    }
}

/// Session keys for admin authentication data.
pub mod keys {
    /// Key for the per-browser [`AuthState`](crate::auth::AuthState).
    pub const AUTH_STATE: &str = "auth_state";

    /// Key for the pending flash message.
    pub const FLASH: &str = "flash";
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::auth::{AdminStatus, SessionTokens, SessionUser, UserSession};
    use chrono::Utc;

    fn signed_in() -> AuthState {
        AuthState::signed_in(UserSession {
            user: SessionUser {
                id: UserId::random(),
                email: Some("admin@tigube.de".to_string()),
            },
            tokens: SessionTokens::new("a".to_string(), "r".to_string(), 0),
        })
    }

    #[test]
    fn test_requires_admin_privilege() {
        let state = signed_in();
        assert!(CurrentAdmin::from_state(&state).is_none());
        assert!(CurrentAdmin::from_state(&AuthState::default()).is_none());
    }

    #[test]
    fn test_role_defaults_to_admin() {
        let mut state = signed_in();
        state.set_admin(
            AdminStatus {
                is_admin: true,
                role: None,
            },
            Utc::now(),
        );
        let admin = CurrentAdmin::from_state(&state).unwrap();
        assert_eq!(admin.role, "admin");
        assert_eq!(admin.display_name(), "admin@tigube.de");
    }
}
