//! `GoTrue` authentication endpoints.
//!
//! Password sign-in, session validation, token refresh and sign-out.

use reqwest::{Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use tigube_core::UserId;

use super::client::{check, decode};
use super::{SupabaseClient, SupabaseError};

/// Clock skew tolerated when checking expiry, in seconds.
const EXPIRY_SKEW_SECS: i64 = 60;

/// Authenticated user as returned by `GoTrue`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    /// User ID (same as `users.id`).
    pub id: UserId,
    /// Email address, if the account has one.
    #[serde(default)]
    pub email: Option<String>,
}

/// A signed-in session.
#[derive(Debug, Clone)]
pub struct AuthSession {
    /// JWT access token.
    pub access_token: SecretString,
    /// Refresh token for obtaining new access tokens.
    pub refresh_token: SecretString,
    /// Unix timestamp when the access token expires.
    pub expires_at: i64,
    /// The signed-in user.
    pub user: AuthUser,
}

impl AuthSession {
    /// Check if the access token is expired (with clock skew).
    #[must_use]
    pub fn is_expired(&self) -> bool {
        chrono::Utc::now().timestamp() >= self.expires_at - EXPIRY_SKEW_SECS
    }

    /// Check if the access token expires within `seconds`.
    #[must_use]
    pub fn expires_within(&self, seconds: i64) -> bool {
        chrono::Utc::now().timestamp() >= self.expires_at - seconds
    }
}

/// Token endpoint response.
#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    /// Token lifetime in seconds.
    expires_in: i64,
    #[serde(default)]
    expires_at: Option<i64>,
    user: AuthUser,
}

impl From<TokenResponse> for AuthSession {
    fn from(response: TokenResponse) -> Self {
        let expires_at = response
            .expires_at
            .unwrap_or_else(|| chrono::Utc::now().timestamp() + response.expires_in);
        Self {
            access_token: SecretString::from(response.access_token),
            refresh_token: SecretString::from(response.refresh_token),
            expires_at,
            user: response.user,
        }
    }
}

#[derive(Serialize)]
struct PasswordGrant<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct RefreshGrant<'a> {
    refresh_token: &'a str,
}

impl SupabaseClient {
    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns `SupabaseError::AuthenticationFailed` if the credentials are
    /// rejected, other variants for transport or service failures.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<AuthSession, SupabaseError> {
        let response = self
            .auth_request(Method::POST, &self.auth_url("token?grant_type=password"), None)
            .json(&PasswordGrant {
                email,
                password: password.expose_secret(),
            })
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::BAD_REQUEST || status == StatusCode::UNAUTHORIZED {
            let message = match check(response).await {
                Err(SupabaseError::Api { message, .. }) => message,
                _ => "Invalid login credentials".to_string(),
            };
            return Err(SupabaseError::AuthenticationFailed(message));
        }

        let token: TokenResponse = decode(check(response).await?).await?;
        Ok(token.into())
    }

    /// Exchange a refresh token for a new session.
    ///
    /// # Errors
    ///
    /// Returns `SupabaseError::Unauthorized` when the refresh token is no
    /// longer valid.
    #[instrument(skip(self, refresh_token))]
    pub async fn refresh_session(
        &self,
        refresh_token: &SecretString,
    ) -> Result<AuthSession, SupabaseError> {
        let response = self
            .auth_request(
                Method::POST,
                &self.auth_url("token?grant_type=refresh_token"),
                None,
            )
            .json(&RefreshGrant {
                refresh_token: refresh_token.expose_secret(),
            })
            .send()
            .await?;

        // GoTrue answers 400 for revoked or reused refresh tokens
        if response.status() == StatusCode::BAD_REQUEST {
            return Err(SupabaseError::Unauthorized);
        }

        let token: TokenResponse = decode(check(response).await?).await?;
        Ok(token.into())
    }

    /// Fetch the user an access token belongs to.
    ///
    /// # Errors
    ///
    /// Returns `SupabaseError::Unauthorized` for expired or revoked tokens.
    #[instrument(skip(self, access_token))]
    pub async fn get_user(&self, access_token: &SecretString) -> Result<AuthUser, SupabaseError> {
        let response = self
            .auth_request(Method::GET, &self.auth_url("user"), Some(access_token))
            .send()
            .await?;
        decode(check(response).await?).await
    }

    /// Revoke the session server-side.
    ///
    /// # Errors
    ///
    /// Returns `SupabaseError` on transport or service failures.
    #[instrument(skip(self, access_token))]
    pub async fn sign_out(&self, access_token: &SecretString) -> Result<(), SupabaseError> {
        let response = self
            .auth_request(Method::POST, &self.auth_url("logout"), Some(access_token))
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn session(expires_in: i64) -> AuthSession {
        AuthSession {
            access_token: SecretString::from("access"),
            refresh_token: SecretString::from("refresh"),
            expires_at: chrono::Utc::now().timestamp() + expires_in,
            user: AuthUser {
                id: UserId::random(),
                email: None,
            },
        }
    }

    #[test]
    fn test_expiry_includes_skew() {
        assert!(!session(3600).is_expired());
        assert!(session(30).is_expired());
        assert!(session(-10).is_expired());
    }

    #[test]
    fn test_expires_within() {
        let s = session(200);
        assert!(s.expires_within(300));
        assert!(!s.expires_within(100));
    }

    #[test]
    fn test_token_response_without_expires_at() {
        let json = serde_json::json!({
            "access_token": "a",
            "refresh_token": "r",
            "expires_in": 3600,
            "token_type": "bearer",
            "user": {"id": "67e55044-10b1-426f-9247-bb680e5fe0c8", "email": "admin@tigube.de", "aud": "authenticated"}
        });
        let response: TokenResponse = serde_json::from_value(json).unwrap();
        let session = AuthSession::from(response);
        assert!(!session.is_expired());
        assert_eq!(session.user.email.as_deref(), Some("admin@tigube.de"));
        assert_eq!(
            session.user.id.to_string(),
            "67e55044-10b1-426f-9247-bb680e5fe0c8"
        );
    }
}
