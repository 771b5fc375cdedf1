//! The backend seam of the authenticator.

use std::future::Future;

use secrecy::SecretString;
use serde::Deserialize;

use tigube_core::UserId;

use super::AuthError;
use super::state::{AdminStatus, SessionTokens, SessionUser, UserSession};
use crate::supabase::{AuthSession, Query, SupabaseClient};

/// Operations the bootstrap needs from the auth provider.
///
/// Implemented for Supabase below and by in-memory fakes in tests.
pub trait AuthBackend: Send + Sync {
    /// Validate stored tokens and return the session they belong to.
    ///
    /// `Ok(None)` means the tokens are no longer accepted.
    fn current_session(
        &self,
        tokens: &SessionTokens,
    ) -> impl Future<Output = Result<Option<UserSession>, AuthError>> + Send;

    /// Look up the admin flag of a user. A missing row is `is_admin: false`.
    fn lookup_admin(
        &self,
        user_id: UserId,
    ) -> impl Future<Output = Result<AdminStatus, AuthError>> + Send;

    /// Password sign-in.
    fn sign_in_with_password(
        &self,
        email: &str,
        password: &SecretString,
    ) -> impl Future<Output = Result<UserSession, AuthError>> + Send;

    /// Rotate tokens.
    fn refresh_session(
        &self,
        tokens: &SessionTokens,
    ) -> impl Future<Output = Result<UserSession, AuthError>> + Send;

    /// Revoke the session server-side.
    fn sign_out(&self, tokens: &SessionTokens) -> impl Future<Output = Result<(), AuthError>> + Send;
}

/// [`AuthBackend`] backed by `GoTrue` and the `users` table.
#[derive(Debug, Clone)]
pub struct SupabaseAuthBackend {
    client: SupabaseClient,
}

impl SupabaseAuthBackend {
    /// Wrap a client.
    #[must_use]
    pub const fn new(client: SupabaseClient) -> Self {
        Self { client }
    }
}

#[derive(Deserialize)]
struct AdminRow {
    #[serde(default)]
    is_admin: Option<bool>,
    #[serde(default)]
    admin_role: Option<String>,
}

impl From<AuthSession> for UserSession {
    fn from(session: AuthSession) -> Self {
        use secrecy::ExposeSecret;

        Self {
            user: SessionUser {
                id: session.user.id,
                email: session.user.email,
            },
            tokens: SessionTokens::new(
                session.access_token.expose_secret().to_string(),
                session.refresh_token.expose_secret().to_string(),
                session.expires_at,
            ),
        }
    }
}

impl AuthBackend for SupabaseAuthBackend {
    async fn current_session(
        &self,
        tokens: &SessionTokens,
    ) -> Result<Option<UserSession>, AuthError> {
        if tokens.is_expired() {
            return match self.client.refresh_session(&tokens.refresh_token()).await {
                Ok(session) => Ok(Some(session.into())),
                Err(crate::supabase::SupabaseError::Unauthorized) => Ok(None),
                Err(e) => Err(e.into()),
            };
        }

        match self.client.get_user(&tokens.access_token()).await {
            Ok(user) => Ok(Some(UserSession {
                user: SessionUser {
                    id: user.id,
                    email: user.email,
                },
                tokens: tokens.clone(),
            })),
            Err(crate::supabase::SupabaseError::Unauthorized) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn lookup_admin(&self, user_id: UserId) -> Result<AdminStatus, AuthError> {
        let query = Query::select("is_admin, admin_role").eq("id", user_id);
        match self.client.maybe_single::<AdminRow>("users", &query).await? {
            Some(row) => Ok(AdminStatus {
                is_admin: row.is_admin.unwrap_or(false),
                role: row.admin_role,
            }),
            None => Ok(AdminStatus::not_admin()),
        }
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<UserSession, AuthError> {
        let session = self.client.sign_in_with_password(email, password).await?;
        Ok(session.into())
    }

    async fn refresh_session(&self, tokens: &SessionTokens) -> Result<UserSession, AuthError> {
        let session = self.client.refresh_session(&tokens.refresh_token()).await?;
        Ok(session.into())
    }

    async fn sign_out(&self, tokens: &SessionTokens) -> Result<(), AuthError> {
        self.client.sign_out(&tokens.access_token()).await?;
        Ok(())
    }
}
