//! The bootstrap state machine.

use chrono::Utc;
use secrecy::SecretString;
use tokio::time::{sleep, timeout};
use tracing::instrument;

use super::backend::AuthBackend;
use super::backoff::next_delay;
use super::state::{AuthEvent, AuthPhase, AuthState};
use super::{AuthError, AuthTimings};

/// Drives [`AuthState`] transitions against an [`AuthBackend`].
#[derive(Debug, Clone)]
pub struct Authenticator<B> {
    backend: B,
    timings: AuthTimings,
}

impl<B: AuthBackend> Authenticator<B> {
    /// Create an authenticator.
    #[must_use]
    pub const fn new(backend: B, timings: AuthTimings) -> Self {
        Self { backend, timings }
    }

    /// The configured timings.
    #[must_use]
    pub const fn timings(&self) -> &AuthTimings {
        &self.timings
    }

    /// The backend.
    #[must_use]
    pub const fn backend(&self) -> &B {
        &self.backend
    }

    /// Establish the session and admin status for `state`.
    ///
    /// The session fetch is bounded by `session_timeout`. When it fails or
    /// times out, an already established user is kept and only the admin
    /// lookup runs; without one the state ends up signed out.
    #[instrument(skip_all, fields(user_id = ?state.user.as_ref().map(|u| u.id)))]
    pub async fn bootstrap(&self, state: &mut AuthState) {
        state.phase = AuthPhase::Initializing;

        let Some(tokens) = state.tokens.clone() else {
            state.clear();
            state.bootstrapped = true;
            return;
        };

        let fetched = timeout(
            self.timings.session_timeout,
            self.backend.current_session(&tokens),
        )
        .await
        .unwrap_or(Err(AuthError::Timeout(self.timings.session_timeout)));
        state.bootstrapped = true;

        match fetched {
            Ok(Some(session)) => {
                state.set_session(session);
                self.resolve_admin(state).await;
            }
            Ok(None) => {
                tracing::info!("Stored session no longer valid");
                state.clear();
            }
            Err(e) if state.is_signed_in() => {
                tracing::warn!(error = %e, "Session fetch failed, keeping established user");
                self.resolve_admin(state).await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Session fetch failed");
                state.clear();
            }
        }
    }

    /// Look up the admin flag with bounded retries.
    ///
    /// Each attempt races its own timeout. Timeouts and transient errors are
    /// retried after a doubling delay; a definitive answer (including "no
    /// row") resolves immediately. When no attempt succeeds the previous
    /// privilege stays in place and the phase becomes `AdminRetained`.
    #[instrument(skip_all)]
    pub async fn resolve_admin(&self, state: &mut AuthState) {
        let Some(user_id) = state.user.as_ref().map(|u| u.id) else {
            state.clear();
            return;
        };

        state.phase = AuthPhase::AdminPending;
        let attempts = self.timings.admin_check_attempts.max(1);
        let mut delay = self.timings.backoff_base;

        for attempt in 1..=attempts {
            let result = timeout(
                self.timings.admin_check_timeout,
                self.backend.lookup_admin(user_id),
            )
            .await
            .unwrap_or(Err(AuthError::Timeout(self.timings.admin_check_timeout)));

            match result {
                Ok(status) => {
                    tracing::debug!(attempt, is_admin = status.is_admin, "Admin status resolved");
                    state.set_admin(status, Utc::now());
                    return;
                }
                Err(e) if e.is_retryable() => {
                    tracing::warn!(attempt, error = %e, "Admin lookup attempt {attempt} failed");
                }
                Err(e) => {
                    tracing::warn!(attempt, error = %e, "Admin lookup failed");
                    break;
                }
            }

            if attempt < attempts {
                sleep(delay).await;
                delay = next_delay(delay, self.timings.backoff_max);
            }
        }

        tracing::warn!(
            is_admin = state.is_admin,
            "Admin lookup exhausted, keeping last known status"
        );
        state.admin_attempted_at = Some(Utc::now());
        state.phase = AuthPhase::AdminRetained;
    }

    /// Apply a session lifecycle event.
    #[instrument(skip_all, fields(event = event.name()))]
    pub async fn handle_event(&self, state: &mut AuthState, event: AuthEvent) {
        match event {
            AuthEvent::InitialSession(_) if state.bootstrapped => {
                tracing::debug!("Initial session already handled");
            }
            AuthEvent::InitialSession(session) => {
                state.bootstrapped = true;
                match session {
                    Some(session) => {
                        state.set_session(session);
                        self.resolve_admin(state).await;
                    }
                    None => state.clear(),
                }
            }
            AuthEvent::TokenRefreshed(session) => {
                let same_user = state
                    .user
                    .as_ref()
                    .is_some_and(|u| u.id == session.user.id);
                if same_user {
                    state.tokens = Some(session.tokens);
                } else {
                    tracing::debug!("Token refresh for a different user ignored");
                }
            }
            AuthEvent::SignedOut => state.clear(),
            AuthEvent::SignedIn(Some(session)) | AuthEvent::UserUpdated(Some(session)) => {
                state.bootstrapped = true;
                state.set_session(session);
                self.resolve_admin(state).await;
            }
            AuthEvent::SignedIn(None) | AuthEvent::UserUpdated(None) => {
                tracing::debug!("Auth event without session, nothing to do");
            }
        }
    }

    /// Sign in with email and password and resolve admin status.
    ///
    /// # Errors
    ///
    /// Returns `AuthError` if the backend rejects the credentials or fails.
    /// `state` is left untouched in that case.
    #[instrument(skip(self, state, password))]
    pub async fn sign_in(
        &self,
        state: &mut AuthState,
        email: &str,
        password: &SecretString,
    ) -> Result<(), AuthError> {
        let session = self.backend.sign_in_with_password(email, password).await?;
        self.handle_event(state, AuthEvent::SignedIn(Some(session)))
            .await;
        Ok(())
    }

    /// Rotate the tokens of the signed-in user.
    ///
    /// A rejected refresh token signs the user out; other failures leave the
    /// state unchanged.
    #[instrument(skip_all)]
    pub async fn refresh(&self, state: &mut AuthState) {
        let Some(tokens) = state.tokens.clone() else {
            return;
        };

        match self.backend.refresh_session(&tokens).await {
            Ok(session) => {
                self.handle_event(state, AuthEvent::TokenRefreshed(session))
                    .await;
            }
            Err(AuthError::SessionRejected) => {
                tracing::info!("Refresh token rejected, signing out");
                self.handle_event(state, AuthEvent::SignedOut).await;
            }
            Err(e) => tracing::warn!(error = %e, "Token refresh failed"),
        }
    }

    /// Sign out. The remote call is best effort; local state is always cleared.
    #[instrument(skip_all)]
    pub async fn sign_out(&self, state: &mut AuthState) {
        if let Some(tokens) = state.tokens.take() {
            let remote = timeout(self.timings.session_timeout, self.backend.sign_out(&tokens))
                .await
                .unwrap_or(Err(AuthError::Timeout(self.timings.session_timeout)));
            if let Err(e) = remote {
                tracing::warn!(error = %e, "Remote sign-out failed, clearing local session anyway");
            }
        }
        self.handle_event(state, AuthEvent::SignedOut).await;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    use tigube_core::UserId;

    use super::*;
    use crate::auth::state::{AdminStatus, SessionTokens, SessionUser, UserSession};

    /// Scripted lookup outcome.
    enum Lookup {
        Answer(AdminStatus),
        Fail(AuthError),
        Hang,
    }

    struct FakeBackend {
        session: Mutex<Option<Result<Option<UserSession>, AuthError>>>,
        session_delay: Duration,
        lookups: Mutex<VecDeque<Lookup>>,
        lookup_calls: AtomicU32,
        sign_out_fails: bool,
        sign_out_calls: AtomicU32,
    }

    impl FakeBackend {
        fn new() -> Self {
            Self {
                session: Mutex::new(None),
                session_delay: Duration::ZERO,
                lookups: Mutex::new(VecDeque::new()),
                lookup_calls: AtomicU32::new(0),
                sign_out_fails: false,
                sign_out_calls: AtomicU32::new(0),
            }
        }

        fn with_session(self, result: Result<Option<UserSession>, AuthError>) -> Self {
            *self.session.lock().unwrap() = Some(result);
            self
        }

        fn with_lookups(self, lookups: Vec<Lookup>) -> Self {
            *self.lookups.lock().unwrap() = lookups.into();
            self
        }
    }

    impl AuthBackend for FakeBackend {
        async fn current_session(
            &self,
            _tokens: &SessionTokens,
        ) -> Result<Option<UserSession>, AuthError> {
            sleep(self.session_delay).await;
            self.session
                .lock()
                .unwrap()
                .take()
                .unwrap_or(Ok(None))
        }

        async fn lookup_admin(&self, _user_id: UserId) -> Result<AdminStatus, AuthError> {
            self.lookup_calls.fetch_add(1, Ordering::SeqCst);
            let next = self.lookups.lock().unwrap().pop_front();
            match next {
                Some(Lookup::Answer(status)) => Ok(status),
                Some(Lookup::Fail(e)) => Err(e),
                Some(Lookup::Hang) | None => {
                    sleep(Duration::from_secs(3600)).await;
                    Err(AuthError::Transient("hung".to_string()))
                }
            }
        }

        async fn sign_in_with_password(
            &self,
            email: &str,
            _password: &SecretString,
        ) -> Result<UserSession, AuthError> {
            if email == "admin@tigube.de" {
                Ok(session(UserId::random()))
            } else {
                Err(AuthError::InvalidCredentials("Invalid login credentials".to_string()))
            }
        }

        async fn refresh_session(&self, _tokens: &SessionTokens) -> Result<UserSession, AuthError> {
            Err(AuthError::SessionRejected)
        }

        async fn sign_out(&self, _tokens: &SessionTokens) -> Result<(), AuthError> {
            self.sign_out_calls.fetch_add(1, Ordering::SeqCst);
            if self.sign_out_fails {
                Err(AuthError::Transient("connection reset".to_string()))
            } else {
                Ok(())
            }
        }
    }

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

    fn established_admin() -> AuthState {
        let mut state = AuthState::signed_in(session(UserId::random()));
        state.bootstrapped = true;
        state.set_admin(admin(), Utc::now());
        state
    }

    #[tokio::test(start_paused = true)]
    async fn test_bootstrap_resolves_admin() {
        let id = UserId::random();
        let backend = FakeBackend::new()
            .with_session(Ok(Some(session(id))))
            .with_lookups(vec![Lookup::Answer(admin())]);
        let auth = Authenticator::new(backend, AuthTimings::default());

        let mut state = AuthState::signed_in(session(id));
        auth.bootstrap(&mut state).await;

        assert_eq!(state.phase, AuthPhase::AdminResolved);
        assert!(state.is_admin());
        assert_eq!(state.admin_role.as_deref(), Some("admin"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_bootstrap_without_tokens_signs_out() {
        let auth = Authenticator::new(FakeBackend::new(), AuthTimings::default());
        let mut state = AuthState::default();

        auth.bootstrap(&mut state).await;

        assert_eq!(state.phase, AuthPhase::SignedOut);
        assert!(state.bootstrapped);
        assert_eq!(auth.backend().lookup_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_bootstrap_never_blocks_past_session_timeout() {
        let mut backend = FakeBackend::new().with_session(Ok(Some(session(UserId::random()))));
        backend.session_delay = Duration::from_secs(60);
        let auth = Authenticator::new(backend, AuthTimings::default());

        // Tokens present but no established user
        let mut state = AuthState::signed_in(session(UserId::random()));
        state.user = None;

        let started = tokio::time::Instant::now();
        auth.bootstrap(&mut state).await;

        assert!(started.elapsed() <= Duration::from_secs(3) + Duration::from_millis(10));
        assert_eq!(state.phase, AuthPhase::SignedOut);
    }

    #[tokio::test(start_paused = true)]
    async fn test_session_timeout_keeps_established_user() {
        let mut backend = FakeBackend::new().with_lookups(vec![Lookup::Answer(admin())]);
        backend.session_delay = Duration::from_secs(60);
        let auth = Authenticator::new(backend, AuthTimings::default());

        let mut state = established_admin();
        let user = state.user.clone();
        auth.bootstrap(&mut state).await;

        assert_eq!(state.user, user);
        assert!(state.is_admin());
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeated_timeout_retains_admin() {
        let backend =
            FakeBackend::new().with_lookups(vec![Lookup::Hang, Lookup::Hang, Lookup::Hang]);
        let auth = Authenticator::new(backend, AuthTimings::default());

        let mut state = established_admin();
        auth.resolve_admin(&mut state).await;

        assert_eq!(state.phase, AuthPhase::AdminRetained);
        assert!(state.is_admin(), "admin must not be downgraded on timeout");
        assert_eq!(auth.backend().lookup_calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_uses_backoff_and_timeouts() {
        let backend = FakeBackend::new().with_lookups(vec![
            Lookup::Hang,
            Lookup::Fail(AuthError::Transient("503".to_string())),
            Lookup::Answer(admin()),
        ]);
        let auth = Authenticator::new(backend, AuthTimings::default());

        let mut state = AuthState::signed_in(session(UserId::random()));
        let started = tokio::time::Instant::now();
        auth.resolve_admin(&mut state).await;

        // 3s timeout + 250ms backoff + immediate failure + 500ms backoff
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(3750));
        assert!(elapsed < Duration::from_millis(3800));
        assert_eq!(state.phase, AuthPhase::AdminResolved);
        assert!(state.is_admin());
    }

    #[tokio::test(start_paused = true)]
    async fn test_definitive_no_row_resolves_without_retry() {
        let backend = FakeBackend::new().with_lookups(vec![Lookup::Answer(AdminStatus::not_admin())]);
        let auth = Authenticator::new(backend, AuthTimings::default());

        let mut state = AuthState::signed_in(session(UserId::random()));
        auth.resolve_admin(&mut state).await;

        assert_eq!(state.phase, AuthPhase::AdminResolved);
        assert!(!state.is_admin());
        assert_eq!(auth.backend().lookup_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_retryable_error_retains_without_retry() {
        let backend = FakeBackend::new()
            .with_lookups(vec![Lookup::Fail(AuthError::Backend("permission denied".to_string()))]);
        let auth = Authenticator::new(backend, AuthTimings::default());

        let mut state = established_admin();
        auth.resolve_admin(&mut state).await;

        assert_eq!(state.phase, AuthPhase::AdminRetained);
        assert!(state.is_admin());
        assert_eq!(auth.backend().lookup_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_token_refresh_changes_tokens_only() {
        let auth = Authenticator::new(FakeBackend::new(), AuthTimings::default());
        let mut state = established_admin();
        let user = state.user.clone().unwrap();

        let mut refreshed = session(user.id);
        refreshed.tokens = SessionTokens::new("new".to_string(), "new-r".to_string(), 42);
        auth.handle_event(&mut state, AuthEvent::TokenRefreshed(refreshed))
            .await;

        assert_eq!(state.tokens.as_ref().unwrap().expires_at, 42);
        assert_eq!(state.user.as_ref(), Some(&user));
        assert!(state.is_admin());
        assert_eq!(auth.backend().lookup_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_initial_session_ignored_after_bootstrap() {
        let auth = Authenticator::new(FakeBackend::new(), AuthTimings::default());
        let mut state = established_admin();
        let before = state.clone();

        auth.handle_event(&mut state, AuthEvent::InitialSession(None))
            .await;

        assert_eq!(state, before);
    }

    #[tokio::test(start_paused = true)]
    async fn test_event_without_session_is_noop() {
        let auth = Authenticator::new(FakeBackend::new(), AuthTimings::default());
        let mut state = established_admin();
        let before = state.clone();

        auth.handle_event(&mut state, AuthEvent::UserUpdated(None))
            .await;

        assert_eq!(state, before);
    }

    #[tokio::test(start_paused = true)]
    async fn test_signed_out_event_clears() {
        let auth = Authenticator::new(FakeBackend::new(), AuthTimings::default());
        let mut state = established_admin();

        auth.handle_event(&mut state, AuthEvent::SignedOut).await;

        assert!(!state.is_signed_in());
        assert!(!state.is_admin);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sign_out_clears_even_when_remote_fails() {
        let mut backend = FakeBackend::new();
        backend.sign_out_fails = true;
        let auth = Authenticator::new(backend, AuthTimings::default());
        let mut state = established_admin();

        auth.sign_out(&mut state).await;

        assert_eq!(auth.backend().sign_out_calls.load(Ordering::SeqCst), 1);
        assert_eq!(state.phase, AuthPhase::SignedOut);
        assert!(state.tokens.is_none());
        assert!(!state.is_admin);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sign_in_rejected_leaves_state() {
        let auth = Authenticator::new(FakeBackend::new(), AuthTimings::default());
        let mut state = AuthState::default();

        let result = auth
            .sign_in(&mut state, "someone@tigube.de", &SecretString::from("pw"))
            .await;

        assert!(matches!(result, Err(AuthError::InvalidCredentials(_))));
        assert_eq!(state, AuthState::default());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sign_in_resolves_admin() {
        let backend = FakeBackend::new().with_lookups(vec![Lookup::Answer(admin())]);
        let auth = Authenticator::new(backend, AuthTimings::default());
        let mut state = AuthState::default();

        auth.sign_in(&mut state, "admin@tigube.de", &SecretString::from("pw"))
            .await
            .unwrap();

        assert!(state.bootstrapped);
        assert!(state.is_admin());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejected_refresh_signs_out() {
        let auth = Authenticator::new(FakeBackend::new(), AuthTimings::default());
        let mut state = established_admin();

        auth.refresh(&mut state).await;

        assert!(!state.is_signed_in());
    }
}
