//! Application state shared across handlers.

use std::sync::Arc;

use crate::auth::{Authenticator, SupabaseAuthBackend};
use crate::config::AdminConfig;
use crate::supabase::{SupabaseClient, SupabaseError};

/// Application state shared across all handlers.
///
/// Cheap to clone; everything lives behind one `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AdminConfig,
    supabase: SupabaseClient,
    authenticator: Authenticator<SupabaseAuthBackend>,
}

impl AppState {
    /// Build the backend client and authenticator from configuration.
    ///
    /// # Errors
    ///
    /// Returns `SupabaseError::Http` if the HTTP client cannot be built.
    pub fn new(config: AdminConfig) -> Result<Self, SupabaseError> {
        let supabase = SupabaseClient::new(&config.supabase)?;
        Ok(Self::from_parts(config, supabase))
    }

    /// Assemble state around an existing client.
    #[must_use]
    pub fn from_parts(config: AdminConfig, supabase: SupabaseClient) -> Self {
        let authenticator = Authenticator::new(
            SupabaseAuthBackend::new(supabase.clone()),
            config.auth_timings,
        );
        Self {
            inner: Arc::new(AppStateInner {
                config,
                supabase,
                authenticator,
            }),
        }
    }

    /// Admin configuration.
    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    /// Backend client.
    #[must_use]
    pub fn supabase(&self) -> &SupabaseClient {
        &self.inner.supabase
    }

    /// Session bootstrap driver.
    #[must_use]
    pub fn authenticator(&self) -> &Authenticator<SupabaseAuthBackend> {
        &self.inner.authenticator
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("supabase", &self.inner.supabase)
            .finish_non_exhaustive()
    }
}
