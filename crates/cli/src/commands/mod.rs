//! Command implementations.

pub mod stats;
pub mod subscriptions;
pub mod users;

use thiserror::Error;

use tigube_admin::config::{ConfigError, SupabaseConfig};
use tigube_admin::db::RepositoryError;
use tigube_admin::supabase::{SupabaseClient, SupabaseError};
use tigube_core::EmailError;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CliError {
    /// Environment is incomplete or invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Backend call failed.
    #[error("Backend error: {0}")]
    Supabase(#[from] SupabaseError),

    /// Repository operation failed.
    #[error("{0}")]
    Repository(#[from] RepositoryError),

    /// Email argument did not parse.
    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// No user with this email.
    #[error("No user found with email: {0}")]
    UserNotFound(String),

    /// Writing output failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Build a backend client from the environment.
///
/// # Errors
///
/// Returns `CliError::Config` for missing variables and
/// `CliError::Supabase` if the HTTP client cannot be built.
pub fn connect() -> Result<SupabaseClient, CliError> {
    dotenvy::dotenv().ok();
    let config = SupabaseConfig::from_env()?;
    if !config.has_service_role() {
        tracing::warn!("SUPABASE_SERVICE_ROLE_KEY not set, writes may be rejected");
    }
    Ok(SupabaseClient::new(&config)?)
}
