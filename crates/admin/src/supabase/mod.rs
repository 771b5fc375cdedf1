//! Supabase backend client.
//!
//! The admin panel owns no database. Every read and write goes through the
//! hosted backend:
//!
//! - `PostgREST` (`/rest/v1`) for tables and views
//! - `GoTrue` (`/auth/v1`) for password sign-in and session validation
//! - Storage (`/storage/v1`) for advertisement images
//!
//! # Keys
//!
//! Table and storage calls use the service role key when configured and fall
//! back to the anon key otherwise. Auth calls always send the anon key as
//! `apikey` plus the user's access token where one is required.

mod auth;
mod client;
mod query;
mod storage;

pub use auth::{AuthSession, AuthUser};
pub use client::SupabaseClient;
pub use query::{Query, escape_search_term, parse_content_range};

use thiserror::Error;

/// `PostgREST` error code for "JSON object requested, multiple (or no) rows returned".
pub const NO_ROWS_CODE: &str = "PGRST116";

/// Postgres `unique_violation`.
pub const UNIQUE_VIOLATION_CODE: &str = "23505";

/// Errors that can occur when talking to Supabase.
#[derive(Debug, Error)]
pub enum SupabaseError {
    /// Transport-level failure (connect, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with an error body.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// `PostgREST` or `GoTrue` error code, when present.
        code: Option<String>,
        /// Human readable message.
        message: String,
    },

    /// Response body could not be decoded.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Requested object does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Sign-in was rejected.
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Access token missing, expired or revoked.
    #[error("Unauthorized")]
    Unauthorized,
}

impl SupabaseError {
    /// Whether this is `PostgREST`'s "no rows" answer to a single-object request.
    #[must_use]
    pub fn is_no_rows(&self) -> bool {
        matches!(self, Self::Api { code: Some(code), .. } if code == NO_ROWS_CODE)
    }

    /// Whether the write hit a unique constraint.
    #[must_use]
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, Self::Api { code: Some(code), .. } if code == UNIQUE_VIOLATION_CODE)
    }

    /// Whether a retry may succeed (network failures, 5xx, rate limiting).
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            Self::Api { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(status: u16, code: Option<&str>) -> SupabaseError {
        SupabaseError::Api {
            status,
            code: code.map(String::from),
            message: "boom".to_string(),
        }
    }

    #[test]
    fn test_no_rows_detection() {
        assert!(api(406, Some("PGRST116")).is_no_rows());
        assert!(!api(406, Some("PGRST100")).is_no_rows());
        assert!(!api(500, None).is_no_rows());
        assert!(!SupabaseError::NotFound("users".to_string()).is_no_rows());
    }

    #[test]
    fn test_unique_violation_detection() {
        assert!(api(409, Some("23505")).is_unique_violation());
        assert!(!api(409, Some("23503")).is_unique_violation());
    }

    #[test]
    fn test_transient_classification() {
        assert!(api(503, None).is_transient());
        assert!(api(429, None).is_transient());
        assert!(!api(400, Some("22P02")).is_transient());
        assert!(!SupabaseError::Unauthorized.is_transient());
        assert!(!SupabaseError::Parse("bad json".to_string()).is_transient());
    }

    #[test]
    fn test_error_display() {
        assert_eq!(api(500, None).to_string(), "API error (500): boom");
    }
}
