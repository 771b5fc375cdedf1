//! Table repositories over the hosted backend.
//!
//! # Tables
//!
//! - `users` - Platform accounts (owners, caretakers, service providers, admins)
//! - `caretaker_profiles` - Approval state of caretakers and service providers
//! - `advertisements`, `advertisement_formats` - Ads and their display formats
//!   (joined by the `advertisements_with_formats` view)
//! - `reviews`, `support_tickets` - Content under moderation
//! - `subscriptions` - Billing state written by the payment provider
//! - `blog_posts` - Public blog content
//! - `verification_requests` - Identity verification submissions
//! - `conversations`, `messages` - Counted only
//!
//! Repositories borrow the [`SupabaseClient`](crate::supabase::SupabaseClient)
//! and translate rows into the types in [`crate::models`].

pub mod advertisements;
pub mod analytics;
pub mod blog;
pub mod content;
pub mod dashboard;
pub mod subscriptions;
pub mod users;
pub mod verification;

use thiserror::Error;

use crate::supabase::SupabaseError;

pub use advertisements::{AdvertisementRepository, ImageUpload};
pub use analytics::AnalyticsRepository;
pub use blog::BlogRepository;
pub use content::ContentRepository;
pub use dashboard::DashboardRepository;
pub use subscriptions::SubscriptionRepository;
pub use users::UserRepository;
pub use verification::VerificationRepository;

/// A page of rows plus the exact total.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub rows: Vec<T>,
    pub total: u64,
}

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Backend call failed.
    #[error("backend error: {0}")]
    Backend(#[from] SupabaseError),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Input rejected before it reached the backend.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The backend answered with something unusable.
    #[error("data corruption: {0}")]
    DataCorruption(String),
}

impl RepositoryError {
    /// Map PostgREST "no rows" to [`RepositoryError::NotFound`].
    pub(crate) fn from_single(err: SupabaseError) -> Self {
        if err.is_no_rows() {
            Self::NotFound
        } else {
            Self::Backend(err)
        }
    }
}

/// Inclusive row range of a 1-based page.
#[must_use]
pub const fn page_range(page: u64, per_page: u64) -> (u64, u64) {
    let page = if page == 0 { 1 } else { page };
    let per_page = if per_page == 0 { 1 } else { per_page };
    let from = (page - 1) * per_page;
    (from, from + per_page - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_range() {
        assert_eq!(page_range(1, 50), (0, 49));
        assert_eq!(page_range(3, 20), (40, 59));
        assert_eq!(page_range(0, 20), (0, 19));
    }

    #[test]
    fn test_no_rows_maps_to_not_found() {
        let err = SupabaseError::Api {
            status: 406,
            code: Some("PGRST116".to_string()),
            message: "no rows".to_string(),
        };
        assert!(matches!(RepositoryError::from_single(err), RepositoryError::NotFound));

        let err = SupabaseError::Api {
            status: 500,
            code: None,
            message: "boom".to_string(),
        };
        assert!(matches!(RepositoryError::from_single(err), RepositoryError::Backend(_)));
    }
}
