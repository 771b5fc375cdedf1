//! Domain models for admin.
//!
//! Every entity is a remote row; these types hold transient copies plus the
//! derived views and write payloads the pages need.

pub mod advertisement;
pub mod analytics;
pub mod blog;
pub mod content;
pub mod dashboard;
pub mod session;
pub mod subscription;
pub mod user;
pub mod verification;

pub use advertisement::{AdFilter, AdFormat, AdStatus, Advertisement, AdvertisementDraft};
pub use analytics::{AnalyticsOverview, DailyCount, Timeframe};
pub use blog::{BlogDraft, BlogForm, BlogPost};
pub use content::{Review, SupportTicket};
pub use dashboard::DashboardStats;
pub use session::{CurrentAdmin, Flash, keys as session_keys};
pub use subscription::{PlanCounts, PlanDrift, PlanEntitlements, SyncReport, UserPlan};
pub use user::{AdminProfile, User, UserFilter};
pub use verification::VerificationRequest;
