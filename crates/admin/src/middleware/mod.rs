//! HTTP middleware for admin.
//!
//! - [`session`] - Cookie session layer plus typed accessors
//! - [`auth`] - The [`RequireAdminAuth`] route guard

pub mod auth;
pub mod session;

pub use auth::{AdminAuthRejection, RequireAdminAuth};
pub use session::{
    SESSION_COOKIE_NAME, clear_auth_state, create_session_layer, load_auth_state, push_flash,
    save_auth_state, take_flash,
};
