//! Core types for Tigube.
//!
//! This module provides type-safe wrappers for the platform's domain concepts.

pub mod email;
pub mod id;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use status::*;
