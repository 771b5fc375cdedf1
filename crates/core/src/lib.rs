//! Tigube Core - Shared domain types.
//!
//! This crate provides the value types shared by the admin panel and the CLI:
//! - `admin` - Server-rendered administration panel
//! - `cli` - Command-line tools for bulk operations
//!
//! # Architecture
//!
//! Rows live in the hosted backend; this crate only describes their shape.
//! It contains no I/O, no HTTP clients and no backend-specific code.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, emails and the status vocabularies of the platform tables

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
