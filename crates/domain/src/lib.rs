//! Domain layer for the scheduled configuration backend.
//!
//! This crate contains:
//! - Domain models (scheduled entries, sort orders, request/response payloads)
//! - The resolution engine and the entry store contract
//! - The scheduled configuration service
//! - Domain error types

pub mod errors;
pub mod models;
pub mod services;

pub use errors::{ScheduledConfigError, StoreError};
