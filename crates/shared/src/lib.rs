//! Shared utilities and common types for the scheduled configuration backend.
//!
//! This crate provides common functionality used across all other crates:
//! - Offset pagination (page requests, pages, sort direction)
//! - Common validation logic

pub mod pagination;
pub mod validation;
