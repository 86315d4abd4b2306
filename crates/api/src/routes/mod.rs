//! HTTP route handlers.

pub mod health;
pub mod scheduled_configs;
