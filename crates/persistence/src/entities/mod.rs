//! Database entity definitions.

pub mod scheduled_config;

pub use scheduled_config::ScheduledConfigEntity;
