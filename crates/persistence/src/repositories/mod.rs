//! Repository implementations.

pub mod scheduled_config;

pub use scheduled_config::ScheduledConfigRepository;
