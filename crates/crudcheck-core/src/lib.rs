//! crudcheck-core: shared types for the customer API test harness
//!
//! This crate provides environment/config resolution, randomized fixture
//! data, and the check-outcome report types shared by the runner and CLI.

pub mod config;
pub mod fixture;
pub mod report;

pub use config::{Config, ConfigError, DbParams};
pub use report::{CheckOutcome, Report};
