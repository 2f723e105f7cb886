//! Shared types, errors, and configuration for Tally.
//!
//! This crate provides common types used across all other crates:
//! - Typed IDs for type-safe entity references
//! - Pagination types for list operations
//! - The explicit tenant/actor context
//! - Application-wide error taxonomy
//! - Configuration management and tracing setup

pub mod config;
pub mod context;
pub mod error;
pub mod telemetry;
pub mod types;

pub use config::AppConfig;
pub use context::TenantContext;
pub use error::{AppError, AppResult, ErrorKind};
