//! Shared types, errors, and configuration for Tala.
//!
//! This crate provides common types used across all other crates:
//! - Typed IDs for type-safe entity references
//! - Rial and gram rounding helpers with decimal precision
//! - Pagination types for list queries
//! - Application-wide error types
//! - Configuration management

pub mod config;
pub mod error;
pub mod types;

pub use config::AppConfig;
pub use error::{AppError, AppResult};
