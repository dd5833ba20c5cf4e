//! Shared types, errors, and configuration for walletd.
//!
//! This crate provides common types used across all other crates:
//! - Fixed-point `Amount` for monetary values
//! - Typed IDs for type-safe entity references
//! - Pagination types for list endpoints
//! - Application-wide error types
//! - Configuration management
//! - JWT claims and token service

pub mod auth;
pub mod config;
pub mod error;
pub mod jwt;
pub mod types;

#[cfg(test)]
mod error_tests;

pub use auth::Claims;
pub use config::{AppConfig, LedgerConfig};
pub use error::{AppError, AppResult};
pub use jwt::{JwtConfig, JwtError, JwtService};
