//! Shared types, errors, and configuration for Fakturo.
//!
//! This crate provides common types used across all other crates:
//! - Money types with decimal precision
//! - Pagination types for list endpoints
//! - Application-wide error types
//! - Configuration management
//! - JWT token handling and auth payloads
//! - Email delivery via SMTP

pub mod auth;
pub mod config;
pub mod email;
pub mod error;
pub mod jwt;
pub mod types;

pub use auth::Claims;
pub use config::AppConfig;
pub use email::{EmailError, EmailService};
pub use error::{AppError, AppResult};
pub use jwt::{JwtConfig, JwtError, JwtService};
pub use types::{Currency, Money, PageRequest, PageResponse};
