//! Core business logic for Fakturo.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, validation rules, and calculations live here.
//!
//! # Modules
//!
//! - `auth` - Password hashing and verification
//! - `document` - Quote/invoice totals, numbering, and due-date rules
//! - `twofactor` - TOTP second factor and recovery codes
//! - `import_export` - CSV import/export row handling
//! - `pdf` - PDF rendering with named template presets
//! - `reports` - Report aggregation and caching

pub mod auth;
pub mod document;
pub mod import_export;
pub mod pdf;
pub mod reports;
pub mod twofactor;
