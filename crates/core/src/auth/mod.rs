//! Authentication and password hashing.
//!
//! This module provides:
//! - Password hashing with Argon2id
//! - Password verification
//! - Password strength validation for registration

mod password;

pub use password::{PasswordError, hash_password, validate_password_strength, verify_password};
