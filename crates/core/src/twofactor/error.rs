//! Two-factor error types.

use thiserror::Error;

/// Errors raised by TOTP operations.
#[derive(Debug, Error)]
pub enum TwoFactorError {
    /// The stored secret is not valid base32.
    #[error("invalid TOTP secret")]
    InvalidSecret,

    /// TOTP construction failed (bad parameters or secret length).
    #[error("failed to build TOTP: {0}")]
    Totp(String),

    /// System clock error while checking a code.
    #[error("system time error: {0}")]
    Clock(String),
}
