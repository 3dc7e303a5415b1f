//! TOTP two-factor authentication and recovery codes.
//!
//! The second factor is standard RFC 6238 TOTP (SHA-1, 6 digits, 30 second
//! step, one step of clock drift), delegated to `totp-rs`. Recovery codes
//! are single-use backup credentials stored hashed.

mod error;
mod recovery;
mod totp;

pub use error::TwoFactorError;
pub use recovery::{
    RECOVERY_CODE_COUNT, generate_recovery_codes, hash_recovery_code, normalize_recovery_code,
};
pub use totp::{generate_secret, otpauth_url, verify_code};
