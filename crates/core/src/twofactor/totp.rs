//! TOTP secret generation and code verification.

use totp_rs::{Algorithm, Secret, TOTP};

use super::error::TwoFactorError;

/// Issuer name shown in authenticator apps.
const ISSUER: &str = "Fakturo";

/// Generates a new random TOTP secret, base32-encoded for storage.
#[must_use]
pub fn generate_secret() -> String {
    Secret::generate_secret().to_encoded().to_string()
}

fn build_totp(secret_base32: &str, account_email: &str) -> Result<TOTP, TwoFactorError> {
    let secret = Secret::Encoded(secret_base32.to_string())
        .to_bytes()
        .map_err(|_| TwoFactorError::InvalidSecret)?;

    TOTP::new(
        Algorithm::SHA1,
        6,
        1,
        30,
        secret,
        Some(ISSUER.to_string()),
        account_email.to_string(),
    )
    .map_err(|e| TwoFactorError::Totp(e.to_string()))
}

/// Returns the `otpauth://` provisioning URL for authenticator apps.
///
/// # Errors
///
/// Returns an error if the stored secret is invalid.
pub fn otpauth_url(secret_base32: &str, account_email: &str) -> Result<String, TwoFactorError> {
    Ok(build_totp(secret_base32, account_email)?.get_url())
}

/// Verifies a six digit TOTP code against the stored secret.
///
/// Accepts one step of clock drift in either direction.
///
/// # Errors
///
/// Returns an error if the stored secret is invalid or the system clock
/// is unavailable.
pub fn verify_code(
    secret_base32: &str,
    account_email: &str,
    code: &str,
) -> Result<bool, TwoFactorError> {
    let totp = build_totp(secret_base32, account_email)?;
    totp.check_current(code.trim())
        .map_err(|e| TwoFactorError::Clock(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_secret_is_valid_base32() {
        let secret = generate_secret();
        assert!(build_totp(&secret, "user@example.com").is_ok());
    }

    #[test]
    fn test_otpauth_url_contains_issuer_and_account() {
        let secret = generate_secret();
        let url = otpauth_url(&secret, "user@example.com").unwrap();

        assert!(url.starts_with("otpauth://totp/"));
        assert!(url.contains("Fakturo"));
        assert!(url.contains("user%40example.com"));
    }

    #[test]
    fn test_current_code_verifies() {
        let secret = generate_secret();
        let totp = build_totp(&secret, "user@example.com").unwrap();
        let code = totp.generate_current().unwrap();

        assert!(verify_code(&secret, "user@example.com", &code).unwrap());
    }

    #[test]
    fn test_wrong_code_rejected() {
        let secret = generate_secret();
        assert!(!verify_code(&secret, "user@example.com", "000000").unwrap()
            || !verify_code(&secret, "user@example.com", "999999").unwrap());
    }

    #[test]
    fn test_invalid_secret_rejected() {
        let result = verify_code("not base32 at all!!", "user@example.com", "123456");
        assert!(matches!(result, Err(TwoFactorError::InvalidSecret)));
    }

    #[test]
    fn test_code_with_surrounding_whitespace_accepted() {
        let secret = generate_secret();
        let totp = build_totp(&secret, "user@example.com").unwrap();
        let code = format!(" {} ", totp.generate_current().unwrap());

        assert!(verify_code(&secret, "user@example.com", &code).unwrap());
    }
}
