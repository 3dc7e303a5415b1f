//! Single-use recovery codes for two-factor accounts.
//!
//! Codes are shown to the user once at enrollment and stored hashed
//! (SHA-256, base64url). The charset omits characters that read
//! ambiguously when printed (I, L, O, 0, 1).

use rand::Rng;
use sha2::{Digest, Sha256};

use super::error::TwoFactorError;

/// Number of recovery codes issued per enrollment.
pub const RECOVERY_CODE_COUNT: usize = 10;

/// Characters used in recovery codes.
const CHARSET: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ23456789";

/// Length of each half of a recovery code.
const HALF_LENGTH: usize = 4;

/// Generates a fresh set of recovery codes, formatted `XXXX-XXXX`.
#[must_use]
pub fn generate_recovery_codes() -> Vec<String> {
    let mut rng = rand::rng();

    (0..RECOVERY_CODE_COUNT)
        .map(|_| {
            let mut code = String::with_capacity(HALF_LENGTH * 2 + 1);
            for i in 0..HALF_LENGTH * 2 {
                if i == HALF_LENGTH {
                    code.push('-');
                }
                let idx = rng.random_range(0..CHARSET.len());
                code.push(char::from(CHARSET[idx]));
            }
            code
        })
        .collect()
}

/// Normalizes user input before hashing: uppercase, hyphens and
/// whitespace stripped.
#[must_use]
pub fn normalize_recovery_code(input: &str) -> String {
    input
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// Hashes a recovery code for storage or comparison.
///
/// # Errors
///
/// Returns an error if the normalized code is empty.
pub fn hash_recovery_code(code: &str) -> Result<String, TwoFactorError> {
    let normalized = normalize_recovery_code(code);
    if normalized.is_empty() {
        return Err(TwoFactorError::Totp("empty recovery code".to_string()));
    }

    let digest = Sha256::digest(normalized.as_bytes());
    Ok(base64_url::encode(&digest))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generates_ten_codes() {
        let codes = generate_recovery_codes();
        assert_eq!(codes.len(), RECOVERY_CODE_COUNT);
    }

    #[test]
    fn test_code_format() {
        for code in generate_recovery_codes() {
            assert_eq!(code.len(), 9);
            assert_eq!(code.chars().nth(4), Some('-'));
            for c in code.chars().filter(|c| *c != '-') {
                assert!(CHARSET.contains(&(c as u8)), "unexpected char {c}");
            }
        }
    }

    #[test]
    fn test_codes_are_unique_within_a_set() {
        let codes = generate_recovery_codes();
        let mut deduped = codes.clone();
        deduped.sort();
        deduped.dedup();
        assert_eq!(deduped.len(), codes.len());
    }

    #[test]
    fn test_normalization_is_forgiving() {
        assert_eq!(normalize_recovery_code(" ab2d-EF3h "), "AB2DEF3H");
        assert_eq!(normalize_recovery_code("AB2DEF3H"), "AB2DEF3H");
    }

    #[test]
    fn test_hash_matches_across_formats() {
        let stored = hash_recovery_code("AB2D-EF3H").unwrap();
        let entered = hash_recovery_code("ab2d ef3h").unwrap();
        assert_eq!(stored, entered);
    }

    #[test]
    fn test_different_codes_hash_differently() {
        let a = hash_recovery_code("AB2D-EF3H").unwrap();
        let b = hash_recovery_code("AB2D-EF3J").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_empty_code_rejected() {
        assert!(hash_recovery_code(" - ").is_err());
    }
}
