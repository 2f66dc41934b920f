//! Password handling.

use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{AccountError, Result};

/// Default minimum password length.
pub const MIN_LENGTH: usize = 6;
/// Upper bound, keeps hashing cost bounded.
pub const MAX_LENGTH: usize = 255;

/// Password length policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PasswordPolicy {
    /// Minimum number of characters.
    pub min_length: usize,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            min_length: MIN_LENGTH,
        }
    }
}

/// Plaintext password, wiped from memory on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Password(String);

impl Password {
    /// Check `raw` against `policy`.
    ///
    /// # Errors
    ///
    /// Returns [`AccountError::Validation`] when the password is shorter
    /// than the policy minimum or longer than [`MAX_LENGTH`].
    pub fn parse(raw: &str, policy: &PasswordPolicy) -> Result<Self> {
        let length = raw.chars().count();

        if length < policy.min_length {
            return Err(AccountError::validation(
                "password",
                format!(
                    "Password must contain at least {} characters.",
                    policy.min_length
                ),
            ));
        }
        if length > MAX_LENGTH {
            return Err(AccountError::validation(
                "password",
                format!("Password must contain at most {MAX_LENGTH} characters."),
            ));
        }

        Ok(Self(raw.to_owned()))
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl std::fmt::Debug for Password {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Password(***)")
    }
}

/// One-way password hash in PHC string format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordHash(String);

impl PasswordHash {
    pub fn new(hash: impl Into<String>) -> Self {
        Self(hash.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy() {
        let policy = PasswordPolicy::default();
        assert!(Password::parse("secret1", &policy).is_ok());
        assert!(Password::parse("secret", &policy).is_ok());
        assert!(matches!(
            Password::parse("short", &policy),
            Err(AccountError::Validation { field: "password", .. })
        ));
        assert!(Password::parse(&"x".repeat(MAX_LENGTH + 1), &policy).is_err());

        let strict = PasswordPolicy { min_length: 12 };
        assert!(Password::parse("secret1", &strict).is_err());
    }

    #[test]
    fn test_debug_hides_plaintext() {
        let password =
            Password::parse("hunter22", &PasswordPolicy::default()).unwrap();
        assert!(!format!("{password:?}").contains("hunter22"));
    }
}
