//! Email logic management.

use std::fmt;

use validator::ValidateEmail;

use crate::error::{AccountError, Result};

/// Value object of a valid email address.
///
/// Addresses are trimmed and lower-cased, so uniqueness is
/// case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Converts a [`String`] into a valid [`EmailAddress`].
    ///
    /// # Errors
    ///
    /// Returns [`AccountError::Validation`] if the string is not a valid
    /// email address according to the HTML5 rules used by `validator`.
    pub fn parse(email: impl AsRef<str>) -> Result<Self> {
        let email = email.as_ref().trim().to_lowercase();

        if email.validate_email() {
            Ok(Self(email))
        } else {
            Err(AccountError::validation("email", "Email must be formatted."))
        }
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for EmailAddress {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
