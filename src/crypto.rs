//! Password hashing.

use argon2::password_hash::{
    PasswordHash as PhcHash, PasswordHasher as _, PasswordVerifier as _,
    SaltString,
};
use argon2::{Argon2, Params, Version};
use rand::distributions::{Alphanumeric, DistString};
use rand::rngs::OsRng;

use crate::account::{Password, PasswordHash};
use crate::config;
use crate::error::{AccountError, Result, ToStoreError};

const OUTPUT_LENGTH: usize = 32;

/// Port for one-way password hashing.
pub trait PasswordVerifier: Send + Sync {
    /// Hash a password. Irreversible.
    fn hash(&self, password: &Password) -> Result<PasswordHash>;

    /// Compare a password with a stored hash.
    ///
    /// # Errors
    ///
    /// [`AccountError::InvalidCredentials`] on mismatch or unreadable hash.
    fn verify(&self, password: &Password, hash: &PasswordHash) -> Result<()>;

    /// Burn the same amount of work as [`PasswordVerifier::verify`] against
    /// a hash no password matches. Called when the account does not exist.
    fn verify_dummy(&self, password: &Password);
}

/// Argon2id password hasher.
pub struct Argon2Verifier {
    params: Params,
    dummy: PasswordHash,
}

impl Argon2Verifier {
    /// Create a new Argon2 hasher with custom parameters.
    pub fn new(config: &config::Argon2) -> Result<Self> {
        let params = Params::new(
            config.memory_cost,
            config.iterations,
            config.parallelism,
            Some(OUTPUT_LENGTH),
        )
        .catch()?;

        let mut verifier = Self {
            params,
            dummy: PasswordHash::new(String::new()),
        };

        let secret = Alphanumeric.sample_string(&mut OsRng, 32);
        verifier.dummy = verifier.hash_bytes(secret.as_bytes())?;

        Ok(verifier)
    }

    fn argon2(&self) -> Argon2<'_> {
        Argon2::new(
            argon2::Algorithm::Argon2id,
            Version::V0x13,
            self.params.clone(),
        )
    }

    fn hash_bytes(&self, bytes: &[u8]) -> Result<PasswordHash> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self.argon2().hash_password(bytes, &salt).catch()?;

        Ok(PasswordHash::new(hash.to_string()))
    }
}

impl PasswordVerifier for Argon2Verifier {
    fn hash(&self, password: &Password) -> Result<PasswordHash> {
        self.hash_bytes(password.as_bytes())
    }

    fn verify(&self, password: &Password, hash: &PasswordHash) -> Result<()> {
        let parsed = PhcHash::new(hash.as_str())
            .map_err(|_| AccountError::InvalidCredentials)?;

        // `verify_password` compares digests in constant time.
        self.argon2()
            .verify_password(password.as_bytes(), &parsed)
            .map_err(|_| AccountError::InvalidCredentials)
    }

    fn verify_dummy(&self, password: &Password) {
        let _ = self.verify(password, &self.dummy);
    }
}
