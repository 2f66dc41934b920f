//! Credential store port and its adapters.

mod memory;
mod postgres;

pub use memory::*;
pub use postgres::*;

use async_trait::async_trait;

use crate::account::{
    Account, AccountId, EmailAddress, PasswordHash, Standing, Status,
};
use crate::error::Result;

/// Account about to be inserted. Timestamps are set by the store.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub id: AccountId,
    pub email: EmailAddress,
    pub password_hash: PasswordHash,
    pub standing: Standing,
}

/// Port for account persistence.
///
/// Every failure of the backing system is reported as
/// [`AccountError::Store`](crate::error::AccountError::Store).
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Insert a new account.
    ///
    /// The email uniqueness check and the insert are one atomic step: two
    /// concurrent calls with the same email yield exactly one success and
    /// one [`AccountError::DuplicateEmail`](crate::error::AccountError::DuplicateEmail).
    async fn create(&self, account: NewAccount) -> Result<Account>;

    /// Find an account by identifier.
    async fn find_by_id(&self, id: &AccountId) -> Result<Option<Account>>;

    /// Find an account by email.
    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<Account>>;

    /// Persist a new status and refresh `updated_at`.
    ///
    /// Fails with [`AccountError::NotFound`](crate::error::AccountError::NotFound)
    /// when no account has this identifier.
    async fn set_status(&self, id: &AccountId, status: Status)
    -> Result<Account>;

    /// Permanently remove an account.
    async fn delete(&self, id: &AccountId) -> Result<()>;

    /// Every account, newest first.
    async fn list(&self) -> Result<Vec<Account>>;
}
