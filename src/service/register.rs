use super::AccountService;
use crate::account::{AccountId, EmailAddress, Password, Role, Standing};
use crate::error::{AccountError, Result};
use crate::store::NewAccount;

impl AccountService {
    /// Create an account for `email`.
    ///
    /// Administrators are approved on creation, standard users start
    /// pending.
    ///
    /// # Errors
    ///
    /// - [`AccountError::Validation`] on a malformed email or a password
    ///   outside the length policy.
    /// - [`AccountError::DuplicateEmail`] when the email is taken.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        role: Role,
    ) -> Result<AccountId> {
        let email = EmailAddress::parse(email)?;
        let password = Password::parse(password, &self.policy)?;
        let password_hash = self.verifier.hash(&password)?;

        let account = self
            .store
            .create(NewAccount {
                id: AccountId::new(),
                email,
                password_hash,
                standing: Standing::initial(role),
            })
            .await
            .inspect_err(|err| {
                if matches!(err, AccountError::DuplicateEmail) {
                    tracing::info!(reason = "duplicate email", "registration refused");
                }
            })?;

        self.cache.invalidate().await;

        metrics::counter!("accounts_registered_total", "role" => role.as_str())
            .increment(1);
        tracing::info!(
            account_id = %account.id,
            role = %role,
            status = %account.standing.status(),
            "account registered"
        );

        Ok(account.id)
    }
}
