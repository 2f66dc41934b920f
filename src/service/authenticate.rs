use super::AccountService;
use crate::account::{EmailAddress, Password};
use crate::error::{AccountError, Result};
use crate::session::Session;

impl AccountService {
    /// Check credentials and open a session.
    ///
    /// Unknown emails, wrong passwords and malformed input all fail the
    /// same way with [`AccountError::InvalidCredentials`].
    pub async fn authenticate(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session> {
        let (Ok(email), Ok(password)) = (
            EmailAddress::parse(email),
            Password::parse(password, &self.policy),
        ) else {
            return Err(failure("malformed input"));
        };

        let Some(account) = self.store.find_by_email(&email).await? else {
            // Same work as a real comparison.
            self.verifier.verify_dummy(&password);
            return Err(failure("unknown email"));
        };

        if self
            .verifier
            .verify(&password, &account.password_hash)
            .is_err()
        {
            return Err(failure("wrong password"));
        }

        let session = self.sessions.issue(&account)?;
        tracing::info!(
            account_id = %account.id,
            role = %account.standing.role(),
            status = %account.standing.status(),
            "session opened"
        );

        Ok(session)
    }
}

fn failure(reason: &'static str) -> AccountError {
    metrics::counter!("auth_failures_total", "reason" => reason).increment(1);
    tracing::info!(reason, "authentication failed");
    AccountError::InvalidCredentials
}

#[cfg(test)]
mod tests {
    use crate::account::{Role, Status};
    use crate::error::AccountError;
    use crate::service::tests::service;

    #[tokio::test]
    async fn test_authenticate() {
        let (service, _) = service();
        let id = service
            .register("alice@x.com", "secret1", Role::User)
            .await
            .unwrap();

        let session = service.authenticate("ALICE@x.com", "secret1").await.unwrap();
        assert_eq!(session.claims.account_id, id);
        assert_eq!(session.claims.role(), Role::User);
        assert_eq!(session.claims.status(), Status::Pending);

        let verified = service.sessions().verify(&session.token).await.unwrap();
        assert_eq!(verified, session.claims);
    }

    #[tokio::test]
    async fn test_failures_are_indistinguishable() {
        let (service, _) = service();
        service
            .register("alice@x.com", "secret1", Role::User)
            .await
            .unwrap();

        let wrong_password = service.authenticate("alice@x.com", "secret2").await;
        let unknown_email = service.authenticate("nobody@x.com", "secret1").await;
        let malformed = service.authenticate("nobody", "1").await;

        for outcome in [wrong_password, unknown_email, malformed] {
            let err = outcome.unwrap_err();
            assert!(matches!(err, AccountError::InvalidCredentials));
            assert_eq!(err.to_string(), "invalid email or password");
        }
    }

    #[tokio::test]
    async fn test_admin_session() {
        let (service, _) = service();
        service
            .register("root@x.com", "secret1", Role::Admin)
            .await
            .unwrap();

        let session = service.authenticate("root@x.com", "secret1").await.unwrap();
        assert!(session.claims.standing.is_admin());
        assert_eq!(session.claims.status(), Status::Approved);
    }
}
