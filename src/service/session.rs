//! Session reconciliation with the store.

use super::AccountService;
use crate::error::Result;
use crate::session::{Session, SessionClaims};

/// Outcome of [`AccountService::renew_session`].
#[derive(Debug)]
pub enum Renewal {
    /// Claims are young enough to be used as they are.
    Current,
    /// Claims were re-derived from the store.
    Renewed(Session),
    /// The account is gone. The session is terminated.
    Invalid,
}

impl AccountService {
    /// Decode a presented token.
    pub async fn verify_session(&self, token: &str) -> Option<SessionClaims> {
        self.sessions.verify(token).await
    }

    /// Re-read the account behind claims older than `update_age`.
    ///
    /// Younger claims are trusted as they are, so a status change reaches
    /// an open session within `update_age` at most.
    pub async fn renew_session(&self, claims: &SessionClaims) -> Result<Renewal> {
        if !self.sessions.is_stale(claims, self.update_age) {
            return Ok(Renewal::Current);
        }

        match self.store.find_by_id(&claims.account_id).await? {
            Some(account) => {
                let session = self.sessions.renew(claims, &account)?;
                tracing::debug!(
                    account_id = %account.id,
                    status = %account.standing.status(),
                    "session renewed"
                );
                Ok(Renewal::Renewed(session))
            },
            None => {
                self.sessions.terminate(claims).await;
                tracing::info!(
                    account_id = %claims.account_id,
                    reason = "account deleted",
                    "session invalidated"
                );
                Ok(Renewal::Invalid)
            },
        }
    }

    /// Close the session. Closing it twice is harmless.
    pub async fn terminate_session(&self, claims: &SessionClaims) {
        self.sessions.terminate(claims).await;
        tracing::info!(account_id = %claims.account_id, "session closed");
    }
}
