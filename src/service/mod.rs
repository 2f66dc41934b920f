//! Account operations.
//!
//! [`AccountService`] owns the approval rules. Its collaborators (store,
//! password verifier, session issuer) are injected so each can be replaced
//! in tests.

mod approval;
mod authenticate;
mod register;
mod session;

pub use session::Renewal;

use std::sync::Arc;

use chrono::TimeDelta;

use crate::account::PasswordPolicy;
use crate::cache::UserListCache;
use crate::crypto::PasswordVerifier;
use crate::error::{AccountError, Result};
use crate::session::{SessionClaims, SessionIssuer};
use crate::store::AccountStore;

/// Account service shared by every request.
pub struct AccountService {
    store: Arc<dyn AccountStore>,
    verifier: Arc<dyn PasswordVerifier>,
    sessions: SessionIssuer,
    cache: UserListCache,
    policy: PasswordPolicy,
    update_age: TimeDelta,
}

impl AccountService {
    /// Create a new [`AccountService`].
    pub fn new(
        store: Arc<dyn AccountStore>,
        verifier: Arc<dyn PasswordVerifier>,
        sessions: SessionIssuer,
        policy: PasswordPolicy,
        update_age: TimeDelta,
    ) -> Self {
        Self {
            store,
            verifier,
            sessions,
            cache: UserListCache::new(),
            policy,
            update_age,
        }
    }

    pub fn sessions(&self) -> &SessionIssuer {
        &self.sessions
    }

    /// Admin-only operations start here.
    fn require_admin(caller: &SessionClaims, operation: &'static str) -> Result<()> {
        if caller.standing.is_admin() {
            return Ok(());
        }

        tracing::warn!(
            caller = %caller.account_id,
            operation,
            reason = "not an administrator",
            "operation refused"
        );
        Err(AccountError::Unauthorized)
    }
}
