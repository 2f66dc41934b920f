//! Admin-initiated status transitions and account removal.

use super::AccountService;
use crate::account::{AccountId, AccountView, Status};
use crate::error::Result;
use crate::session::SessionClaims;

impl AccountService {
    /// Move the account `id` to `status`. Any status may follow any other.
    ///
    /// Sessions already issued to the account are not touched; they pick
    /// up the change at their next renewal.
    pub async fn set_status(
        &self,
        caller: &SessionClaims,
        id: &AccountId,
        status: Status,
    ) -> Result<AccountView> {
        Self::require_admin(caller, "set_status")?;

        let account = self.store.set_status(id, status).await?;
        self.cache.invalidate().await;

        metrics::counter!("status_transitions_total", "status" => status.as_str())
            .increment(1);
        tracing::info!(
            caller = %caller.account_id,
            account_id = %id,
            %status,
            "account status updated"
        );

        Ok(account.view())
    }

    /// Permanently remove the account `id`.
    pub async fn delete_account(
        &self,
        caller: &SessionClaims,
        id: &AccountId,
    ) -> Result<()> {
        Self::require_admin(caller, "delete_account")?;

        self.store.delete(id).await?;
        self.cache.invalidate().await;

        metrics::counter!("accounts_deleted_total").increment(1);
        tracing::info!(caller = %caller.account_id, account_id = %id, "account deleted");

        Ok(())
    }

    /// Every account, newest first.
    pub async fn list_accounts(
        &self,
        caller: &SessionClaims,
    ) -> Result<Vec<AccountView>> {
        Self::require_admin(caller, "list_accounts")?;

        self.cache
            .get_or_load(|| async {
                let accounts = self.store.list().await?;
                Ok(accounts.iter().map(|account| account.view()).collect())
            })
            .await
    }
}
