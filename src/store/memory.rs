//! In-memory account store.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{AccountStore, NewAccount};
use crate::account::{Account, AccountId, EmailAddress, Status};
use crate::clock::Clock;
use crate::error::{AccountError, Result};

#[derive(Default)]
struct Inner {
    // Insertion sequence breaks ties between equal `created_at`.
    accounts: HashMap<AccountId, (u64, Account)>,
    emails: HashMap<String, AccountId>,
    sequence: u64,
}

/// Account store kept in process memory.
///
/// Used when no PostgreSQL instance is configured, and by tests.
pub struct MemoryStore {
    inner: RwLock<Inner>,
    clock: Arc<dyn Clock>,
}

impl MemoryStore {
    /// Create a new empty [`MemoryStore`].
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            clock,
        }
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn create(&self, account: NewAccount) -> Result<Account> {
        let mut inner = self.inner.write().await;

        if inner.emails.contains_key(account.email.as_str())
            || inner.accounts.contains_key(&account.id)
        {
            return Err(AccountError::DuplicateEmail);
        }

        let now = self.clock.now();
        let account = Account {
            id: account.id,
            email: account.email,
            password_hash: account.password_hash,
            standing: account.standing,
            created_at: now,
            updated_at: now,
        };

        inner.sequence += 1;
        let sequence = inner.sequence;
        inner
            .emails
            .insert(account.email.to_string(), account.id);
        inner
            .accounts
            .insert(account.id, (sequence, account.clone()));

        Ok(account)
    }

    async fn find_by_id(&self, id: &AccountId) -> Result<Option<Account>> {
        Ok(self
            .inner
            .read()
            .await
            .accounts
            .get(id)
            .map(|(_, account)| account.clone()))
    }

    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<Account>> {
        let inner = self.inner.read().await;

        Ok(inner
            .emails
            .get(email.as_str())
            .and_then(|id| inner.accounts.get(id))
            .map(|(_, account)| account.clone()))
    }

    async fn set_status(
        &self,
        id: &AccountId,
        status: Status,
    ) -> Result<Account> {
        let mut inner = self.inner.write().await;
        let (_, account) =
            inner.accounts.get_mut(id).ok_or(AccountError::NotFound)?;

        account.standing = account.standing.transition(status);
        account.updated_at = self.clock.now();

        Ok(account.clone())
    }

    async fn delete(&self, id: &AccountId) -> Result<()> {
        let mut inner = self.inner.write().await;
        let (_, account) =
            inner.accounts.remove(id).ok_or(AccountError::NotFound)?;
        inner.emails.remove(account.email.as_str());

        Ok(())
    }

    async fn list(&self) -> Result<Vec<Account>> {
        let inner = self.inner.read().await;

        let mut rows: Vec<&(u64, Account)> = inner.accounts.values().collect();
        rows.sort_by(|(a_seq, a), (b_seq, b)| {
            b.created_at.cmp(&a.created_at).then(b_seq.cmp(a_seq))
        });

        Ok(rows.into_iter().map(|(_, account)| account.clone()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::{PasswordHash, Standing};
    use crate::clock::FixedClock;

    fn new_account(email: &str, standing: Standing) -> NewAccount {
        NewAccount {
            id: AccountId::new(),
            email: EmailAddress::parse(email).unwrap(),
            password_hash: PasswordHash::new("$argon2id$stub"),
            standing,
        }
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let store = MemoryStore::new(Arc::new(FixedClock::default()));
        let pending = Standing::User {
            status: Status::Pending,
        };

        let created = store
            .create(new_account("bob@x.com", pending))
            .await
            .unwrap();
        assert_eq!(created.created_at, created.updated_at);

        let found = store.find_by_id(&created.id).await.unwrap().unwrap();
        assert_eq!(found, created);

        let email = EmailAddress::parse("BOB@x.com").unwrap();
        let found = store.find_by_email(&email).await.unwrap().unwrap();
        assert_eq!(found.id, created.id);

        assert!(matches!(
            store.create(new_account("bob@x.com", Standing::Admin)).await,
            Err(AccountError::DuplicateEmail)
        ));
    }

    #[tokio::test]
    async fn test_set_status_refreshes_updated_at() {
        let clock = Arc::new(FixedClock::default());
        let store = MemoryStore::new(clock.clone());
        let created = store
            .create(new_account(
                "alice@x.com",
                Standing::initial(crate::account::Role::User),
            ))
            .await
            .unwrap();

        clock.advance(chrono::TimeDelta::seconds(5));
        let updated =
            store.set_status(&created.id, Status::Approved).await.unwrap();

        assert_eq!(updated.standing.status(), Status::Approved);
        assert!(updated.updated_at > created.updated_at);
        assert_eq!(updated.created_at, created.created_at);

        assert!(matches!(
            store.set_status(&AccountId::new(), Status::Approved).await,
            Err(AccountError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_delete_frees_email() {
        let store = MemoryStore::new(Arc::new(FixedClock::default()));
        let created = store
            .create(new_account("carol@x.com", Standing::Admin))
            .await
            .unwrap();

        store.delete(&created.id).await.unwrap();
        assert!(store.find_by_id(&created.id).await.unwrap().is_none());
        assert!(matches!(
            store.delete(&created.id).await,
            Err(AccountError::NotFound)
        ));

        assert!(
            store
                .create(new_account("carol@x.com", Standing::Admin))
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let clock = Arc::new(FixedClock::default());
        let store = MemoryStore::new(clock.clone());

        let mut ids = Vec::new();
        for email in ["a@x.com", "b@x.com", "c@x.com"] {
            clock.advance(chrono::TimeDelta::seconds(1));
            ids.push(
                store
                    .create(new_account(email, Standing::Admin))
                    .await
                    .unwrap()
                    .id,
            );
        }
        // Same timestamp as `c@x.com`.
        ids.push(
            store
                .create(new_account("d@x.com", Standing::Admin))
                .await
                .unwrap()
                .id,
        );

        let listed: Vec<AccountId> =
            store.list().await.unwrap().iter().map(|a| a.id).collect();
        ids.reverse();
        assert_eq!(listed, ids);
    }
}
