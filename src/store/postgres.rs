//! PostgreSQL implementation of the account store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{AccountStore, NewAccount};
use crate::account::{
    Account, AccountId, EmailAddress, PasswordHash, Role, Standing, Status,
};
use crate::error::{AccountError, Result, ToStoreError};

const COLUMNS: &str =
    "id, email, password_hash, role, status, created_at, updated_at";

/// Row of the `accounts` table.
#[derive(Debug, sqlx::FromRow)]
struct AccountRecord {
    id: Uuid,
    email: String,
    password_hash: String,
    role: String,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl AccountRecord {
    fn into_account(self) -> Result<Account> {
        // Rows are written by this store only; a parse failure means the
        // table was edited by hand.
        let corrupted = |_| {
            AccountError::store(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                "corrupted account row",
            ))
        };
        let role = self.role.parse::<Role>().map_err(corrupted)?;
        let status = self.status.parse::<Status>().map_err(corrupted)?;

        Ok(Account {
            id: AccountId::from(self.id),
            email: EmailAddress::parse(&self.email).map_err(corrupted)?,
            password_hash: PasswordHash::new(self.password_hash),
            standing: Standing::from_parts(role, status),
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// PostgreSQL account store.
#[derive(Clone)]
pub struct PgAccountStore {
    pool: PgPool,
}

impl PgAccountStore {
    /// Create a new [`PgAccountStore`].
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountStore for PgAccountStore {
    async fn create(&self, account: NewAccount) -> Result<Account> {
        let query = format!(
            "INSERT INTO accounts (id, email, password_hash, role, status)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {COLUMNS}"
        );

        let record = sqlx::query_as::<_, AccountRecord>(&query)
            .bind(account.id.as_uuid())
            .bind(account.email.as_str())
            .bind(account.password_hash.as_str())
            .bind(account.standing.role().as_str())
            .bind(account.standing.status().as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(|err| {
                // The UNIQUE constraint makes check-and-insert atomic.
                let duplicate = err
                    .as_database_error()
                    .is_some_and(|db| db.is_unique_violation());
                if duplicate {
                    AccountError::DuplicateEmail
                } else {
                    AccountError::store(err)
                }
            })?;

        record.into_account()
    }

    async fn find_by_id(&self, id: &AccountId) -> Result<Option<Account>> {
        let query = format!("SELECT {COLUMNS} FROM accounts WHERE id = $1");

        sqlx::query_as::<_, AccountRecord>(&query)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .catch()?
            .map(AccountRecord::into_account)
            .transpose()
    }

    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<Account>> {
        let query =
            format!("SELECT {COLUMNS} FROM accounts WHERE email = $1");

        sqlx::query_as::<_, AccountRecord>(&query)
            .bind(email.as_str())
            .fetch_optional(&self.pool)
            .await
            .catch()?
            .map(AccountRecord::into_account)
            .transpose()
    }

    async fn set_status(
        &self,
        id: &AccountId,
        status: Status,
    ) -> Result<Account> {
        let query = format!(
            "UPDATE accounts
            SET status = CASE WHEN role = 'ADMIN' THEN 'APPROVED' ELSE $2 END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {COLUMNS}"
        );

        sqlx::query_as::<_, AccountRecord>(&query)
            .bind(id.as_uuid())
            .bind(status.as_str())
            .fetch_optional(&self.pool)
            .await
            .catch()?
            .ok_or(AccountError::NotFound)?
            .into_account()
    }

    async fn delete(&self, id: &AccountId) -> Result<()> {
        let result = sqlx::query("DELETE FROM accounts WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .catch()?;

        if result.rows_affected() == 0 {
            return Err(AccountError::NotFound);
        }

        Ok(())
    }

    async fn list(&self) -> Result<Vec<Account>> {
        let query = format!(
            "SELECT {COLUMNS} FROM accounts ORDER BY created_at DESC, id"
        );

        sqlx::query_as::<_, AccountRecord>(&query)
            .fetch_all(&self.pool)
            .await
            .catch()?
            .into_iter()
            .map(AccountRecord::into_account)
            .collect()
    }
}
