//! Read-through cache of the admin user list.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::RwLock;

use crate::account::AccountView;
use crate::error::Result;

/// Cached account list, newest first.
///
/// Every mutation of the store must call [`UserListCache::invalidate`]. A
/// load that races with an invalidation is returned to its caller but never
/// cached.
#[derive(Debug, Default)]
pub struct UserListCache {
    revision: AtomicU64,
    entries: RwLock<Option<Vec<AccountView>>>,
}

impl UserListCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached list, or run `load` and cache its output.
    pub async fn get_or_load<F, Fut>(&self, load: F) -> Result<Vec<AccountView>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<AccountView>>>,
    {
        let cached = self.entries.read().await.clone();
        if let Some(accounts) = cached {
            metrics::counter!("user_list_cache_total", "outcome" => "hit")
                .increment(1);
            return Ok(accounts);
        }

        metrics::counter!("user_list_cache_total", "outcome" => "miss")
            .increment(1);
        let revision = self.revision.load(Ordering::Acquire);
        let accounts = load().await?;

        let mut entries = self.entries.write().await;
        if self.revision.load(Ordering::Acquire) == revision {
            *entries = Some(accounts.clone());
        }

        Ok(accounts)
    }

    /// Drop the cached list.
    pub async fn invalidate(&self) {
        let mut entries = self.entries.write().await;
        self.revision.fetch_add(1, Ordering::AcqRel);
        *entries = None;
    }
}
