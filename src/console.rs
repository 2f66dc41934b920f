//! Admin console table with optimistic status updates.
//!
//! The table mirrors the account list an administrator works on. A status
//! change is shown at once through [`ConsoleTable::apply_status`], then kept
//! with [`ConsoleTable::confirm`] or undone with [`ConsoleTable::rollback`]
//! depending on the server answer. Deletions wait for the server.

use std::collections::HashMap;

use crate::account::{AccountId, AccountView, Status};

/// A status change shown before the server acknowledged it.
#[derive(Debug, Clone, PartialEq)]
#[must_use = "a pending change must be confirmed or rolled back"]
pub struct PendingChange {
    id: AccountId,
    previous: AccountView,
    revision: u64,
}

/// Client-side account list.
#[derive(Debug, Default, Clone)]
pub struct ConsoleTable {
    rows: Vec<AccountView>,
    // Latest revision applied to each row.
    revisions: HashMap<AccountId, u64>,
    next_revision: u64,
}

impl ConsoleTable {
    pub fn new(rows: Vec<AccountView>) -> Self {
        Self {
            rows,
            ..Default::default()
        }
    }

    pub fn rows(&self) -> &[AccountView] {
        &self.rows
    }

    pub fn get(&self, id: &AccountId) -> Option<&AccountView> {
        self.rows.iter().find(|row| &row.id == id)
    }

    /// Replace the table with a fresh server listing. Changes still in
    /// flight are forgotten.
    pub fn reload(&mut self, rows: Vec<AccountView>) {
        self.rows = rows;
        self.revisions.clear();
    }

    /// Show `status` on the row of `id`. Returns `None` when the row is not
    /// in the table.
    pub fn apply_status(
        &mut self,
        id: &AccountId,
        status: Status,
    ) -> Option<PendingChange> {
        let row = self.rows.iter_mut().find(|row| &row.id == id)?;
        let previous = row.clone();
        row.status = status;

        self.next_revision += 1;
        self.revisions.insert(*id, self.next_revision);

        Some(PendingChange {
            id: *id,
            previous,
            revision: self.next_revision,
        })
    }

    /// The server accepted the change. `updated` replaces the row when the
    /// server returned it and no newer change was applied since.
    pub fn confirm(&mut self, change: PendingChange, updated: Option<AccountView>) {
        if !self.is_latest(&change) {
            return;
        }
        self.revisions.remove(&change.id);

        if let Some(updated) = updated
            && let Some(row) = self.rows.iter_mut().find(|row| row.id == change.id)
        {
            *row = updated;
        }
    }

    /// The server refused the change. Restores the previous row unless a
    /// newer change superseded this one. Returns whether the row was
    /// restored.
    pub fn rollback(&mut self, change: PendingChange) -> bool {
        if !self.is_latest(&change) {
            return false;
        }
        self.revisions.remove(&change.id);

        match self.rows.iter_mut().find(|row| row.id == change.id) {
            Some(row) => {
                *row = change.previous;
                true
            },
            None => false,
        }
    }

    /// Drop a row once the server confirmed its deletion.
    pub fn remove(&mut self, id: &AccountId) -> Option<AccountView> {
        self.revisions.remove(id);
        let index = self.rows.iter().position(|row| &row.id == id)?;
        Some(self.rows.remove(index))
    }

    fn is_latest(&self, change: &PendingChange) -> bool {
        self.revisions.get(&change.id) == Some(&change.revision)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::account::Role;

    fn row(email: &str) -> AccountView {
        AccountView {
            id: AccountId::new(),
            email: email.into(),
            role: Role::User,
            status: Status::Pending,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_apply_then_rollback() {
        let alice = row("alice@x.com");
        let mut table = ConsoleTable::new(vec![alice.clone(), row("bob@x.com")]);

        let change = table.apply_status(&alice.id, Status::Approved).unwrap();
        assert_eq!(table.get(&alice.id).unwrap().status, Status::Approved);

        assert!(table.rollback(change));
        assert_eq!(table.get(&alice.id).unwrap(), &alice);
    }

    #[test]
    fn test_confirm_keeps_change() {
        let alice = row("alice@x.com");
        let mut table = ConsoleTable::new(vec![alice.clone()]);

        let change = table.apply_status(&alice.id, Status::Rejected).unwrap();
        let mut updated = alice.clone();
        updated.status = Status::Rejected;
        updated.updated_at = Utc::now();
        table.confirm(change, Some(updated.clone()));

        assert_eq!(table.get(&alice.id).unwrap(), &updated);
    }

    #[test]
    fn test_superseded_rollback_is_ignored() {
        let alice = row("alice@x.com");
        let mut table = ConsoleTable::new(vec![alice.clone()]);

        let first = table.apply_status(&alice.id, Status::Approved).unwrap();
        let second = table.apply_status(&alice.id, Status::Rejected).unwrap();

        assert!(!table.rollback(first));
        assert_eq!(table.get(&alice.id).unwrap().status, Status::Rejected);

        table.confirm(second, None);
        assert_eq!(table.get(&alice.id).unwrap().status, Status::Rejected);
    }

    #[test]
    fn test_unknown_row() {
        let mut table = ConsoleTable::new(vec![row("alice@x.com")]);
        assert!(table.apply_status(&AccountId::new(), Status::Approved).is_none());
    }

    #[test]
    fn test_remove() {
        let alice = row("alice@x.com");
        let bob = row("bob@x.com");
        let mut table = ConsoleTable::new(vec![alice.clone(), bob.clone()]);

        let change = table.apply_status(&alice.id, Status::Approved).unwrap();
        let removed = table.remove(&alice.id).unwrap();
        assert_eq!(removed.id, alice.id);
        assert!(!table.rollback(change));
        assert_eq!(table.rows(), &[bob]);
    }
}
