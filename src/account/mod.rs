//! Account model: roles, approval status and standing.
//!
//! The persisted shape keeps a `(role, status)` pair. In memory the pair is
//! folded into [`Standing`] so an administrator never carries a status that
//! would have to be ignored.

mod email;
mod id;
mod password;

pub use email::*;
pub use id::*;
pub use password::*;

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AccountError;

/// Role chosen at registration. Immutable.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    #[default]
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::User => "USER",
        }
    }
}

impl FromStr for Role {
    type Err = AccountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ADMIN" => Ok(Role::Admin),
            "USER" => Ok(Role::User),
            _ => Err(AccountError::validation("role", "Unknown role.")),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Approval status of a standard account.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl Status {
    pub const ALL: [Status; 3] =
        [Status::Pending, Status::Approved, Status::Rejected];

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Pending => "PENDING",
            Status::Approved => "APPROVED",
            Status::Rejected => "REJECTED",
        }
    }
}

impl FromStr for Status {
    type Err = AccountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Status::Pending),
            "APPROVED" => Ok(Status::Approved),
            "REJECTED" => Ok(Status::Rejected),
            _ => Err(AccountError::validation("status", "Unknown status.")),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Authorization standing of an account.
///
/// Administrators are always authorized and sit outside the approval
/// machine; standard users carry their approval [`Status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Standing {
    Admin,
    User { status: Status },
}

impl Standing {
    /// Standing assigned at creation for `role`.
    pub fn initial(role: Role) -> Self {
        match role {
            Role::Admin => Standing::Admin,
            Role::User => Standing::User {
                status: Status::Pending,
            },
        }
    }

    /// Rebuild a standing from its persisted pair. The status of an
    /// administrator is inert and dropped here.
    pub fn from_parts(role: Role, status: Status) -> Self {
        match role {
            Role::Admin => Standing::Admin,
            Role::User => Standing::User { status },
        }
    }

    pub fn role(&self) -> Role {
        match self {
            Standing::Admin => Role::Admin,
            Standing::User { .. } => Role::User,
        }
    }

    /// Persisted status. Administrators project [`Status::Approved`].
    pub fn status(&self) -> Status {
        match self {
            Standing::Admin => Status::Approved,
            Standing::User { status } => *status,
        }
    }

    #[inline]
    pub fn is_admin(&self) -> bool {
        matches!(self, Standing::Admin)
    }

    /// Whether the approval gate lets this account through.
    pub fn is_approved(&self) -> bool {
        self.status() == Status::Approved
    }

    /// Apply a status transition. Any status may follow any other; an
    /// administrator is unaffected.
    pub fn transition(self, status: Status) -> Self {
        match self {
            Standing::Admin => Standing::Admin,
            Standing::User { .. } => Standing::User { status },
        }
    }
}

/// Account as persisted by the credential store.
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    pub id: AccountId,
    pub email: EmailAddress,
    pub password_hash: PasswordHash,
    pub standing: Standing,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Project the account into its public read model.
    pub fn view(&self) -> AccountView {
        AccountView {
            id: self.id,
            email: self.email.to_string(),
            role: self.standing.role(),
            status: self.standing.status(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Account row shown on the admin console. Never carries credentials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountView {
    pub id: AccountId,
    pub email: String,
    pub role: Role,
    pub status: Status,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_standing() {
        assert_eq!(Standing::initial(Role::Admin), Standing::Admin);
        assert_eq!(Standing::initial(Role::Admin).status(), Status::Approved);
        assert_eq!(
            Standing::initial(Role::User),
            Standing::User {
                status: Status::Pending
            }
        );
    }

    #[test]
    fn test_transitions_are_total() {
        for from in Status::ALL {
            for to in Status::ALL {
                let standing = Standing::User { status: from }.transition(to);
                assert_eq!(standing.status(), to);
                assert_eq!(standing.role(), Role::User);
            }
        }

        let rejected = Standing::User {
            status: Status::Rejected,
        };
        assert!(rejected.transition(Status::Approved).is_approved());
    }

    #[test]
    fn test_admin_status_is_inert() {
        for status in Status::ALL {
            let standing = Standing::from_parts(Role::Admin, status);
            assert_eq!(standing, Standing::Admin);
            assert!(standing.is_approved());
            assert_eq!(standing.transition(status), Standing::Admin);
        }
    }

    #[test]
    fn test_wire_names() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), r#""ADMIN""#);
        assert_eq!(
            serde_json::from_str::<Status>(r#""REJECTED""#).unwrap(),
            Status::Rejected
        );
        assert_eq!("PENDING".parse::<Status>().unwrap(), Status::Pending);
        assert!("pending".parse::<Status>().is_err());
        assert_eq!("USER".parse::<Role>().unwrap(), Role::User);
    }
}
