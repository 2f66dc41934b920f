//! Route guard.
//!
//! [`decide_route`] is evaluated once per request, before any page is
//! produced. It only looks at the claims attached to the request; it never
//! reads the store.

use serde::{Deserialize, Serialize};

use crate::account::Role;
use crate::session::SessionClaims;

/// Paths the guard works with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutePaths {
    /// Public entry and login page.
    pub login: String,
    /// Prefix reserved to administrators.
    pub admin_prefix: String,
    /// Landing page of administrators.
    pub admin_console: String,
    /// Prefix reserved to approved users. Also their landing page.
    pub dashboard: String,
    /// Where unapproved users wait.
    pub pending: String,
}

impl Default for RoutePaths {
    fn default() -> Self {
        Self {
            login: "/".into(),
            admin_prefix: "/admin".into(),
            admin_console: "/admin/dashboard".into(),
            dashboard: "/dashboard".into(),
            pending: "/pending".into(),
        }
    }
}

/// Route configuration that could lock users out.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum RouteConfigError {
    #[error("route `{0}` must start with `/`")]
    Relative(String),
    #[error("pending page `{0}` must not be under a protected prefix")]
    PendingProtected(String),
    #[error("dashboard `{0}` must not be under the admin prefix")]
    DashboardUnderAdmin(String),
    #[error("admin console `{0}` must be under the admin prefix")]
    ConsoleOutsideAdmin(String),
    #[error("page `{0}` is configured twice")]
    Duplicate(String),
}

impl RoutePaths {
    /// Reject configurations that would produce redirect loops.
    pub fn validate(&self) -> Result<(), RouteConfigError> {
        for path in [
            &self.login,
            &self.admin_prefix,
            &self.admin_console,
            &self.dashboard,
            &self.pending,
        ] {
            if !path.starts_with('/') {
                return Err(RouteConfigError::Relative(path.clone()));
            }
        }

        if self.is_protected(&self.pending) {
            return Err(RouteConfigError::PendingProtected(self.pending.clone()));
        }
        if under(&self.dashboard, &self.admin_prefix) {
            return Err(RouteConfigError::DashboardUnderAdmin(
                self.dashboard.clone(),
            ));
        }
        if !under(&self.admin_console, &self.admin_prefix) {
            return Err(RouteConfigError::ConsoleOutsideAdmin(
                self.admin_console.clone(),
            ));
        }

        let pages = [
            &self.login,
            &self.admin_console,
            &self.dashboard,
            &self.pending,
        ];
        for (i, page) in pages.iter().enumerate() {
            if pages[i + 1..].contains(page) {
                return Err(RouteConfigError::Duplicate(page.to_string()));
            }
        }

        Ok(())
    }

    /// Whether `path` requires an authenticated session.
    pub fn is_protected(&self, path: &str) -> bool {
        under(path, &self.admin_prefix) || under(path, &self.dashboard)
    }
}

/// Outcome of the guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision<'a> {
    Allow,
    Redirect(&'a str),
}

/// Segment-aware prefix test: `/admin` covers `/admin` and `/admin/x`, not
/// `/administrator`.
fn under(path: &str, prefix: &str) -> bool {
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        return true;
    }

    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

/// Decide what happens to a request for `path`. `claims` is `None` for an
/// unauthenticated request.
///
/// Rules are evaluated in order:
///
/// 1. login page, authenticated administrator → admin console;
/// 2. login page, authenticated user → dashboard;
/// 3. login page, anonymous → allow;
/// 4. protected prefix, anonymous → login page;
/// 5. admin prefix, not an administrator → dashboard;
/// 6. dashboard prefix, user not approved → pending page;
/// 7. allow.
pub fn decide_route<'a>(
    claims: Option<&SessionClaims>,
    path: &str,
    paths: &'a RoutePaths,
) -> Decision<'a> {
    if path == paths.login {
        return match claims.map(SessionClaims::role) {
            Some(Role::Admin) => Decision::Redirect(&paths.admin_console),
            Some(Role::User) => Decision::Redirect(&paths.dashboard),
            None => Decision::Allow,
        };
    }

    let Some(claims) = claims else {
        return if paths.is_protected(path) {
            Decision::Redirect(&paths.login)
        } else {
            Decision::Allow
        };
    };

    if under(path, &paths.admin_prefix) && !claims.standing.is_admin() {
        return Decision::Redirect(&paths.dashboard);
    }

    if under(path, &paths.dashboard)
        && claims.role() == Role::User
        && !claims.standing.is_approved()
    {
        return Decision::Redirect(&paths.pending);
    }

    Decision::Allow
}
