//! Page documents. Access is decided by the route guard beforehand.

use axum::extract::{Query, State};
use axum::response::{Html, IntoResponse, Redirect, Response};
use serde::Deserialize;

use crate::AppState;
use crate::middleware::Caller;

/// Outcome of a form submission, shown on the login page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    Registered,
    InvalidCredentials,
    DuplicateEmail,
    InvalidFields,
}

impl Notice {
    fn as_str(&self) -> &'static str {
        match self {
            Notice::Registered => "registered",
            Notice::InvalidCredentials => "invalid-credentials",
            Notice::DuplicateEmail => "duplicate-email",
            Notice::InvalidFields => "invalid-fields",
        }
    }

    fn parse(notice: &str) -> Option<Self> {
        match notice {
            "registered" => Some(Notice::Registered),
            "invalid-credentials" => Some(Notice::InvalidCredentials),
            "duplicate-email" => Some(Notice::DuplicateEmail),
            "invalid-fields" => Some(Notice::InvalidFields),
            _ => None,
        }
    }

    fn message(&self) -> &'static str {
        match self {
            Notice::Registered => "User created! You can sign in now.",
            Notice::InvalidCredentials => "Invalid credentials.",
            Notice::DuplicateEmail => "Email already in use.",
            Notice::InvalidFields => "Invalid fields.",
        }
    }

    /// Send the browser back to the login page with this notice.
    pub fn redirect(self, login: &str) -> Redirect {
        Redirect::to(&format!("{login}?notice={}", self.as_str()))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginQuery {
    notice: Option<String>,
}

fn document(title: &str, body: &str) -> Html<String> {
    Html(format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head><meta charset=\"utf-8\"><title>{title}</title></head>\n<body>\n{body}\n</body>\n</html>\n"
    ))
}

/// Login and registration page. Only anonymous visitors get here.
pub async fn login(
    State(state): State<AppState>,
    Query(query): Query<LoginQuery>,
) -> Html<String> {
    let notice = query
        .notice
        .as_deref()
        .and_then(Notice::parse)
        .map(|notice| {
            let class = if notice == Notice::Registered { "success" } else { "error" };
            format!("<p class=\"{class}\">{}</p>\n", notice.message())
        })
        .unwrap_or_default();

    document(
        &format!("Sign in to {}", state.config.name),
        &format!(
            "<h1>Sign in</h1>\n\
             {notice}\
             <form id=\"login\" method=\"post\" action=\"/login\">\n\
             <input name=\"email\" type=\"email\" autocomplete=\"username\" required>\n\
             <input name=\"password\" type=\"password\" autocomplete=\"current-password\" required>\n\
             <button type=\"submit\">Sign in</button>\n\
             </form>\n\
             <h2>Create account</h2>\n\
             <form id=\"register\" method=\"post\" action=\"/register\">\n\
             <input name=\"email\" type=\"email\" autocomplete=\"username\" required>\n\
             <input name=\"password\" type=\"password\" autocomplete=\"new-password\" minlength=\"{min}\" required>\n\
             <select name=\"role\">\n\
             <option value=\"USER\" selected>User</option>\n\
             <option value=\"ADMIN\">Admin</option>\n\
             </select>\n\
             <button type=\"submit\">Register</button>\n\
             </form>",
            min = state.config.password.min_length,
        ),
    )
}

/// Where unapproved accounts wait for an administrator.
pub async fn pending(caller: Option<Caller>) -> Html<String> {
    let status = caller
        .map(|Caller(claims)| claims.status().as_str())
        .unwrap_or("PENDING");

    document(
        "Approval pending",
        &format!(
            "<h1>Approval pending</h1>\n\
             <p>Your account status is <strong>{status}</strong>. An administrator must approve it before you can continue.</p>\n\
             <form method=\"post\" action=\"/logout\"><button type=\"submit\">Sign out</button></form>"
        ),
    )
}

/// Dashboard of approved users. Administrators are sent to their console.
pub async fn dashboard(
    State(state): State<AppState>,
    Caller(claims): Caller,
) -> Response {
    if claims.standing.is_admin() {
        return Redirect::to(&state.config.routes.admin_console).into_response();
    }

    document(
        "Dashboard",
        &format!(
            "<h1>Dashboard</h1>\n\
             <p>Signed in as <code>{}</code> ({}).</p>\n\
             <form method=\"post\" action=\"/logout\"><button type=\"submit\">Sign out</button></form>",
            claims.account_id,
            claims.role(),
        ),
    )
    .into_response()
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use http_body_util::BodyExt;

    use crate::account::{Role, Status};
    use crate::app;
    use crate::router::tests::{location, make_request, state, token};

    async fn text(response: axum::http::Response<axum::body::Body>) -> String {
        let body = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(body.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_anonymous_pages() {
        let app = app(state());

        let response =
            make_request(app.clone(), Method::GET, "/", None, String::new()).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(text(response).await.contains("<form id=\"login\""));

        for path in ["/dashboard", "/admin/dashboard", "/admin/anything"] {
            let response =
                make_request(app.clone(), Method::GET, path, None, String::new())
                    .await;
            assert_eq!(response.status(), StatusCode::SEE_OTHER, "{path}");
            assert_eq!(location(&response), "/");
        }

        let response =
            make_request(app, Method::GET, "/pending", None, String::new()).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_pending_user_is_held_back() {
        let state = state();
        let app = app(state.clone());
        let token = token(&state, "alice@x.com", Role::User).await;

        let response =
            make_request(app.clone(), Method::GET, "/", Some(&token), String::new())
                .await;
        assert_eq!(location(&response), "/dashboard");

        let response = make_request(
            app.clone(),
            Method::GET,
            "/dashboard",
            Some(&token),
            String::new(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/pending");

        let response = make_request(
            app.clone(),
            Method::GET,
            "/admin/dashboard",
            Some(&token),
            String::new(),
        )
        .await;
        assert_eq!(location(&response), "/dashboard");

        let response =
            make_request(app, Method::GET, "/pending", Some(&token), String::new())
                .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(text(response).await.contains(Status::Pending.as_str()));
    }

    #[tokio::test]
    async fn test_approved_user_reaches_dashboard() {
        let state = state();
        let app = app(state.clone());
        let admin = token(&state, "root@x.com", Role::Admin).await;
        let user = token(&state, "alice@x.com", Role::User).await;

        let admin = state.accounts.verify_session(&admin).await.unwrap();
        let claims = state.accounts.verify_session(&user).await.unwrap();
        state
            .accounts
            .set_status(&admin, &claims.account_id, Status::Approved)
            .await
            .unwrap();

        // A fresh login carries the new status.
        let session = state
            .accounts
            .authenticate("alice@x.com", "secret1")
            .await
            .unwrap();
        let response = make_request(
            app,
            Method::GET,
            "/dashboard",
            Some(&session.token),
            String::new(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(text(response).await.contains(&claims.account_id.to_string()));
    }

    #[tokio::test]
    async fn test_admin_lands_on_console() {
        let state = state();
        let app = app(state.clone());
        let token = token(&state, "root@x.com", Role::Admin).await;

        let response =
            make_request(app.clone(), Method::GET, "/", Some(&token), String::new())
                .await;
        assert_eq!(location(&response), "/admin/dashboard");

        // The guard lets admins through, the page itself sends them on.
        let response =
            make_request(app, Method::GET, "/dashboard", Some(&token), String::new())
                .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/admin/dashboard");
    }

    #[tokio::test]
    async fn test_login_page_forms() {
        let app = app(state());

        let response =
            make_request(app.clone(), Method::GET, "/", None, String::new()).await;
        let page = text(response).await;
        assert!(page.contains("<form id=\"register\" method=\"post\" action=\"/register\">"));
        assert!(page.contains("<select name=\"role\">"));
        assert!(page.contains("<option value=\"ADMIN\">"));
        assert!(!page.contains("class=\"error\""));

        let response = make_request(
            app.clone(),
            Method::GET,
            "/?notice=duplicate-email",
            None,
            String::new(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(text(response).await.contains("Email already in use."));

        // Unknown notices are ignored.
        let response = make_request(
            app,
            Method::GET,
            "/?notice=bogus",
            None,
            String::new(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(!text(response).await.contains("<p class="));
    }

    #[tokio::test]
    async fn test_garbage_cookie_is_cleared() {
        let app = app(state());

        let response = make_request(
            app,
            Method::GET,
            "/dashboard",
            Some("garbage"),
            String::new(),
        )
        .await;
        assert_eq!(location(&response), "/");
        let cookie = response
            .headers()
            .get(axum::http::header::SET_COOKIE)
            .and_then(|value| value.to_str().ok())
            .unwrap();
        assert!(cookie.starts_with("session=;"));
    }
}
