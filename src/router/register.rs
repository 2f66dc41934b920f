use axum::Json;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response as HttpResponse};
use serde::{Deserialize, Serialize};
use validator::Validate;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::AppState;
use crate::account::{AccountId, Role};
use crate::error::{AccountError, ServerError};
use crate::router::pages::Notice;
use crate::router::{Valid, is_form};

/// Email and password rules live in the account service.
#[derive(Deserialize, Validate, Zeroize, ZeroizeOnDrop)]
pub struct Body {
    email: String,
    password: String,
    #[serde(default)]
    #[zeroize(skip)]
    role: Option<Role>,
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub id: AccountId,
}

/// Handler to create an account.
///
/// Browser forms are redirected to the login page with the outcome.
pub async fn handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Valid(body): Valid<Body>,
) -> Result<HttpResponse, ServerError> {
    let result = state
        .accounts
        .register(&body.email, &body.password, body.role.unwrap_or_default())
        .await;

    if is_form(&headers) {
        let notice = match result {
            Ok(_) => Notice::Registered,
            Err(AccountError::DuplicateEmail) => Notice::DuplicateEmail,
            Err(AccountError::Validation { .. }) => Notice::InvalidFields,
            Err(err) => return Err(err.into()),
        };
        return Ok(notice.redirect(&state.config.routes.login).into_response());
    }

    Ok((StatusCode::CREATED, Json(Response { id: result? })).into_response())
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use crate::account::Role;
    use crate::router::tests::{json, location, make_request, state, submit_form};
    use crate::*;

    #[tokio::test]
    async fn test_register_handler() {
        let state = state();
        let app = app(state.clone());

        let response = make_request(
            app.clone(),
            Method::POST,
            "/register",
            None,
            json!({ "email": "alice@x.com", "password": "secret1" }).to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = json(response).await;
        assert!(body["id"].is_string());

        let response = make_request(
            app,
            Method::POST,
            "/register",
            None,
            json!({ "email": "ALICE@x.com", "password": "secret1", "role": "ADMIN" })
                .to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_register_validation() {
        let app = app(state());

        let response = make_request(
            app.clone(),
            Method::POST,
            "/register",
            None,
            json!({ "email": "alice", "password": "secret1" }).to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json(response).await;
        assert_eq!(body["errors"][0]["field"], "email");

        let response = make_request(
            app.clone(),
            Method::POST,
            "/register",
            None,
            json!({ "email": "alice@x.com", "password": "12345" }).to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json(response).await;
        assert_eq!(body["errors"][0]["field"], "password");

        let response = make_request(
            app,
            Method::POST,
            "/register",
            None,
            "{not json".to_owned(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_register_trims_email() {
        let state = state();
        let app = app(state.clone());

        let response = make_request(
            app,
            Method::POST,
            "/register",
            None,
            json!({ "email": "  Bob@X.com ", "password": "secret1" }).to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        state
            .accounts
            .authenticate("bob@x.com", "secret1")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_form_register() {
        let state = state();
        let app = app(state.clone());

        let response = submit_form(
            app.clone(),
            "/register",
            None,
            "email=root%40x.com&password=secret1&role=ADMIN",
        )
        .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/?notice=registered");
        let session = state
            .accounts
            .authenticate("root@x.com", "secret1")
            .await
            .unwrap();
        assert_eq!(session.claims.role(), Role::Admin);

        // Without a role the account is a pending user.
        let response = submit_form(
            app.clone(),
            "/register",
            None,
            "email=alice%40x.com&password=secret1",
        )
        .await;
        assert_eq!(location(&response), "/?notice=registered");
        let session = state
            .accounts
            .authenticate("alice@x.com", "secret1")
            .await
            .unwrap();
        assert_eq!(session.claims.role(), Role::User);

        let response = submit_form(
            app.clone(),
            "/register",
            None,
            "email=ALICE%40x.com&password=secret1&role=USER",
        )
        .await;
        assert_eq!(location(&response), "/?notice=duplicate-email");

        let response =
            submit_form(app, "/register", None, "email=alice&password=1").await;
        assert_eq!(location(&response), "/?notice=invalid-fields");
    }
}
