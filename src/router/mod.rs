pub mod admin;
pub mod login;
pub mod pages;
pub mod register;
pub mod status;

use axum::extract::{FromRequest, Request};
use axum::http::{HeaderMap, header};
use axum::{Form, Json};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::error::ServerError;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Whether the body comes from an HTML form rather than an API client.
pub fn is_form(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with(FORM_CONTENT_TYPE))
}

/// JSON or url-encoded body checked with [`Validate`] before reaching the
/// handler.
#[derive(Debug, Clone, Copy, Default)]
pub struct Valid<T>(pub T);

impl<T, S> FromRequest<S> for Valid<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let value = if is_form(req.headers()) {
            let Form(value) = Form::<T>::from_request(req, state).await?;
            value
        } else {
            let Json(value) = Json::<T>::from_request(req, state).await?;
            value
        };
        value.validate()?;
        Ok(Valid(value))
    }
}

/// MUST NEVER be used in production.
#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Arc;

    use axum::Router;
    use axum::body::Body;
    use axum::extract::Request;
    use axum::http::{Method, Response, header};
    use http_body_util::BodyExt;
    use tower::util::ServiceExt;

    use crate::account::Role;
    use crate::config::Configuration;
    use crate::{AppState, service};

    /// State backed by a memory store.
    pub fn state() -> AppState {
        let (accounts, _) = service::tests::service();

        AppState {
            config: Arc::new(Configuration::default()),
            accounts: Arc::new(accounts),
            metrics: None,
        }
    }

    /// Send one request. `token` travels in the session cookie.
    pub async fn make_request(
        app: Router,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: String,
    ) -> Response<Body> {
        let mut request = Request::builder()
            .method(method)
            .uri(path)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            request = request.header(header::COOKIE, format!("session={token}"));
        }

        app.oneshot(request.body(Body::from(body)).unwrap())
            .await
            .unwrap()
    }

    /// Send an url-encoded body, the way a browser submits a form.
    pub async fn submit_form(
        app: Router,
        path: &str,
        token: Option<&str>,
        body: &str,
    ) -> Response<Body> {
        let mut request = Request::builder()
            .method(Method::POST)
            .uri(path)
            .header(header::CONTENT_TYPE, super::FORM_CONTENT_TYPE);
        if let Some(token) = token {
            request = request.header(header::COOKIE, format!("session={token}"));
        }

        app.oneshot(request.body(Body::from(body.to_owned())).unwrap())
            .await
            .unwrap()
    }

    /// Register an account and return a session token for it.
    pub async fn token(state: &AppState, email: &str, role: Role) -> String {
        state
            .accounts
            .register(email, "secret1", role)
            .await
            .unwrap();
        state
            .accounts
            .authenticate(email, "secret1")
            .await
            .unwrap()
            .token
    }

    pub async fn json(response: Response<Body>) -> serde_json::Value {
        let body = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&body).unwrap()
    }

    #[test]
    fn test_is_form() {
        let mut headers = axum::http::HeaderMap::new();
        assert!(!super::is_form(&headers));

        headers.insert(
            header::CONTENT_TYPE,
            "application/x-www-form-urlencoded; charset=UTF-8".parse().unwrap(),
        );
        assert!(super::is_form(&headers));

        headers.insert(header::CONTENT_TYPE, "application/json".parse().unwrap());
        assert!(!super::is_form(&headers));
    }

    pub fn set_cookie(response: &Response<Body>) -> &str {
        response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
    }

    pub fn location(response: &Response<Body>) -> &str {
        response
            .headers()
            .get(header::LOCATION)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
    }
}
