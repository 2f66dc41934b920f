//! Middlewares for routes.

use std::convert::Infallible;

use axum::extract::{FromRequestParts, OptionalFromRequestParts, Request, State};
use axum::http::{HeaderMap, header, request::Parts};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};

use crate::AppState;
use crate::config::Configuration;
use crate::error::{AccountError, ServerError};
use crate::guard::{Decision, decide_route};
use crate::service::Renewal;
use crate::session::{Session, SessionClaims};

pub const SESSION_COOKIE: &str = "session";
const BEARER: &str = "Bearer ";

/// Build the cookie carrying `session`.
pub fn session_cookie(config: &Configuration, session: &Session) -> Cookie<'static> {
    let max_age = session.claims.expires_at - session.claims.issued_at;

    Cookie::build((SESSION_COOKIE, session.token.clone()))
        .path("/")
        .http_only(true)
        .secure(config.session.cookie_secure)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(max_age.num_seconds()))
        .build()
}

/// Cookie that erases the session cookie.
pub fn removal_cookie() -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE).path("/").build()
}

fn bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .and_then(|header| header.strip_prefix(BEARER))
        .map(|token| token.trim().to_owned())
}

/// Route guard.
///
/// Reads the session from the `session` cookie or a bearer token, renews
/// stale claims, then lets [`decide_route`] allow or redirect the request.
/// Verified claims are handed to handlers through request extensions.
pub async fn guard(
    State(state): State<AppState>,
    mut jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response, ServerError> {
    let from_cookie = jar.get(SESSION_COOKIE).map(|c| c.value().to_owned());
    let token = from_cookie.clone().or_else(|| bearer(req.headers()));

    let mut claims = None;
    if let Some(token) = token {
        match state.accounts.verify_session(&token).await {
            Some(current) => match state.accounts.renew_session(&current).await? {
                Renewal::Current => claims = Some(current),
                Renewal::Renewed(session) => {
                    jar = jar.add(session_cookie(&state.config, &session));
                    claims = Some(session.claims);
                },
                Renewal::Invalid => (),
            },
            None => tracing::debug!("ignoring invalid session token"),
        }

        if claims.is_none() && from_cookie.is_some() {
            jar = jar.remove(removal_cookie());
        }
    }

    let path = req.uri().path().to_owned();
    if let Decision::Redirect(target) =
        decide_route(claims.as_ref(), &path, &state.config.routes)
    {
        tracing::debug!(%path, %target, "route guard redirect");
        return Ok((jar, Redirect::to(target)).into_response());
    }

    if let Some(claims) = claims {
        req.extensions_mut().insert(claims);
    }
    let response = next.run(req).await;

    // A handler that sets the session cookie itself (login, logout) wins.
    let handler_owns_cookie = response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .any(|value| value.as_bytes().starts_with(b"session="));
    if handler_owns_cookie {
        return Ok(response);
    }

    Ok((jar, response).into_response())
}

/// Claims of the authenticated caller.
#[derive(Debug, Clone)]
pub struct Caller(pub SessionClaims);

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<SessionClaims>()
            .cloned()
            .map(Caller)
            .ok_or(ServerError::Account(AccountError::Unauthorized))
    }
}

impl<S> OptionalFromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(parts.extensions.get::<SessionClaims>().cloned().map(Caller))
    }
}
