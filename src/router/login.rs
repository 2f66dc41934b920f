//! Open and close sessions.

use axum::Json;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Redirect};
use axum_extra::extract::CookieJar;
use serde::{Deserialize, Serialize};
use validator::Validate;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::AppState;
use crate::account::{Role, Status};
use crate::error::{AccountError, ServerError};
use crate::middleware::{Caller, removal_cookie, session_cookie};
use crate::router::pages::Notice;
use crate::router::{Valid, is_form};
use crate::session::TOKEN_TYPE;

/// Credentials are checked by the service only, so malformed input fails
/// like wrong input.
#[derive(Deserialize, Validate, Zeroize, ZeroizeOnDrop)]
pub struct Body {
    email: String,
    password: String,
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub token_type: String,
    pub token: String,
    /// Seconds.
    pub expires_in: i64,
    pub role: Role,
    pub status: Status,
}

/// Handler to log in.
///
/// API clients get the token as JSON. Browser forms are redirected to the
/// login page, which the route guard forwards to the caller's landing page.
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
    Valid(body): Valid<Body>,
) -> Result<axum::response::Response, ServerError> {
    let login_page = &state.config.routes.login;
    let form = is_form(&headers);

    let session = match state
        .accounts
        .authenticate(&body.email, &body.password)
        .await
    {
        Ok(session) => session,
        Err(AccountError::InvalidCredentials) if form => {
            return Ok(Notice::InvalidCredentials.redirect(login_page).into_response());
        },
        Err(err) => return Err(err.into()),
    };

    let jar = jar.add(session_cookie(&state.config, &session));
    if form {
        return Ok((jar, Redirect::to(login_page)).into_response());
    }

    let expires_in = (session.claims.expires_at - session.claims.issued_at).num_seconds();
    Ok((
        jar,
        Json(Response {
            token_type: TOKEN_TYPE.to_owned(),
            role: session.claims.role(),
            status: session.claims.status(),
            token: session.token,
            expires_in,
        }),
    )
        .into_response())
}

/// Handler to log out. Always lands on the login page.
pub async fn logout(
    State(state): State<AppState>,
    caller: Option<Caller>,
    jar: CookieJar,
) -> (CookieJar, Redirect) {
    if let Some(Caller(claims)) = caller {
        state.accounts.terminate_session(&claims).await;
    }

    (
        jar.remove(removal_cookie()),
        Redirect::to(&state.config.routes.login),
    )
}
