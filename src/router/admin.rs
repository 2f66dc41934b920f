//! Admin console HTTP API.

use axum::Json;
use axum::extract::{Path, State};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::AppState;
use crate::account::{AccountId, AccountView, Status};
use crate::error::ServerError;
use crate::middleware::Caller;
use crate::router::Valid;

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct StatusBody {
    pub status: Status,
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub message: String,
}

/// Every account, newest first.
pub async fn list(
    State(state): State<AppState>,
    Caller(caller): Caller,
) -> Result<Json<Vec<AccountView>>, ServerError> {
    Ok(Json(state.accounts.list_accounts(&caller).await?))
}

pub async fn update_status(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(id): Path<String>,
    Valid(body): Valid<StatusBody>,
) -> Result<Json<Message>, ServerError> {
    let id: AccountId = id.parse()?;
    let account = state.accounts.set_status(&caller, &id, body.status).await?;

    Ok(Json(Message {
        message: format!("Account {} is now {}.", account.id, account.status),
    }))
}

pub async fn delete(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(id): Path<String>,
) -> Result<Json<Message>, ServerError> {
    let id: AccountId = id.parse()?;
    state.accounts.delete_account(&caller, &id).await?;

    Ok(Json(Message {
        message: format!("Account {id} deleted."),
    }))
}
