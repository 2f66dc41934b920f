//! Error handler for gatehouse.
//!
//! [`AccountError`] is the closed taxonomy every core operation returns.
//! [`ServerError`] adds the HTTP-only failures and turns everything into a
//! problem-details JSON body.

use axum::extract::rejection::{FormRejection, JsonRejection};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;
use validator::ValidationErrors;

pub type Result<T> = std::result::Result<T, AccountError>;

/// Errors returned by account operations.
#[derive(Debug, Error)]
pub enum AccountError {
    #[error("invalid {field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },
    #[error("email already in use")]
    DuplicateEmail,
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("caller is not allowed to perform this operation")]
    Unauthorized,
    #[error("account not found")]
    NotFound,

    #[error("store failure")]
    Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl AccountError {
    /// Build a [`AccountError::Validation`] for `field`.
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    /// Wrap a collaborator failure.
    pub fn store<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Store(Box::new(err))
    }
}

/// Turn any collaborator error into [`AccountError::Store`].
pub trait ToStoreError<T> {
    fn catch(self) -> Result<T>;
}

impl<T, E> ToStoreError<T> for std::result::Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn catch(self) -> Result<T> {
        self.map_err(AccountError::store)
    }
}

/// Enum representing server-side errors.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Account(#[from] AccountError),

    #[error("validation error occurred")]
    Validation(#[from] ValidationErrors),

    #[error(transparent)]
    Axum(#[from] JsonRejection),

    #[error(transparent)]
    Form(#[from] FormRejection),
}

/// Structure for detailed error responses.
#[derive(Debug, Serialize)]
pub struct ResponseError {
    r#type: Option<String>,
    title: String,
    status: u16,
    detail: String,
    instance: Option<String>,
    errors: Option<Vec<FieldError>>,
}

impl ResponseError {
    /// Update error status code.
    pub fn status(mut self, code: StatusCode) -> Self {
        self.status = code.as_u16();
        self
    }

    /// Update `title` field.
    pub fn title(mut self, title: &str) -> Self {
        self.title = title.into();
        self
    }

    /// Add detailed error.
    pub fn details(mut self, description: &str) -> Self {
        self.detail = description.into();
        self
    }

    /// Add one error per invalid field.
    pub fn errors(mut self, errors: Vec<FieldError>) -> Self {
        self.errors = Some(errors);
        self
    }

    fn into_http(self) -> Response {
        match serde_json::to_string(&self) {
            Ok(body) => Response::builder()
                .status(self.status)
                .header(header::CONTENT_TYPE, "application/json")
                .body(body.into())
                .unwrap_or_else(|_| internal_server_error()),
            Err(_) => internal_server_error(),
        }
    }
}

impl Default for ResponseError {
    fn default() -> Self {
        Self {
            r#type: None,
            title: "Internal server error.".to_owned(),
            status: StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
            detail: String::default(),
            instance: None,
            errors: None,
        }
    }
}

/// A single invalid field.
#[derive(Debug, Serialize)]
pub struct FieldError {
    field: String,
    message: String,
}

fn parse_validation_errors(errors: &ValidationErrors) -> Vec<FieldError> {
    errors
        .field_errors()
        .iter()
        .flat_map(|(field, issues)| {
            issues.iter().map(move |issue| FieldError {
                field: field.to_string(),
                message: issue
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| issue.code.to_string()),
            })
        })
        .collect()
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let response = ResponseError::default()
            .title("There were validation errors with your request.")
            .details(&self.to_string())
            .status(StatusCode::BAD_REQUEST);

        let response = match self {
            ServerError::Validation(ref errors) => {
                response.errors(parse_validation_errors(errors))
            },
            ServerError::Account(AccountError::Validation {
                field,
                ref message,
            }) => response.errors(vec![FieldError {
                field: field.to_owned(),
                message: message.clone(),
            }]),
            ServerError::Account(AccountError::DuplicateEmail) => response
                .title("Email already in use.")
                .status(StatusCode::CONFLICT),
            ServerError::Account(AccountError::InvalidCredentials) => response
                .title("Invalid email or password.")
                .status(StatusCode::UNAUTHORIZED),
            // No detail on purpose: a tampered client learns nothing.
            ServerError::Account(AccountError::Unauthorized) => {
                ResponseError::default()
                    .title("Forbidden.")
                    .status(StatusCode::FORBIDDEN)
            },
            ServerError::Account(AccountError::NotFound) => response
                .title("Account not found.")
                .status(StatusCode::NOT_FOUND),
            ServerError::Account(AccountError::Store(source)) => {
                tracing::error!(err = %source, "store failure");
                ResponseError::default()
            },
            ServerError::Axum(_) | ServerError::Form(_) => {
                response.title("Request body could not be parsed.")
            },
        };

        response.into_http()
    }
}

fn internal_server_error() -> Response {
    Response::builder()
        .status(StatusCode::INTERNAL_SERVER_ERROR)
        .header(header::CONTENT_TYPE, "application/json")
        .body(
            serde_json::json!({
                "type": null,
                "title": "Internal server error.",
                "status": StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
                "detail": null,
                "instance": null,
                "errors": null,
            })
            .to_string()
            .into(),
        )
        .unwrap_or_else(|_| Response::new("Internal server error".into()))
}
