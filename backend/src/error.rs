use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// RepoError
///
/// Failures surfaced by a `Repository` implementation. A `Conflict` means a
/// uniqueness constraint rejected the write (duplicate login or token value).
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("unique constraint violated")]
    Conflict,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl RepoError {
    /// Classifies a raw `sqlx` error, folding unique-key violations into `Conflict`.
    pub fn from_sqlx(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => RepoError::Conflict,
            _ => RepoError::Database(err),
        }
    }
}

/// AccountError
///
/// The typed failures of the account service. Every operation reports one of
/// these synchronously; nothing is retried internally.
#[derive(Debug, Error)]
pub enum AccountError {
    /// The referenced user (or the token's owner) does not exist. Also used for
    /// a wrong password at login so callers cannot enumerate logins.
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    AlreadyExists(String),
    /// Logout was asked to revoke a token that is not on record.
    #[error("incorrect token")]
    InvalidToken,
    #[error("credential hashing failed: {0}")]
    Hashing(String),
    #[error(transparent)]
    Storage(#[from] RepoError),
}

pub type AccountResult<T> = Result<T, AccountError>;

impl AccountError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AccountError::NotFound(_) => StatusCode::NOT_FOUND,
            AccountError::AlreadyExists(_) => StatusCode::CONFLICT,
            AccountError::InvalidToken => StatusCode::UNAUTHORIZED,
            AccountError::Hashing(_) | AccountError::Storage(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AccountError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Internal details stay in the logs; the client only sees a generic message.
        let message = if status.is_server_error() {
            tracing::error!("account service failure: {}", self);
            "internal error".to_string()
        } else {
            self.to_string()
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
