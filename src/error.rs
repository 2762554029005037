use poem::{error::ResponseError, http::StatusCode};
use sea_orm::DbErr;
use thiserror::Error;

pub type Result<T, E = ForumError> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum ForumError {
    /// Missing rows and comments that belong to someone else both end up here.
    #[error("not found")]
    NotFound,

    #[error("username already taken")]
    UsernameTaken,

    #[error("database error: {0}")]
    Database(#[from] DbErr),

    #[error("session token error: {0}")]
    Session(#[from] jsonwebtoken::errors::Error),

    #[error("password hashing failed: {0}")]
    PasswordHash(password_hash::Error),
}

impl From<password_hash::Error> for ForumError {
    fn from(err: password_hash::Error) -> Self {
        ForumError::PasswordHash(err)
    }
}

impl ResponseError for ForumError {
    fn status(&self) -> StatusCode {
        match self {
            ForumError::NotFound => StatusCode::NOT_FOUND,
            ForumError::UsernameTaken => StatusCode::CONFLICT,
            ForumError::Database(_) | ForumError::Session(_) | ForumError::PasswordHash(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn as_response(&self) -> poem::Response
    where
        Self: std::error::Error + Send + Sync + 'static,
    {
        let status = self.status();
        let body = if status.is_client_error() {
            status.canonical_reason().unwrap_or_default().to_string()
        } else {
            tracing::error!(error = %self, "request failed");
            "Internal Server Error".to_string()
        };
        poem::Response::builder().status(status).body(body)
    }
}
