use advanced_results::QueryError;
use axum::response::{IntoResponse, Response};
use axum_helpers::{AppError, auth::JwtError};
use mongodb::bson::oid::ObjectId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UserError {
    #[error("User not found with id of {0}")]
    NotFound(ObjectId),

    #[error("There is no user with email: {0}")]
    UnknownEmail(String),

    #[error("There is no user with that email: {0}")]
    UnknownResetEmail(String),

    #[error("Password is incorrect")]
    IncorrectPassword,

    #[error("Invalid current password. Please provide a valid current password")]
    InvalidCurrentPassword,

    #[error("This an email: {0} exitst already")]
    EmailTaken(String),

    /// Unique index violation outside the driver (in-memory store)
    #[error("Duplicate email: {0}")]
    DuplicateKey(String),

    #[error("Token expire")]
    ResetTokenExpired,

    #[error("User id: {0} can not remove this profile")]
    RemoveForbidden(ObjectId),

    #[error("Role {0} can not be self-assigned")]
    RoleNotAllowed(axum_helpers::Role),

    #[error("Password hashing error: {0}")]
    PasswordHash(String),

    #[error(transparent)]
    Token(#[from] JwtError),

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    Database(#[from] mongodb::error::Error),

    #[error(transparent)]
    App(#[from] AppError),
}

pub type UserResult<T> = Result<T, UserError>;

/// Convert UserError to AppError for standardized error responses
impl From<UserError> for AppError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::NotFound(_)
            | UserError::UnknownEmail(_)
            | UserError::UnknownResetEmail(_)
            | UserError::IncorrectPassword
            | UserError::InvalidCurrentPassword => AppError::NotFound(err.to_string()),
            UserError::EmailTaken(_) | UserError::RoleNotAllowed(_) => {
                AppError::BadRequest(err.to_string())
            }
            UserError::DuplicateKey(email) => AppError::DuplicateKey(email),
            UserError::ResetTokenExpired | UserError::RemoveForbidden(_) => {
                AppError::Forbidden(err.to_string())
            }
            UserError::PasswordHash(msg) => AppError::InternalServerError(msg),
            UserError::Token(e) => e.into(),
            UserError::Query(e) => e.into(),
            UserError::Database(e) => AppError::Database(e),
            UserError::App(e) => e,
        }
    }
}

impl IntoResponse for UserError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}
