use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use thiserror::Error;

use crate::schema::FieldKind;

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("Cannot cast '{value}' to {kind:?} for field '{field}'")]
    Cast {
        field: String,
        value: String,
        kind: FieldKind,
    },

    #[error("Unsupported operator '{operator}' on field '{field}'")]
    UnknownOperator { field: String, operator: String },

    #[error("Storage error: {0}")]
    Storage(#[from] mongodb::error::Error),
}

pub type QueryResult<T> = Result<T, QueryError>;

/// Malformed filters answer like a lookup of a non-existent resource.
impl From<QueryError> for AppError {
    fn from(err: QueryError) -> Self {
        match err {
            QueryError::Cast { .. } | QueryError::UnknownOperator { .. } => {
                tracing::debug!(error = %err, "Rejecting list query");
                AppError::NotFound("Resource not found".to_string())
            }
            QueryError::Storage(e) => AppError::from(e),
        }
    }
}

impl IntoResponse for QueryError {
    fn into_response(self) -> Response {
        AppError::from(self).into_response()
    }
}
