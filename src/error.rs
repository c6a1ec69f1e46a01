use std::string::FromUtf8Error;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::services::QueryError;

/// Application-level errors surfaced to HTTP clients
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    MissingParameter(String),

    #[error("Data unavailable: {0}")]
    DataUnavailable(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::MissingParameter(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::DataUnavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
        };

        let body = Json(json!({
            "message": message
        }));

        (status, body).into_response()
    }
}

impl From<QueryError> for AppError {
    fn from(err: QueryError) -> Self {
        match err {
            QueryError::MissingParameter("type") => {
                AppError::MissingParameter("Please select a type".to_string())
            }
            QueryError::MissingParameter(_) => AppError::MissingParameter(err.to_string()),
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;

/// Failures while loading the source table.
///
/// These never reach request handlers: the loader logs them and serves an
/// empty table instead.
#[derive(thiserror::Error, Debug)]
pub enum LoadError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[error("Column {column} is not valid UTF-8: {source}")]
    Decode {
        column: String,
        #[source]
        source: FromUtf8Error,
    },

    #[error("Unsupported type {type_name} in column {column}")]
    UnsupportedType { column: String, type_name: String },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Loader task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

pub type LoadResult<T> = Result<T, LoadError>;
