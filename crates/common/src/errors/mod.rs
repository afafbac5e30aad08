//! Error types for Citegraph services
//!
//! Single-entity operations fail fast with a typed [`AppError`]; batch jobs
//! log and skip per-record errors. Every variant maps to a stable numeric
//! [`ErrorCode`], and the classifiers drive retry and log-level decisions.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

/// Error codes for machine-readable error identification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation errors (1xxx)
    InvalidArgument,

    // Resource errors (4xxx)
    NotFound,
    AuthorNotFound,
    PaperNotFound,
    LikeNotFound,

    // Conflict errors (5xxx)
    Conflict,
    DuplicateLike,

    // Database errors (7xxx)
    DatabaseError,
    ConnectionError,

    // Internal errors (9xxx)
    InternalError,
    ConfigurationError,
    SerializationError,
}

impl ErrorCode {
    /// Get the numeric code for this error
    pub fn as_code(&self) -> u16 {
        match self {
            ErrorCode::InvalidArgument => 1001,

            ErrorCode::NotFound => 4001,
            ErrorCode::AuthorNotFound => 4002,
            ErrorCode::PaperNotFound => 4003,
            ErrorCode::LikeNotFound => 4004,

            ErrorCode::Conflict => 5001,
            ErrorCode::DuplicateLike => 5002,

            ErrorCode::DatabaseError => 7001,
            ErrorCode::ConnectionError => 7002,

            ErrorCode::InternalError => 9001,
            ErrorCode::ConfigurationError => 9002,
            ErrorCode::SerializationError => 9003,
        }
    }
}

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Validation errors
    #[error("Invalid argument `{argument}`: {message}")]
    InvalidArgument { argument: String, message: String },

    // Resource errors
    #[error("Resource not found: {resource_type} with id {id}")]
    NotFound { resource_type: String, id: String },

    #[error("Author not found: {id}")]
    AuthorNotFound { id: String },

    #[error("Paper not found: {id}")]
    PaperNotFound { id: String },

    #[error("Like not found: author {author_id} has no active like for paper {paper_id}")]
    LikeNotFound { author_id: String, paper_id: String },

    // Conflict errors
    #[error("Duplicate resource: {message}")]
    Duplicate { message: String },

    #[error("Like already exists: author {author_id} already likes paper {paper_id}")]
    DuplicateLike { author_id: String, paper_id: String },

    // Database errors
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Database connection error: {message}")]
    DatabaseConnection { message: String },

    // Internal errors
    #[error("Internal error: {message}")]
    Internal { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // Generic
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Shorthand for an invalid argument error
    pub fn invalid_argument(argument: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::InvalidArgument {
            argument: argument.into(),
            message: message.into(),
        }
    }

    /// Get the error code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::InvalidArgument { .. } => ErrorCode::InvalidArgument,
            AppError::NotFound { .. } => ErrorCode::NotFound,
            AppError::AuthorNotFound { .. } => ErrorCode::AuthorNotFound,
            AppError::PaperNotFound { .. } => ErrorCode::PaperNotFound,
            AppError::LikeNotFound { .. } => ErrorCode::LikeNotFound,
            AppError::Duplicate { .. } => ErrorCode::Conflict,
            AppError::DuplicateLike { .. } => ErrorCode::DuplicateLike,
            AppError::Database(_) => ErrorCode::DatabaseError,
            AppError::DatabaseConnection { .. } => ErrorCode::ConnectionError,
            AppError::Internal { .. } => ErrorCode::InternalError,
            AppError::Configuration { .. } => ErrorCode::ConfigurationError,
            AppError::Serialization(_) => ErrorCode::SerializationError,
            AppError::Other(_) => ErrorCode::InternalError,
        }
    }

    /// Entity (or like) is absent
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            AppError::NotFound { .. }
                | AppError::AuthorNotFound { .. }
                | AppError::PaperNotFound { .. }
                | AppError::LikeNotFound { .. }
        )
    }

    /// Uniqueness violation such as a double like
    pub fn is_conflict(&self) -> bool {
        matches!(self, AppError::Duplicate { .. } | AppError::DuplicateLike { .. })
    }

    /// Infrastructure failure; worth retrying and logging at error level
    pub fn is_server_error(&self) -> bool {
        matches!(
            self,
            AppError::Database(_)
                | AppError::DatabaseConnection { .. }
                | AppError::Internal { .. }
                | AppError::Configuration { .. }
                | AppError::Serialization(_)
                | AppError::Other(_)
        )
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Configuration {
            message: err.to_string(),
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal {
            message: err.to_string()
        }
    }
}
