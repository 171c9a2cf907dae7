//! Error types for the BKGT services
//!
//! All errors use thiserror for structured error handling.
//! Storage errors are propagated unchanged through the `Database` variant.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Invalid search field: {0}")]
    InvalidQueryField(String),

    #[error("Item not found: {0}")]
    ItemNotFound(i64),

    #[error("Message not found: {0}")]
    MessageNotFound(i64),

    #[error("Settings error: {0}")]
    Settings(String),
}

impl serde::Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
