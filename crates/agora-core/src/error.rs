//! Error types for Agora core operations

use thiserror::Error;

/// Errors raised while interpreting protocol messages
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("Malformed {field} in reply from {sender}: {content:?}")]
    MalformedContent {
        sender: String,
        field: &'static str,
        content: String,
    },

    #[error("Discount {percent}% from {sender} is outside [0, 100)")]
    DiscountOutOfRange { sender: String, percent: u32 },

    #[error("Unknown performative: {0}")]
    UnknownPerformative(String),

    #[error("Serialization error: {message}")]
    SerializationError { message: String },
}

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        CoreError::SerializationError {
            message: e.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
