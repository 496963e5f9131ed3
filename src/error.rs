//! Error types for submission validation

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Submission file missing or unreadable: {0}")]
    MissingSubmission(String),

    #[error("Submission file is empty: {0}")]
    EmptySubmission(String),

    #[error("Malformed transaction hex: {0}")]
    MalformedHex(String),

    #[error("Transaction decoding failed: {0}")]
    Decode(String),

    #[error("Script processing failed: {0}")]
    Script(String),

    #[error("Address encoding failed: {0}")]
    Address(String),

    #[error("Coin not found: {0}")]
    CoinNotFound(String),

    #[error("Invalid signature: {0}")]
    InvalidSignature(String),
}

pub type Result<T> = std::result::Result<T, ValidationError>;
