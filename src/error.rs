use thiserror::Error;

use crate::sdk::SdkError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Connection failure: {0}")]
    Connection(String),

    #[error("Certificate invalid or not found")]
    CertificateInvalid,

    #[error("SDK call failed: {0}")]
    Sdk(#[from] SdkError),

    #[error("Malformed callback payload: {0}")]
    MalformedPayload(String),

    #[error("HTTP request failed with status {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    pub fn config(msg: impl Into<String>) -> Self {
        AppError::Config(msg.into())
    }

    pub fn connection(msg: impl Into<String>) -> Self {
        AppError::Connection(msg.into())
    }

    pub fn malformed(msg: impl Into<String>) -> Self {
        AppError::MalformedPayload(msg.into())
    }
}
