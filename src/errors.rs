use std::io;

use thiserror::Error;

/// Error type shared by the merge, split and reformat tools.
#[derive(Debug, Error)]
pub enum PrepError {
    #[error("{reason} in file {file}, entry {position}")]
    Validation {
        file: String,
        position: usize,
        reason: String,
    },
    #[error("{reason} in file {file}")]
    Parse { file: String, reason: String },
    #[error("configuration error: {0}")]
    Config(String),
    #[error("validation failed: {missing} missing item(s), {extra} extra item(s)")]
    RoundTrip { missing: usize, extra: usize },
    #[error("tokenizer unavailable: {0}")]
    Tokenizer(String),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type PrepResult<T> = Result<T, PrepError>;

impl PrepError {
    pub(crate) fn validation(file: &str, position: usize, reason: impl Into<String>) -> Self {
        PrepError::Validation {
            file: file.to_string(),
            position,
            reason: reason.into(),
        }
    }

    pub(crate) fn parse(file: &str, reason: impl Into<String>) -> Self {
        PrepError::Parse {
            file: file.to_string(),
            reason: reason.into(),
        }
    }
}
