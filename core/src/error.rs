use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A required column is missing. `line` is 1-based and equals the record id
    /// the line would have been assigned.
    #[error("malformed record on line {line}: {reason}")]
    MalformedRecord { line: usize, reason: String },

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("config error: {0}")]
    Config(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SearchError>;

impl SearchError {
    pub fn invalid<S: Into<String>>(msg: S) -> Self {
        SearchError::InvalidParameter(msg.into())
    }
}
