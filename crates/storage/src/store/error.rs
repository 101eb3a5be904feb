#![forbid(unsafe_code)]

use tt_core::{IdError, SessionId};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("sqlite: {0}")]
    Sql(#[from] rusqlite::Error),
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid id: {0}")]
    InvalidId(#[from] IdError),
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    #[error("unknown session: {0}")]
    UnknownSession(SessionId),
}

impl StoreError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnknownSession(_) => "NOT_FOUND",
            Self::InvalidId(_) | Self::InvalidInput(_) => "INVALID_INPUT",
            Self::Io(_) | Self::Sql(_) | Self::Json(_) => "STORE_ERROR",
        }
    }
}
