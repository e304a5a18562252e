//! Error types for lectern-session

use thiserror::Error;

use crate::store::StoreError;

/// Result type alias using lectern-session Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during session operations
#[derive(Error, Debug)]
pub enum Error {
    /// An error from the server client
    #[error(transparent)]
    Api(#[from] lectern_api::Error),

    /// Conversation storage failed
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    /// The user message was empty after trimming
    #[error("Message cannot be empty")]
    EmptyMessage,

    /// A quiz failed validation
    #[error("Invalid quiz: {0}")]
    InvalidQuiz(String),
}
