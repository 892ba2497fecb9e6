//! FaqClaw error type.
//!
//! User-facing variants (`NotFound`, `InvalidInput`, `EmptyCorpus`) are
//! recovered inside the conversation engine and turned into replies.
//! `Persistence` raised by a save is the only one that must reach the operator.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FaqClawError {
    /// A referenced question or index no longer exists.
    #[error("not found: {0}")]
    NotFound(String),

    /// Input could not be interpreted (bad number, out of range, empty text).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The operation needs at least one stored question.
    #[error("knowledge base is empty")]
    EmptyCorpus,

    /// The knowledge base could not be written (or read, for strict callers).
    #[error("persistence error: {0}")]
    Persistence(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("channel error: {0}")]
    Channel(String),

    #[error("lookup error: {0}")]
    Lookup(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl FaqClawError {
    /// Errors the session recovers from locally.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Self::NotFound(_) | Self::InvalidInput(_) | Self::EmptyCorpus
        )
    }

    /// Errors that must stop the dispatcher.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Persistence(_))
    }
}

pub type Result<T> = std::result::Result<T, FaqClawError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        assert!(FaqClawError::EmptyCorpus.is_user_facing());
        assert!(FaqClawError::NotFound("x".into()).is_user_facing());
        assert!(!FaqClawError::Persistence("disk full".into()).is_user_facing());
        assert!(FaqClawError::Persistence("disk full".into()).is_fatal());
        assert!(!FaqClawError::Channel("timeout".into()).is_fatal());
    }

    #[test]
    fn test_error_display() {
        let err = FaqClawError::Persistence("write db.json: denied".into());
        assert_eq!(err.to_string(), "persistence error: write db.json: denied");
    }
}
