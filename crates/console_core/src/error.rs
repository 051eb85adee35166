use shared::error::ValidationError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("{0}")]
    Validation(#[from] ValidationError),
    #[error("{0}")]
    Operation(String),
}

impl FormError {
    pub fn operation(err: impl std::fmt::Display) -> Self {
        FormError::Operation(format!("{err:#}"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InvalidState {
    #[error("a submission is already in flight")]
    AlreadySubmitting,
    #[error("the previous submission has not settled yet")]
    AwaitingSettle,
    #[error("controller has been disposed")]
    Disposed,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ListSyncError {
    #[error(transparent)]
    InvalidState(#[from] InvalidState),
    #[error("failed to fetch list: {0}")]
    Fetch(String),
}
