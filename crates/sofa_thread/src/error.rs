use thiserror::Error;

use crate::controls::ControlError;
use crate::payment::TransitionError;
use crate::store::MessageId;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialisation error: {0}")]
    Serialisation(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ThreadError {
    #[error("no message with id {0}")]
    UnknownMessage(MessageId),

    #[error("message {0} is not a payment or payment request")]
    NotAPayment(MessageId),

    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error("payment state store failed: {0}")]
    Store(#[from] StoreError),

    #[error(transparent)]
    NoSuchControl(#[from] ControlError),
}

impl ThreadError {
    /// True when the UI should silently ignore the failure.
    pub fn is_noop(&self) -> bool {
        matches!(self, Self::Transition(e) if e.is_noop())
    }
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("cannot read settings: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid settings: {0}")]
    Parse(#[from] serde_json::Error),
}
