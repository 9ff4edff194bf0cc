//! Payment lifecycle for `Payment` / `PaymentRequest` envelopes.
//!
//! ```text
//!   none ──approve──▶ pendingConfirmation ──broadcastSucceeded──▶ approved
//!    │                    │        └────────broadcastFailed─────▶ failed
//!    └──decline──▶ rejected ◀──decline──┘
//! ```
//!
//! `approved`, `rejected` and `failed` are terminal.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PaymentState {
    #[default]
    None,
    PendingConfirmation,
    Approved,
    Rejected,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PaymentEvent {
    /// User confirmed the intent to pay.
    Approve,
    /// User declined (possible until the broadcast completes).
    Decline,
    BroadcastSucceeded,
    BroadcastFailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("payment is already {state}")]
    AlreadyTerminal { state: PaymentState },

    #[error("cannot apply {event} to a payment that is {from}")]
    InvalidTransition {
        from: PaymentState,
        event: PaymentEvent,
    },
}

impl TransitionError {
    /// Duplicate taps on a settled payment: callers should ignore these
    /// rather than surface them.
    pub fn is_noop(&self) -> bool {
        matches!(self, Self::AlreadyTerminal { .. })
    }
}

impl PaymentState {
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Approved | Self::Rejected | Self::Failed)
    }

    pub fn transition(self, event: PaymentEvent) -> Result<Self, TransitionError> {
        use PaymentEvent as E;
        use PaymentState as S;

        if self.is_terminal() {
            return Err(TransitionError::AlreadyTerminal { state: self });
        }
        match (self, event) {
            (S::None, E::Approve) => Ok(S::PendingConfirmation),
            (S::None | S::PendingConfirmation, E::Decline) => Ok(S::Rejected),
            (S::PendingConfirmation, E::BroadcastSucceeded) => Ok(S::Approved),
            (S::PendingConfirmation, E::BroadcastFailed) => Ok(S::Failed),
            (from, event) => Err(TransitionError::InvalidTransition { from, event }),
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::PendingConfirmation => "pendingConfirmation",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Failed => "failed",
        }
    }
}

impl PaymentEvent {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Decline => "decline",
            Self::BroadcastSucceeded => "broadcastSucceeded",
            Self::BroadcastFailed => "broadcastFailed",
        }
    }
}

impl fmt::Display for PaymentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for PaymentEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown name `{0}`")]
pub struct UnknownName(pub String);

impl FromStr for PaymentState {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [
            Self::None,
            Self::PendingConfirmation,
            Self::Approved,
            Self::Rejected,
            Self::Failed,
        ]
        .into_iter()
        .find(|state| state.as_str() == s)
        .ok_or_else(|| UnknownName(s.to_string()))
    }
}

impl FromStr for PaymentEvent {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [
            Self::Approve,
            Self::Decline,
            Self::BroadcastSucceeded,
            Self::BroadcastFailed,
        ]
        .into_iter()
        .find(|event| event.as_str() == s)
        .ok_or_else(|| UnknownName(s.to_string()))
    }
}
