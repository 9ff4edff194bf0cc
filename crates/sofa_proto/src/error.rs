use thiserror::Error;

/// Why a raw envelope could not be turned into an [`Envelope`](crate::Envelope).
///
/// All variants are recoverable: the caller drops the offending line and
/// carries on with the rest of the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("not a SOFA envelope (expected `SOFA::<Type>:<json>`)")]
    NotSofa,

    #[error("unknown SOFA type `{0}`")]
    UnknownType(String),

    #[error("invalid JSON body: {0}")]
    InvalidJson(String),

    #[error("malformed payload: field `{field}` {reason}")]
    MalformedPayload { field: String, reason: String },
}

impl DecodeError {
    pub(crate) fn missing(field: &str) -> Self {
        Self::MalformedPayload {
            field: field.to_string(),
            reason: "is missing".to_string(),
        }
    }

    pub(crate) fn wrong_type(field: &str, expected: &str) -> Self {
        Self::MalformedPayload {
            field: field.to_string(),
            reason: format!("must be {expected}"),
        }
    }

    /// Name of the offending field, when the failure is tied to one.
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::MalformedPayload { field, .. } => Some(field),
            _ => None,
        }
    }
}
