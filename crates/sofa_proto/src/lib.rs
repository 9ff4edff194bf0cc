//! sofa_proto: Wire types and codec for SOFA chat envelopes
//!
//! A SOFA envelope is one line of text: a fixed `SOFA::<Type>:` tag followed
//! by a JSON object whose schema is selected by the tag. Everything in this
//! crate is pure: decoding and encoding never perform I/O.
//!
//! # Modules
//! - `envelope` - The closed set of envelope variants
//! - `codec`    - `SOFA::<Type>:<json>` parsing and serialisation
//! - `control`  - Buttons and button groups attached to messages
//! - `wei`      - 256-bit wei amounts in hexadecimal wire form
//! - `error`    - Decode failures

pub mod codec;
pub mod control;
pub mod envelope;
pub mod error;
pub mod wei;

pub use codec::{decode, encode, SOFA_PREFIX};
pub use control::{
    Button, ButtonAction, ButtonEffect, Control, ControlGroup, ControlValue, LocalEffect,
    LocalEffectKind, UnrecognizedAction,
};
pub use envelope::{
    Attachment, Command, Envelope, InitialRequest, InitialResponse, Message, Payment,
    PaymentRequest, SofaType, Status, TxStatus,
};
pub use error::DecodeError;
pub use wei::{Wei, WeiParseError};
