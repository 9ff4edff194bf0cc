//! Conversation-level logic on top of `sofa_proto`: the payment lifecycle,
//! transcript projection, the control panel and init handshake pairing,
//! tied together by [`Thread`].

pub mod controls;
pub mod error;
pub mod handshake;
pub mod payment;
pub mod projection;
pub mod settings;
pub mod store;
pub mod thread;

pub use controls::{Activation, ControlError, ControlPanel, ControlRef};
pub use error::{SettingsError, StoreError, ThreadError};
pub use handshake::{HandshakeEvent, HandshakeTracker, InitValueSource};
pub use payment::{PaymentEvent, PaymentState, TransitionError, UnknownName};
pub use projection::{
    project, project_at, GroupPosition, MessageKind, Projectable, ThreadEntry, ThreadItem,
};
pub use settings::ThreadSettings;
pub use store::{JsonFilePaymentStore, MemoryPaymentStore, MessageId, PaymentStore};
pub use thread::{Ingest, Thread, ThreadRecord};
