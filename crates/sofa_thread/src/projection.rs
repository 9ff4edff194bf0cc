//! Transcript projection: ordered envelopes in, render hints out.
//!
//! Each item's grouping depends only on its rendered neighbours, so an append
//! touches at most the new tail and its predecessor, and a payment state
//! change touches only its own item.

use serde::Serialize;
use sofa_proto::Envelope;

use crate::payment::PaymentState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MessageKind {
    Simple,
    Image,
    PaymentRequest,
    Payment,
    Status,
}

impl MessageKind {
    /// `None` for handshake envelopes, which never render.
    pub fn of(envelope: &Envelope) -> Option<Self> {
        match envelope {
            Envelope::Message(message) if message.has_image() => Some(Self::Image),
            Envelope::Message(_) | Envelope::Command(_) => Some(Self::Simple),
            Envelope::PaymentRequest(_) => Some(Self::PaymentRequest),
            Envelope::Payment(_) => Some(Self::Payment),
            Envelope::Status(_) => Some(Self::Status),
            Envelope::InitialRequest(_) | Envelope::InitialResponse(_) => None,
        }
    }

    pub const fn is_payment(self) -> bool {
        matches!(self, Self::PaymentRequest | Self::Payment)
    }
}

/// Where a bubble sits within a run of same-direction messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum GroupPosition {
    Single,
    Top,
    Middle,
    Bottom,
}

impl GroupPosition {
    /// Arguments are the `is_outgoing` flags of the rendered predecessor,
    /// the item itself and the rendered successor.
    pub fn from_neighbours(previous: Option<bool>, current: bool, next: Option<bool>) -> Self {
        let joins_previous = previous == Some(current);
        let joins_next = next == Some(current);
        match (joins_previous, joins_next) {
            (false, false) => Self::Single,
            (true, true) => Self::Middle,
            (true, false) => Self::Bottom,
            (false, true) => Self::Top,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadItem {
    pub kind: MessageKind,
    pub is_outgoing: bool,
    pub group_position: GroupPosition,
    pub is_actionable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_state: Option<PaymentState>,
}

impl ThreadItem {
    /// Payment kinds always carry a state (`none` when unknown); other kinds
    /// never do. Only an unanswered payment request is actionable.
    pub fn new(
        kind: MessageKind,
        is_outgoing: bool,
        group_position: GroupPosition,
        payment_state: Option<PaymentState>,
    ) -> Self {
        let payment_state = kind
            .is_payment()
            .then(|| payment_state.unwrap_or_default());
        let is_actionable =
            kind == MessageKind::PaymentRequest && payment_state == Some(PaymentState::None);
        Self {
            kind,
            is_outgoing,
            group_position,
            is_actionable,
            payment_state,
        }
    }
}

/// Anything that can stand in for one envelope of a conversation.
pub trait Projectable {
    fn envelope(&self) -> &Envelope;
    fn is_outgoing(&self) -> bool;
    fn payment_state(&self) -> Option<PaymentState>;

    fn kind(&self) -> Option<MessageKind> {
        MessageKind::of(self.envelope())
    }
}

/// Plain projection input for callers that keep their own records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadEntry {
    pub envelope: Envelope,
    pub is_outgoing: bool,
    pub payment_state: Option<PaymentState>,
}

impl ThreadEntry {
    pub fn new(envelope: Envelope, is_outgoing: bool) -> Self {
        Self {
            envelope,
            is_outgoing,
            payment_state: None,
        }
    }

    pub fn with_payment_state(mut self, state: PaymentState) -> Self {
        self.payment_state = Some(state);
        self
    }
}

impl Projectable for ThreadEntry {
    fn envelope(&self) -> &Envelope {
        &self.envelope
    }

    fn is_outgoing(&self) -> bool {
        self.is_outgoing
    }

    fn payment_state(&self) -> Option<PaymentState> {
        self.payment_state
    }
}

/// Project the whole sequence. Handshake entries are skipped and do not
/// break up a run of bubbles.
pub fn project<T: Projectable>(entries: &[T]) -> Vec<ThreadItem> {
    (0..entries.len())
        .filter_map(|index| project_at(entries, index))
        .collect()
}

/// Project a single entry from its window. `None` if `index` is out of
/// range or names a handshake entry.
pub fn project_at<T: Projectable>(entries: &[T], index: usize) -> Option<ThreadItem> {
    let entry = entries.get(index)?;
    let kind = entry.kind()?;

    let rendered = |e: &&T| e.kind().is_some();
    let previous = entries[..index]
        .iter()
        .rev()
        .find(rendered)
        .map(|e| e.is_outgoing());
    let next = entries[index + 1..]
        .iter()
        .find(rendered)
        .map(|e| e.is_outgoing());

    let position = GroupPosition::from_neighbours(previous, entry.is_outgoing(), next);
    Some(ThreadItem::new(
        kind,
        entry.is_outgoing(),
        position,
        entry.payment_state(),
    ))
}
