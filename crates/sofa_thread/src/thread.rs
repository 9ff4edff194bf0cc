//! One conversation: decoded records, their projection, and the state that
//! user actions flow back into.

use chrono::{DateTime, Utc};
use sofa_proto::{DecodeError, Envelope, InitialRequest, InitialResponse, Message};
use tracing::{debug, info, warn};

use crate::controls::{Activation, ControlPanel, ControlRef};
use crate::error::ThreadError;
use crate::handshake::{self, HandshakeEvent, HandshakeTracker, InitValueSource};
use crate::payment::{PaymentEvent, PaymentState};
use crate::projection::{project_at, Projectable, ThreadItem};
use crate::settings::ThreadSettings;
use crate::store::{MessageId, PaymentStore};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadRecord {
    pub id: MessageId,
    pub envelope: Envelope,
    pub is_outgoing: bool,
    pub received_at: DateTime<Utc>,
    /// Mirrors the store for payment kinds; `None` for everything else.
    pub payment_state: Option<PaymentState>,
}

impl Projectable for ThreadRecord {
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

/// What happened to an envelope handed to the thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ingest {
    /// Appended to the transcript at `index`.
    Displayed { id: MessageId, index: usize },
    /// A record with this id is already at `index`; nothing was appended.
    Duplicate { id: MessageId, index: usize },
    /// Handshake traffic; kept out of the transcript.
    Handshake(HandshakeEvent),
    /// Could not be decoded; the thread is unchanged.
    Dropped(DecodeError),
}

pub struct Thread<S: PaymentStore> {
    thread_id: String,
    settings: ThreadSettings,
    store: S,
    records: Vec<ThreadRecord>,
    /// Parallel to `records`.
    items: Vec<ThreadItem>,
    handshake: HandshakeTracker,
    panel: ControlPanel,
    keyboard_hint: Option<bool>,
}

impl<S: PaymentStore> Thread<S> {
    pub fn new(thread_id: impl Into<String>, settings: ThreadSettings, store: S) -> Self {
        let panel = ControlPanel::new(settings.max_menu_depth);
        Self {
            thread_id: thread_id.into(),
            settings,
            store,
            records: Vec::new(),
            items: Vec::new(),
            handshake: HandshakeTracker::new(),
            panel,
            keyboard_hint: None,
        }
    }

    /// Decode and append a raw envelope from the transport.
    pub fn ingest(&mut self, raw: &str, is_outgoing: bool) -> Ingest {
        self.ingest_with_id(MessageId::generate(), raw, is_outgoing)
    }

    /// Like [`ingest`](Self::ingest), under a caller-chosen id.
    pub fn ingest_with_id(&mut self, id: MessageId, raw: &str, is_outgoing: bool) -> Ingest {
        match Envelope::decode(raw) {
            Ok(envelope) => self.push_with_id(id, envelope, is_outgoing),
            Err(e) => {
                warn!(thread = %self.thread_id, error = %e, "dropping undecodable envelope");
                Ingest::Dropped(e)
            }
        }
    }

    pub fn push(&mut self, envelope: Envelope, is_outgoing: bool) -> Ingest {
        self.push_with_id(MessageId::generate(), envelope, is_outgoing)
    }

    /// Append under a caller-chosen id, so persisted payment states can be
    /// found again when a conversation is replayed. Ids are unique within a
    /// thread: a second envelope under a known id is not appended.
    pub fn push_with_id(&mut self, id: MessageId, envelope: Envelope, is_outgoing: bool) -> Ingest {
        match envelope {
            Envelope::InitialRequest(request) => {
                return Ingest::Handshake(self.handshake.on_request(request));
            }
            Envelope::InitialResponse(response) => {
                return Ingest::Handshake(self.handshake.on_response(response));
            }
            _ => {}
        }

        if let Some(index) = self.index_of(&id) {
            debug!(thread = %self.thread_id, message = %id, index, "already in thread");
            return Ingest::Duplicate { id, index };
        }

        if let Envelope::Message(message) = &envelope {
            if !is_outgoing {
                self.absorb_message(message);
            }
        }

        let payment_state = envelope
            .is_payment()
            .then(|| self.initial_payment_state(&id));

        let index = self.records.len();
        debug!(thread = %self.thread_id, message = %id, index, kind = envelope.sofa_type().tag(), "appending");
        self.records.push(ThreadRecord {
            id: id.clone(),
            envelope,
            is_outgoing,
            received_at: Utc::now(),
            payment_state,
        });

        // the new tail and its predecessor are the only items whose
        // neighbourhood changed
        if let Some(item) = project_at(&self.records, index) {
            self.items.push(item);
        }
        if index > 0 {
            self.refresh(index - 1);
        }

        Ingest::Displayed { id, index }
    }

    fn absorb_message(&mut self, message: &Message) {
        if !message.controls.is_empty() {
            self.panel.offer(message.controls.clone());
        }
        if let Some(show) = message.show_keyboard {
            self.keyboard_hint = Some(show);
        }
    }

    fn initial_payment_state(&self, id: &MessageId) -> PaymentState {
        match self.store.load(id) {
            Ok(Some(state)) => state,
            Ok(None) => {
                if let Err(e) = self.store.save(id, PaymentState::None) {
                    warn!(thread = %self.thread_id, message = %id, error = %e, "cannot record new payment");
                }
                PaymentState::None
            }
            Err(e) => {
                warn!(thread = %self.thread_id, message = %id, error = %e, "cannot load payment state");
                PaymentState::None
            }
        }
    }

    // handshakes never reach `records`, so every record projects to an item
    fn refresh(&mut self, index: usize) {
        if let Some(item) = project_at(&self.records, index) {
            self.items[index] = item;
        }
    }

    /// Drive the payment behind `id` and re-project its item.
    pub fn transition_payment(
        &mut self,
        id: &MessageId,
        event: PaymentEvent,
    ) -> Result<ThreadItem, ThreadError> {
        let index = self
            .index_of(id)
            .ok_or_else(|| ThreadError::UnknownMessage(id.clone()))?;
        if !self.records[index].envelope.is_payment() {
            return Err(ThreadError::NotAPayment(id.clone()));
        }

        let current = self.store.load(id)?.unwrap_or_default();
        let next = match current.transition(event) {
            Ok(next) => next,
            Err(e) => {
                debug!(thread = %self.thread_id, message = %id, error = %e, "payment transition refused");
                return Err(e.into());
            }
        };
        self.store.save(id, next)?;
        info!(thread = %self.thread_id, message = %id, from = %current, to = %next, "payment transition");

        self.records[index].payment_state = Some(next);
        self.refresh(index);
        Ok(self.items[index].clone())
    }

    /// Press a control. A resulting command is appended as an outgoing
    /// record and handed back for the transport to send.
    pub fn activate_control(&mut self, target: ControlRef) -> Result<Activation, ThreadError> {
        let activation = self.panel.activate(target)?;
        if let Activation::Send(command) = &activation {
            self.push(Envelope::Command(command.clone()), true);
        }
        Ok(activation)
    }

    /// Profile values to volunteer when an app contact's thread is opened for
    /// the first time.
    pub fn greeting(&self, is_app: bool, source: &dyn InitValueSource) -> Option<InitialResponse> {
        if !is_app || !self.records.is_empty() {
            return None;
        }
        let request = InitialRequest::new(self.settings.greeting_fields.iter().cloned());
        Some(handshake::answer(request, source))
    }

    /// Answer the request the peer is waiting on, if any.
    pub fn answer_outstanding(&mut self, source: &dyn InitValueSource) -> Option<InitialResponse> {
        let request = self.handshake.take_outstanding()?;
        Some(handshake::answer(request, source))
    }

    pub fn thread_id(&self) -> &str {
        &self.thread_id
    }

    pub fn settings(&self) -> &ThreadSettings {
        &self.settings
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn records(&self) -> &[ThreadRecord] {
        &self.records
    }

    pub fn items(&self) -> &[ThreadItem] {
        &self.items
    }

    pub fn record(&self, id: &MessageId) -> Option<&ThreadRecord> {
        self.index_of(id).map(|index| &self.records[index])
    }

    pub fn item(&self, id: &MessageId) -> Option<&ThreadItem> {
        self.index_of(id).map(|index| &self.items[index])
    }

    pub fn panel(&self) -> &ControlPanel {
        &self.panel
    }

    pub fn keyboard_hint(&self) -> Option<bool> {
        self.keyboard_hint
    }

    pub fn outstanding_request(&self) -> Option<&InitialRequest> {
        self.handshake.outstanding()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn index_of(&self, id: &MessageId) -> Option<usize> {
        self.records.iter().position(|record| &record.id == id)
    }
}
