//! Init handshake pairing.
//!
//! The wire carries no correlation id: a response is attributed to the most
//! recent request still waiting for an answer.

use std::collections::{BTreeMap, HashMap};

use sofa_proto::{InitialRequest, InitialResponse};
use tracing::debug;

/// Supplies values for the fields an `InitialRequest` asks about.
pub trait InitValueSource {
    fn value_for(&self, field: &str) -> Option<String>;
}

impl<F> InitValueSource for F
where
    F: Fn(&str) -> Option<String>,
{
    fn value_for(&self, field: &str) -> Option<String> {
        self(field)
    }
}

impl InitValueSource for BTreeMap<String, String> {
    fn value_for(&self, field: &str) -> Option<String> {
        self.get(field).cloned()
    }
}

impl InitValueSource for HashMap<String, String> {
    fn value_for(&self, field: &str) -> Option<String> {
        self.get(field).cloned()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandshakeEvent {
    /// A request is now waiting for its answer.
    RequestOutstanding(InitialRequest),
    /// A response was matched to the outstanding request.
    Paired(InitialResponse),
    /// A response arrived with nothing to pair it with (or it already named
    /// the request it answers).
    Standalone(InitialResponse),
}

#[derive(Debug, Default)]
pub struct HandshakeTracker {
    outstanding: Option<InitialRequest>,
}

impl HandshakeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_request(&mut self, request: InitialRequest) -> HandshakeEvent {
        if self.outstanding.is_some() {
            debug!("replacing unanswered init request");
        }
        self.outstanding = Some(request.clone());
        HandshakeEvent::RequestOutstanding(request)
    }

    pub fn on_response(&mut self, mut response: InitialResponse) -> HandshakeEvent {
        if response.in_reply_to.is_some() {
            return HandshakeEvent::Standalone(response);
        }
        match self.outstanding.take() {
            Some(request) => {
                debug!(fields = request.requested_fields.len(), "init response paired");
                response.in_reply_to = Some(request);
                HandshakeEvent::Paired(response)
            }
            None => HandshakeEvent::Standalone(response),
        }
    }

    pub fn outstanding(&self) -> Option<&InitialRequest> {
        self.outstanding.as_ref()
    }

    pub fn take_outstanding(&mut self) -> Option<InitialRequest> {
        self.outstanding.take()
    }
}

/// Build the answer to `request` from `source`.
pub fn answer(request: InitialRequest, source: &dyn InitValueSource) -> InitialResponse {
    InitialResponse::answering(request, |field| source.value_for(field))
}
